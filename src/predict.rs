//! Proxy address prediction.
//!
//! Each prediction composes the salt, reads the factory's creation code once
//! and derives the address with the formula of the selected [`Backend`].

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::crypto::zksync::HeaderDecodeError;
use crate::crypto::{create2, keccak256, zksync, Address, SaltVariant, Word};
use crate::error::PredictError;
use crate::factory::ProxyFactory;

/// Address derivation family of the target chain. Chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// EVM CREATE2 over `creationCode || singleton`.
    #[default]
    Standard,
    /// zkSync era ContractDeployer.
    ZkSync,
}

impl FromStr for Backend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" | "evm" => Ok(Backend::Standard),
            "zksync" | "zk" | "era" => Ok(Backend::ZkSync),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Standard => write!(f, "standard"),
            Backend::ZkSync => write!(f, "zksync"),
        }
    }
}

/// Salt-independent half of the derivation for one (factory, singleton,
/// creation code) snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyDeployment {
    factory: Address,
    material: CodeMaterial,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CodeMaterial {
    Standard {
        init_code_hash: [u8; 32],
    },
    ZkSync {
        bytecode_hash: [u8; 32],
        input_hash: [u8; 32],
    },
}

impl ProxyDeployment {
    pub fn prepare(
        backend: Backend,
        factory: &Address,
        singleton: &Address,
        creation_code: &[u8],
    ) -> Result<Self, HeaderDecodeError> {
        let material = match backend {
            Backend::Standard => CodeMaterial::Standard {
                init_code_hash: create2::init_code_hash(creation_code, singleton),
            },
            Backend::ZkSync => CodeMaterial::ZkSync {
                bytecode_hash: zksync::bytecode_hash_from_header(creation_code)?,
                input_hash: keccak256(&singleton.to_word()),
            },
        };
        Ok(Self {
            factory: *factory,
            material,
        })
    }

    pub fn factory(&self) -> &Address {
        &self.factory
    }

    pub fn address(&self, salt: &[u8; 32]) -> Address {
        match &self.material {
            CodeMaterial::Standard { init_code_hash } => {
                create2::create2_address(&self.factory, salt, init_code_hash)
            }
            CodeMaterial::ZkSync {
                bytecode_hash,
                input_hash,
            } => zksync::create2_address(&self.factory, bytecode_hash, salt, input_hash),
        }
    }
}

/// Pure derivation from already fetched creation code.
pub fn derive_address(
    backend: Backend,
    factory: &Address,
    singleton: &Address,
    salt: &[u8; 32],
    creation_code: &[u8],
) -> Result<Address, HeaderDecodeError> {
    Ok(ProxyDeployment::prepare(backend, factory, singleton, creation_code)?.address(salt))
}

/// Outcome of comparing a prediction with an address observed on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Nothing to compare against.
    Unchecked,
    Match(Address),
    Mismatch {
        expected: Address,
        predicted: Option<Address>,
    },
}

impl Verification {
    pub fn check(expected: Option<Address>, predicted: Option<Address>) -> Self {
        match expected {
            None => Verification::Unchecked,
            Some(expected) if predicted == Some(expected) => Verification::Match(expected),
            Some(expected) => Verification::Mismatch {
                expected,
                predicted,
            },
        }
    }

    /// Process exit status: 2 on mismatch, 0 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Verification::Mismatch { .. } => 2,
            _ => 0,
        }
    }
}

/// Address of `createProxyWithNonce(singleton, initializer, nonce)`.
pub async fn predict<F: ProxyFactory>(
    factory: &F,
    backend: Backend,
    singleton: &Address,
    initializer: &[u8],
    nonce: &Word,
) -> Result<Address, PredictError> {
    predict_variant(factory, backend, singleton, initializer, nonce, &SaltVariant::Plain).await
}

/// Address of `createProxyWithCallback(singleton, initializer, nonce, callback)`.
pub async fn predict_with_callback<F: ProxyFactory>(
    factory: &F,
    backend: Backend,
    singleton: &Address,
    initializer: &[u8],
    nonce: &Word,
    callback: &Address,
) -> Result<Address, PredictError> {
    let variant = SaltVariant::Callback(*callback);
    predict_variant(factory, backend, singleton, initializer, nonce, &variant).await
}

/// Address of `createChainSpecificProxyWithNonce(singleton, initializer, nonce)` on `chain_id`.
pub async fn predict_chain_specific<F: ProxyFactory>(
    factory: &F,
    backend: Backend,
    singleton: &Address,
    initializer: &[u8],
    nonce: &Word,
    chain_id: &Word,
) -> Result<Address, PredictError> {
    let variant = SaltVariant::ChainSpecific(*chain_id);
    predict_variant(factory, backend, singleton, initializer, nonce, &variant).await
}

pub async fn predict_variant<F: ProxyFactory>(
    factory: &F,
    backend: Backend,
    singleton: &Address,
    initializer: &[u8],
    nonce: &Word,
    variant: &SaltVariant,
) -> Result<Address, PredictError> {
    let salt = variant.compose(initializer, nonce);
    let factory_address = factory.address();
    let creation_code = factory.creation_code().await?;

    let address = derive_address(backend, &factory_address, singleton, &salt, &creation_code)
        .inspect_err(|e| warn!(factory = %factory_address, error = %e, "cannot decode proxy creation code"))?;

    debug!(
        %backend,
        %variant,
        nonce = %nonce,
        salt = %hex::encode(salt),
        %address,
        "predicted proxy address"
    );
    Ok(address)
}
