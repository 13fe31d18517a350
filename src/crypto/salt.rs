//! CREATE2 salt composition used by SafeProxyFactory.
//!
//!   createProxyWithNonce:         salt = keccak256(keccak256(initializer) || saltNonce)
//!   createProxyWithCallback:      saltNonce' = keccak256(saltNonce || callback), then as above
//!   createChainSpecificProxyWithNonce:
//!                                 salt = keccak256(keccak256(initializer) || saltNonce || chainId)
//!
//! Operands are packed tightly (`abi.encodePacked`): nonces, chain ids and the
//! initializer hash as 32-byte words, the callback as its raw 20 bytes.

use std::fmt;

use super::{initializer_hash, keccak256_concat, Address, Word};

/// Which factory entry point the salt is composed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaltVariant {
    Plain,
    Callback(Address),
    ChainSpecific(Word),
}

impl SaltVariant {
    /// Builds the 32-byte salt for `initializer` and `nonce`.
    pub fn compose(&self, initializer: &[u8], nonce: &Word) -> [u8; 32] {
        let init_hash = initializer_hash(initializer);
        self.compose_with_hash(&init_hash, nonce)
    }

    /// Same as [`SaltVariant::compose`] with the initializer already hashed.
    pub fn compose_with_hash(&self, initializer_hash: &[u8; 32], nonce: &Word) -> [u8; 32] {
        match self {
            SaltVariant::Plain => safe_salt(initializer_hash, nonce),
            // zero callback still goes through the substitution
            SaltVariant::Callback(callback) => {
                safe_salt(initializer_hash, &callback_nonce(nonce, callback))
            }
            SaltVariant::ChainSpecific(chain_id) => {
                chain_specific_salt(initializer_hash, nonce, chain_id)
            }
        }
    }
}

impl fmt::Display for SaltVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaltVariant::Plain => write!(f, "plain"),
            SaltVariant::Callback(callback) => write!(f, "callback {}", callback),
            SaltVariant::ChainSpecific(chain_id) => write!(f, "chain-specific {}", chain_id),
        }
    }
}

/// keccak256(initializerHash || saltNonce).
pub fn safe_salt(initializer_hash: &[u8; 32], salt_nonce: &Word) -> [u8; 32] {
    keccak256_concat(&[&initializer_hash[..], &salt_nonce.as_bytes()[..]])
}

/// keccak256(saltNonce || callback), the nonce substituted by `createProxyWithCallback`.
/// The callback is packed unpadded, so the preimage is 52 bytes.
pub fn callback_nonce(salt_nonce: &Word, callback: &Address) -> Word {
    Word::from_be_bytes(keccak256_concat(&[
        &salt_nonce.as_bytes()[..],
        &callback.as_bytes()[..],
    ]))
}

/// keccak256(initializerHash || saltNonce || chainId).
pub fn chain_specific_salt(
    initializer_hash: &[u8; 32],
    salt_nonce: &Word,
    chain_id: &Word,
) -> [u8; 32] {
    keccak256_concat(&[
        &initializer_hash[..],
        &salt_nonce.as_bytes()[..],
        &chain_id.as_bytes()[..],
    ])
}
