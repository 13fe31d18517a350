//! SafeProxyFactory collaborators: where the proxy creation code comes from.

mod rpc;

pub use rpc::RpcFactory;

use std::future::Future;

use crate::crypto::Address;
use crate::error::PredictError;

/// A deployed proxy factory.
///
/// `creation_code` is read on every prediction; implementations must not
/// assume it stays the same across calls.
pub trait ProxyFactory {
    fn address(&self) -> Address;

    /// Current `proxyCreationCode()`: EVM init code prefix on standard chains,
    /// the ContractDeployer call header on zkSync.
    fn creation_code(&self) -> impl Future<Output = Result<Vec<u8>, PredictError>>;
}

/// A factory whose creation code is already known, e.g. taken from a build
/// artifact or snapshotted once from a node.
#[derive(Debug, Clone)]
pub struct StaticFactory {
    address: Address,
    creation_code: Vec<u8>,
}

impl StaticFactory {
    pub fn new(address: Address, creation_code: Vec<u8>) -> Self {
        Self {
            address,
            creation_code,
        }
    }
}

impl ProxyFactory for StaticFactory {
    fn address(&self) -> Address {
        self.address
    }

    fn creation_code(&self) -> impl Future<Output = Result<Vec<u8>, PredictError>> {
        std::future::ready(Ok(self.creation_code.clone()))
    }
}
