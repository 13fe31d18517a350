use alloy::{primitives, providers::Provider, sol};
use tracing::debug;

use super::ProxyFactory;
use crate::crypto::Address;
use crate::error::PredictError;

sol! {
    #[sol(rpc)]
    contract SafeProxyFactory {
        function proxyCreationCode() public pure returns (bytes memory);
    }
}

/// Factory read through a JSON-RPC node.
pub struct RpcFactory<P> {
    address: Address,
    provider: P,
}

impl<P: Provider + Clone> RpcFactory<P> {
    pub fn new(address: Address, provider: P) -> Self {
        Self { address, provider }
    }

    /// Whether code already lives at `address`. A deployed proxy there means
    /// `createProxy*` with the same inputs would revert.
    pub async fn is_deployed(&self, address: &Address) -> Result<bool, PredictError> {
        let code = self
            .provider
            .get_code_at(to_alloy(address))
            .await
            .map_err(|e| PredictError::network(*address, e))?;

        debug!(address = %address, code_len = code.len(), "fetched account code");
        Ok(!code.is_empty())
    }
}

impl<P: Provider + Clone> ProxyFactory for RpcFactory<P> {
    fn address(&self) -> Address {
        self.address
    }

    async fn creation_code(&self) -> Result<Vec<u8>, PredictError> {
        let factory = SafeProxyFactory::new(to_alloy(&self.address), self.provider.clone());

        let code = factory
            .proxyCreationCode()
            .call()
            .await
            .map_err(|e| PredictError::network(self.address, e))?;

        debug!(factory = %self.address, code_len = code.len(), "fetched proxy creation code");
        Ok(code.to_vec())
    }
}

fn to_alloy(address: &Address) -> primitives::Address {
    primitives::Address::from(address.into_bytes())
}
