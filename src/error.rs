use crate::crypto::zksync::HeaderDecodeError;
use crate::crypto::Address;

/// Why a prediction produced no address.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("malformed deployer call header: {0}")]
    HeaderDecode(#[from] HeaderDecodeError),

    /// The RPC read failed. Callers own the retry policy.
    #[error("RPC read for {address} failed: {message}")]
    Network { address: Address, message: String },
}

impl PredictError {
    pub fn network(address: Address, err: impl std::fmt::Display) -> Self {
        PredictError::Network {
            address,
            message: err.to_string(),
        }
    }
}
