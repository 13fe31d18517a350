//! # safe_proxy_predict
//!
//! Predicts where SafeProxyFactory will deploy a proxy, before any
//! transaction is sent.
//!
//! The salt follows the factory entry point:
//! `createProxyWithNonce` hashes keccak256(initializer) with the nonce,
//! `createProxyWithCallback` first folds the callback into the nonce,
//! `createChainSpecificProxyWithNonce` appends the chain id.
//! The address then follows the chain's [`Backend`]: EVM CREATE2 over
//! `proxyCreationCode || singleton`, or the zkSync ContractDeployer formula
//! over the bytecode hash carried in the creation code header.
//!
//! ## Architecture
//!
//! - `crypto`: salt composition, CREATE2 and zkSync address formulas
//! - `factory`: where the proxy creation code comes from (static or RPC)
//! - `predict`: backend dispatch and the prediction entry points
//! - `worker`: parallel sweeps over nonce ranges
//! - `config`: command-line configuration

pub mod config;
pub mod crypto;
pub mod error;
pub mod factory;
pub mod predict;
pub mod worker;

pub use config::{Config, Request};
pub use crypto::{Address, SaltVariant, Word};
pub use error::PredictError;
pub use factory::{ProxyFactory, RpcFactory, StaticFactory};
pub use predict::{
    derive_address, predict, predict_chain_specific, predict_variant, predict_with_callback,
    Backend, ProxyDeployment, Verification,
};
pub use worker::{SweepJob, SweepResult, WorkerPanicked, WorkerPool};
