//! Standard EVM CREATE2 address computation.
//!
//! Matches SafeProxyFactory.deployProxy on EVM chains:
//!   deploymentData = proxyCreationCode || uint256(singleton)
//!   address = keccak256(0xff || factory || salt || keccak256(deploymentData))[12:32]

use super::{keccak256_concat, Address};

/// keccak256(creationCode || word(singleton)).
pub fn init_code_hash(creation_code: &[u8], singleton: &Address) -> [u8; 32] {
    keccak256_concat(&[creation_code, &singleton.to_word()[..]])
}

/// Computes the CREATE2 address (EIP-1014).
/// Preimage: 0xff (1) || deployer (20) || salt (32) || init_code_hash (32) = 85 bytes.
pub fn create2_address(deployer: &Address, salt: &[u8; 32], init_code_hash: &[u8; 32]) -> Address {
    let mut preimage = [0u8; 85];
    preimage[0] = 0xff;
    preimage[1..21].copy_from_slice(deployer.as_bytes());
    preimage[21..53].copy_from_slice(salt);
    preimage[53..85].copy_from_slice(init_code_hash);

    Address::from_digest(&super::keccak256(&preimage))
}

/// Safe proxy address for `singleton` deployed by `factory` with `salt`.
pub fn proxy_address(
    factory: &Address,
    singleton: &Address,
    salt: &[u8; 32],
    creation_code: &[u8],
) -> Address {
    create2_address(factory, salt, &init_code_hash(creation_code, singleton))
}
