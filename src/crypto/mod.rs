//! Hashing and address derivation for Safe proxy deployments.
//!
//! - `salt`: initializer hash plus nonce (and optional callback / chain id) -> 32-byte salt
//! - `create2`: standard EVM CREATE2 address from the factory creation code
//! - `zksync`: deployer call header decoding and the zkSync CREATE2 formula

mod address;
pub mod create2;
pub mod salt;
mod word;
pub mod zksync;

pub use address::{Address, AddressError};
pub use salt::SaltVariant;
pub use word::{Word, WordError};

use tiny_keccak::{Hasher, Keccak};

/// Keccak-256 of arbitrary bytes (output 32 bytes).
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    keccak256_concat(&[input])
}

/// Keccak-256 over the tight concatenation of `parts`.
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Digest of the Safe `setup` payload passed to the factory. Empty input is valid.
#[inline]
pub fn initializer_hash(initializer: &[u8]) -> [u8; 32] {
    keccak256(initializer)
}
