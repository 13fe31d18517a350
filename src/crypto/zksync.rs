//! zkSync era deployment: deployer call header decoding and CREATE2 address.
//!
//! On zkSync `type(SafeProxy).creationCode` is not EVM init code but the
//! ContractDeployer call header:
//!
//! ```text
//! selector (4) || abi.encode(bytes32 salt, bytes32 bytecodeHash, bytes constructorInput)
//! ```
//!
//! and the deployed address is
//!
//! ```text
//! keccak256(CREATE2_PREFIX || word(sender) || salt || bytecodeHash || keccak256(input))[12:32]
//! ```

use super::{keccak256, keccak256_concat, Address, Word};

/// keccak256("zksyncCreate2").
pub const CREATE2_PREFIX: [u8; 32] = [
    0x20, 0x20, 0xdb, 0xa9, 0x1b, 0x30, 0xcc, 0x00, 0x06, 0x18, 0x8a, 0xf7, 0x94, 0xc2, 0xfb, 0x30,
    0xdd, 0x85, 0x20, 0xdb, 0x7e, 0x2c, 0x08, 0x8b, 0x7f, 0xc7, 0xc1, 0x03, 0xc0, 0x0c, 0xa4, 0x94,
];

const SELECTOR_LEN: usize = 4;
const WORD_LEN: usize = 32;
/// Head of the `(bytes32, bytes32, bytes)` tuple: two values and one offset.
const TUPLE_HEAD_LEN: usize = 3 * WORD_LEN;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderDecodeError {
    #[error("deployer call header truncated: need at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("constructor input offset {offset} out of bounds for a {available}-byte tuple")]
    OffsetOutOfBounds { offset: Word, available: usize },
    #[error("constructor input length {length} at offset {offset} overruns a {available}-byte tuple")]
    LengthOutOfBounds {
        offset: usize,
        length: Word,
        available: usize,
    },
}

/// Extracts the bytecode hash from the deployer call header returned by
/// `proxyCreationCode()` on zkSync.
///
/// The tuple is decoded strictly: the constructor input must sit inside the
/// buffer, padded to a whole word. Its contents are not inspected.
pub fn bytecode_hash_from_header(creation_code: &[u8]) -> Result<[u8; 32], HeaderDecodeError> {
    let min_len = SELECTOR_LEN + TUPLE_HEAD_LEN;
    if creation_code.len() < min_len {
        return Err(HeaderDecodeError::Truncated {
            expected: min_len,
            actual: creation_code.len(),
        });
    }
    let tuple = &creation_code[SELECTOR_LEN..];

    let offset_word = word_at(tuple, 2 * WORD_LEN);
    let offset = word_to_usize(&offset_word)
        .filter(|offset| {
            offset
                .checked_add(WORD_LEN)
                .is_some_and(|end| end <= tuple.len())
        })
        .ok_or(HeaderDecodeError::OffsetOutOfBounds {
            offset: offset_word,
            available: tuple.len(),
        })?;

    let length_word = word_at(tuple, offset);
    let data_start = offset + WORD_LEN;
    let fits = word_to_usize(&length_word)
        .and_then(|length| length.checked_next_multiple_of(WORD_LEN))
        .and_then(|padded| data_start.checked_add(padded))
        .is_some_and(|end| end <= tuple.len());
    if !fits {
        return Err(HeaderDecodeError::LengthOutOfBounds {
            offset,
            length: length_word,
            available: tuple.len(),
        });
    }

    Ok(*word_at(tuple, WORD_LEN).as_bytes())
}

/// zkSync CREATE2 address of a contract deployed by `sender`.
pub fn create2_address(
    sender: &Address,
    bytecode_hash: &[u8; 32],
    salt: &[u8; 32],
    input_hash: &[u8; 32],
) -> Address {
    let digest = keccak256_concat(&[
        &CREATE2_PREFIX[..],
        &sender.to_word()[..],
        &salt[..],
        &bytecode_hash[..],
        &input_hash[..],
    ]);
    Address::from_digest(&digest)
}

/// Safe proxy address on zkSync. The proxy constructor input is `abi.encode(singleton)`.
pub fn proxy_address(
    factory: &Address,
    singleton: &Address,
    salt: &[u8; 32],
    creation_code: &[u8],
) -> Result<Address, HeaderDecodeError> {
    let bytecode_hash = bytecode_hash_from_header(creation_code)?;
    let input_hash = keccak256(&singleton.to_word());
    Ok(create2_address(factory, &bytecode_hash, salt, &input_hash))
}

/// Caller guarantees `at + 32 <= buf.len()`.
fn word_at(buf: &[u8], at: usize) -> Word {
    let mut word = [0u8; WORD_LEN];
    word.copy_from_slice(&buf[at..at + WORD_LEN]);
    Word::from_be_bytes(word)
}

fn word_to_usize(word: &Word) -> Option<usize> {
    let bytes = word.as_bytes();
    if bytes[..24].iter().any(|&b| b != 0) {
        return None;
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&bytes[24..]);
    usize::try_from(u64::from_be_bytes(low)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SaltVariant;

    const BYTECODE_HASH: &str = "0100004124426fb9ebb25e27d670c068e52f9ba631bd383279a188be47e3f86d";

    /// create2 selector, zero salt, bytecode hash, offset 0x60, empty input.
    fn header() -> Vec<u8> {
        let mut out = vec![0x3c, 0xda, 0x33, 0x51];
        out.extend_from_slice(&[0u8; 32]);
        out.extend_from_slice(&hex::decode(BYTECODE_HASH).unwrap());
        out.extend_from_slice(Word::from_u64(0x60).as_bytes());
        out.extend_from_slice(Word::ZERO.as_bytes());
        out
    }

    fn set_word(buf: &mut [u8], at: usize, word: Word) {
        buf[at..at + 32].copy_from_slice(word.as_bytes());
    }

    #[test]
    fn test_prefix_is_hash_of_tag() {
        assert_eq!(CREATE2_PREFIX, keccak256(b"zksyncCreate2"));
    }

    #[test]
    fn test_decode_header() {
        let code = header();
        assert_eq!(code.len(), 132);
        let hash = bytecode_hash_from_header(&code).unwrap();
        assert_eq!(hex::encode(hash), BYTECODE_HASH);
    }

    #[test]
    fn test_decode_ignores_constructor_input_contents() {
        let mut code = header();
        set_word(&mut code, 4 + 96, Word::from_u64(3));
        code.extend_from_slice(&[0xab; 32]);
        assert_eq!(hex::encode(bytecode_hash_from_header(&code).unwrap()), BYTECODE_HASH);
    }

    #[test]
    fn test_decode_rejects_short_header() {
        // selector + two words only
        let code = &header()[..4 + 64];
        assert_eq!(
            bytecode_hash_from_header(code),
            Err(HeaderDecodeError::Truncated {
                expected: 100,
                actual: 68
            })
        );
        assert!(matches!(
            bytecode_hash_from_header(&[0x3c, 0xda]),
            Err(HeaderDecodeError::Truncated { actual: 2, .. })
        ));
        assert!(bytecode_hash_from_header(&[]).is_err());
    }

    #[test]
    fn test_decode_rejects_bad_offset() {
        let mut code = header();
        set_word(&mut code, 4 + 64, Word::from_u64(0x80));
        assert!(matches!(
            bytecode_hash_from_header(&code),
            Err(HeaderDecodeError::OffsetOutOfBounds { available: 128, .. })
        ));

        set_word(&mut code, 4 + 64, Word::from_be_bytes([0xff; 32]));
        assert!(matches!(
            bytecode_hash_from_header(&code),
            Err(HeaderDecodeError::OffsetOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_overrunning_length() {
        let mut code = header();
        set_word(&mut code, 4 + 96, Word::from_u64(1));
        assert_eq!(
            bytecode_hash_from_header(&code),
            Err(HeaderDecodeError::LengthOutOfBounds {
                offset: 0x60,
                length: Word::from_u64(1),
                available: 128,
            })
        );

        // unpadded tail
        code.extend_from_slice(&[0xab]);
        assert!(bytecode_hash_from_header(&code).is_err());

        set_word(&mut code, 4 + 96, Word::from_be_bytes([0xff; 32]));
        assert!(matches!(
            bytecode_hash_from_header(&code),
            Err(HeaderDecodeError::LengthOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_proxy_address_known_vector() {
        let factory = Address::from_bytes([0xaa; 20]);
        let singleton: Address = "0x41675C099F32341bf84BFc5382aF534df5C7461a".parse().unwrap();
        let salt = SaltVariant::Plain.compose(&[], &Word::from_u64(42));
        let addr = proxy_address(&factory, &singleton, &salt, &header()).unwrap();
        assert_eq!(addr.to_checksum(), "0xF81B0De3E0b8b9A0e2adCc590F49Fb970B392AA6");

        assert_eq!(
            hex::encode(keccak256(&singleton.to_word())),
            "c156a179a4bd476eb538c37e234c571851205a68f881c6d53cbe1847a9d507e3"
        );
    }

    #[test]
    fn test_proxy_address_chain_specific_vector() {
        let factory = Address::from_bytes([0xaa; 20]);
        let singleton: Address = "0x41675C099F32341bf84BFc5382aF534df5C7461a".parse().unwrap();
        let salt = SaltVariant::ChainSpecific(Word::from_u64(324)).compose(&[], &Word::from_u64(42));
        let addr = proxy_address(&factory, &singleton, &salt, &header()).unwrap();
        assert_eq!(addr.to_checksum(), "0x1AB32A3123e7BE39ac8fd6dD3aa63922a8052594");
    }
}
