//! 32-byte big-endian ABI words (`uint256` nonces and chain ids).

use std::fmt;
use std::str::FromStr;

/// An unsigned 256-bit integer stored as a big-endian ABI word.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Word([u8; 32]);

impl Word {
    pub const ZERO: Word = Word([0u8; 32]);

    #[inline]
    pub const fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `self + rhs`, or `None` past 2^256 - 1.
    pub fn checked_add(&self, rhs: u64) -> Option<Word> {
        let mut out = self.0;
        let mut carry = rhs as u128;
        for byte in out.iter_mut().rev() {
            if carry == 0 {
                break;
            }
            let val = *byte as u128 + (carry & 0xff);
            *byte = val as u8;
            carry = (carry >> 8) + (val >> 8);
        }
        (carry == 0).then_some(Word(out))
    }

    /// Lowercase hex of all 32 bytes (no 0x).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decimal rendering, the form Safe SDKs take for `saltNonce`.
    pub fn to_decimal(&self) -> String {
        let Some(start) = self.0.iter().position(|&b| b != 0) else {
            return "0".to_string();
        };

        // decimal digits, least significant first
        let mut digits: Vec<u8> = vec![0];
        for &byte in &self.0[start..] {
            let mut carry = byte as u32;
            for d in digits.iter_mut() {
                let val = (*d as u32) * 256 + carry;
                *d = (val % 10) as u8;
                carry = val / 10;
            }
            while carry > 0 {
                digits.push((carry % 10) as u8);
                carry /= 10;
            }
        }

        digits.iter().rev().map(|d| (b'0' + d) as char).collect()
    }

    fn parse_decimal(s: &str) -> Result<Self, WordError> {
        let mut bytes = [0u8; 32];
        for c in s.chars() {
            let digit = c.to_digit(10).ok_or(WordError::InvalidDigit(c))?;
            // bytes = bytes * 10 + digit
            let mut carry = digit;
            for byte in bytes.iter_mut().rev() {
                let val = (*byte as u32) * 10 + carry;
                *byte = (val & 0xff) as u8;
                carry = val >> 8;
            }
            if carry != 0 {
                return Err(WordError::Overflow);
            }
        }
        Ok(Self(bytes))
    }

    fn parse_hex(h: &str) -> Result<Self, WordError> {
        let h = h.trim_start_matches('0');
        if h.len() > 64 {
            return Err(WordError::Overflow);
        }
        let padded = format!("{:0>64}", h);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&padded, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl From<u64> for Word {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WordError {
    #[error("value is empty")]
    Empty,
    #[error("invalid decimal digit {0:?}")]
    InvalidDigit(char),
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("value does not fit in 256 bits")]
    Overflow,
}

impl FromStr for Word {
    type Err = WordError;

    /// Decimal, or hex when prefixed with `0x`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(h) = s.strip_prefix("0x") {
            if h.is_empty() {
                return Err(WordError::Empty);
            }
            return Self::parse_hex(h);
        }
        if s.is_empty() {
            return Err(WordError::Empty);
        }
        Self::parse_decimal(s)
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word(0x{})", self.to_hex())
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_DEC: &str =
        "115792089237316195423570985008687907853269984665640564039457584007913129639935";

    #[test]
    fn test_from_u64_is_big_endian() {
        let w = Word::from_u64(42);
        assert_eq!(&w.as_bytes()[..31], &[0u8; 31]);
        assert_eq!(w.as_bytes()[31], 42);
    }

    #[test]
    fn test_parse_decimal_and_hex_agree() {
        let dec: Word = "1694552470".parse().unwrap();
        let hex: Word = "0x6500D196".parse().unwrap();
        assert_eq!(dec, hex);
        assert_eq!(dec, Word::from_u64(1_694_552_470));
    }

    #[test]
    fn test_decimal_roundtrip_at_max() {
        let max: Word = MAX_DEC.parse().unwrap();
        assert_eq!(max.as_bytes(), &[0xff; 32]);
        assert_eq!(max.to_decimal(), MAX_DEC);
    }

    #[test]
    fn test_parse_overflow() {
        let too_big = format!("{}6", &MAX_DEC[..MAX_DEC.len() - 1]);
        assert_eq!(too_big.parse::<Word>(), Err(WordError::Overflow));
        let too_long = format!("0x1{}", "0".repeat(64));
        assert_eq!(too_long.parse::<Word>(), Err(WordError::Overflow));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!("".parse::<Word>(), Err(WordError::Empty));
        assert_eq!("0x".parse::<Word>(), Err(WordError::Empty));
        assert_eq!("12a".parse::<Word>(), Err(WordError::InvalidDigit('a')));
        assert!(matches!("0xzz".parse::<Word>(), Err(WordError::InvalidHex(_))));
    }

    #[test]
    fn test_zero_renders() {
        assert_eq!(Word::ZERO.to_decimal(), "0");
        assert_eq!("0x0000".parse::<Word>().unwrap(), Word::ZERO);
    }

    #[test]
    fn test_checked_add_carries() {
        assert_eq!(Word::from_u64(0xff).checked_add(1), Some(Word::from_u64(0x100)));
        assert_eq!(Word::ZERO.checked_add(u64::MAX), Some(Word::from_u64(u64::MAX)));

        let mut expected = [0u8; 32];
        expected[23] = 1;
        expected[24..31].copy_from_slice(&[0xff; 7]);
        expected[31] = 0xfe;
        assert_eq!(
            Word::from_u64(u64::MAX).checked_add(u64::MAX),
            Some(Word::from_be_bytes(expected))
        );
    }

    #[test]
    fn test_checked_add_overflow() {
        let max = Word::from_be_bytes([0xff; 32]);
        assert_eq!(max.checked_add(0), Some(max));
        assert_eq!(max.checked_add(1), None);
    }
}
