//! `0x`-prefixed hex helpers shared by the text forms of the primitives.

use rustc_hex::{FromHex, FromHexError, ToHex};

/// An error that can occur while parsing a hex string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseHexError {
    /// The string contains a character that is not a hex digit.
    #[error("invalid character '{ch}' at position {index}, expected 0-9 or a-f or A-F")]
    InvalidCharacter {
        /// The offending character.
        ch: char,
        /// The position of the character, not counting the `0x` prefix.
        index: usize,
    },
    /// The number of hex digits is odd.
    #[error("odd number of hex digits")]
    OddLength,
    /// The decoded value has an unexpected length.
    #[error("bad length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// The expected length in bytes.
        expected: usize,
        /// The actual length in bytes.
        actual: usize,
    },
}

impl From<FromHexError> for ParseHexError {
    fn from(err: FromHexError) -> Self {
        match err {
            FromHexError::InvalidHexCharacter(ch, index) => Self::InvalidCharacter { ch, index },
            FromHexError::InvalidHexLength => Self::OddLength,
        }
    }
}

/// Strip the optional `0x` prefix.
fn strip_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decode a hex string of any even length, with or without the `0x` prefix.
pub fn decode(s: &str) -> Result<Vec<u8>, ParseHexError> {
    let digits = strip_prefix(s);
    if digits.len() % 2 != 0 {
        return Err(ParseHexError::OddLength);
    }
    Ok(digits.from_hex()?)
}

/// Decode a hex string that must represent exactly `N` bytes.
pub fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseHexError> {
    let bytes = decode(s)?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| ParseHexError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        })
}

/// Render the bytes as a `0x`-prefixed lowercase hex string.
pub fn encode(bytes: &[u8]) -> String {
    let digits: String = bytes.to_hex();
    format!("0x{digits}")
}
