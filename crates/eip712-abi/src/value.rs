//! ABI values.

use primitive_types::U256;
use primitives_ethereum::EthereumAddress;

use crate::Error;

/// A concrete value to be encoded against a [`crate::ParamType`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// An unsigned integer.
    Uint(U256),
    /// A signed integer, stored as its 256-bit two's complement.
    Int(U256),
    /// An address.
    Address(EthereumAddress),
    /// A boolean.
    Bool(bool),
    /// The bytes of a `bytesN` value, must be exactly `N` long.
    FixedBytes(Vec<u8>),
    /// Dynamic bytes.
    Bytes(Vec<u8>),
    /// An UTF-8 string.
    String(String),
    /// The items of a fixed-size or a dynamic array.
    Array(Vec<Value>),
    /// The components of a tuple, or the fields of a struct in their declared order.
    Tuple(Vec<Value>),
}

impl Value {
    /// An unsigned integer value.
    pub fn uint(value: impl Into<U256>) -> Self {
        Self::Uint(value.into())
    }

    /// A signed integer value.
    pub fn int(value: i128) -> Self {
        let magnitude = U256::from(value.unsigned_abs());
        if value < 0 {
            Self::Int(twos_complement_negate(magnitude))
        } else {
            Self::Int(magnitude)
        }
    }

    /// A signed integer value from its sign and magnitude.
    ///
    /// Fails if the magnitude does not fit into `int256`.
    pub fn int_from_sign_magnitude(negative: bool, magnitude: U256) -> Result<Self, Error> {
        let limit = U256::one() << 255;
        let out_of_range = Error::OutOfRange {
            ty: "int256".to_owned(),
            reason: "magnitude does not fit into 255 bits",
        };
        if negative {
            if magnitude > limit {
                return Err(out_of_range);
            }
            Ok(Self::Int(twos_complement_negate(magnitude)))
        } else {
            if magnitude >= limit {
                return Err(out_of_range);
            }
            Ok(Self::Int(magnitude))
        }
    }

    /// A short description of the value kind, for error reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Uint(_) => "uint",
            Self::Int(_) => "int",
            Self::Address(_) => "address",
            Self::Bool(_) => "bool",
            Self::FixedBytes(_) => "fixed bytes",
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Tuple(_) => "tuple",
        }
    }
}

impl From<EthereumAddress> for Value {
    fn from(address: EthereumAddress) -> Self {
        Self::Address(address)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Negate the value in 256-bit two's complement.
fn twos_complement_negate(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

/// Whether a 256-bit two's complement value is representable with `bits` bits.
pub(crate) fn fits_signed(value: &U256, bits: usize) -> bool {
    if bits >= 256 {
        return true;
    }
    let high = *value >> (bits - 1);
    high.is_zero() || high == U256::MAX >> (bits - 1)
}

/// Whether an unsigned value is representable with `bits` bits.
pub(crate) fn fits_unsigned(value: &U256, bits: usize) -> bool {
    value.bits() <= bits
}
