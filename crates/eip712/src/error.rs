//! The EIP-712 errors.

/// An error that can happen while hashing the typed data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Encoding of the values failed, or a type name is malformed.
    #[error(transparent)]
    Abi(#[from] eip712_abi::Error),
    /// The struct types reference each other in a cycle.
    #[error("cyclic reference to the struct type {0:?}")]
    CyclicTypeReference(String),
    /// A struct type is referenced but not defined.
    #[error("reference to an undefined struct type {0:?}")]
    UnknownTypeReference(String),
}

impl Error {
    /// The value does not have the shape of the given type.
    pub(crate) fn type_mismatch(expected: impl ToString, value: &eip712_abi::Value) -> Self {
        Self::Abi(eip712_abi::Error::TypeMismatch {
            expected: expected.to_string(),
            found: value.kind(),
        })
    }
}
