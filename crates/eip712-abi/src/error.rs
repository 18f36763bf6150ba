//! ABI errors.

/// An error that can happen while parsing types or encoding and decoding values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The shape of the value does not match the declared type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The declared type.
        expected: String,
        /// The kind of the value that was supplied.
        found: &'static str,
    },
    /// The value does not fit into the declared type.
    #[error("value out of range for {ty}: {reason}")]
    OutOfRange {
        /// The declared type.
        ty: String,
        /// What exactly went out of range.
        reason: &'static str,
    },
    /// The type name is not a valid type.
    #[error("malformed type string: {0:?}")]
    MalformedTypeString(String),
    /// The encoded data is not a valid encoding of the requested types.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(&'static str),
}
