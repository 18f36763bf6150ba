//! The EIP-712 implementation: type canonicalization, struct hashing, domain separators
//! and the final signing digest.
//!
//! ```text
//! digest = keccak256(0x19 ++ 0x01 ++ domainSeparator ++ hashStruct(message))
//! hashStruct(s) = keccak256(typeHash ++ encodeData(s))
//! ```

mod domain;
mod error;
mod types;

#[cfg(feature = "json")]
pub mod typed_data;

pub use domain::{Domain, DomainSeparatorCache, EIP712_DOMAIN_TYPE_NAME};
pub use eip712_abi::{EthereumAddress, ParamType, Value, U256};
pub use eip712_common::keccak_256;
pub use error::Error;
pub use primitives_ethereum::Digest;
pub use types::{TypeDescriptor, TypeField, TypeRef, Types};

/// Compose the final signing digest from the domain separator and the struct hash of the message.
pub fn signing_digest(domain_separator: &[u8; 32], struct_hash: &[u8; 32]) -> Digest {
    Digest(eip712_common::signing_digest(domain_separator, struct_hash))
}
