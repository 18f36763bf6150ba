//! Common test utils for EIP-712 typed data hashing.

use ethers_core::types::transaction::eip712::{Eip712, TypedData};

pub mod ether_mail;

/// Compute the signing digest of the given EIP-712 typed data JSON with the reference
/// implementation.
pub fn reference_signing_digest(type_data_json: &str) -> [u8; 32] {
    let typed_data: TypedData = serde_json::from_str(type_data_json).unwrap();
    typed_data.encode_eip712().unwrap()
}
