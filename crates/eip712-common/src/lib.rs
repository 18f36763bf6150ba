//! Common logic for EIP-712 typed data hashing: the primitive hash and the final digest
//! composition.

pub use primitives_ethereum::{Digest, EthereumAddress};
use sha3::Digest as _;

/// A first number of an EIP191 message.
const EIP191_MAGIC_BYTE: u8 = 0x19;
/// The EIP191 version for the EIP-712 structured data.
const EIP191_VERSION_STRUCTURED_DATA: u8 = 0x01;

/// The Keccak-256 hash of the given bytes.
///
/// This is the one hash function used across the whole typed data pipeline,
/// replacing it changes every digest.
pub fn keccak_256(data: impl AsRef<[u8]>) -> [u8; 32] {
    sha3::Keccak256::digest(data.as_ref()).into()
}

/// Compute the final EIP-712 signing digest:
/// `keccak256(0x19 ++ 0x01 ++ domain_separator ++ struct_hash)`.
pub fn signing_digest(domain_separator: &[u8; 32], struct_hash: &[u8; 32]) -> [u8; 32] {
    let mut msg: [u8; 66] = [0; 66];
    msg[0] = EIP191_MAGIC_BYTE;
    msg[1] = EIP191_VERSION_STRUCTURED_DATA;
    msg[2..34].copy_from_slice(domain_separator);
    msg[34..66].copy_from_slice(struct_hash);
    keccak_256(msg)
}

/// Compute the digest for a message whose primary type is the domain itself.
///
/// There is no struct hash in this case, only the domain separator follows the prefix.
pub fn domain_only_signing_digest(domain_separator: &[u8; 32]) -> [u8; 32] {
    let mut msg: [u8; 34] = [0; 34];
    msg[0] = EIP191_MAGIC_BYTE;
    msg[1] = EIP191_VERSION_STRUCTURED_DATA;
    msg[2..34].copy_from_slice(domain_separator);
    keccak_256(msg)
}
