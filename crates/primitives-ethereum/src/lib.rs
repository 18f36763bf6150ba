//! Common ethereum related primitives.

mod digest;
mod ethereum_address;
pub mod hex;

pub use digest::*;
pub use ethereum_address::*;
