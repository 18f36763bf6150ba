//! The Solidity ABI value model with its encoder and decoder.
//!
//! Only the parameter encoding (`abi.encode`) is covered, there are no function selectors
//! or event topics here.

mod decoder;
mod encoder;
mod error;
mod param_type;
mod value;

pub use decoder::decode;
pub use encoder::encode;
pub use error::Error;
pub use param_type::ParamType;
pub use primitive_types::U256;
pub use primitives_ethereum::EthereumAddress;
pub use value::Value;

/// The size of a single ABI word.
pub const WORD_SIZE: usize = 32;
