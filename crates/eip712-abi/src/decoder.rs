//! ABI decoder.

use primitive_types::U256;
use primitives_ethereum::EthereumAddress;

use crate::value::{fits_signed, fits_unsigned};
use crate::{Error, ParamType, Value, WORD_SIZE};

/// Decode the data produced by [`crate::encode`] for the given types.
///
/// Offsets, lengths and paddings are validated, so any data that decodes
/// successfully re-encodes to the same bytes (modulo trailing data and the placement of tails).
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Value>, Error> {
    for ty in types {
        ty.validate()?;
    }
    let types: Vec<_> = types.iter().collect();
    decode_sequence(&types, data)
}

/// Read the word at the given offset.
fn read_word(data: &[u8], offset: usize) -> Result<&[u8; 32], Error> {
    offset
        .checked_add(WORD_SIZE)
        .and_then(|end| data.get(offset..end))
        .and_then(|slice| slice.try_into().ok())
        .ok_or(Error::InvalidEncoding("unexpected end of data"))
}

/// Read the word at the given offset as an offset or a length.
fn read_usize(data: &[u8], offset: usize) -> Result<usize, Error> {
    let value = U256::from_big_endian(read_word(data, offset)?);
    if value > U256::from(u32::MAX) {
        return Err(Error::InvalidEncoding("offset or length is too large"));
    }
    Ok(value.low_u64() as usize)
}

/// Decode a head/tail laid out sequence starting at the beginning of `data`.
fn decode_sequence(types: &[&ParamType], data: &[u8]) -> Result<Vec<Value>, Error> {
    let mut values = Vec::with_capacity(types.len());
    let mut head = 0;
    for ty in types {
        let value = if ty.is_dynamic() {
            let offset = read_usize(data, head)?;
            let tail = data
                .get(offset..)
                .ok_or(Error::InvalidEncoding("offset points outside of the data"))?;
            decode_single(ty, tail)?
        } else {
            let place = data
                .get(head..)
                .ok_or(Error::InvalidEncoding("unexpected end of data"))?;
            decode_single(ty, place)?
        };
        values.push(value);
        head = head
            .checked_add(ty.head_size()?)
            .ok_or(Error::InvalidEncoding("head size overflows"))?;
    }
    Ok(values)
}

/// Decode `len` items of the same type.
fn decode_homogeneous(ty: &ParamType, len: usize, data: &[u8]) -> Result<Vec<Value>, Error> {
    // Each item takes at least one word in the head, this bounds the allocation below.
    if len.saturating_mul(WORD_SIZE) > data.len() {
        return Err(Error::InvalidEncoding("array length exceeds the data"));
    }
    let types = vec![ty; len];
    decode_sequence(&types, data)
}

/// Decode a single value placed at the beginning of `data`.
fn decode_single(ty: &ParamType, data: &[u8]) -> Result<Value, Error> {
    match ty {
        ParamType::Uint(bits) => {
            let value = U256::from_big_endian(read_word(data, 0)?);
            if !fits_unsigned(&value, *bits) {
                return Err(Error::InvalidEncoding("unsigned integer is out of range"));
            }
            Ok(Value::Uint(value))
        }
        ParamType::Int(bits) => {
            let value = U256::from_big_endian(read_word(data, 0)?);
            if !fits_signed(&value, *bits) {
                return Err(Error::InvalidEncoding("signed integer is not sign-extended"));
            }
            Ok(Value::Int(value))
        }
        ParamType::Address => {
            let word = read_word(data, 0)?;
            if word[..12].iter().any(|b| *b != 0) {
                return Err(Error::InvalidEncoding("address has non-zero padding"));
            }
            let mut address = [0u8; 20];
            address.copy_from_slice(&word[12..]);
            Ok(Value::Address(EthereumAddress(address)))
        }
        ParamType::Bool => {
            let word = read_word(data, 0)?;
            if word[..31].iter().any(|b| *b != 0) || word[31] > 1 {
                return Err(Error::InvalidEncoding("bool is neither 0 nor 1"));
            }
            Ok(Value::Bool(word[31] == 1))
        }
        ParamType::FixedBytes(len) => {
            let word = read_word(data, 0)?;
            if word[*len..].iter().any(|b| *b != 0) {
                return Err(Error::InvalidEncoding("fixed bytes have non-zero padding"));
            }
            Ok(Value::FixedBytes(word[..*len].to_vec()))
        }
        ParamType::Bytes => read_length_prefixed(data).map(|bytes| Value::Bytes(bytes.to_vec())),
        ParamType::String => {
            let bytes = read_length_prefixed(data)?;
            let s = core::str::from_utf8(bytes)
                .map_err(|_| Error::InvalidEncoding("string is not valid UTF-8"))?;
            Ok(Value::String(s.to_owned()))
        }
        ParamType::Array(inner) => {
            let len = read_usize(data, 0)?;
            decode_homogeneous(inner, len, &data[WORD_SIZE..]).map(Value::Array)
        }
        ParamType::FixedArray(inner, len) => {
            decode_homogeneous(inner, *len, data).map(Value::Array)
        }
        ParamType::Tuple(types) => {
            let types: Vec<_> = types.iter().collect();
            decode_sequence(&types, data).map(Value::Tuple)
        }
    }
}

/// Read the length word and the payload it describes, checking the zero padding.
fn read_length_prefixed(data: &[u8]) -> Result<&[u8], Error> {
    let len = read_usize(data, 0)?;
    let padded_len = len.div_ceil(WORD_SIZE) * WORD_SIZE;
    let payload = data
        .get(WORD_SIZE..WORD_SIZE + padded_len)
        .ok_or(Error::InvalidEncoding("unexpected end of data"))?;
    if payload[len..].iter().any(|b| *b != 0) {
        return Err(Error::InvalidEncoding("non-zero padding after the payload"));
    }
    Ok(&payload[..len])
}
