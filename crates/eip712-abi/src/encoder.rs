//! ABI encoder.

use primitive_types::U256;

use crate::value::{fits_signed, fits_unsigned};
use crate::{Error, ParamType, Value, WORD_SIZE};

/// A single ABI word holding the given integer.
fn word(value: U256) -> [u8; 32] {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    buf
}

/// Append the bytes padded with zeroes on the right to a multiple of the word size.
fn extend_padded(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(bytes);
    let rem = bytes.len() % WORD_SIZE;
    if rem != 0 {
        buf.resize(buf.len() + WORD_SIZE - rem, 0);
    }
}

/// Encode the `(type, value)` pairs as the parameters of a call, i.e. as a tuple.
pub fn encode(params: &[(ParamType, Value)]) -> Result<Vec<u8>, Error> {
    for (ty, _) in params {
        ty.validate()?;
    }
    let pairs: Vec<_> = params.iter().map(|(ty, value)| (ty, value)).collect();
    encode_sequence(&pairs)
}

/// Encode the items in the head/tail layout.
fn encode_sequence(pairs: &[(&ParamType, &Value)]) -> Result<Vec<u8>, Error> {
    let heads_size = pairs.iter().try_fold(0usize, |size, (ty, _)| {
        size.checked_add(ty.head_size()?)
            .ok_or_else(|| Error::OutOfRange {
                ty: ty.to_string(),
                reason: "head size overflows",
            })
    })?;

    // Not preallocated, the declared sizes are not checked against the values yet.
    let mut heads = Vec::new();
    let mut tails = Vec::new();

    for (ty, value) in pairs {
        let encoded = encode_single(ty, value)?;
        if ty.is_dynamic() {
            let offset = heads_size + tails.len();
            heads.extend_from_slice(&word(U256::from(offset)));
            tails.extend_from_slice(&encoded);
        } else {
            heads.extend_from_slice(&encoded);
        }
    }

    heads.extend_from_slice(&tails);
    Ok(heads)
}

/// Encode the same type for every item.
fn encode_homogeneous(ty: &ParamType, items: &[Value]) -> Result<Vec<u8>, Error> {
    let pairs: Vec<_> = items.iter().map(|item| (ty, item)).collect();
    encode_sequence(&pairs)
}

/// Encode one value, either in place (static types) or as its tail (dynamic types).
fn encode_single(ty: &ParamType, value: &Value) -> Result<Vec<u8>, Error> {
    let out_of_range = |reason| Error::OutOfRange {
        ty: ty.to_string(),
        reason,
    };

    match (ty, value) {
        (ParamType::Uint(bits), Value::Uint(x)) => {
            if !fits_unsigned(x, *bits) {
                return Err(out_of_range("integer does not fit into the declared width"));
            }
            Ok(word(*x).to_vec())
        }
        (ParamType::Int(bits), Value::Int(x)) => {
            if !fits_signed(x, *bits) {
                return Err(out_of_range("integer does not fit into the declared width"));
            }
            Ok(word(*x).to_vec())
        }
        (ParamType::Address, Value::Address(address)) => Ok(address.to_word().to_vec()),
        (ParamType::Bool, Value::Bool(flag)) => Ok(word(U256::from(u8::from(*flag))).to_vec()),
        (ParamType::FixedBytes(len), Value::FixedBytes(bytes)) => {
            if bytes.len() != *len {
                return Err(out_of_range("byte length differs from the declared width"));
            }
            let mut buf = [0u8; 32];
            buf[..bytes.len()].copy_from_slice(bytes);
            Ok(buf.to_vec())
        }
        (ParamType::Bytes, Value::Bytes(bytes)) => Ok(encode_length_prefixed(bytes)),
        (ParamType::String, Value::String(s)) => Ok(encode_length_prefixed(s.as_bytes())),
        (ParamType::Array(inner), Value::Array(items)) => {
            let mut buf = word(U256::from(items.len())).to_vec();
            buf.extend_from_slice(&encode_homogeneous(inner, items)?);
            Ok(buf)
        }
        (ParamType::FixedArray(inner, len), Value::Array(items)) if items.len() == *len => {
            encode_homogeneous(inner, items)
        }
        (ParamType::Tuple(types), Value::Tuple(items)) if items.len() == types.len() => {
            let pairs: Vec<_> = types.iter().zip(items).collect();
            encode_sequence(&pairs)
        }
        _ => Err(Error::TypeMismatch {
            expected: ty.to_string(),
            found: value.kind(),
        }),
    }
}

/// The length word followed by the padded payload.
fn encode_length_prefixed(bytes: &[u8]) -> Vec<u8> {
    let mut buf = word(U256::from(bytes.len())).to_vec();
    extend_padded(&mut buf, bytes);
    buf
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use hex_literal::hex;
    use primitives_ethereum::EthereumAddress;

    use super::*;

    fn ty(s: &str) -> ParamType {
        s.parse().unwrap()
    }

    #[test]
    fn static_words() {
        let encoded = encode(&[
            (ty("uint8"), Value::uint(18)),
            (ty("int16"), Value::int(-1)),
            (ty("bool"), Value::Bool(true)),
            (ty("bytes4"), Value::FixedBytes(hex!("deadbeef").to_vec())),
            (
                ty("address"),
                Value::Address(EthereumAddress(hex!(
                    "0a5bce3bc08608c9b4a4d88ba216fe203da74861"
                ))),
            ),
        ])
        .unwrap();

        let expected = [
            hex!("0000000000000000000000000000000000000000000000000000000000000012"),
            hex!("ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"),
            hex!("0000000000000000000000000000000000000000000000000000000000000001"),
            hex!("deadbeef00000000000000000000000000000000000000000000000000000000"),
            hex!("0000000000000000000000000a5bce3bc08608c9b4a4d88ba216fe203da74861"),
        ]
        .concat();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn dynamic_head_tail() {
        // abi.encode(uint256(1), "Hello, Bob!", uint256[](2, 3))
        let encoded = encode(&[
            (ty("uint256"), Value::uint(1)),
            (ty("string"), Value::from("Hello, Bob!")),
            (
                ty("uint256[]"),
                Value::Array(vec![Value::uint(2), Value::uint(3)]),
            ),
        ])
        .unwrap();

        let expected = [
            hex!("0000000000000000000000000000000000000000000000000000000000000001"),
            hex!("0000000000000000000000000000000000000000000000000000000000000060"),
            hex!("00000000000000000000000000000000000000000000000000000000000000a0"),
            hex!("000000000000000000000000000000000000000000000000000000000000000b"),
            hex!("48656c6c6f2c20426f6221000000000000000000000000000000000000000000"),
            hex!("0000000000000000000000000000000000000000000000000000000000000002"),
            hex!("0000000000000000000000000000000000000000000000000000000000000002"),
            hex!("0000000000000000000000000000000000000000000000000000000000000003"),
        ]
        .concat();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn empty_dynamic_values() {
        let encoded = encode(&[
            (ty("bytes"), Value::Bytes(Vec::new())),
            (ty("bool[]"), Value::Array(Vec::new())),
        ])
        .unwrap();

        let expected = [
            hex!("0000000000000000000000000000000000000000000000000000000000000040"),
            hex!("0000000000000000000000000000000000000000000000000000000000000060"),
            hex!("0000000000000000000000000000000000000000000000000000000000000000"),
            hex!("0000000000000000000000000000000000000000000000000000000000000000"),
        ]
        .concat();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn static_tuple_and_fixed_array_in_place() {
        let encoded = encode(&[
            (
                ty("(uint8,bool)"),
                Value::Tuple(vec![Value::uint(7), Value::Bool(false)]),
            ),
            (
                ty("uint16[2]"),
                Value::Array(vec![Value::uint(1), Value::uint(2)]),
            ),
        ])
        .unwrap();

        let expected = [
            hex!("0000000000000000000000000000000000000000000000000000000000000007"),
            hex!("0000000000000000000000000000000000000000000000000000000000000000"),
            hex!("0000000000000000000000000000000000000000000000000000000000000001"),
            hex!("0000000000000000000000000000000000000000000000000000000000000002"),
        ]
        .concat();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn nested_dynamic_tuple() {
        // abi.encode((uint256, string)("x" at 1))
        let encoded = encode(&[(
            ty("(uint256,string)"),
            Value::Tuple(vec![Value::uint(1), Value::from("x")]),
        )])
        .unwrap();

        let expected = [
            hex!("0000000000000000000000000000000000000000000000000000000000000020"),
            hex!("0000000000000000000000000000000000000000000000000000000000000001"),
            hex!("0000000000000000000000000000000000000000000000000000000000000040"),
            hex!("0000000000000000000000000000000000000000000000000000000000000001"),
            hex!("7800000000000000000000000000000000000000000000000000000000000000"),
        ]
        .concat();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn out_of_range() {
        assert_matches!(
            encode(&[(ty("uint8"), Value::uint(256))]),
            Err(Error::OutOfRange { ty, .. }) if ty == "uint8"
        );
        assert_matches!(
            encode(&[(ty("int8"), Value::int(-129))]),
            Err(Error::OutOfRange { .. })
        );
        assert_matches!(
            encode(&[(ty("int8"), Value::int(128))]),
            Err(Error::OutOfRange { .. })
        );
        assert_matches!(
            encode(&[(ty("bytes32"), Value::FixedBytes(vec![0; 31]))]),
            Err(Error::OutOfRange { .. })
        );
        assert!(encode(&[(ty("uint8"), Value::uint(255))]).is_ok());
        assert!(encode(&[(ty("int8"), Value::int(-128))]).is_ok());
    }

    #[test]
    fn invalid_hand_built_types() {
        assert_matches!(
            encode(&[(ParamType::Int(0), Value::int(1))]),
            Err(Error::MalformedTypeString(ty)) if ty == "int0"
        );
        assert_matches!(
            encode(&[(ParamType::FixedBytes(33), Value::FixedBytes(vec![0; 33]))]),
            Err(Error::MalformedTypeString(ty)) if ty == "bytes33"
        );
        assert_matches!(
            encode(&[(
                ParamType::Array(Box::new(ParamType::Uint(7))),
                Value::Array(vec![])
            )]),
            Err(Error::MalformedTypeString(_))
        );
    }

    #[test]
    fn huge_fixed_array() {
        assert_matches!(
            encode(&[(ty("uint256[1152921504606846976]"), Value::Array(vec![]))]),
            Err(Error::OutOfRange { .. })
        );
        // Fits into the head size, but not the value.
        assert_matches!(
            encode(&[(ty("uint256[1099511627776]"), Value::Array(vec![]))]),
            Err(Error::TypeMismatch { found: "array", .. })
        );
    }

    #[test]
    fn type_mismatch() {
        assert_matches!(
            encode(&[(ty("uint256"), Value::Bool(true))]),
            Err(Error::TypeMismatch { found: "bool", .. })
        );
        assert_matches!(
            encode(&[(ty("int256"), Value::uint(1))]),
            Err(Error::TypeMismatch { found: "uint", .. })
        );
        assert_matches!(
            encode(&[(ty("uint8[3]"), Value::Array(vec![Value::uint(1)]))]),
            Err(Error::TypeMismatch { found: "array", .. })
        );
        assert_matches!(
            encode(&[(ty("(bool,bool)"), Value::Tuple(vec![Value::Bool(true)]))]),
            Err(Error::TypeMismatch { found: "tuple", .. })
        );
        assert_matches!(
            encode(&[(ty("bool[]"), Value::Array(vec![Value::uint(1)]))]),
            Err(Error::TypeMismatch { found: "uint", .. })
        );
    }
}
