//! The JSON form of the typed data, as accepted by `eth_signTypedData_v4`.

use std::collections::BTreeMap;

use eip712_abi::{EthereumAddress, ParamType, Value, U256};
use primitives_ethereum::hex::{self, ParseHexError};
use serde::{Deserialize, Serialize};

use crate::{Digest, Domain, TypeDescriptor, TypeField, TypeRef, Types, EIP712_DOMAIN_TYPE_NAME};

/// An error that can happen while hashing the JSON typed data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Hashing of the converted message failed.
    #[error(transparent)]
    Eip712(#[from] crate::Error),
    /// The input is not a valid typed data JSON.
    #[error("invalid typed data JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A struct value is missing one of the declared fields.
    #[error("the {ty} value is missing the field {field:?}")]
    MissingField {
        /// The struct type name.
        ty: String,
        /// The missing field name.
        field: String,
    },
    /// An address or bytes value is not a valid hex string.
    #[error("invalid hex for {ty}: {source}")]
    InvalidHex {
        /// The expected type.
        ty: String,
        /// The hex parsing error.
        source: ParseHexError,
    },
    /// An integer value is neither a JSON integer nor a decimal or hex string.
    #[error("invalid integer for {ty}: {value}")]
    InvalidInteger {
        /// The expected type.
        ty: String,
        /// The offending value.
        value: String,
    },
    /// The declared `EIP712Domain` type does not list exactly the fields present in the domain.
    #[error("declared domain type {declared} does not match the domain {expected}")]
    DomainTypeMismatch {
        /// The signature of the declared type.
        declared: String,
        /// The signature implied by the domain fields.
        expected: String,
    },
    /// The JSON value has the wrong shape for the type.
    #[error("unexpected value for {ty}: {value}")]
    UnexpectedValue {
        /// The expected type.
        ty: String,
        /// The offending value.
        value: String,
    },
}

/// The typed data: struct types, the primary type, the domain and the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    /// The struct types by their names, usually including `EIP712Domain`.
    pub types: BTreeMap<String, Vec<TypeField>>,
    /// The struct type of the message.
    pub primary_type: String,
    /// The signing domain.
    pub domain: Domain,
    /// The message as a JSON object.
    #[serde(default)]
    pub message: serde_json::Value,
}

impl TypedData {
    /// Parse the typed data from JSON.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// The declared struct types.
    pub fn types(&self) -> Types {
        self.types
            .iter()
            .map(|(name, fields)| TypeDescriptor::new(name.clone(), fields.clone()))
            .collect()
    }

    /// The message converted to a struct value of the primary type.
    pub fn message_value(&self) -> Result<Value, Error> {
        self.convert(
            &TypeRef::Struct(self.primary_type.clone()),
            &self.message,
        )
    }

    /// The struct hash of the message.
    pub fn struct_hash(&self) -> Result<[u8; 32], Error> {
        let value = self.message_value()?;
        Ok(self.types().struct_hash(&self.primary_type, &value)?)
    }

    /// The domain separator.
    ///
    /// The separator is computed from the `domain` object. The `EIP712Domain` type does not
    /// have to be declared, but when it is, it must list the present domain fields in
    /// the canonical order, otherwise wallets hashing by the declared type would disagree.
    pub fn domain_separator(&self) -> Result<[u8; 32], Error> {
        if let Some(fields) = self.types.get(EIP712_DOMAIN_TYPE_NAME) {
            let expected = self.domain.descriptor();
            if *fields != expected.fields {
                let declared = TypeDescriptor::new(EIP712_DOMAIN_TYPE_NAME, fields.clone());
                return Err(Error::DomainTypeMismatch {
                    declared: declared.signature(),
                    expected: expected.signature(),
                });
            }
        }
        Ok(self.domain.domain_separator())
    }

    /// The digest to sign.
    ///
    /// When the primary type is the domain itself, the message is not hashed and the digest
    /// commits to the domain alone.
    pub fn signing_digest(&self) -> Result<Digest, Error> {
        let domain_separator = self.domain_separator()?;
        if self.primary_type == EIP712_DOMAIN_TYPE_NAME {
            return Ok(Digest(eip712_common::domain_only_signing_digest(
                &domain_separator,
            )));
        }
        Ok(crate::signing_digest(&domain_separator, &self.struct_hash()?))
    }

    /// Convert the JSON value into a value of the given type.
    fn convert(&self, ty: &TypeRef, json: &serde_json::Value) -> Result<Value, Error> {
        let unexpected = || Error::UnexpectedValue {
            ty: ty.to_string(),
            value: json.to_string(),
        };

        match ty {
            TypeRef::Elementary(param) => convert_elementary(param, json),
            TypeRef::Struct(name) => {
                let fields = self
                    .types
                    .get(name)
                    .ok_or_else(|| crate::Error::UnknownTypeReference(name.clone()))?;
                let object = json.as_object().ok_or_else(unexpected)?;
                fields
                    .iter()
                    .map(|field| {
                        let item = object.get(&field.name).ok_or_else(|| Error::MissingField {
                            ty: name.clone(),
                            field: field.name.clone(),
                        })?;
                        self.convert(&field.ty, item)
                    })
                    .collect::<Result<_, _>>()
                    .map(Value::Tuple)
            }
            TypeRef::Array(inner) | TypeRef::FixedArray(inner, _) => json
                .as_array()
                .ok_or_else(unexpected)?
                .iter()
                .map(|item| self.convert(inner, item))
                .collect::<Result<_, _>>()
                .map(Value::Array),
        }
    }
}

/// Convert the JSON value into a value of the elementary type.
fn convert_elementary(ty: &ParamType, json: &serde_json::Value) -> Result<Value, Error> {
    let unexpected = || Error::UnexpectedValue {
        ty: ty.to_string(),
        value: json.to_string(),
    };
    let invalid_hex = |source| Error::InvalidHex {
        ty: ty.to_string(),
        source,
    };
    let invalid_integer = || Error::InvalidInteger {
        ty: ty.to_string(),
        value: json.to_string(),
    };

    match ty {
        ParamType::Uint(_) => match json {
            serde_json::Value::Number(n) => n.as_u64().map(Value::uint).ok_or_else(invalid_integer),
            serde_json::Value::String(s) => parse_magnitude(s)
                .map(Value::Uint)
                .ok_or_else(invalid_integer),
            _ => Err(invalid_integer()),
        },
        ParamType::Int(_) => match json {
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(|n| Value::int(n.into()))
                .ok_or_else(invalid_integer),
            serde_json::Value::String(s) => {
                let (negative, magnitude) = match s.strip_prefix('-') {
                    Some(rest) => (true, rest),
                    None => (false, s.as_str()),
                };
                let magnitude = parse_magnitude(magnitude).ok_or_else(invalid_integer)?;
                Value::int_from_sign_magnitude(negative, magnitude)
                    .map_err(|err| Error::Eip712(err.into()))
            }
            _ => Err(invalid_integer()),
        },
        ParamType::Address => {
            let s = json.as_str().ok_or_else(unexpected)?;
            s.parse::<EthereumAddress>()
                .map(Value::Address)
                .map_err(invalid_hex)
        }
        ParamType::Bool => json.as_bool().map(Value::Bool).ok_or_else(unexpected),
        ParamType::FixedBytes(_) => {
            let s = json.as_str().ok_or_else(unexpected)?;
            hex::decode(s).map(Value::FixedBytes).map_err(invalid_hex)
        }
        ParamType::Bytes => {
            let s = json.as_str().ok_or_else(unexpected)?;
            hex::decode(s).map(Value::Bytes).map_err(invalid_hex)
        }
        ParamType::String => json
            .as_str()
            .map(|s| Value::String(s.to_owned()))
            .ok_or_else(unexpected),
        ParamType::Array(_) | ParamType::FixedArray(..) | ParamType::Tuple(_) => Err(unexpected()),
    }
}

/// Parse a non-negative integer from a decimal or a `0x`-prefixed hex string.
fn parse_magnitude(s: &str) -> Option<U256> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok(),
        Some(_) => None,
        None if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            U256::from_dec_str(s).ok()
        }
        None => None,
    }
}
