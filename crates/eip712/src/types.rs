//! Struct type definitions, their canonical type strings and the struct hashing.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use eip712_abi::{ParamType, Value};
use eip712_common::keccak_256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

/// The type of a struct field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// An elementary type, never an array or a tuple.
    Elementary(ParamType),
    /// A reference to a struct type by its name.
    Struct(String),
    /// `T[]`.
    Array(Box<TypeRef>),
    /// `T[N]`.
    FixedArray(Box<TypeRef>, usize),
}

impl TypeRef {
    /// The name of the struct type this type refers to, looking through arrays.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Self::Elementary(_) => None,
            Self::Struct(name) => Some(name),
            Self::Array(inner) | Self::FixedArray(inner, _) => inner.struct_name(),
        }
    }

    /// Check a type that may have been built by hand rather than parsed.
    ///
    /// Arrays and tuples must not hide inside [`Self::Elementary`], they would bypass
    /// the hashing of the array items.
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            Self::Elementary(ty) if ty.is_elementary() => Ok(ty.validate()?),
            Self::Elementary(ty) => Err(Error::Abi(eip712_abi::Error::MalformedTypeString(
                ty.to_string(),
            ))),
            Self::Struct(_) => Ok(()),
            Self::Array(inner) | Self::FixedArray(inner, _) => inner.validate(),
        }
    }
}

/// Whether the name belongs to one of the sized elementary type families, like `uint7` or `bytes`.
fn is_reserved_name(s: &str) -> bool {
    ["uint", "int", "bytes"].iter().any(|family| {
        s.strip_prefix(family)
            .is_some_and(|width| width.bytes().all(|b| b.is_ascii_digit()))
    })
}

/// Whether the string can name a struct type.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

impl FromStr for TypeRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::Abi(eip712_abi::Error::MalformedTypeString(s.to_owned()));

        if let Some(without_bracket) = s.strip_suffix(']') {
            let open = without_bracket.rfind('[').ok_or_else(malformed)?;
            let inner: TypeRef = without_bracket[..open].parse()?;
            let size = &without_bracket[open + 1..];
            if size.is_empty() {
                return Ok(Self::Array(Box::new(inner)));
            }
            if !size.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            let size = size.parse().map_err(|_| malformed())?;
            return Ok(Self::FixedArray(Box::new(inner), size));
        }

        match s.parse::<ParamType>() {
            Ok(ty) if ty.is_elementary() => Ok(Self::Elementary(ty)),
            // Names from the sized families are reserved, `uint7` is a typo rather than a struct.
            Err(_) if !is_reserved_name(s) && is_identifier(s) => Ok(Self::Struct(s.to_owned())),
            _ => Err(malformed()),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elementary(ty) => write!(f, "{ty}"),
            Self::Struct(name) => f.write_str(name),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::FixedArray(inner, len) => write!(f, "{inner}[{len}]"),
        }
    }
}

impl Serialize for TypeRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A single field of a struct type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeField {
    /// The field name.
    pub name: String,
    /// The field type.
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

impl TypeField {
    /// Create a new field, parsing its type from the EIP-712 type name.
    pub fn new(name: impl Into<String>, ty: &str) -> Result<Self, Error> {
        Ok(Self {
            name: name.into(),
            ty: ty.parse()?,
        })
    }
}

/// An EIP-712 struct type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    /// The name of the struct.
    pub struct_name: String,
    /// The fields in their declared order, which is significant for hashing.
    pub fields: Vec<TypeField>,
}

impl TypeDescriptor {
    /// Create a new struct type.
    pub fn new(struct_name: impl Into<String>, fields: Vec<TypeField>) -> Self {
        Self {
            struct_name: struct_name.into(),
            fields,
        }
    }

    /// Create a new struct type from `(name, type)` pairs, parsing the types.
    pub fn parse<'a>(
        struct_name: impl Into<String>,
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, Error> {
        let fields = fields
            .into_iter()
            .map(|(name, ty)| TypeField::new(name, ty))
            .collect::<Result<_, _>>()?;
        Ok(Self::new(struct_name, fields))
    }

    /// The signature of this struct alone: `Name(type1 name1,type2 name2)`.
    pub fn signature(&self) -> String {
        let mut signature = format!("{}(", self.struct_name);
        for (idx, field) in self.fields.iter().enumerate() {
            if idx > 0 {
                signature.push(',');
            }
            signature.push_str(&format!("{} {}", field.ty, field.name));
        }
        signature.push(')');
        signature
    }
}

/// A set of struct types that may reference each other by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Types {
    /// The struct types by their names.
    types: BTreeMap<String, TypeDescriptor>,
}

impl Types {
    /// An empty set of types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a struct type, returning the previous one with the same name, if any.
    pub fn insert(&mut self, descriptor: TypeDescriptor) -> Option<TypeDescriptor> {
        self.types
            .insert(descriptor.struct_name.clone(), descriptor)
    }

    /// Look up a struct type by name.
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    /// Look up a struct type that must exist.
    fn get_required(&self, name: &str) -> Result<&TypeDescriptor, Error> {
        self.get(name)
            .ok_or_else(|| Error::UnknownTypeReference(name.to_owned()))
    }

    /// Walk the struct types referenced from `descriptor`, depth first, validating
    /// the field types on the way.
    ///
    /// `path` holds the structs currently being walked, `visited` the ones already
    /// fully walked.
    fn collect_dependencies<'a>(
        &'a self,
        descriptor: &'a TypeDescriptor,
        path: &mut Vec<&'a str>,
        visited: &mut BTreeSet<&'a str>,
    ) -> Result<(), Error> {
        path.push(&descriptor.struct_name);
        for field in &descriptor.fields {
            field.ty.validate()?;
            let Some(name) = field.ty.struct_name() else {
                continue;
            };
            if path.contains(&name) {
                return Err(Error::CyclicTypeReference(name.to_owned()));
            }
            if visited.contains(name) {
                continue;
            }
            let dependency = self.get_required(name)?;
            self.collect_dependencies(dependency, path, visited)?;
            visited.insert(&dependency.struct_name);
        }
        path.pop();
        Ok(())
    }

    /// The struct type with the names of all the structs it references, checked for
    /// cycles, undefined references and malformed field types.
    fn dependencies(&self, name: &str) -> Result<(&TypeDescriptor, BTreeSet<&str>), Error> {
        let root = self.get_required(name)?;

        let mut path = Vec::new();
        let mut dependencies = BTreeSet::new();
        self.collect_dependencies(root, &mut path, &mut dependencies)?;
        Ok((root, dependencies))
    }

    /// The canonical EIP-712 type string of the struct: its own signature followed by
    /// the signatures of all the structs it references, sorted by name.
    pub fn canonical_type_string(&self, name: &str) -> Result<String, Error> {
        let (root, dependencies) = self.dependencies(name)?;

        let mut type_string = root.signature();
        for dependency in dependencies {
            type_string.push_str(&self.get_required(dependency)?.signature());
        }

        tracing::trace!(%name, %type_string, "canonical type string");
        Ok(type_string)
    }

    /// The hash of the canonical type string of the struct.
    pub fn type_hash(&self, name: &str) -> Result<[u8; 32], Error> {
        self.canonical_type_string(name).map(keccak_256)
    }

    /// Turn a field into a parameter that takes a single ABI word.
    ///
    /// Strings and bytes are replaced by their hashes, structs by their struct hashes and
    /// arrays by the hash of the concatenated encodings of their items.
    fn encode_field(&self, ty: &TypeRef, value: &Value) -> Result<(ParamType, Value), Error> {
        let word = |hash: [u8; 32]| (ParamType::FixedBytes(32), Value::FixedBytes(hash.to_vec()));

        match ty {
            TypeRef::Elementary(ParamType::String) => match value {
                Value::String(s) => Ok(word(keccak_256(s.as_bytes()))),
                other => Err(Error::type_mismatch(ty, other)),
            },
            TypeRef::Elementary(ParamType::Bytes) => match value {
                Value::Bytes(bytes) => Ok(word(keccak_256(bytes))),
                other => Err(Error::type_mismatch(ty, other)),
            },
            TypeRef::Elementary(param) => Ok((param.clone(), value.clone())),
            TypeRef::Struct(name) => Ok(word(self.struct_hash(name, value)?)),
            TypeRef::Array(inner) | TypeRef::FixedArray(inner, _) => {
                let Value::Array(items) = value else {
                    return Err(Error::type_mismatch(ty, value));
                };
                if matches!(ty, TypeRef::FixedArray(_, len) if *len != items.len()) {
                    return Err(Error::type_mismatch(ty, value));
                }
                let params = items
                    .iter()
                    .map(|item| self.encode_field(inner, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(word(keccak_256(eip712_abi::encode(&params)?)))
            }
        }
    }

    /// Encode the struct value fields, without the type hash.
    ///
    /// The value is a [`Value::Tuple`] holding the fields in their declared order.
    pub fn encode_data(&self, name: &str, value: &Value) -> Result<Vec<u8>, Error> {
        self.dependencies(name)?;
        let params = self.encode_fields(name, value)?;
        Ok(eip712_abi::encode(&params)?)
    }

    /// The fields of the struct value as single-word parameters.
    fn encode_fields(&self, name: &str, value: &Value) -> Result<Vec<(ParamType, Value)>, Error> {
        let descriptor = self.get_required(name)?;
        let Value::Tuple(items) = value else {
            return Err(Error::type_mismatch(name, value));
        };
        if items.len() != descriptor.fields.len() {
            return Err(Error::type_mismatch(name, value));
        }

        descriptor
            .fields
            .iter()
            .zip(items)
            .map(|(field, item)| self.encode_field(&field.ty, item))
            .collect()
    }

    /// The EIP-712 struct hash: `keccak256(typeHash ++ encodeData(value))`.
    pub fn struct_hash(&self, name: &str, value: &Value) -> Result<[u8; 32], Error> {
        let type_hash = self.type_hash(name)?;

        let mut params = vec![(ParamType::FixedBytes(32), Value::FixedBytes(type_hash.to_vec()))];
        params.extend(self.encode_fields(name, value)?);
        let hash = keccak_256(eip712_abi::encode(&params)?);

        tracing::trace!(%name, struct_hash = %primitives_ethereum::hex::encode(&hash), "struct hash");
        Ok(hash)
    }

    /// The full signing digest of the message of the given struct type under the domain.
    pub fn signing_digest(
        &self,
        domain: &crate::Domain,
        name: &str,
        value: &Value,
    ) -> Result<crate::Digest, Error> {
        let struct_hash = self.struct_hash(name, value)?;
        Ok(crate::signing_digest(&domain.domain_separator(), &struct_hash))
    }
}

impl FromIterator<TypeDescriptor> for Types {
    fn from_iter<T: IntoIterator<Item = TypeDescriptor>>(iter: T) -> Self {
        let mut types = Self::new();
        for descriptor in iter {
            types.insert(descriptor);
        }
        types
    }
}
