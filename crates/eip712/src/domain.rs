//! The EIP-712 domain.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use eip712_abi::{EthereumAddress, ParamType, Value, U256};
use eip712_common::keccak_256;
use serde::{Deserialize, Serialize};

use crate::{TypeDescriptor, TypeField, TypeRef};

/// The name of the domain struct type.
pub const EIP712_DOMAIN_TYPE_NAME: &str = "EIP712Domain";

/// A data type representing the domain of the EIP-712.
/// Compatible with versions 3 and 4 of EIP-712: every field is optional, and only the present
/// ones take part in both the type string and the encoded data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    /// The user readable name of signing domain, i.e. the name of the DApp or the protocol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The current major version of the signing domain.
    /// Signatures from different versions are not compatible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// The EIP-155 chain id.
    /// The user-agent should refuse signing if it does not match the currently active chain.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_u256"
    )]
    pub chain_id: Option<U256>,
    /// The Ethereum address of the contract that will verify the resulting signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<EthereumAddress>,
    /// A unique 32-byte value hardcoded into both the contract and the dApp meant as a last-resort
    /// means to distinguish the dApp from others.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_salt"
    )]
    pub salt: Option<[u8; 32]>,
}

impl Domain {
    /// The usual domain with the name, version, chain id and verifying contract, but no salt.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: impl Into<U256>,
        verifying_contract: impl Into<EthereumAddress>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            version: Some(version.into()),
            chain_id: Some(chain_id.into()),
            verifying_contract: Some(verifying_contract.into()),
            salt: None,
        }
    }

    /// The same domain with the salt set.
    pub fn with_salt(self, salt: [u8; 32]) -> Self {
        Self {
            salt: Some(salt),
            ..self
        }
    }

    /// The `EIP712Domain` struct type restricted to the fields present in this domain.
    pub fn descriptor(&self) -> TypeDescriptor {
        let field = |name: &str, ty: ParamType| TypeField {
            name: name.to_owned(),
            ty: TypeRef::Elementary(ty),
        };

        let fields = [
            self.name.as_ref().map(|_| field("name", ParamType::String)),
            self.version.as_ref().map(|_| field("version", ParamType::String)),
            self.chain_id.map(|_| field("chainId", ParamType::Uint(256))),
            self.verifying_contract
                .map(|_| field("verifyingContract", ParamType::Address)),
            self.salt.map(|_| field("salt", ParamType::FixedBytes(32))),
        ]
        .into_iter()
        .flatten()
        .collect();

        TypeDescriptor::new(EIP712_DOMAIN_TYPE_NAME, fields)
    }

    /// The domain as a struct value, matching [`Self::descriptor`].
    pub fn value(&self) -> Value {
        let fields = [
            self.name.clone().map(Value::String),
            self.version.clone().map(Value::String),
            self.chain_id.map(Value::Uint),
            self.verifying_contract.map(Value::Address),
            self.salt.map(|salt| Value::FixedBytes(salt.to_vec())),
        ]
        .into_iter()
        .flatten()
        .collect();

        Value::Tuple(fields)
    }

    /// Generate a typehash for the current domain.
    pub fn typehash(&self) -> [u8; 32] {
        // The domain has no struct dependencies, the signature is the whole type string.
        keccak_256(self.descriptor().signature())
    }

    /// Compute the EIP-712 domain separator.
    pub fn domain_separator(&self) -> [u8; 32] {
        let mut buf = Vec::with_capacity(6 * 32);

        buf.extend_from_slice(&self.typehash());

        if let Some(name) = &self.name {
            buf.extend_from_slice(&keccak_256(name.as_bytes()));
        }

        if let Some(version) = &self.version {
            buf.extend_from_slice(&keccak_256(version.as_bytes()));
        }

        if let Some(chain_id) = self.chain_id {
            let mut word = [0u8; 32];
            chain_id.to_big_endian(&mut word);
            buf.extend_from_slice(&word);
        }

        if let Some(verifying_contract) = &self.verifying_contract {
            buf.extend_from_slice(&verifying_contract.to_word());
        }

        if let Some(salt) = &self.salt {
            buf.extend_from_slice(salt);
        }

        keccak_256(&buf)
    }
}

/// A caller-owned cache of domain separators.
///
/// Separators are pure functions of the domain, so the cache only saves the hashing.
#[derive(Debug, Default)]
pub struct DomainSeparatorCache {
    /// Computed separators by their domains.
    separators: RwLock<HashMap<Domain, [u8; 32]>>,
}

impl DomainSeparatorCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The separator of the domain, computed on the first request.
    pub fn domain_separator(&self, domain: &Domain) -> [u8; 32] {
        if let Some(separator) = self
            .separators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(domain)
        {
            return *separator;
        }

        let separator = domain.domain_separator();
        tracing::debug!(
            name = ?domain.name,
            version = ?domain.version,
            chain_id = ?domain.chain_id,
            "domain separator cache miss"
        );

        *self
            .separators
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(domain.clone())
            .or_insert(separator)
    }

    /// The number of cached separators.
    pub fn len(&self) -> usize {
        self.separators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Serde for the chain id: accepts JSON numbers, decimal and `0x`-hex strings,
/// produces `0x`-hex strings.
mod serde_u256 {
    use eip712_abi::U256;
    use serde::{de, Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.collect_str(&format_args!("{value:#x}")),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor;

        impl<'de> de::Visitor<'de> for Visitor {
            type Value = Option<U256>;

            fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str("an unsigned integer, a decimal string or a 0x-prefixed hex string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Some(U256::from(v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map(|v| Some(U256::from(v)))
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                let parsed = match v.strip_prefix("0x") {
                    Some(hex) => U256::from_str_radix(hex, 16).ok(),
                    None => U256::from_dec_str(v).ok(),
                };
                parsed
                    .map(Some)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
                d.deserialize_any(self)
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

/// Serde for the salt as a `0x`-hex string.
mod serde_salt {
    use primitives_ethereum::hex;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &Option<[u8; 32]>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(salt) => serializer.serialize_str(&hex::encode(salt)),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<[u8; 32]>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| hex::decode_fixed(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use eip712_common_test_utils::ether_mail;
    use hex_literal::hex;

    use super::*;
    use crate::Types;

    fn ether_mail_domain() -> Domain {
        Domain::new(
            ether_mail::DOMAIN_NAME,
            ether_mail::DOMAIN_VERSION,
            ether_mail::CHAIN_ID,
            ether_mail::VERIFYING_CONTRACT,
        )
    }

    const SALT: [u8; 32] = hex!("bc359f5dccf5c5e94aa42b0e7ef42abe753b0ae17f8e63d5809f3b8e938adc75");

    #[test]
    fn domain_typehash_full() {
        let sample_hash = keccak_256(b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract,bytes32 salt)");

        let domain = Domain {
            name: Some(String::new()),
            version: Some(String::new()),
            chain_id: Some(U256::zero()),
            verifying_contract: Some(EthereumAddress::default()),
            salt: Some([0u8; 32]),
        };

        assert_eq!(domain.typehash(), sample_hash);
    }

    #[test]
    fn domain_typehash_partial() {
        let domain = Domain {
            name: Some("Ether Mail".to_owned()),
            chain_id: Some(U256::one()),
            ..Default::default()
        };
        assert_eq!(
            domain.descriptor().signature(),
            "EIP712Domain(string name,uint256 chainId)"
        );

        assert_eq!(
            Domain::default().descriptor().signature(),
            "EIP712Domain()"
        );
    }

    #[test]
    fn domain_separator() {
        // See https://github.com/ethereum/EIPs/blob/fcaec3dc70e758fe80abd86f0c70bbbedbec6e61/assets/eip-712/Example.sol

        // From https://github.com/ethereum/EIPs/blob/fcaec3dc70e758fe80abd86f0c70bbbedbec6e61/assets/eip-712/Example.sol#L101
        let domain = ether_mail_domain();
        assert_eq!(domain.domain_separator(), ether_mail::DOMAIN_SEPARATOR);
        assert_eq!(
            domain.typehash(),
            keccak_256(b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)")
        );
    }

    #[test]
    fn salt_changes_separator_and_type_string() {
        let unsalted = ether_mail_domain();
        let salted = ether_mail_domain().with_salt(SALT);

        assert_ne!(unsalted.domain_separator(), salted.domain_separator());
        assert!(!unsalted.descriptor().signature().contains("bytes32 salt"));
        assert!(salted.descriptor().signature().ends_with(",bytes32 salt)"));
    }

    #[test]
    fn separator_matches_generic_struct_hash() {
        let domains = [
            ether_mail_domain(),
            ether_mail_domain().with_salt(SALT),
            Domain {
                version: Some("2".to_owned()),
                verifying_contract: Some(EthereumAddress([0x62; 20])),
                ..Default::default()
            },
            Domain::default(),
        ];

        for domain in domains {
            let types: Types = [domain.descriptor()].into_iter().collect();
            assert_eq!(
                types
                    .struct_hash(EIP712_DOMAIN_TYPE_NAME, &domain.value())
                    .unwrap(),
                domain.domain_separator(),
                "{domain:?}"
            );
            assert_eq!(
                types.type_hash(EIP712_DOMAIN_TYPE_NAME).unwrap(),
                domain.typehash()
            );
        }
    }

    #[test]
    fn serde_roundtrip() {
        let domain = ether_mail_domain().with_salt(SALT);
        let json = serde_json::to_value(&domain).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Ether Mail",
                "version": "1",
                "chainId": "0x1",
                "verifyingContract": "0xcccccccccccccccccccccccccccccccccccccccc",
                "salt": "0xbc359f5dccf5c5e94aa42b0e7ef42abe753b0ae17f8e63d5809f3b8e938adc75",
            })
        );
        assert_eq!(serde_json::from_value::<Domain>(json).unwrap(), domain);
    }

    #[test]
    fn deserialize_chain_id_forms() {
        for chain_id in [
            serde_json::json!(5234),
            serde_json::json!("5234"),
            serde_json::json!("0x1472"),
        ] {
            let domain: Domain = serde_json::from_value(serde_json::json!({ "chainId": chain_id })).unwrap();
            assert_eq!(domain.chain_id, Some(U256::from(5234)));
        }

        assert!(serde_json::from_value::<Domain>(serde_json::json!({ "chainId": -1 })).is_err());
        assert!(serde_json::from_value::<Domain>(serde_json::json!({ "chainId": "0xzz" })).is_err());
    }

    #[test]
    #[tracing_test::traced_test]
    fn cache_computes_once() {
        let cache = DomainSeparatorCache::new();
        assert!(cache.is_empty());

        let domain = ether_mail_domain();
        assert_eq!(cache.domain_separator(&domain), ether_mail::DOMAIN_SEPARATOR);
        assert_eq!(cache.domain_separator(&domain), ether_mail::DOMAIN_SEPARATOR);
        assert_eq!(cache.len(), 1);
        assert!(logs_contain("domain separator cache miss"));

        let salted = domain.with_salt(SALT);
        assert_eq!(cache.domain_separator(&salted), salted.domain_separator());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn cache_is_shared_across_threads() {
        let cache = DomainSeparatorCache::new();
        let domain = ether_mail_domain();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    assert_eq!(cache.domain_separator(&domain), ether_mail::DOMAIN_SEPARATOR);
                });
            }
        });
        assert_eq!(cache.len(), 1);
    }
}
