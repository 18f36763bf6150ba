//! The "Ether Mail" example from the EIP-712 text.
//!
//! See https://github.com/ethereum/EIPs/blob/fcaec3dc70e758fe80abd86f0c70bbbedbec6e61/assets/eip-712/Example.js

use eip712_abi::Value;
use hex_literal::hex;
use primitives_ethereum::EthereumAddress;

/// The domain name.
pub const DOMAIN_NAME: &str = "Ether Mail";
/// The domain version.
pub const DOMAIN_VERSION: &str = "1";
/// The domain chain id.
pub const CHAIN_ID: u64 = 1;
/// The domain verifying contract.
pub const VERIFYING_CONTRACT: [u8; 20] = hex!("cccccccccccccccccccccccccccccccccccccccc");

/// The wallet of the sender, Cow.
pub const COW_WALLET: [u8; 20] = hex!("cd2a3d9f938e13cd947ec05abc7fe734df8dd826");
/// The wallet of the recipient, Bob.
pub const BOB_WALLET: [u8; 20] = hex!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");

/// The struct types, as `(name, [(field name, field type)])`.
pub const TYPES: &[(&str, &[(&str, &str)])] = &[
    (
        "Mail",
        &[("from", "Person"), ("to", "Person"), ("contents", "string")],
    ),
    ("Person", &[("name", "string"), ("wallet", "address")]),
];

/// The domain separator, from `Example.sol`.
pub const DOMAIN_SEPARATOR: [u8; 32] =
    hex!("f2cee375fa42b42143804025fc449deafd50cc031ca257e0b194a650a912090f");
/// The struct hash of the message.
pub const MAIL_STRUCT_HASH: [u8; 32] =
    hex!("c52c0ee5d84264471806290a3f2c4cecfc5490626bf912d01f240d7a274b371e");
/// The final digest to sign.
pub const SIGNING_DIGEST: [u8; 32] =
    hex!("be609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2");

/// The message as a `Mail` struct value.
pub fn message() -> Value {
    let person = |name: &str, wallet: [u8; 20]| {
        Value::Tuple(vec![
            Value::from(name),
            Value::Address(EthereumAddress(wallet)),
        ])
    };

    Value::Tuple(vec![
        person("Cow", COW_WALLET),
        person("Bob", BOB_WALLET),
        Value::from("Hello, Bob!"),
    ])
}

/// The whole typed data in the `eth_signTypedData_v4` JSON form.
pub const ETHER_MAIL_JSON: &str = r#"{
    "types": {
        "EIP712Domain": [
            { "name": "name", "type": "string" },
            { "name": "version", "type": "string" },
            { "name": "chainId", "type": "uint256" },
            { "name": "verifyingContract", "type": "address" }
        ],
        "Person": [
            { "name": "name", "type": "string" },
            { "name": "wallet", "type": "address" }
        ],
        "Mail": [
            { "name": "from", "type": "Person" },
            { "name": "to", "type": "Person" },
            { "name": "contents", "type": "string" }
        ]
    },
    "primaryType": "Mail",
    "domain": {
        "name": "Ether Mail",
        "version": "1",
        "chainId": 1,
        "verifyingContract": "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC"
    },
    "message": {
        "from": {
            "name": "Cow",
            "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"
        },
        "to": {
            "name": "Bob",
            "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB"
        },
        "contents": "Hello, Bob!"
    }
}"#;
