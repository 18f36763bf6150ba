//! ABI parameter types.

use core::fmt;
use core::str::FromStr;

use crate::{Error, WORD_SIZE};

/// A Solidity ABI type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// `uintN`, the width is in bits.
    Uint(usize),
    /// `intN`, the width is in bits.
    Int(usize),
    /// `address`.
    Address,
    /// `bool`.
    Bool,
    /// `bytesN`, the width is in bytes.
    FixedBytes(usize),
    /// `bytes`.
    Bytes,
    /// `string`.
    String,
    /// `T[]`.
    Array(Box<ParamType>),
    /// `T[N]`.
    FixedArray(Box<ParamType>, usize),
    /// `(T1,T2,...)`.
    Tuple(Vec<ParamType>),
}

impl ParamType {
    /// Whether the type is encoded out-of-place, behind an offset.
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::Bytes | Self::String | Self::Array(_) => true,
            Self::FixedArray(inner, _) => inner.is_dynamic(),
            Self::Tuple(items) => items.iter().any(Self::is_dynamic),
            _ => false,
        }
    }

    /// Whether the type has no inner structure.
    pub fn is_elementary(&self) -> bool {
        !matches!(
            self,
            Self::Array(_) | Self::FixedArray(..) | Self::Tuple(_)
        )
    }

    /// Check the widths of the integer and fixed-bytes types, including the nested ones.
    ///
    /// Types built by hand are not checked otherwise, parsing always produces valid ones.
    pub fn validate(&self) -> Result<(), Error> {
        let valid = match self {
            Self::Uint(bits) | Self::Int(bits) => bits % 8 == 0 && (8..=256).contains(bits),
            Self::FixedBytes(len) => (1..=32).contains(len),
            Self::Array(inner) | Self::FixedArray(inner, _) => return inner.validate(),
            Self::Tuple(items) => return items.iter().try_for_each(Self::validate),
            Self::Address | Self::Bool | Self::Bytes | Self::String => true,
        };
        if !valid {
            return Err(Error::MalformedTypeString(self.to_string()));
        }
        Ok(())
    }

    /// The number of bytes the type occupies in the head of the enclosing tuple.
    pub(crate) fn head_size(&self) -> Result<usize, Error> {
        if self.is_dynamic() {
            return Ok(WORD_SIZE);
        }
        let overflow = || Error::OutOfRange {
            ty: self.to_string(),
            reason: "head size overflows",
        };
        match self {
            Self::FixedArray(inner, len) => inner
                .head_size()?
                .checked_mul(*len)
                .ok_or_else(overflow),
            Self::Tuple(items) => items.iter().try_fold(0usize, |size, item| {
                size.checked_add(item.head_size()?).ok_or_else(overflow)
            }),
            _ => Ok(WORD_SIZE),
        }
    }

    /// Parse an elementary type name, i.e. one without brackets or parentheses.
    fn parse_elementary(s: &str) -> Result<Self, Error> {
        let malformed = || Error::MalformedTypeString(s.to_owned());

        match s {
            "address" => return Ok(Self::Address),
            "bool" => return Ok(Self::Bool),
            "bytes" => return Ok(Self::Bytes),
            "string" => return Ok(Self::String),
            _ => {}
        }

        let (family, width): (fn(usize) -> Self, &str) = if let Some(w) = s.strip_prefix("uint")
        {
            (Self::Uint, w)
        } else if let Some(w) = s.strip_prefix("int") {
            (Self::Int, w)
        } else if let Some(w) = s.strip_prefix("bytes") {
            (Self::FixedBytes, w)
        } else {
            return Err(malformed());
        };

        if width.is_empty() || !width.bytes().all(|b| b.is_ascii_digit()) || width.starts_with('0')
        {
            return Err(malformed());
        }
        let width: usize = width.parse().map_err(|_| malformed())?;

        let ty = family(width);
        ty.validate().map_err(|_| malformed())?;
        Ok(ty)
    }
}

/// Split the inside of a tuple type at the top-level commas.
fn split_tuple_components(s: &str) -> Option<Vec<&str>> {
    let mut components = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                components.push(&s[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    components.push(&s[start..]);
    Some(components)
}

impl FromStr for ParamType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::MalformedTypeString(s.to_owned());

        if let Some(without_bracket) = s.strip_suffix(']') {
            let open = without_bracket.rfind('[').ok_or_else(malformed)?;
            let inner: ParamType = without_bracket[..open].parse()?;
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

        if let Some(inside) = s.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            if inside.is_empty() {
                return Ok(Self::Tuple(Vec::new()));
            }
            let components = split_tuple_components(inside).ok_or_else(malformed)?;
            let items = components
                .into_iter()
                .map(str::parse)
                .collect::<Result<_, _>>()?;
            return Ok(Self::Tuple(items));
        }

        Self::parse_elementary(s)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::Int(bits) => write!(f, "int{bits}"),
            Self::Address => f.write_str("address"),
            Self::Bool => f.write_str("bool"),
            Self::FixedBytes(len) => write!(f, "bytes{len}"),
            Self::Bytes => f.write_str("bytes"),
            Self::String => f.write_str("string"),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::FixedArray(inner, len) => write!(f, "{inner}[{len}]"),
            Self::Tuple(items) => {
                f.write_str("(")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_elementary() {
        let cases = [
            ("uint8", ParamType::Uint(8)),
            ("uint96", ParamType::Uint(96)),
            ("uint256", ParamType::Uint(256)),
            ("int128", ParamType::Int(128)),
            ("address", ParamType::Address),
            ("bool", ParamType::Bool),
            ("bytes1", ParamType::FixedBytes(1)),
            ("bytes32", ParamType::FixedBytes(32)),
            ("bytes", ParamType::Bytes),
            ("string", ParamType::String),
        ];

        for (input, expected) in cases {
            assert_eq!(input.parse::<ParamType>().unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn parse_composite() {
        let ty: ParamType = "(uint256,(address,bytes)[],bool[2])[3][]".parse().unwrap();
        assert_eq!(
            ty,
            ParamType::Array(Box::new(ParamType::FixedArray(
                Box::new(ParamType::Tuple(vec![
                    ParamType::Uint(256),
                    ParamType::Array(Box::new(ParamType::Tuple(vec![
                        ParamType::Address,
                        ParamType::Bytes
                    ]))),
                    ParamType::FixedArray(Box::new(ParamType::Bool), 2),
                ])),
                3
            )))
        );
        assert_eq!(ty.to_string(), "(uint256,(address,bytes)[],bool[2])[3][]");
    }

    #[test]
    fn parse_malformed() {
        let cases = [
            "uint", "int", "uint7", "uint0", "uint264", "uint08", "int-8", "bytes0", "bytes33",
            "Person", "", "uint256[", "uint256]", "uint256[x]", "(uint256", "(uint256))",
            "string ",
        ];

        for input in cases {
            assert_matches!(
                input.parse::<ParamType>(),
                Err(Error::MalformedTypeString(_)),
                "{input}"
            );
        }
    }

    #[test]
    fn dynamic_and_head_size() {
        let ty: ParamType = "(uint256,bool)[2]".parse().unwrap();
        assert!(!ty.is_dynamic());
        assert_eq!(ty.head_size().unwrap(), 4 * 32);

        let ty: ParamType = "(uint256,string)[2]".parse().unwrap();
        assert!(ty.is_dynamic());
        assert_eq!(ty.head_size().unwrap(), 32);

        assert!(ParamType::Array(Box::new(ParamType::Bool)).is_dynamic());
    }

    #[test]
    fn head_size_overflow() {
        let ty: ParamType = "uint256[1152921504606846976]".parse().unwrap();
        assert_matches!(ty.head_size(), Err(Error::OutOfRange { .. }));

        let ty: ParamType = "(uint256[288230376151711744],uint256[288230376151711744])"
            .parse()
            .unwrap();
        assert_matches!(ty.head_size(), Err(Error::OutOfRange { .. }));
    }

    #[test]
    fn validate_hand_built_types() {
        let invalid = [
            ParamType::Uint(7),
            ParamType::Uint(0),
            ParamType::Int(0),
            ParamType::Int(264),
            ParamType::FixedBytes(0),
            ParamType::FixedBytes(33),
            ParamType::Array(Box::new(ParamType::Int(12))),
            ParamType::Tuple(vec![ParamType::Bool, ParamType::FixedBytes(40)]),
        ];
        for ty in invalid {
            assert_matches!(ty.validate(), Err(Error::MalformedTypeString(_)), "{ty:?}");
        }

        let ty: ParamType = "(uint8,int256,bytes32,address)[2][]".parse().unwrap();
        assert!(ty.validate().is_ok());
    }
}
