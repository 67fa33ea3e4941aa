//! Field normalizer — converts chain-native felt words into storage types.

use serde::{Deserialize, Serialize};

use crate::error::NormalizeError;
use crate::felt::{self, FeltError};
use crate::kinds::{FieldDef, FieldKind};

/// A storage-ready scalar value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Text(String),
    Bool(bool),
    Address(String),
}

/// Normalize one data word according to its declared field kind.
pub fn normalize(field: &FieldDef, word: &str) -> Result<FieldValue, NormalizeError> {
    match field.kind {
        FieldKind::Uint => {
            let value = felt::to_u64(word).map_err(|e| wide_err(e, field.name, word))?;
            if value > i64::MAX as u64 {
                return Err(NormalizeError::Overflow {
                    field: field.name.to_string(),
                    value: word.to_string(),
                });
            }
            Ok(FieldValue::Int(value as i64))
        }
        FieldKind::Bool => match felt::canonical(word).map_err(|e| invalid(e, field.name, word))?.as_str() {
            "0x0" => Ok(FieldValue::Bool(false)),
            "0x1" => Ok(FieldValue::Bool(true)),
            _ => Err(NormalizeError::Boolean {
                field: field.name.to_string(),
                value: word.to_string(),
            }),
        },
        FieldKind::ShortString => {
            let bytes = felt::to_bytes(word).map_err(|e| invalid(e, field.name, word))?;
            String::from_utf8(bytes)
                .map(FieldValue::Text)
                .map_err(|_| NormalizeError::Encoding {
                    field: field.name.to_string(),
                })
        }
        FieldKind::Address => felt::canonical(word)
            .map(FieldValue::Address)
            .map_err(|e| invalid(e, field.name, word)),
    }
}

fn wide_err(e: FeltError, field: &str, word: &str) -> NormalizeError {
    match e {
        FeltError::Overflow => NormalizeError::Overflow {
            field: field.to_string(),
            value: word.to_string(),
        },
        FeltError::InvalidHex => invalid(e, field, word),
    }
}

fn invalid(_e: FeltError, field: &str, word: &str) -> NormalizeError {
    NormalizeError::InvalidFelt {
        field: field.to_string(),
        value: word.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(kind: FieldKind) -> FieldDef {
        FieldDef { name: "test_field", kind }
    }

    #[test]
    fn uint_narrows_in_range() {
        let v = normalize(&def(FieldKind::Uint), "0x2a").unwrap();
        assert_eq!(v, FieldValue::Int(42));
    }

    #[test]
    fn uint_rejects_above_i64() {
        // i64::MAX + 1
        let err = normalize(&def(FieldKind::Uint), "0x8000000000000000").unwrap_err();
        assert!(matches!(err, NormalizeError::Overflow { .. }));
        // a full 252-bit word
        let err = normalize(
            &def(FieldKind::Uint),
            "0x800000000000011000000000000000000000000000000000000000000000000",
        )
        .unwrap_err();
        assert!(matches!(err, NormalizeError::Overflow { .. }));
    }

    #[test]
    fn bool_words() {
        assert_eq!(normalize(&def(FieldKind::Bool), "0x0").unwrap(), FieldValue::Bool(false));
        assert_eq!(normalize(&def(FieldKind::Bool), "0x1").unwrap(), FieldValue::Bool(true));
        assert_eq!(
            normalize(&def(FieldKind::Bool), "0x0001").unwrap(),
            FieldValue::Bool(true)
        );
        assert!(matches!(
            normalize(&def(FieldKind::Bool), "0x2").unwrap_err(),
            NormalizeError::Boolean { .. }
        ));
    }

    #[test]
    fn short_string_decodes_utf8() {
        // "ipfs://Qm"
        let word = format!("0x{}", hex::encode("ipfs://Qm"));
        assert_eq!(
            normalize(&def(FieldKind::ShortString), &word).unwrap(),
            FieldValue::Text("ipfs://Qm".into())
        );
        assert_eq!(
            normalize(&def(FieldKind::ShortString), "0x0").unwrap(),
            FieldValue::Text(String::new())
        );
    }

    #[test]
    fn short_string_rejects_invalid_utf8() {
        // 0xff 0xfe is not valid UTF-8
        let err = normalize(&def(FieldKind::ShortString), "0xfffe").unwrap_err();
        assert!(matches!(err, NormalizeError::Encoding { .. }));
    }

    #[test]
    fn address_canonicalizes() {
        assert_eq!(
            normalize(&def(FieldKind::Address), "0x0000ABCdef").unwrap(),
            FieldValue::Address("0xabcdef".into())
        );
        assert!(matches!(
            normalize(&def(FieldKind::Address), "not-hex").unwrap_err(),
            NormalizeError::InvalidFelt { .. }
        ));
    }
}
