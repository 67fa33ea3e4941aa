//! Event decoder — maps a raw event onto a kind's declared field layout.
//!
//! Stateless and pure: the same raw event always decodes to the same set of
//! typed fields or the same error.

use std::collections::BTreeMap;

use crate::error::{DecodeError, NormalizeError};
use crate::event::RawEvent;
use crate::felt;
use crate::kinds::EventKind;
use crate::normalize::{self, FieldValue};

/// A fully decoded, normalized event ready for routing.
#[derive(Debug, Clone)]
pub struct DecodedEvent {
    pub kind: EventKind,
    /// Emitting contract address, canonical hex.
    pub address: String,
    pub tx_hash: String,
    pub event_index: u32,
    fields: BTreeMap<&'static str, FieldValue>,
}

impl DecodedEvent {
    /// Integer field accessor.
    pub fn int(&self, name: &str) -> Result<i64, DecodeError> {
        match self.get(name)? {
            FieldValue::Int(v) => Ok(*v),
            _ => Err(DecodeError::FieldType { field: name.to_string() }),
        }
    }

    /// Text field accessor.
    pub fn text(&self, name: &str) -> Result<&str, DecodeError> {
        match self.get(name)? {
            FieldValue::Text(s) => Ok(s),
            _ => Err(DecodeError::FieldType { field: name.to_string() }),
        }
    }

    /// Boolean field accessor.
    pub fn flag(&self, name: &str) -> Result<bool, DecodeError> {
        match self.get(name)? {
            FieldValue::Bool(b) => Ok(*b),
            _ => Err(DecodeError::FieldType { field: name.to_string() }),
        }
    }

    /// Address field accessor.
    pub fn addr(&self, name: &str) -> Result<&str, DecodeError> {
        match self.get(name)? {
            FieldValue::Address(a) => Ok(a),
            _ => Err(DecodeError::FieldType { field: name.to_string() }),
        }
    }

    fn get(&self, name: &str) -> Result<&FieldValue, DecodeError> {
        self.fields
            .get(name)
            .ok_or_else(|| DecodeError::MissingField { field: name.to_string() })
    }
}

/// Decode `raw` as an event of `kind`.
///
/// Fails when the first key word does not match the kind's selector or when
/// the data word count disagrees with the declared layout.
pub fn decode_event(kind: EventKind, raw: &RawEvent) -> Result<DecodedEvent, DecodeError> {
    let first_key = raw.keys.first().ok_or(DecodeError::MissingKey)?;
    let actual = felt::canonical(first_key).map_err(|_| DecodeError::SelectorMismatch {
        kind: kind.name(),
        expected: kind.selector().to_string(),
        actual: first_key.clone(),
    })?;
    if actual != kind.selector() {
        return Err(DecodeError::SelectorMismatch {
            kind: kind.name(),
            expected: kind.selector().to_string(),
            actual,
        });
    }

    let layout = kind.layout();
    if raw.data.len() != layout.len() {
        return Err(DecodeError::FieldCountMismatch {
            kind: kind.name(),
            expected: layout.len(),
            actual: raw.data.len(),
        });
    }

    let mut fields = BTreeMap::new();
    for (def, word) in layout.iter().zip(&raw.data) {
        fields.insert(def.name, normalize::normalize(def, word)?);
    }

    let address = felt::canonical(&raw.address).map_err(|_| {
        DecodeError::Normalize(NormalizeError::InvalidFelt {
            field: "address".to_string(),
            value: raw.address.clone(),
        })
    })?;
    Ok(DecodedEvent {
        kind,
        address,
        tx_hash: raw.tx_hash.clone(),
        event_index: raw.event_index,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price_updated_raw(course: u64, price: u64) -> RawEvent {
        RawEvent {
            address: "0x5390dc11f780b241418e875095cca768ded2a9c1b605af036bf2760bd5bf6ef".into(),
            keys: vec![EventKind::CoursePriceUpdated.selector().to_string()],
            data: vec![format!("{course:#x}"), format!("{price:#x}")],
            tx_hash: "0xt1".into(),
            event_index: 0,
        }
    }

    #[test]
    fn decodes_price_updated() {
        let raw = price_updated_raw(42, 100);
        let ev = decode_event(EventKind::CoursePriceUpdated, &raw).unwrap();
        assert_eq!(ev.int("course_identifier").unwrap(), 42);
        assert_eq!(ev.int("new_price").unwrap(), 100);
        assert_eq!(ev.kind, EventKind::CoursePriceUpdated);
    }

    #[test]
    fn decode_is_pure() {
        let raw = price_updated_raw(7, 9);
        let a = decode_event(EventKind::CoursePriceUpdated, &raw).unwrap();
        let b = decode_event(EventKind::CoursePriceUpdated, &raw).unwrap();
        assert_eq!(a.int("new_price").unwrap(), b.int("new_price").unwrap());
    }

    #[test]
    fn rejects_wrong_selector() {
        let mut raw = price_updated_raw(1, 2);
        raw.keys = vec![EventKind::CourseRemoved.selector().to_string()];
        let err = decode_event(EventKind::CoursePriceUpdated, &raw).unwrap_err();
        assert!(matches!(err, DecodeError::SelectorMismatch { .. }));
    }

    #[test]
    fn rejects_missing_keys() {
        let mut raw = price_updated_raw(1, 2);
        raw.keys.clear();
        assert!(matches!(
            decode_event(EventKind::CoursePriceUpdated, &raw).unwrap_err(),
            DecodeError::MissingKey
        ));
    }

    #[test]
    fn rejects_wrong_data_arity() {
        let mut raw = price_updated_raw(1, 2);
        raw.data.pop();
        let err = decode_event(EventKind::CoursePriceUpdated, &raw).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::FieldCountMismatch { expected: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn rejects_unparseable_address() {
        let mut raw = price_updated_raw(1, 2);
        raw.address = "not-a-felt".into();
        let err = decode_event(EventKind::CoursePriceUpdated, &raw).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Normalize(NormalizeError::InvalidFelt { .. })
        ));
    }

    #[test]
    fn decodes_course_created() {
        let raw = RawEvent {
            address: "0x5390dc11f780b241418e875095cca768ded2a9c1b605af036bf2760bd5bf6ef".into(),
            keys: vec![EventKind::CourseCreated.selector().to_string()],
            data: vec![
                "0x2a".into(),                                  // course_identifier
                "0xabc".into(),                                 // owner_
                "0x1".into(),                                   // accessment_
                format!("0x{}", hex::encode("https://uri")),    // base_uri
                format!("0x{}", hex::encode("Rust 101")),       // name_
                format!("0x{}", hex::encode("R101")),           // symbol
                format!("0x{}", hex::encode("ipfs://Qm")),      // course_ipfs_uri
                "0x0".into(),                                   // is_approved
            ],
            tx_hash: "0xt2".into(),
            event_index: 3,
        };
        let ev = decode_event(EventKind::CourseCreated, &raw).unwrap();
        assert_eq!(ev.int("course_identifier").unwrap(), 42);
        assert_eq!(ev.addr("owner_").unwrap(), "0xabc");
        assert!(ev.flag("accessment_").unwrap());
        assert_eq!(ev.text("name_").unwrap(), "Rust 101");
        assert_eq!(ev.text("symbol").unwrap(), "R101");
        assert!(!ev.flag("is_approved").unwrap());
    }

    #[test]
    fn typed_accessor_mismatch() {
        let raw = price_updated_raw(1, 2);
        let ev = decode_event(EventKind::CoursePriceUpdated, &raw).unwrap();
        assert!(matches!(
            ev.text("new_price").unwrap_err(),
            DecodeError::FieldType { .. }
        ));
        assert!(matches!(
            ev.int("nonexistent").unwrap_err(),
            DecodeError::MissingField { .. }
        ));
    }
}
