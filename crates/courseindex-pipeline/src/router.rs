//! Event router — selector dispatch and contract address filtering.
//!
//! The router sits between the raw block stream and the handlers. For each
//! raw event it canonicalizes the emitting address, resolves the first key
//! word against the selector table, and hands a decoded event to the caller.
//! Events from foreign contracts and events with unknown selectors are
//! dropped without failing the block.

use tracing::{debug, warn};

use courseindex_core::{decode_event, felt, DecodedEvent, EventKind, RawEvent};

use crate::error::IndexError;

/// Lifecycle of one routing pass.
///
/// `Idle` between events; `Dispatching` while a selector is being resolved;
/// `Reconciling` once a decoded event has been handed off; `Skipped` when the
/// event was dropped. `settle` returns the router to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    Idle,
    Dispatching,
    Reconciling,
    Skipped,
}

/// Routes raw events to their kind, filtering by contract address.
pub struct EventRouter {
    contract: String,
    state: RouterState,
}

impl EventRouter {
    /// Build a router for one contract. `contract` must be a valid hex word.
    pub fn new(contract: &str) -> Result<Self, IndexError> {
        let contract = felt::canonical(contract)
            .map_err(|e| IndexError::Config(format!("router contract: {e}")))?;
        Ok(Self {
            contract,
            state: RouterState::Idle,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RouterState {
        self.state
    }

    /// Return the router to `Idle` after the caller finished with the event.
    pub fn settle(&mut self) {
        self.state = RouterState::Idle;
    }

    /// Resolve and decode one raw event.
    ///
    /// Returns `Ok(None)` when the event is not ours: foreign contract,
    /// missing keys, or an unregistered selector. Decode failures on a
    /// recognized kind surface as errors so the caller can count them.
    pub fn route(&mut self, raw: &RawEvent) -> Result<Option<DecodedEvent>, IndexError> {
        self.state = RouterState::Dispatching;

        let address = match felt::canonical(&raw.address) {
            Ok(a) => a,
            Err(_) => {
                debug!(address = %raw.address, "unparseable event address, skipping");
                self.state = RouterState::Skipped;
                return Ok(None);
            }
        };
        if address != self.contract {
            debug!(%address, "event from foreign contract, skipping");
            self.state = RouterState::Skipped;
            return Ok(None);
        }

        let Some(first_key) = raw.keys.first() else {
            warn!(tx_hash = %raw.tx_hash, "event without keys, skipping");
            self.state = RouterState::Skipped;
            return Ok(None);
        };
        let selector = match felt::canonical(first_key) {
            Ok(s) => s,
            Err(_) => {
                warn!(key = %first_key, "unparseable selector word, skipping");
                self.state = RouterState::Skipped;
                return Ok(None);
            }
        };

        let Some(kind) = EventKind::selector_table().get(selector.as_str()) else {
            warn!(%selector, tx_hash = %raw.tx_hash, "unknown event selector, skipping");
            self.state = RouterState::Skipped;
            return Ok(None);
        };

        let decoded = decode_event(*kind, raw)?;
        self.state = RouterState::Reconciling;
        Ok(Some(decoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = "0x5390dc11f780b241418e875095cca768ded2a9c1b605af036bf2760bd5bf6ef";

    fn raw(address: &str, keys: Vec<String>, data: Vec<String>) -> RawEvent {
        RawEvent {
            address: address.into(),
            keys,
            data,
            tx_hash: "0xt".into(),
            event_index: 0,
        }
    }

    #[test]
    fn routes_known_selector() {
        let mut router = EventRouter::new(CONTRACT).unwrap();
        let ev = raw(
            CONTRACT,
            vec![EventKind::CourseRemoved.selector().to_string()],
            vec!["0x7".into()],
        );
        let decoded = router.route(&ev).unwrap().unwrap();
        assert_eq!(decoded.kind, EventKind::CourseRemoved);
        assert_eq!(router.state(), RouterState::Reconciling);
        router.settle();
        assert_eq!(router.state(), RouterState::Idle);
    }

    #[test]
    fn drops_foreign_contract() {
        let mut router = EventRouter::new(CONTRACT).unwrap();
        let ev = raw(
            "0xdead",
            vec![EventKind::CourseRemoved.selector().to_string()],
            vec!["0x7".into()],
        );
        assert!(router.route(&ev).unwrap().is_none());
        assert_eq!(router.state(), RouterState::Skipped);
    }

    #[test]
    fn drops_unknown_selector() {
        let mut router = EventRouter::new(CONTRACT).unwrap();
        let ev = raw(CONTRACT, vec!["0xdeadbeef".into()], vec![]);
        assert!(router.route(&ev).unwrap().is_none());
        assert_eq!(router.state(), RouterState::Skipped);
    }

    #[test]
    fn address_filter_is_canonical() {
        // Uppercase, zero-padded spelling of the same contract still matches.
        let mut router = EventRouter::new(CONTRACT).unwrap();
        let padded = format!("0x0{}", CONTRACT.trim_start_matches("0x").to_uppercase());
        let ev = raw(
            &padded,
            vec![EventKind::CourseRemoved.selector().to_string()],
            vec!["0x7".into()],
        );
        assert!(router.route(&ev).unwrap().is_some());
    }

    #[test]
    fn decode_failure_surfaces_as_error() {
        let mut router = EventRouter::new(CONTRACT).unwrap();
        // Known selector but wrong data arity.
        let ev = raw(
            CONTRACT,
            vec![EventKind::CoursePriceUpdated.selector().to_string()],
            vec!["0x1".into()],
        );
        assert!(router.route(&ev).is_err());
    }
}
