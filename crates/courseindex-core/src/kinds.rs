//! The closed set of course-registry event kinds and their field layouts.
//!
//! Every event the contract emits is one of these eleven kinds. The
//! discriminant (first key word of a raw event) is the `starknet_keccak`
//! of the kind's name; selectors are computed once and cached, never
//! re-hashed per event.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::felt;

/// Storage-level type of a single event field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Wide on-chain integer, narrowed to `i64` (overflow rejects).
    Uint,
    /// `0x0` / `0x1` word.
    Bool,
    /// Cairo short string — at most 31 bytes of UTF-8 packed into one felt.
    ShortString,
    /// Contract/account address, canonicalized hex.
    Address,
}

/// One field of an event's data layout.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn f(name: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef { name, kind }
}

use FieldKind::{Address, Bool, ShortString, Uint};

const COURSE_CREATED: &[FieldDef] = &[
    f("course_identifier", Uint),
    f("owner_", Address),
    f("accessment_", Bool),
    f("base_uri", ShortString),
    f("name_", ShortString),
    f("symbol", ShortString),
    f("course_ipfs_uri", ShortString),
    f("is_approved", Bool),
];
const COURSE_REPLACED: &[FieldDef] = &[
    f("course_identifier", Uint),
    f("owner_", Address),
    f("new_course_uri", ShortString),
];
const COURSE_CERT_CLAIMED: &[FieldDef] =
    &[f("course_identifier", Uint), f("candidate", Address)];
const ADMIN_TRANSFERRED: &[FieldDef] = &[f("new_admin", Address)];
const COURSE_IDENTIFIER_ONLY: &[FieldDef] = &[f("course_identifier", Uint)];
const COURSE_PRICE_UPDATED: &[FieldDef] =
    &[f("course_identifier", Uint), f("new_price", Uint)];
const ACQUIRED_COURSE: &[FieldDef] = &[
    f("course_identifier", Uint),
    f("owner", Address),
    f("candidate", Address),
];

/// Exhaustive enumeration of contract event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    CourseCreated,
    CourseReplaced,
    CourseCertClaimed,
    AdminTransferred,
    CourseSuspended,
    CourseUnsuspended,
    CourseRemoved,
    CoursePriceUpdated,
    AcquiredCourse,
    CourseApproved,
    CourseUnapproved,
}

impl EventKind {
    pub const ALL: [EventKind; 11] = [
        EventKind::CourseCreated,
        EventKind::CourseReplaced,
        EventKind::CourseCertClaimed,
        EventKind::AdminTransferred,
        EventKind::CourseSuspended,
        EventKind::CourseUnsuspended,
        EventKind::CourseRemoved,
        EventKind::CoursePriceUpdated,
        EventKind::AcquiredCourse,
        EventKind::CourseApproved,
        EventKind::CourseUnapproved,
    ];

    /// The contract-declared event name, hashed to form the discriminant.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CourseCreated => "CourseCreated",
            Self::CourseReplaced => "CourseReplaced",
            Self::CourseCertClaimed => "CourseCertClaimed",
            Self::AdminTransferred => "AdminTransferred",
            Self::CourseSuspended => "CourseSuspended",
            Self::CourseUnsuspended => "CourseUnsuspended",
            Self::CourseRemoved => "CourseRemoved",
            Self::CoursePriceUpdated => "CoursePriceUpdated",
            Self::AcquiredCourse => "AcquiredCourse",
            Self::CourseApproved => "CourseApproved",
            Self::CourseUnapproved => "CourseUnapproved",
        }
    }

    /// Relational table the kind reconciles into.
    pub fn table(&self) -> &'static str {
        match self {
            Self::CourseCreated => "course_created",
            Self::CourseReplaced => "course_replaced",
            Self::CourseCertClaimed => "course_cert_claimed",
            Self::AdminTransferred => "admin_transferred",
            Self::CourseSuspended => "course_suspended",
            Self::CourseUnsuspended => "course_unsuspended",
            Self::CourseRemoved => "course_removed",
            Self::CoursePriceUpdated => "course_price_updated",
            Self::AcquiredCourse => "acquired_course",
            Self::CourseApproved => "course_approved",
            Self::CourseUnapproved => "course_unapproved",
        }
    }

    /// Ordered data-word layout for this kind.
    pub fn layout(&self) -> &'static [FieldDef] {
        match self {
            Self::CourseCreated => COURSE_CREATED,
            Self::CourseReplaced => COURSE_REPLACED,
            Self::CourseCertClaimed => COURSE_CERT_CLAIMED,
            Self::AdminTransferred => ADMIN_TRANSFERRED,
            Self::CourseSuspended
            | Self::CourseUnsuspended
            | Self::CourseRemoved
            | Self::CourseApproved
            | Self::CourseUnapproved => COURSE_IDENTIFIER_ONLY,
            Self::CoursePriceUpdated => COURSE_PRICE_UPDATED,
            Self::AcquiredCourse => ACQUIRED_COURSE,
        }
    }

    /// Canonical-hex selector for this kind, computed once per process.
    pub fn selector(&self) -> &'static str {
        static SELECTORS: OnceLock<Vec<String>> = OnceLock::new();
        let all = SELECTORS
            .get_or_init(|| EventKind::ALL.iter().map(|k| felt::selector(k.name())).collect());
        &all[*self as usize]
    }

    /// Selector → kind lookup table, built once per process.
    pub fn selector_table() -> &'static HashMap<&'static str, EventKind> {
        static TABLE: OnceLock<HashMap<&'static str, EventKind>> = OnceLock::new();
        TABLE.get_or_init(|| {
            EventKind::ALL.iter().map(|k| (k.selector(), *k)).collect()
        })
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_table_covers_all_kinds() {
        let table = EventKind::selector_table();
        assert_eq!(table.len(), EventKind::ALL.len());
        for kind in EventKind::ALL {
            assert_eq!(table.get(kind.selector()), Some(&kind));
        }
    }

    #[test]
    fn selectors_are_distinct_and_canonical() {
        for kind in EventKind::ALL {
            let sel = kind.selector();
            assert!(sel.starts_with("0x"));
            assert_eq!(sel, felt::canonical(sel).unwrap());
        }
    }

    #[test]
    fn layouts_match_contract_arity() {
        assert_eq!(EventKind::CourseCreated.layout().len(), 8);
        assert_eq!(EventKind::CourseReplaced.layout().len(), 3);
        assert_eq!(EventKind::AcquiredCourse.layout().len(), 3);
        assert_eq!(EventKind::CoursePriceUpdated.layout().len(), 2);
        assert_eq!(EventKind::AdminTransferred.layout().len(), 1);
        assert_eq!(EventKind::CourseRemoved.layout().len(), 1);
    }
}
