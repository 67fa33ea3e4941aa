//! Record and row types for the reconciliation tables.
//!
//! `New*` records carry the reconciled facts a handler extracted from one
//! event; `*Row` adds the storage-assigned `id` (distinct from any natural
//! key). Every table also records the block number and block timestamp of
//! the event that last wrote it.

use serde::{Deserialize, Serialize};

// ─── course_created ──────────────────────────────────────────────────────────

/// Natural key: (course_identifier, course_creator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourseCreated {
    pub course_identifier: i64,
    pub course_creator: String,
    pub course_address: String,
    pub accessment: bool,
    pub base_uri: String,
    pub name: String,
    pub symbol: String,
    pub course_ipfs_uri: String,
    pub is_approved: bool,
    pub block_number: i64,
    pub block_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(any(feature = "sqlite", feature = "postgres"), derive(sqlx::FromRow))]
pub struct CourseCreatedRow {
    pub id: i64,
    pub course_identifier: i64,
    pub course_creator: String,
    pub course_address: String,
    pub accessment: bool,
    pub base_uri: String,
    pub name: String,
    pub symbol: String,
    pub course_ipfs_uri: String,
    pub is_approved: bool,
    pub block_number: i64,
    pub block_timestamp: i64,
}

// ─── course_replaced ─────────────────────────────────────────────────────────

/// Natural key: course_identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourseReplaced {
    pub course_identifier: i64,
    pub owner: String,
    pub new_course_uri: String,
    pub block_number: i64,
    pub block_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(any(feature = "sqlite", feature = "postgres"), derive(sqlx::FromRow))]
pub struct CourseReplacedRow {
    pub id: i64,
    pub course_identifier: i64,
    pub owner: String,
    pub new_course_uri: String,
    pub block_number: i64,
    pub block_timestamp: i64,
}

// ─── course_cert_claimed ─────────────────────────────────────────────────────

/// Natural key: course_identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourseCertClaimed {
    pub course_identifier: i64,
    pub candidate: String,
    pub block_number: i64,
    pub block_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(any(feature = "sqlite", feature = "postgres"), derive(sqlx::FromRow))]
pub struct CourseCertClaimedRow {
    pub id: i64,
    pub course_identifier: i64,
    pub candidate: String,
    pub block_number: i64,
    pub block_timestamp: i64,
}

// ─── admin_transferred ───────────────────────────────────────────────────────

/// Natural key: new_admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAdminTransferred {
    pub new_admin: String,
    pub block_number: i64,
    pub block_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(any(feature = "sqlite", feature = "postgres"), derive(sqlx::FromRow))]
pub struct AdminTransferredRow {
    pub id: i64,
    pub new_admin: String,
    pub block_number: i64,
    pub block_timestamp: i64,
}

// ─── status tables (suspended / unsuspended / removed / approved / unapproved)

/// The five identifier-only fact tables share one record shape; the kind
/// selects the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    Suspended,
    Unsuspended,
    Removed,
    Approved,
    Unapproved,
}

impl StatusKind {
    pub const ALL: [StatusKind; 5] = [
        StatusKind::Suspended,
        StatusKind::Unsuspended,
        StatusKind::Removed,
        StatusKind::Approved,
        StatusKind::Unapproved,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Self::Suspended => "course_suspended",
            Self::Unsuspended => "course_unsuspended",
            Self::Removed => "course_removed",
            Self::Approved => "course_approved",
            Self::Unapproved => "course_unapproved",
        }
    }
}

/// Natural key: course_identifier (per table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourseStatus {
    pub course_identifier: i64,
    pub block_number: i64,
    pub block_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(any(feature = "sqlite", feature = "postgres"), derive(sqlx::FromRow))]
pub struct CourseStatusRow {
    pub id: i64,
    pub course_identifier: i64,
    pub block_number: i64,
    pub block_timestamp: i64,
}

// ─── course_price_updated ────────────────────────────────────────────────────

/// Natural key: course_identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCoursePriceUpdated {
    pub course_identifier: i64,
    pub new_price: i64,
    pub block_number: i64,
    pub block_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(any(feature = "sqlite", feature = "postgres"), derive(sqlx::FromRow))]
pub struct CoursePriceUpdatedRow {
    pub id: i64,
    pub course_identifier: i64,
    pub new_price: i64,
    pub block_number: i64,
    pub block_timestamp: i64,
}

// ─── acquired_course ─────────────────────────────────────────────────────────

/// Natural key: (course_identifier, owner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAcquiredCourse {
    pub course_identifier: i64,
    pub owner: String,
    pub candidate: String,
    pub block_number: i64,
    pub block_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(any(feature = "sqlite", feature = "postgres"), derive(sqlx::FromRow))]
pub struct AcquiredCourseRow {
    pub id: i64,
    pub course_identifier: i64,
    pub owner: String,
    pub candidate: String,
    pub block_number: i64,
    pub block_timestamp: i64,
}

// ─── aggregate view ──────────────────────────────────────────────────────────

/// One entry of the per-address activity view: a union over every table
/// whose rows involve the address, newest block first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(any(feature = "sqlite", feature = "postgres"), derive(sqlx::FromRow))]
pub struct ActivityRecord {
    /// Source table of the fact.
    pub kind: String,
    /// Course identifier, when the source table has one.
    pub course_identifier: Option<i64>,
    pub address: String,
    pub block_number: i64,
    pub block_timestamp: i64,
}
