//! courseindex-store — the reconciliation layer behind the event pipeline.
//!
//! Every event kind reconciles into its own table through a single atomic
//! `INSERT … ON CONFLICT … DO UPDATE` keyed by the kind's natural key, so
//! redelivered blocks never duplicate rows and the latest processed write
//! wins. The same store also persists the pipeline cursor.
//!
//! Backends:
//! - [`sqlite`] — SQLite via `sqlx` (embedded; in-memory pools for tests)
//! - [`postgres`] — PostgreSQL via `sqlx` (feature: `postgres`)

pub mod error;
pub mod rows;
pub mod store;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use error::StorageError;
pub use rows::{
    ActivityRecord, AcquiredCourseRow, AdminTransferredRow, CourseCertClaimedRow,
    CourseCreatedRow, CoursePriceUpdatedRow, CourseReplacedRow, CourseStatusRow,
    NewAcquiredCourse, NewAdminTransferred, NewCourseCertClaimed, NewCourseCreated,
    NewCoursePriceUpdated, NewCourseReplaced, NewCourseStatus, StatusKind,
};
pub use store::CourseStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
