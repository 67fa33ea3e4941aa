//! The `CourseStore` trait — one keyed upsert per event kind, cursor
//! persistence, and the read operations the external API consumes.

use async_trait::async_trait;

use courseindex_core::Cursor;

use crate::error::StorageError;
use crate::rows::{
    ActivityRecord, AcquiredCourseRow, AdminTransferredRow, CourseCertClaimedRow,
    CourseCreatedRow, CoursePriceUpdatedRow, CourseReplacedRow, CourseStatusRow,
    NewAcquiredCourse, NewAdminTransferred, NewCourseCertClaimed, NewCourseCreated,
    NewCoursePriceUpdated, NewCourseReplaced, NewCourseStatus, StatusKind,
};

/// Reconciliation store shared by the pipeline (sole writer) and the read
/// API (reader). Every upsert is a single atomic insert-or-update on the
/// table's natural key: absent key inserts, present key overwrites all
/// non-key columns.
#[async_trait]
pub trait CourseStore: Send + Sync {
    // ── cursor ────────────────────────────────────────────────────────────

    /// Load the last committed cursor, `None` before the first block commits.
    async fn load_cursor(&self, pipeline_id: &str) -> Result<Option<Cursor>, StorageError>;

    /// Durably record the cursor for `pipeline_id` (upsert).
    async fn save_cursor(&self, pipeline_id: &str, cursor: &Cursor) -> Result<(), StorageError>;

    // ── reconciliation upserts ────────────────────────────────────────────

    async fn upsert_course_created(
        &self,
        rec: &NewCourseCreated,
    ) -> Result<CourseCreatedRow, StorageError>;

    async fn upsert_course_replaced(
        &self,
        rec: &NewCourseReplaced,
    ) -> Result<CourseReplacedRow, StorageError>;

    async fn upsert_course_cert_claimed(
        &self,
        rec: &NewCourseCertClaimed,
    ) -> Result<CourseCertClaimedRow, StorageError>;

    async fn upsert_admin_transferred(
        &self,
        rec: &NewAdminTransferred,
    ) -> Result<AdminTransferredRow, StorageError>;

    /// Shared upsert for the five identifier-only fact tables.
    async fn upsert_course_status(
        &self,
        kind: StatusKind,
        rec: &NewCourseStatus,
    ) -> Result<CourseStatusRow, StorageError>;

    async fn upsert_course_price_updated(
        &self,
        rec: &NewCoursePriceUpdated,
    ) -> Result<CoursePriceUpdatedRow, StorageError>;

    async fn upsert_acquired_course(
        &self,
        rec: &NewAcquiredCourse,
    ) -> Result<AcquiredCourseRow, StorageError>;

    // ── reads ─────────────────────────────────────────────────────────────

    /// All `course_created` rows for a course identifier (one per creator).
    async fn course_by_identifier(
        &self,
        course_identifier: i64,
    ) -> Result<Vec<CourseCreatedRow>, StorageError>;

    /// Courses registered by a creator address.
    async fn courses_by_creator(
        &self,
        creator: &str,
    ) -> Result<Vec<CourseCreatedRow>, StorageError>;

    /// Acquisitions held by an owner address.
    async fn acquisitions_by_owner(
        &self,
        owner: &str,
    ) -> Result<Vec<AcquiredCourseRow>, StorageError>;

    /// Latest reconciled price fact for a course, if any.
    async fn price_of_course(
        &self,
        course_identifier: i64,
    ) -> Result<Option<CoursePriceUpdatedRow>, StorageError>;

    /// All rows of one status table, ordered by course identifier.
    async fn status_rows(&self, kind: StatusKind) -> Result<Vec<CourseStatusRow>, StorageError>;

    /// Union of every table's rows involving `address`, newest block first.
    async fn activity_for_address(
        &self,
        address: &str,
    ) -> Result<Vec<ActivityRecord>, StorageError>;
}
