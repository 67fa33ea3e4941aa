//! Per-kind event handlers.
//!
//! Each handler maps a decoded event onto its table's record and performs a
//! keyed upsert. Every kind reconciles the same way, so redelivery of a block
//! converges on identical rows instead of duplicating them.

use tracing::debug;

use courseindex_core::{Block, DecodedEvent, EventKind};
use courseindex_store::{
    CourseStore, NewAcquiredCourse, NewAdminTransferred, NewCourseCertClaimed, NewCourseCreated,
    NewCoursePriceUpdated, NewCourseReplaced, NewCourseStatus, StatusKind,
};

use crate::error::IndexError;

/// Apply one decoded event to the store.
pub async fn apply_event<S: CourseStore + ?Sized>(
    store: &S,
    ev: &DecodedEvent,
    block: &Block,
) -> Result<(), IndexError> {
    let block_number = block.number as i64;
    let block_timestamp = block.timestamp;

    match ev.kind {
        EventKind::CourseCreated => {
            let rec = NewCourseCreated {
                course_identifier: ev.int("course_identifier")?,
                course_creator: ev.addr("owner_")?.to_string(),
                course_address: ev.address.clone(),
                accessment: ev.flag("accessment_")?,
                base_uri: ev.text("base_uri")?.to_string(),
                name: ev.text("name_")?.to_string(),
                symbol: ev.text("symbol")?.to_string(),
                course_ipfs_uri: ev.text("course_ipfs_uri")?.to_string(),
                is_approved: ev.flag("is_approved")?,
                block_number,
                block_timestamp,
            };
            store.upsert_course_created(&rec).await?;
        }
        EventKind::CourseReplaced => {
            let rec = NewCourseReplaced {
                course_identifier: ev.int("course_identifier")?,
                owner: ev.addr("owner_")?.to_string(),
                new_course_uri: ev.text("new_course_uri")?.to_string(),
                block_number,
                block_timestamp,
            };
            store.upsert_course_replaced(&rec).await?;
        }
        EventKind::CourseCertClaimed => {
            let rec = NewCourseCertClaimed {
                course_identifier: ev.int("course_identifier")?,
                candidate: ev.addr("candidate")?.to_string(),
                block_number,
                block_timestamp,
            };
            store.upsert_course_cert_claimed(&rec).await?;
        }
        EventKind::AdminTransferred => {
            let rec = NewAdminTransferred {
                new_admin: ev.addr("new_admin")?.to_string(),
                block_number,
                block_timestamp,
            };
            store.upsert_admin_transferred(&rec).await?;
        }
        EventKind::CourseSuspended => {
            upsert_status(store, ev, StatusKind::Suspended, block_number, block_timestamp).await?;
        }
        EventKind::CourseUnsuspended => {
            upsert_status(store, ev, StatusKind::Unsuspended, block_number, block_timestamp)
                .await?;
        }
        EventKind::CourseRemoved => {
            upsert_status(store, ev, StatusKind::Removed, block_number, block_timestamp).await?;
        }
        EventKind::CourseApproved => {
            upsert_status(store, ev, StatusKind::Approved, block_number, block_timestamp).await?;
        }
        EventKind::CourseUnapproved => {
            upsert_status(store, ev, StatusKind::Unapproved, block_number, block_timestamp)
                .await?;
        }
        EventKind::CoursePriceUpdated => {
            let rec = NewCoursePriceUpdated {
                course_identifier: ev.int("course_identifier")?,
                new_price: ev.int("new_price")?,
                block_number,
                block_timestamp,
            };
            store.upsert_course_price_updated(&rec).await?;
        }
        EventKind::AcquiredCourse => {
            let rec = NewAcquiredCourse {
                course_identifier: ev.int("course_identifier")?,
                owner: ev.addr("owner")?.to_string(),
                candidate: ev.addr("candidate")?.to_string(),
                block_number,
                block_timestamp,
            };
            store.upsert_acquired_course(&rec).await?;
        }
    }

    debug!(kind = %ev.kind, tx_hash = %ev.tx_hash, block_number, "event reconciled");
    Ok(())
}

/// Shared path for the five identifier-only fact tables.
async fn upsert_status<S: CourseStore + ?Sized>(
    store: &S,
    ev: &DecodedEvent,
    kind: StatusKind,
    block_number: i64,
    block_timestamp: i64,
) -> Result<(), IndexError> {
    let rec = NewCourseStatus {
        course_identifier: ev.int("course_identifier")?,
        block_number,
        block_timestamp,
    };
    store.upsert_course_status(kind, &rec).await?;
    Ok(())
}
