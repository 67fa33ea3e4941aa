//! SQLite backend for the reconciliation store.
//!
//! Single-file persistence via `sqlx` with WAL mode; in-memory pools for
//! tests. Every upsert is one `INSERT … ON CONFLICT … DO UPDATE … RETURNING`
//! statement, so reconciliation is atomic at the statement level.
//!
//! # Usage
//! ```rust,no_run
//! use courseindex_store::sqlite::SqliteStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::open("./courseindex.db").await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use courseindex_core::Cursor;

use crate::error::StorageError;
use crate::rows::{
    ActivityRecord, AcquiredCourseRow, AdminTransferredRow, CourseCertClaimedRow,
    CourseCreatedRow, CoursePriceUpdatedRow, CourseReplacedRow, CourseStatusRow,
    NewAcquiredCourse, NewAdminTransferred, NewCourseCertClaimed, NewCourseCreated,
    NewCoursePriceUpdated, NewCourseReplaced, NewCourseStatus, StatusKind,
};
use crate::store::CourseStore;

/// SQLite-backed reconciliation store.
///
/// Cheaply cloneable; clones share the same connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// The path may be a plain file path (`"./courseindex.db"`) or a full
    /// SQLite URL (`"sqlite:./courseindex.db?mode=rwc"`).
    pub async fn open(path: &str) -> Result<Self, StorageError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let pool = SqlitePool::connect(&url).await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Open an in-memory database. All data is lost when the store is
    /// dropped. A single-connection pool keeps every query on the same
    /// in-memory database.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Close the pool. The store handle is unusable afterwards.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        sqlx::query("PRAGMA journal_mode=WAL;").execute(&self.pool).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS pipeline_cursor (
                pipeline_id TEXT    PRIMARY KEY,
                order_key   INTEGER NOT NULL,
                unique_key  TEXT    NOT NULL,
                updated_at  INTEGER NOT NULL
            );",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS course_created (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                course_identifier INTEGER NOT NULL,
                course_creator    TEXT    NOT NULL,
                course_address    TEXT    NOT NULL,
                accessment        BOOLEAN NOT NULL,
                base_uri          TEXT    NOT NULL,
                name              TEXT    NOT NULL,
                symbol            TEXT    NOT NULL,
                course_ipfs_uri   TEXT    NOT NULL,
                is_approved       BOOLEAN NOT NULL,
                block_number      INTEGER NOT NULL,
                block_timestamp   INTEGER NOT NULL,
                UNIQUE (course_identifier, course_creator)
            );",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS course_replaced (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                course_identifier INTEGER NOT NULL UNIQUE,
                owner             TEXT    NOT NULL,
                new_course_uri    TEXT    NOT NULL,
                block_number      INTEGER NOT NULL,
                block_timestamp   INTEGER NOT NULL
            );",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS course_cert_claimed (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                course_identifier INTEGER NOT NULL UNIQUE,
                candidate         TEXT    NOT NULL,
                block_number      INTEGER NOT NULL,
                block_timestamp   INTEGER NOT NULL
            );",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS admin_transferred (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                new_admin       TEXT    NOT NULL UNIQUE,
                block_number    INTEGER NOT NULL,
                block_timestamp INTEGER NOT NULL
            );",
        )
        .execute(&self.pool)
        .await?;

        for kind in StatusKind::ALL {
            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id                INTEGER PRIMARY KEY AUTOINCREMENT,
                    course_identifier INTEGER NOT NULL UNIQUE,
                    block_number      INTEGER NOT NULL,
                    block_timestamp   INTEGER NOT NULL
                );",
                kind.table()
            ))
            .execute(&self.pool)
            .await?;
        }

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS course_price_updated (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                course_identifier INTEGER NOT NULL UNIQUE,
                new_price         INTEGER NOT NULL,
                block_number      INTEGER NOT NULL,
                block_timestamp   INTEGER NOT NULL
            );",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS acquired_course (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                course_identifier INTEGER NOT NULL,
                owner             TEXT    NOT NULL,
                candidate         TEXT    NOT NULL,
                block_number      INTEGER NOT NULL,
                block_timestamp   INTEGER NOT NULL,
                UNIQUE (course_identifier, owner)
            );",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_course_created_creator
             ON course_created (course_creator);",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_acquired_course_owner
             ON acquired_course (owner);",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CourseStore for SqliteStore {
    async fn load_cursor(&self, pipeline_id: &str) -> Result<Option<Cursor>, StorageError> {
        let row = sqlx::query(
            "SELECT order_key, unique_key FROM pipeline_cursor WHERE pipeline_id = ?",
        )
        .bind(pipeline_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Cursor {
            order_key: r.get::<i64, _>("order_key") as u64,
            unique_key: r.get("unique_key"),
        }))
    }

    async fn save_cursor(&self, pipeline_id: &str, cursor: &Cursor) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO pipeline_cursor (pipeline_id, order_key, unique_key, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (pipeline_id) DO UPDATE SET
                order_key  = excluded.order_key,
                unique_key = excluded.unique_key,
                updated_at = excluded.updated_at",
        )
        .bind(pipeline_id)
        .bind(cursor.order_key as i64)
        .bind(&cursor.unique_key)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        debug!(pipeline_id, order_key = cursor.order_key, "cursor saved");
        Ok(())
    }

    async fn upsert_course_created(
        &self,
        rec: &NewCourseCreated,
    ) -> Result<CourseCreatedRow, StorageError> {
        let row = sqlx::query_as::<_, CourseCreatedRow>(
            "INSERT INTO course_created
                (course_identifier, course_creator, course_address, accessment,
                 base_uri, name, symbol, course_ipfs_uri, is_approved,
                 block_number, block_timestamp)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (course_identifier, course_creator) DO UPDATE SET
                course_address  = excluded.course_address,
                accessment      = excluded.accessment,
                base_uri        = excluded.base_uri,
                name            = excluded.name,
                symbol          = excluded.symbol,
                course_ipfs_uri = excluded.course_ipfs_uri,
                is_approved     = excluded.is_approved,
                block_number    = excluded.block_number,
                block_timestamp = excluded.block_timestamp
             RETURNING *",
        )
        .bind(rec.course_identifier)
        .bind(&rec.course_creator)
        .bind(&rec.course_address)
        .bind(rec.accessment)
        .bind(&rec.base_uri)
        .bind(&rec.name)
        .bind(&rec.symbol)
        .bind(&rec.course_ipfs_uri)
        .bind(rec.is_approved)
        .bind(rec.block_number)
        .bind(rec.block_timestamp)
        .fetch_one(&self.pool)
        .await?;

        debug!(course = rec.course_identifier, "course_created reconciled");
        Ok(row)
    }

    async fn upsert_course_replaced(
        &self,
        rec: &NewCourseReplaced,
    ) -> Result<CourseReplacedRow, StorageError> {
        let row = sqlx::query_as::<_, CourseReplacedRow>(
            "INSERT INTO course_replaced
                (course_identifier, owner, new_course_uri, block_number, block_timestamp)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (course_identifier) DO UPDATE SET
                owner           = excluded.owner,
                new_course_uri  = excluded.new_course_uri,
                block_number    = excluded.block_number,
                block_timestamp = excluded.block_timestamp
             RETURNING *",
        )
        .bind(rec.course_identifier)
        .bind(&rec.owner)
        .bind(&rec.new_course_uri)
        .bind(rec.block_number)
        .bind(rec.block_timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn upsert_course_cert_claimed(
        &self,
        rec: &NewCourseCertClaimed,
    ) -> Result<CourseCertClaimedRow, StorageError> {
        let row = sqlx::query_as::<_, CourseCertClaimedRow>(
            "INSERT INTO course_cert_claimed
                (course_identifier, candidate, block_number, block_timestamp)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (course_identifier) DO UPDATE SET
                candidate       = excluded.candidate,
                block_number    = excluded.block_number,
                block_timestamp = excluded.block_timestamp
             RETURNING *",
        )
        .bind(rec.course_identifier)
        .bind(&rec.candidate)
        .bind(rec.block_number)
        .bind(rec.block_timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn upsert_admin_transferred(
        &self,
        rec: &NewAdminTransferred,
    ) -> Result<AdminTransferredRow, StorageError> {
        let row = sqlx::query_as::<_, AdminTransferredRow>(
            "INSERT INTO admin_transferred (new_admin, block_number, block_timestamp)
             VALUES (?, ?, ?)
             ON CONFLICT (new_admin) DO UPDATE SET
                block_number    = excluded.block_number,
                block_timestamp = excluded.block_timestamp
             RETURNING *",
        )
        .bind(&rec.new_admin)
        .bind(rec.block_number)
        .bind(rec.block_timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn upsert_course_status(
        &self,
        kind: StatusKind,
        rec: &NewCourseStatus,
    ) -> Result<CourseStatusRow, StorageError> {
        let row = sqlx::query_as::<_, CourseStatusRow>(&format!(
            "INSERT INTO {} (course_identifier, block_number, block_timestamp)
             VALUES (?, ?, ?)
             ON CONFLICT (course_identifier) DO UPDATE SET
                block_number    = excluded.block_number,
                block_timestamp = excluded.block_timestamp
             RETURNING *",
            kind.table()
        ))
        .bind(rec.course_identifier)
        .bind(rec.block_number)
        .bind(rec.block_timestamp)
        .fetch_one(&self.pool)
        .await?;

        debug!(table = kind.table(), course = rec.course_identifier, "status reconciled");
        Ok(row)
    }

    async fn upsert_course_price_updated(
        &self,
        rec: &NewCoursePriceUpdated,
    ) -> Result<CoursePriceUpdatedRow, StorageError> {
        let row = sqlx::query_as::<_, CoursePriceUpdatedRow>(
            "INSERT INTO course_price_updated
                (course_identifier, new_price, block_number, block_timestamp)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (course_identifier) DO UPDATE SET
                new_price       = excluded.new_price,
                block_number    = excluded.block_number,
                block_timestamp = excluded.block_timestamp
             RETURNING *",
        )
        .bind(rec.course_identifier)
        .bind(rec.new_price)
        .bind(rec.block_number)
        .bind(rec.block_timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn upsert_acquired_course(
        &self,
        rec: &NewAcquiredCourse,
    ) -> Result<AcquiredCourseRow, StorageError> {
        let row = sqlx::query_as::<_, AcquiredCourseRow>(
            "INSERT INTO acquired_course
                (course_identifier, owner, candidate, block_number, block_timestamp)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (course_identifier, owner) DO UPDATE SET
                candidate       = excluded.candidate,
                block_number    = excluded.block_number,
                block_timestamp = excluded.block_timestamp
             RETURNING *",
        )
        .bind(rec.course_identifier)
        .bind(&rec.owner)
        .bind(&rec.candidate)
        .bind(rec.block_number)
        .bind(rec.block_timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn course_by_identifier(
        &self,
        course_identifier: i64,
    ) -> Result<Vec<CourseCreatedRow>, StorageError> {
        let rows = sqlx::query_as::<_, CourseCreatedRow>(
            "SELECT * FROM course_created WHERE course_identifier = ? ORDER BY course_creator",
        )
        .bind(course_identifier)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn courses_by_creator(
        &self,
        creator: &str,
    ) -> Result<Vec<CourseCreatedRow>, StorageError> {
        let rows = sqlx::query_as::<_, CourseCreatedRow>(
            "SELECT * FROM course_created WHERE course_creator = ? ORDER BY course_identifier",
        )
        .bind(creator)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn acquisitions_by_owner(
        &self,
        owner: &str,
    ) -> Result<Vec<AcquiredCourseRow>, StorageError> {
        let rows = sqlx::query_as::<_, AcquiredCourseRow>(
            "SELECT * FROM acquired_course WHERE owner = ? ORDER BY course_identifier",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn price_of_course(
        &self,
        course_identifier: i64,
    ) -> Result<Option<CoursePriceUpdatedRow>, StorageError> {
        let row = sqlx::query_as::<_, CoursePriceUpdatedRow>(
            "SELECT * FROM course_price_updated WHERE course_identifier = ?",
        )
        .bind(course_identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn status_rows(&self, kind: StatusKind) -> Result<Vec<CourseStatusRow>, StorageError> {
        let rows = sqlx::query_as::<_, CourseStatusRow>(&format!(
            "SELECT * FROM {} ORDER BY course_identifier",
            kind.table()
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn activity_for_address(
        &self,
        address: &str,
    ) -> Result<Vec<ActivityRecord>, StorageError> {
        let rows = sqlx::query_as::<_, ActivityRecord>(
            "SELECT 'course_created' AS kind, course_identifier, ?1 AS address,
                    block_number, block_timestamp
               FROM course_created WHERE course_creator = ?1
             UNION ALL
             SELECT 'course_replaced', course_identifier, ?1, block_number, block_timestamp
               FROM course_replaced WHERE owner = ?1
             UNION ALL
             SELECT 'course_cert_claimed', course_identifier, ?1, block_number, block_timestamp
               FROM course_cert_claimed WHERE candidate = ?1
             UNION ALL
             SELECT 'admin_transferred', NULL, ?1, block_number, block_timestamp
               FROM admin_transferred WHERE new_admin = ?1
             UNION ALL
             SELECT 'acquired_course', course_identifier, ?1, block_number, block_timestamp
               FROM acquired_course WHERE owner = ?1 OR candidate = ?1
             ORDER BY block_number DESC",
        )
        .bind(address)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(course: i64, creator: &str, block: i64) -> NewCourseCreated {
        NewCourseCreated {
            course_identifier: course,
            course_creator: creator.to_string(),
            course_address: "0x5390dc11f780b2".to_string(),
            accessment: true,
            base_uri: "https://base".to_string(),
            name: "Rust 101".to_string(),
            symbol: "R101".to_string(),
            course_ipfs_uri: "ipfs://Qm".to_string(),
            is_approved: false,
            block_number: block,
            block_timestamp: block * 12,
        }
    }

    #[tokio::test]
    async fn cursor_roundtrip_and_upsert() {
        let store = SqliteStore::in_memory().await.unwrap();

        assert!(store.load_cursor("course").await.unwrap().is_none());

        store
            .save_cursor("course", &Cursor::new(755_193, "0xaaa"))
            .await
            .unwrap();
        store
            .save_cursor("course", &Cursor::new(755_194, "0xbbb"))
            .await
            .unwrap();

        let cursor = store.load_cursor("course").await.unwrap().unwrap();
        assert_eq!(cursor.order_key, 755_194);
        assert_eq!(cursor.unique_key, "0xbbb");
    }

    #[tokio::test]
    async fn course_created_upsert_replaces_payload() {
        let store = SqliteStore::in_memory().await.unwrap();

        let first = store.upsert_course_created(&created(42, "0xabc", 100)).await.unwrap();

        let mut changed = created(42, "0xabc", 200);
        changed.is_approved = true;
        changed.name = "Rust 201".to_string();
        let second = store.upsert_course_created(&changed).await.unwrap();

        // same row, overwritten payload
        assert_eq!(second.id, first.id);
        assert_eq!(second.name, "Rust 201");
        assert!(second.is_approved);
        assert_eq!(second.block_number, 200);

        let rows = store.course_by_identifier(42).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn course_created_key_includes_creator() {
        let store = SqliteStore::in_memory().await.unwrap();

        store.upsert_course_created(&created(42, "0xabc", 100)).await.unwrap();
        store.upsert_course_created(&created(42, "0xdef", 101)).await.unwrap();

        let rows = store.course_by_identifier(42).await.unwrap();
        assert_eq!(rows.len(), 2);

        let mine = store.courses_by_creator("0xabc").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].course_creator, "0xabc");
    }

    #[tokio::test]
    async fn price_updated_last_write_wins() {
        let store = SqliteStore::in_memory().await.unwrap();

        for (price, block) in [(100, 10), (150, 11)] {
            store
                .upsert_course_price_updated(&NewCoursePriceUpdated {
                    course_identifier: 42,
                    new_price: price,
                    block_number: block,
                    block_timestamp: block * 12,
                })
                .await
                .unwrap();
        }

        let row = store.price_of_course(42).await.unwrap().unwrap();
        assert_eq!(row.new_price, 150);
        assert_eq!(row.block_number, 11);
    }

    #[tokio::test]
    async fn status_upsert_is_idempotent() {
        let store = SqliteStore::in_memory().await.unwrap();

        let rec = NewCourseStatus {
            course_identifier: 7,
            block_number: 5,
            block_timestamp: 60,
        };
        for kind in StatusKind::ALL {
            store.upsert_course_status(kind, &rec).await.unwrap();
            store.upsert_course_status(kind, &rec).await.unwrap();
            assert_eq!(store.status_rows(kind).await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn acquired_course_keyed_by_course_and_owner() {
        let store = SqliteStore::in_memory().await.unwrap();

        let rec = NewAcquiredCourse {
            course_identifier: 42,
            owner: "0xowner1".to_string(),
            candidate: "0xcand1".to_string(),
            block_number: 10,
            block_timestamp: 120,
        };
        store.upsert_acquired_course(&rec).await.unwrap();

        // same course, different owner — new row
        let other = NewAcquiredCourse {
            owner: "0xowner2".to_string(),
            ..rec.clone()
        };
        store.upsert_acquired_course(&other).await.unwrap();

        // same key — overwrite candidate
        let updated = NewAcquiredCourse {
            candidate: "0xcand9".to_string(),
            block_number: 11,
            ..rec.clone()
        };
        store.upsert_acquired_course(&updated).await.unwrap();

        let mine = store.acquisitions_by_owner("0xowner1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].candidate, "0xcand9");
    }

    #[tokio::test]
    async fn admin_transferred_keyed_by_admin() {
        let store = SqliteStore::in_memory().await.unwrap();

        let rec = NewAdminTransferred {
            new_admin: "0xadmin".to_string(),
            block_number: 3,
            block_timestamp: 36,
        };
        let first = store.upsert_admin_transferred(&rec).await.unwrap();
        let again = store
            .upsert_admin_transferred(&NewAdminTransferred { block_number: 4, ..rec })
            .await
            .unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(again.block_number, 4);
    }

    #[tokio::test]
    async fn activity_view_unions_newest_first() {
        let store = SqliteStore::in_memory().await.unwrap();
        let addr = "0xabc";

        store.upsert_course_created(&created(1, addr, 100)).await.unwrap();
        store
            .upsert_acquired_course(&NewAcquiredCourse {
                course_identifier: 2,
                owner: addr.to_string(),
                candidate: "0xcand".to_string(),
                block_number: 300,
                block_timestamp: 3600,
            })
            .await
            .unwrap();
        store
            .upsert_course_cert_claimed(&NewCourseCertClaimed {
                course_identifier: 3,
                candidate: addr.to_string(),
                block_number: 200,
                block_timestamp: 2400,
            })
            .await
            .unwrap();
        // unrelated address must not appear
        store.upsert_course_created(&created(9, "0xother", 400)).await.unwrap();

        let activity = store.activity_for_address(addr).await.unwrap();
        assert_eq!(activity.len(), 3);
        assert_eq!(activity[0].kind, "acquired_course");
        assert_eq!(activity[0].block_number, 300);
        assert_eq!(activity[1].kind, "course_cert_claimed");
        assert_eq!(activity[2].kind, "course_created");
        assert_eq!(activity[2].course_identifier, Some(1));
    }
}
