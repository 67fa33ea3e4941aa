//! PostgreSQL backend for the reconciliation store.
//!
//! Production deployment target; the pipeline is the sole writer while the
//! external read API queries the same tables. Connection pooling via `sqlx`.
//!
//! # Feature Flag
//! Requires the `postgres` feature:
//! ```toml
//! courseindex-store = { version = "0.2", features = ["postgres"] }
//! ```

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use courseindex_core::Cursor;

use crate::error::StorageError;
use crate::rows::{
    ActivityRecord, AcquiredCourseRow, AdminTransferredRow, CourseCertClaimedRow,
    CourseCreatedRow, CoursePriceUpdatedRow, CourseReplacedRow, CourseStatusRow,
    NewAcquiredCourse, NewAdminTransferred, NewCourseCertClaimed, NewCourseCreated,
    NewCoursePriceUpdated, NewCourseReplaced, NewCourseStatus, StatusKind,
};
use crate::store::CourseStore;

/// Connection options for the Postgres backend.
#[derive(Debug, Clone)]
pub struct PostgresOptions {
    /// Maximum number of connections in the pool (default: 10)
    pub max_connections: u32,
    /// Minimum number of idle connections to keep open (default: 1)
    pub min_connections: u32,
    /// Connection timeout in seconds (default: 30)
    pub connect_timeout_secs: u64,
}

impl Default for PostgresOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
        }
    }
}

/// PostgreSQL-backed reconciliation store.
///
/// Thread-safe and cheaply cloneable — wraps a connection pool internally.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to a PostgreSQL database and initialize the schema.
    ///
    /// The URL format follows libpq convention:
    /// `postgresql://[user[:password]@][host][:port][/dbname]`
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| StorageError::Storage(format!("postgres connect: {e}")))?;

        let store = Self { pool };
        store.init_schema().await?;
        info!("PostgresStore connected and schema initialized");
        Ok(store)
    }

    /// Connect with custom pool options.
    pub async fn connect_with_options(
        database_url: &str,
        opts: PostgresOptions,
    ) -> Result<Self, StorageError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(opts.max_connections)
            .min_connections(opts.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(opts.connect_timeout_secs))
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Storage(format!("postgres connect: {e}")))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Close the pool. The store handle is unusable afterwards.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Get the underlying connection pool (for the read API's own queries).
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS pipeline_cursor (
                pipeline_id TEXT   PRIMARY KEY,
                order_key   BIGINT NOT NULL,
                unique_key  TEXT   NOT NULL,
                updated_at  BIGINT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS course_created (
                id                BIGSERIAL PRIMARY KEY,
                course_identifier BIGINT  NOT NULL,
                course_creator    TEXT    NOT NULL,
                course_address    TEXT    NOT NULL,
                accessment        BOOLEAN NOT NULL,
                base_uri          TEXT    NOT NULL,
                name              TEXT    NOT NULL,
                symbol            TEXT    NOT NULL,
                course_ipfs_uri   TEXT    NOT NULL,
                is_approved       BOOLEAN NOT NULL,
                block_number      BIGINT  NOT NULL,
                block_timestamp   BIGINT  NOT NULL,
                UNIQUE (course_identifier, course_creator)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS course_replaced (
                id                BIGSERIAL PRIMARY KEY,
                course_identifier BIGINT NOT NULL UNIQUE,
                owner             TEXT   NOT NULL,
                new_course_uri    TEXT   NOT NULL,
                block_number      BIGINT NOT NULL,
                block_timestamp   BIGINT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS course_cert_claimed (
                id                BIGSERIAL PRIMARY KEY,
                course_identifier BIGINT NOT NULL UNIQUE,
                candidate         TEXT   NOT NULL,
                block_number      BIGINT NOT NULL,
                block_timestamp   BIGINT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS admin_transferred (
                id              BIGSERIAL PRIMARY KEY,
                new_admin       TEXT   NOT NULL UNIQUE,
                block_number    BIGINT NOT NULL,
                block_timestamp BIGINT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        for kind in StatusKind::ALL {
            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id                BIGSERIAL PRIMARY KEY,
                    course_identifier BIGINT NOT NULL UNIQUE,
                    block_number      BIGINT NOT NULL,
                    block_timestamp   BIGINT NOT NULL
                )",
                kind.table()
            ))
            .execute(&self.pool)
            .await?;
        }

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS course_price_updated (
                id                BIGSERIAL PRIMARY KEY,
                course_identifier BIGINT NOT NULL UNIQUE,
                new_price         BIGINT NOT NULL,
                block_number      BIGINT NOT NULL,
                block_timestamp   BIGINT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS acquired_course (
                id                BIGSERIAL PRIMARY KEY,
                course_identifier BIGINT NOT NULL,
                owner             TEXT   NOT NULL,
                candidate         TEXT   NOT NULL,
                block_number      BIGINT NOT NULL,
                block_timestamp   BIGINT NOT NULL,
                UNIQUE (course_identifier, owner)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_course_created_creator
             ON course_created (course_creator)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_acquired_course_owner
             ON acquired_course (owner)",
        )
        .execute(&self.pool)
        .await?;

        debug!("PostgresStore schema initialized");
        Ok(())
    }
}

#[async_trait]
impl CourseStore for PostgresStore {
    async fn load_cursor(&self, pipeline_id: &str) -> Result<Option<Cursor>, StorageError> {
        let row = sqlx::query(
            "SELECT order_key, unique_key FROM pipeline_cursor WHERE pipeline_id = $1",
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
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (pipeline_id) DO UPDATE SET
                order_key  = EXCLUDED.order_key,
                unique_key = EXCLUDED.unique_key,
                updated_at = EXCLUDED.updated_at",
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
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             ON CONFLICT (course_identifier, course_creator) DO UPDATE SET
                course_address  = EXCLUDED.course_address,
                accessment      = EXCLUDED.accessment,
                base_uri        = EXCLUDED.base_uri,
                name            = EXCLUDED.name,
                symbol          = EXCLUDED.symbol,
                course_ipfs_uri = EXCLUDED.course_ipfs_uri,
                is_approved     = EXCLUDED.is_approved,
                block_number    = EXCLUDED.block_number,
                block_timestamp = EXCLUDED.block_timestamp
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
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (course_identifier) DO UPDATE SET
                owner           = EXCLUDED.owner,
                new_course_uri  = EXCLUDED.new_course_uri,
                block_number    = EXCLUDED.block_number,
                block_timestamp = EXCLUDED.block_timestamp
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
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (course_identifier) DO UPDATE SET
                candidate       = EXCLUDED.candidate,
                block_number    = EXCLUDED.block_number,
                block_timestamp = EXCLUDED.block_timestamp
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
             VALUES ($1, $2, $3)
             ON CONFLICT (new_admin) DO UPDATE SET
                block_number    = EXCLUDED.block_number,
                block_timestamp = EXCLUDED.block_timestamp
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
             VALUES ($1, $2, $3)
             ON CONFLICT (course_identifier) DO UPDATE SET
                block_number    = EXCLUDED.block_number,
                block_timestamp = EXCLUDED.block_timestamp
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
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (course_identifier) DO UPDATE SET
                new_price       = EXCLUDED.new_price,
                block_number    = EXCLUDED.block_number,
                block_timestamp = EXCLUDED.block_timestamp
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
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (course_identifier, owner) DO UPDATE SET
                candidate       = EXCLUDED.candidate,
                block_number    = EXCLUDED.block_number,
                block_timestamp = EXCLUDED.block_timestamp
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
            "SELECT * FROM course_created WHERE course_identifier = $1 ORDER BY course_creator",
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
            "SELECT * FROM course_created WHERE course_creator = $1 ORDER BY course_identifier",
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
            "SELECT * FROM acquired_course WHERE owner = $1 ORDER BY course_identifier",
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
            "SELECT * FROM course_price_updated WHERE course_identifier = $1",
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
            "SELECT 'course_created' AS kind, course_identifier, $1::TEXT AS address,
                    block_number, block_timestamp
               FROM course_created WHERE course_creator = $1
             UNION ALL
             SELECT 'course_replaced', course_identifier, $1::TEXT, block_number, block_timestamp
               FROM course_replaced WHERE owner = $1
             UNION ALL
             SELECT 'course_cert_claimed', course_identifier, $1::TEXT, block_number, block_timestamp
               FROM course_cert_claimed WHERE candidate = $1
             UNION ALL
             SELECT 'admin_transferred', NULL::BIGINT, $1::TEXT, block_number, block_timestamp
               FROM admin_transferred WHERE new_admin = $1
             UNION ALL
             SELECT 'acquired_course', course_identifier, $1::TEXT, block_number, block_timestamp
               FROM acquired_course WHERE owner = $1 OR candidate = $1
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
    // Integration tests require a running PostgreSQL instance.
    // Example: DATABASE_URL=postgresql://localhost/courseindex_test cargo test
    use super::*;

    #[tokio::test]
    #[ignore = "requires PostgreSQL (set DATABASE_URL to enable)"]
    async fn postgres_cursor_and_upsert_roundtrip() {
        let url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set for integration tests");
        let store = PostgresStore::connect(&url).await.unwrap();

        store
            .save_cursor("itest", &Cursor::new(755_193, "0xaaa"))
            .await
            .unwrap();
        let cursor = store.load_cursor("itest").await.unwrap().unwrap();
        assert_eq!(cursor.order_key, 755_193);

        let rec = NewCoursePriceUpdated {
            course_identifier: 424_242,
            new_price: 100,
            block_number: 1,
            block_timestamp: 12,
        };
        store.upsert_course_price_updated(&rec).await.unwrap();
        store
            .upsert_course_price_updated(&NewCoursePriceUpdated { new_price: 150, ..rec })
            .await
            .unwrap();

        let row = store.price_of_course(424_242).await.unwrap().unwrap();
        assert_eq!(row.new_price, 150);
    }
}
