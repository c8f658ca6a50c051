//! Relational store for files, meters and readings
//!
//! [`MeterStore`] is the narrow interface the reconciler needs. The SQLite
//! implementation hands it out as a [`StoreTransaction`] so that a whole file
//! is reconciled atomically: commit on success, rollback (or drop) on error.
//!
//! # Database Schema
//!
//! - `file_table`: one row per generation code, with receipt date/time
//! - `meter_table`: one row per meter, with last-updated date/time
//! - `reading_table`: one row per body record, keyed by file and meter
//!
//! See `migrations/` at the workspace root.

use async_trait::async_trait;
use smrt_common::types::Stamp;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::models::{BodyRecord, FileRecord, MeterRecord, ReadingRecord};

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Store operations used during reconciliation
#[async_trait]
pub trait MeterStore: Send {
    async fn file_exists(&mut self, file_id: &str) -> Result<bool>;

    /// Insert-if-absent. Returns `false` when the file id was already present.
    async fn insert_file(&mut self, file_id: &str, received: &Stamp) -> Result<bool>;

    async fn device_exists(&mut self, device_id: &str) -> Result<bool>;

    async fn insert_device(&mut self, device_id: &str, updated: &Stamp) -> Result<()>;

    /// Fails when the meter does not exist.
    async fn update_device(&mut self, device_id: &str, updated: &Stamp) -> Result<()>;

    async fn insert_reading(&mut self, file_id: &str, record: &BodyRecord) -> Result<()>;
}

/// SQLite-backed store
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database named by `config.url`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect_with(options)
            .await?;

        info!(
            url = %config.url,
            max_connections = config.max_connections,
            "Database connection pool created"
        );

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the tables if they do not exist yet
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        debug!("Database migrations completed");
        Ok(())
    }

    pub async fn begin(&self) -> Result<StoreTransaction> {
        let tx = self.pool.begin().await?;
        Ok(StoreTransaction { tx })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ========================================================================
    // Read helpers
    // ========================================================================

    pub async fn count_files(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM file_table")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_meters(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM meter_table")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_readings(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM reading_table")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn file(&self, file_id: &str) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT FILE_ID AS file_id,
                   DATE_RECEIVED AS date_received,
                   TIME_RECEIVED AS time_received
            FROM file_table
            WHERE FILE_ID = ?
            "#,
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn meter(&self, meter_id: &str) -> Result<Option<MeterRecord>> {
        let record = sqlx::query_as::<_, MeterRecord>(
            r#"
            SELECT METER_ID AS meter_id,
                   LAST_UPDATED_DATE AS last_updated_date,
                   LAST_UPDATED_TIME AS last_updated_time
            FROM meter_table
            WHERE METER_ID = ?
            "#,
        )
        .bind(meter_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Readings of one file in insertion order
    pub async fn readings_for_file(&self, file_id: &str) -> Result<Vec<ReadingRecord>> {
        let records = sqlx::query_as::<_, ReadingRecord>(
            r#"
            SELECT READING_ID AS reading_id,
                   FILE_ID AS file_id,
                   METER_ID AS meter_id,
                   MEASUREMENT_DATE AS measurement_date,
                   MEASUREMENT_TIME AS measurement_time,
                   CONSUMPTION AS consumption
            FROM reading_table
            WHERE FILE_ID = ?
            ORDER BY READING_ID
            "#,
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

/// One in-flight unit of work. Dropping it without [`commit`](Self::commit)
/// rolls everything back.
pub struct StoreTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl StoreTransaction {
    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl MeterStore for StoreTransaction {
    async fn file_exists(&mut self, file_id: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM file_table WHERE FILE_ID = ?")
            .bind(file_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(found.is_some())
    }

    async fn insert_file(&mut self, file_id: &str, received: &Stamp) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO file_table (FILE_ID, DATE_RECEIVED, TIME_RECEIVED)
            VALUES (?, ?, ?)
            ON CONFLICT (FILE_ID) DO NOTHING
            "#,
        )
        .bind(file_id)
        .bind(received.date.as_str())
        .bind(received.time.as_str())
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn device_exists(&mut self, device_id: &str) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM meter_table WHERE METER_ID = ?")
                .bind(device_id)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(found.is_some())
    }

    async fn insert_device(&mut self, device_id: &str, updated: &Stamp) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO meter_table (METER_ID, LAST_UPDATED_DATE, LAST_UPDATED_TIME)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(device_id)
        .bind(updated.date.as_str())
        .bind(updated.time.as_str())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_device(&mut self, device_id: &str, updated: &Stamp) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE meter_table
            SET LAST_UPDATED_DATE = ?, LAST_UPDATED_TIME = ?
            WHERE METER_ID = ?
            "#,
        )
        .bind(updated.date.as_str())
        .bind(updated.time.as_str())
        .bind(device_id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            warn!(meter_id = %device_id, "Meter update matched no rows");
            return Err(sqlx::Error::RowNotFound.into());
        }
        Ok(())
    }

    async fn insert_reading(&mut self, file_id: &str, record: &BodyRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reading_table
                (FILE_ID, METER_ID, MEASUREMENT_DATE, MEASUREMENT_TIME, CONSUMPTION)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(file_id)
        .bind(&record.meter_id)
        .bind(&record.measurement_date)
        .bind(&record.measurement_time)
        .bind(&record.consumption)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }
}
