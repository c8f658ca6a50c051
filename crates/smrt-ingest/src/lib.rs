//! SMRT Ingest Library
//!
//! Batch ingestion of SMRT meter-reading files into a relational store.
//!
//! # Pipeline
//!
//! - **loader**: delimited text to raw rows, fields kept verbatim
//! - **envelope**: header/footer acceptance check
//! - **reconcile**: file, meter and reading writes with idempotent skip
//! - **driver**: directory scan, quarantine and processed-file handling
//!
//! # Example
//!
//! ```no_run
//! use smrt_ingest::{run_batch, IngestConfig, SqliteStore, SystemClock};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::load_with(|_| Ok(()))?;
//!     let store = SqliteStore::connect(&config.database).await?;
//!     store.migrate().await?;
//!
//!     let stats = run_batch(&config, &store, &SystemClock).await?;
//!     println!("{} files ingested", stats.ingested);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod clock;
pub mod config;
pub mod driver;
pub mod envelope;
pub mod error;
pub mod loader;
pub mod models;
pub mod reconcile;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use config::{DatabaseConfig, IngestConfig, ProcessedPolicy};
pub use driver::{run_batch, BatchStats, FileOutcome};
pub use error::{IngestError, Result};
pub use reconcile::{reconcile, ReconcileOutcome, ReconcileStats};
pub use store::{MeterStore, SqliteStore, StoreTransaction};
