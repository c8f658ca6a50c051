//! SMRT Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the SMRT ingest workspace.
//!
//! # Overview
//!
//! - **Error Handling**: Shared error type and result alias
//! - **Types**: Wire-format dates and times (`YYYYMMDD` / `HHMMSS`)
//! - **Logging**: Centralized `tracing` subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use smrt_common::types::WireDate;
//!
//! fn check(date: &str) -> smrt_common::Result<()> {
//!     let date = WireDate::parse(date)?;
//!     println!("valid date: {}", date);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SmrtError};
