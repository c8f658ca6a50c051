//! Batch driver
//!
//! Scans the input directory once, in file-name order, and routes each
//! regular file to one of three places:
//!
//! - rejected by the loader or the envelope check: moved to quarantine,
//!   byte-for-byte, keeping its name
//! - accepted: reconciled inside its own transaction, then left, deleted
//!   or archived per [`ProcessedPolicy`]
//! - store or filesystem failure: transaction rolled back, file left where
//!   it is for the next run
//!
//! A failing file never stops the batch.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::{IngestConfig, ProcessedPolicy};
use crate::envelope;
use crate::error::{IngestError, Result};
use crate::loader;
use crate::reconcile::{reconcile, ReconcileOutcome, ReconcileStats};
use crate::store::SqliteStore;

/// Totals for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub files_seen: usize,
    pub ingested: usize,
    pub duplicates: usize,
    pub quarantined: usize,
    pub failed: usize,
    pub readings_inserted: usize,
}

impl BatchStats {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Ingested(stats) => {
                self.ingested += 1;
                self.readings_inserted += stats.readings_inserted;
            },
            FileOutcome::Duplicate { .. } => self.duplicates += 1,
            FileOutcome::Quarantined { .. } => self.quarantined += 1,
        }
    }
}

/// Where a single file ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Ingested(ReconcileStats),
    Duplicate { file_id: String },
    Quarantined { reason: String },
}

impl From<ReconcileOutcome> for FileOutcome {
    fn from(outcome: ReconcileOutcome) -> Self {
        match outcome {
            ReconcileOutcome::Ingested(stats) => FileOutcome::Ingested(stats),
            ReconcileOutcome::Duplicate { file_id } => FileOutcome::Duplicate { file_id },
        }
    }
}

/// Process every regular file in the input directory.
///
/// Only an unreadable input directory fails the whole call; per-file
/// failures are logged and counted in [`BatchStats::failed`].
pub async fn run_batch(
    config: &IngestConfig,
    store: &SqliteStore,
    clock: &dyn Clock,
) -> Result<BatchStats> {
    let files = list_input_files(&config.input_dir)?;
    info!(
        input_dir = %config.input_dir.display(),
        files = files.len(),
        "Starting batch"
    );

    let mut stats = BatchStats {
        files_seen: files.len(),
        ..BatchStats::default()
    };

    for path in &files {
        match process_file(config, store, clock, path).await {
            Ok(outcome) => stats.record(&outcome),
            Err(e) => {
                error!(file = %path.display(), error = %e, "Failed to process file");
                stats.failed += 1;
            },
        }
    }

    info!(
        files_seen = stats.files_seen,
        ingested = stats.ingested,
        duplicates = stats.duplicates,
        quarantined = stats.quarantined,
        failed = stats.failed,
        readings_inserted = stats.readings_inserted,
        "Batch complete"
    );

    Ok(stats)
}

/// Regular files directly under `dir`, sorted by name
pub fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        } else {
            debug!(path = %path.display(), "Skipping non-file entry");
        }
    }
    files.sort();
    Ok(files)
}

/// Validate, reconcile and route a single file
#[tracing::instrument(skip_all, fields(file = %path.display()))]
pub async fn process_file(
    config: &IngestConfig,
    store: &SqliteStore,
    clock: &dyn Clock,
    path: &Path,
) -> Result<FileOutcome> {
    let rows = match loader::load_rows(path, config.delimiter) {
        Ok(rows) => rows,
        Err(e) if e.is_malformed_input() => return quarantine(config, path, e.to_string()),
        Err(e) => return Err(e),
    };

    let file = match envelope::check(&rows) {
        Ok(file) => file,
        Err(reason) => return quarantine(config, path, reason.to_string()),
    };

    let mut tx = store.begin().await?;
    let outcome = match reconcile(&mut tx, &file, clock).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            return Err(e);
        },
    };
    tx.commit().await?;

    apply_processed_policy(config, path)?;

    Ok(outcome.into())
}

fn quarantine(config: &IngestConfig, path: &Path, reason: String) -> Result<FileOutcome> {
    let dest = relocate(path, &config.quarantine_dir)?;
    warn!(
        reason = %reason,
        destination = %dest.display(),
        "File rejected, moved to quarantine"
    );
    Ok(FileOutcome::Quarantined { reason })
}

fn apply_processed_policy(config: &IngestConfig, path: &Path) -> Result<()> {
    match config.processed {
        ProcessedPolicy::Leave => {},
        ProcessedPolicy::Delete => {
            fs::remove_file(path)?;
            debug!("Processed file deleted");
        },
        ProcessedPolicy::Archive => {
            let archive_dir = config.archive_dir.as_deref().ok_or_else(|| {
                IngestError::config("Archive policy requires an archive directory")
            })?;
            let dest = relocate(path, archive_dir)?;
            debug!(destination = %dest.display(), "Processed file archived");
        },
    }
    Ok(())
}

/// Move `path` into `dir` under the same file name, creating `dir` if needed.
/// An existing file of that name is replaced.
fn relocate(path: &Path, dir: &Path) -> Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", path.display()),
        )
    })?;

    fs::create_dir_all(dir)?;
    let dest = dir.join(name);
    move_file(path, &dest)?;
    Ok(dest)
}

/// Rename, falling back to copy and remove across filesystems
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(error = %e, "Rename failed, copying instead");
            fs::copy(from, to)?;
            fs::remove_file(from)
        },
    }
}
