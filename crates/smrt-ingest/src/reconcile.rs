//! Reconcile a validated file into the store
//!
//! The generation code is the idempotency key: a file whose id is already
//! recorded is skipped without touching meters or readings. Otherwise the
//! file row is written first, then every distinct meter is created or has its
//! last-updated stamp refreshed, then every body row becomes a reading.

use smrt_common::types::Stamp;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::Result;
use crate::models::SmrtFile;
use crate::store::MeterStore;

/// Counts for one ingested file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileStats {
    pub file_id: String,
    pub received: Stamp,
    pub meters_created: usize,
    pub meters_updated: usize,
    pub readings_inserted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Ingested(ReconcileStats),
    /// The file id was already recorded; nothing was written
    Duplicate { file_id: String },
}

impl ReconcileOutcome {
    pub fn file_id(&self) -> &str {
        match self {
            ReconcileOutcome::Ingested(stats) => &stats.file_id,
            ReconcileOutcome::Duplicate { file_id } => file_id,
        }
    }

    pub fn readings_inserted(&self) -> usize {
        match self {
            ReconcileOutcome::Ingested(stats) => stats.readings_inserted,
            ReconcileOutcome::Duplicate { .. } => 0,
        }
    }
}

/// Write one file's rows through `store`.
///
/// The caller owns the transaction behind `store` and decides whether to
/// commit; on error nothing here is undone explicitly.
#[tracing::instrument(skip(store, file, clock), fields(file_id = %file.file_id()))]
pub async fn reconcile<S>(
    store: &mut S,
    file: &SmrtFile,
    clock: &dyn Clock,
) -> Result<ReconcileOutcome>
where
    S: MeterStore + ?Sized,
{
    let file_id = file.file_id().to_string();
    let received = clock.stamp();

    if store.file_exists(&file_id).await? {
        info!("File already ingested, skipping");
        return Ok(ReconcileOutcome::Duplicate { file_id });
    }

    if !store.insert_file(&file_id, &received).await? {
        info!("File recorded concurrently, skipping");
        return Ok(ReconcileOutcome::Duplicate { file_id });
    }

    let mut meters_created = 0;
    let mut meters_updated = 0;
    for meter_id in file.meter_ids() {
        let now = clock.stamp();
        if store.device_exists(meter_id).await? {
            store.update_device(meter_id, &now).await?;
            meters_updated += 1;
        } else {
            store.insert_device(meter_id, &now).await?;
            meters_created += 1;
        }
        debug!(meter_id, stamp = %now, "Meter reconciled");
    }

    for record in &file.records {
        store.insert_reading(&file_id, record).await?;
    }
    let readings_inserted = file.records.len();

    info!(
        received = %received,
        meters_created,
        meters_updated,
        readings_inserted,
        "File reconciled"
    );

    Ok(ReconcileOutcome::Ingested(ReconcileStats {
        file_id,
        received,
        meters_created,
        meters_updated,
        readings_inserted,
    }))
}
