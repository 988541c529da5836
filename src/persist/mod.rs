// src/persist/mod.rs
// =============================================================================
// This module saves finished crawl runs.
//
// Two artifacts per run:
// - snapshot: a JSON file of the ranked result (always attempted)
// - store: per-video records in a document store (only when one is
//   configured)
//
// Each artifact is written on its own. A failure is logged and counted in
// the PersistReport; it never stops the other writes.
// =============================================================================

mod file_store;
mod snapshot;
mod store;

use std::path::PathBuf;
use tracing::{info, warn};

use crate::crawl::{CrawlEngine, CrawlRun};
use crate::error::CrawlError;
use crate::model::CrawlResult;

pub use file_store::FileStore;
pub use snapshot::SnapshotWriter;
pub use store::{
    write_store_records, CollectionRecord, MemoryStore, RecordStore, StoreReport, VideoRecord,
    WatchedRecord, UNKNOWN_METRIC,
};

/// What got written for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistReport {
    /// Path of the snapshot file, None if writing it failed
    pub snapshot: Option<PathBuf>,
    /// None when no store is configured
    pub store: Option<StoreReport>,
}

// Crawls one keyword and saves the run
//
// Parameters:
//   engine: the configured crawl engine
//   snapshots: where snapshot files go
//   store: the document store, if one is configured
//   project_id: the project the store records belong to
//   keyword: the search term to crawl
//
// Returns: Result<(CrawlRun, PersistReport), CrawlError>
//   Error: the search failed. Nothing has been written in that case.
pub async fn run_keyword(
    engine: &CrawlEngine<'_>,
    snapshots: &SnapshotWriter,
    store: Option<&dyn RecordStore>,
    project_id: &str,
    keyword: &str,
) -> Result<(CrawlRun, PersistReport), CrawlError> {
    let run = engine.run(keyword).await?;
    let report = persist_run(snapshots, store, project_id, &run.result).await;
    Ok((run, report))
}

// Writes the snapshot file, then the store records if a store is live
//
// Parameters:
//   snapshots: where snapshot files go
//   store: the document store, if one is configured
//   project_id: the project the store records belong to
//   result: the ranked run to save
//
// Returns: PersistReport (failures are logged, never returned)
pub async fn persist_run(
    snapshots: &SnapshotWriter,
    store: Option<&dyn RecordStore>,
    project_id: &str,
    result: &CrawlResult,
) -> PersistReport {
    let snapshot = match snapshots.write(result).await {
        Ok(path) => {
            info!(path = %path.display(), "snapshot written");
            Some(path)
        }
        Err(e) => {
            warn!(keyword = %result.keyword, error = %e, "failed to write snapshot");
            None
        }
    };

    let store = match store {
        Some(store) => {
            let report = write_store_records(store, project_id, result).await;
            info!(
                stored = report.stored,
                skipped = report.skipped,
                failed = report.failed,
                "store records written"
            );
            Some(report)
        }
        None => None,
    };

    PersistReport { snapshot, store }
}
