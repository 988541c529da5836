// src/error.rs
// =============================================================================
// Error types that cross module boundaries.
//
// Gateways translate whatever went wrong inside them into one of these
// before handing control back to the engine:
// - SearchError aborts a run (surfaced as CrawlError::SearchUnavailable)
// - FetchError prunes one branch and the run carries on
// - PersistError is logged per artifact; other writes still happen
// =============================================================================

use thiserror::Error;

/// Failure of the keyword search collaborator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("search unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a fetch that produced no video
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The video does not exist (or is no longer available)
    #[error("video not found")]
    NotFound,
    /// The source could not be reached, timed out, or sent garbage
    #[error("fetch unavailable: {0}")]
    Unavailable(String),
}

/// Errors that abort a crawl run
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("search for '{keyword}' failed: {reason}")]
    SearchUnavailable { keyword: String, reason: SearchError },
}

/// Failure to write one persisted artifact
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write {artifact}: {reason}")]
    WriteFailed { artifact: String, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PersistError {
    pub fn write_failed(artifact: impl Into<String>, reason: impl ToString) -> Self {
        PersistError::WriteFailed {
            artifact: artifact.into(),
            reason: reason.to_string(),
        }
    }
}
