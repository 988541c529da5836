// src/gateway/mod.rs
// =============================================================================
// This module defines the collaborators the crawl engine talks to.
//
// The engine never knows where videos come from. It only sees two traits:
// - SearchGateway: keyword -> ordered seed stubs
// - FetchGateway: stub -> full video metadata + recommendations
//
// Implementations:
// - http: a JSON video API reached over HTTP
// - fixture: an in-memory graph (loaded from a JSON file or built in tests)
// - timeout: wraps any gateway so each call has a deadline
// =============================================================================

mod fixture;
mod http;
mod timeout;

use async_trait::async_trait;

use crate::error::{FetchError, SearchError};
use crate::model::{FetchedVideo, VideoStub};

pub use fixture::FixtureGateway;
pub use http::HttpGateway;
pub use timeout::Timeout;

/// Resolves a keyword to an ordered list of seed videos
#[async_trait]
pub trait SearchGateway: Send + Sync {
    async fn search(&self, keyword: &str) -> Result<Vec<VideoStub>, SearchError>;
}

/// Resolves a video stub to its metadata and recommendations
///
/// `FetchError::NotFound` is an ordinary outcome, not a crash: the engine
/// prunes that branch and keeps going.
#[async_trait]
pub trait FetchGateway: Send + Sync {
    async fn fetch(&self, stub: &VideoStub) -> Result<FetchedVideo, FetchError>;
}
