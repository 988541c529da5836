// src/gateway/timeout.rs
// =============================================================================
// Puts a deadline on every call to a wrapped gateway.
//
// The engine itself never times anything out; a caller that wants to bound
// wall-clock time wraps its gateways in Timeout instead. An elapsed search
// becomes SearchError::Unavailable (the run aborts), an elapsed fetch becomes
// FetchError::Unavailable (the branch is pruned).
// =============================================================================

use async_trait::async_trait;
use std::time::Duration;

use super::{FetchGateway, SearchGateway};
use crate::error::{FetchError, SearchError};
use crate::model::{FetchedVideo, VideoStub};

pub struct Timeout<G> {
    inner: G,
    limit: Duration,
}

impl<G> Timeout<G> {
    pub fn new(inner: G, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: SearchGateway> SearchGateway for Timeout<G> {
    async fn search(&self, keyword: &str) -> Result<Vec<VideoStub>, SearchError> {
        tokio::time::timeout(self.limit, self.inner.search(keyword))
            .await
            .unwrap_or_else(|_| {
                Err(SearchError::Unavailable(format!(
                    "search timed out after {:?}",
                    self.limit
                )))
            })
    }
}

#[async_trait]
impl<G: FetchGateway> FetchGateway for Timeout<G> {
    async fn fetch(&self, stub: &VideoStub) -> Result<FetchedVideo, FetchError> {
        tokio::time::timeout(self.limit, self.inner.fetch(stub))
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::Unavailable(format!(
                    "fetch timed out after {:?}",
                    self.limit
                )))
            })
    }
}
