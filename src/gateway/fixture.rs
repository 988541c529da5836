// src/gateway/fixture.rs
// =============================================================================
// A gateway backed by an in-memory recommendation graph.
//
// Used for offline runs (`--fixture graph.json`) and by the tests. The file
// format is:
//
//   {
//     "searches": { "rust": [{"id": "a", "title": "A"}] },
//     "videos":   { "a": {"id": "a", "title": "A", "recommendations": [...]} }
//   }
//
// A keyword missing from "searches" is a search failure; an id missing from
// "videos" is a NotFound fetch. Every fetch is counted per id so callers can
// check that nothing was fetched twice.
// =============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use super::{FetchGateway, SearchGateway};
use crate::error::{FetchError, SearchError};
use crate::model::{FetchedVideo, VideoStub};

#[derive(Debug, Default, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    searches: HashMap<String, Vec<VideoStub>>,
    #[serde(default)]
    videos: HashMap<String, FetchedVideo>,
}

#[derive(Debug, Default)]
pub struct FixtureGateway {
    searches: HashMap<String, Vec<VideoStub>>,
    videos: HashMap<String, FetchedVideo>,
    fetch_counts: Mutex<HashMap<String, usize>>,
}

impl FixtureGateway {
    pub fn new() -> Self {
        Self::default()
    }

    // Reads a fixture graph from a JSON file
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let file: FixtureFile = serde_json::from_str(raw)?;
        Ok(Self {
            searches: file.searches,
            videos: file.videos,
            fetch_counts: Mutex::new(HashMap::new()),
        })
    }

    pub fn with_search(mut self, keyword: &str, seeds: &[&str]) -> Self {
        let stubs = seeds
            .iter()
            .map(|id| VideoStub::new(*id, id.to_uppercase()))
            .collect();
        self.searches.insert(keyword.to_string(), stubs);
        self
    }

    /// Adds a video whose recommendations are the given ids, in order
    pub fn with_video(mut self, id: &str, recommendations: &[&str]) -> Self {
        let recommendations = recommendations
            .iter()
            .map(|rec| VideoStub::new(*rec, rec.to_uppercase()))
            .collect();
        let video = FetchedVideo::new(id, id.to_uppercase()).with_recommendations(recommendations);
        self.videos.insert(id.to_string(), video);
        self
    }

    /// How many times `id` was requested from this gateway
    pub fn fetch_count(&self, id: &str) -> usize {
        self.fetch_counts
            .lock()
            .map(|counts| counts.get(id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetch_counts
            .lock()
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }
}

#[async_trait]
impl SearchGateway for FixtureGateway {
    async fn search(&self, keyword: &str) -> Result<Vec<VideoStub>, SearchError> {
        self.searches
            .get(keyword)
            .cloned()
            .ok_or_else(|| SearchError::Unavailable(format!("no fixture results for '{keyword}'")))
    }
}

#[async_trait]
impl FetchGateway for FixtureGateway {
    async fn fetch(&self, stub: &VideoStub) -> Result<FetchedVideo, FetchError> {
        if let Ok(mut counts) = self.fetch_counts.lock() {
            *counts.entry(stub.id.clone()).or_insert(0) += 1;
        }

        self.videos.get(&stub.id).cloned().ok_or(FetchError::NotFound)
    }
}
