// src/model.rs
// =============================================================================
// The data shared by every part of the crawler.
//
// - VideoStub: a reference to a video we have not fetched (id + title)
// - FetchedVideo: what a fetch gateway hands back for one video
// - VideoNode: a fetched video plus what the traversal learned about it
// - CrawlResult: one keyword's ranked, deduplicated output
//
// Everything serializes to camelCase JSON, which is the format of the
// snapshot files, the fixture files and the JSON video API.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Minimal reference to a video, as found in search results and
/// recommendation lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStub {
    pub id: String,
    pub title: String,
}

impl VideoStub {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

// Metadata returned by a fetch gateway. The traversal fields (depth and
// recommendedCount) only exist once the engine has placed the video in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedVideo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration_seconds: u64,
    #[serde(default)]
    pub hashtags: BTreeSet<String>,
    #[serde(default)]
    pub upload_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub comment_count: Option<u64>,
    #[serde(default)]
    pub recommendations: Vec<VideoStub>,
    #[serde(default = "Utc::now")]
    pub collected_at: DateTime<Utc>,
}

impl FetchedVideo {
    /// A bare video with no metadata besides its recommendations.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            duration_seconds: 0,
            hashtags: BTreeSet::new(),
            upload_date: None,
            publish_date: None,
            is_paid: false,
            channel: String::new(),
            view_count: None,
            like_count: None,
            comment_count: None,
            recommendations: Vec::new(),
            collected_at: Utc::now(),
        }
    }

    pub fn with_recommendations(mut self, recommendations: Vec<VideoStub>) -> Self {
        self.recommendations = recommendations;
        self
    }
}

/// A fetched video placed in a crawl run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoNode {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration_seconds: u64,
    pub hashtags: BTreeSet<String>,
    pub upload_date: Option<DateTime<Utc>>,
    pub publish_date: Option<DateTime<Utc>>,
    pub is_paid: bool,
    pub channel: String,
    /// None when the source did not report the metric
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    /// Shallowest depth this video was reached at during the run
    pub depth: usize,
    /// How many recommendation lists referenced this video during the run
    pub recommended_count: u32,
    pub recommendations: Vec<VideoStub>,
    pub collected_at: DateTime<Utc>,
}

impl VideoNode {
    // Promotes a fetch result into a node first reached at `depth`
    pub fn from_fetched(video: FetchedVideo, depth: usize) -> Self {
        Self {
            id: video.id,
            title: video.title,
            description: video.description,
            duration_seconds: video.duration_seconds,
            hashtags: video.hashtags,
            upload_date: video.upload_date,
            publish_date: video.publish_date,
            is_paid: video.is_paid,
            channel: video.channel,
            view_count: video.view_count,
            like_count: video.like_count,
            comment_count: video.comment_count,
            depth,
            recommended_count: 0,
            recommendations: video.recommendations,
            collected_at: video.collected_at,
        }
    }

    /// The recommendations the crawler follows, capped at `branching_factor`
    pub fn followed_recommendations(&self, branching_factor: usize) -> &[VideoStub] {
        let end = self.recommendations.len().min(branching_factor);
        &self.recommendations[..end]
    }
}

/// The output of one crawl of one keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    pub keyword: String,
    pub run_date: DateTime<Utc>,
    /// Sorted by recommended_count, most recommended first
    pub videos: Vec<VideoNode>,
}
