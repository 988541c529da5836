// src/persist/store.rs
// =============================================================================
// Document-store records and the per-video write policy.
//
// For every crawl run we store:
// - one CollectionRecord (the whole ranked result)
// - one VideoRecord per video id the store has never seen
// - one WatchedRecord per video per calendar day (UTC), keyed by
//   (project, keyword, video id, day)
//
// Videos are written independently: a failure on one is logged and counted
// and the others carry on. There is no transaction around the batch, the
// "already recorded today" check makes a re-run pick up where it stopped.
// =============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::error::PersistError;
use crate::model::{CrawlResult, VideoNode, VideoStub};

/// Stored in place of a metric the source did not report
pub const UNKNOWN_METRIC: i64 = -1;

// How many videos are written to the store at once
const STORE_CONCURRENCY: usize = 8;

/// Canonical, run-independent description of a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration_seconds: u64,
    pub hashtags: BTreeSet<String>,
    pub upload_date: Option<DateTime<Utc>>,
    pub publish_date: Option<DateTime<Utc>>,
    pub is_paid: bool,
    pub channel: String,
}

impl From<&VideoNode> for VideoRecord {
    fn from(node: &VideoNode) -> Self {
        Self {
            id: node.id.clone(),
            title: node.title.clone(),
            description: node.description.clone(),
            duration_seconds: node.duration_seconds,
            hashtags: node.hashtags.clone(),
            upload_date: node.upload_date,
            publish_date: node.publish_date,
            is_paid: node.is_paid,
            channel: node.channel.clone(),
        }
    }
}

/// What one crawl observed about one video on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedRecord {
    pub project_id: String,
    pub id: String,
    pub title: String,
    pub keyword: String,
    pub date: DateTime<Utc>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub depth: usize,
    pub recommended_count: u32,
    pub recommendations: Vec<VideoStub>,
}

impl WatchedRecord {
    pub fn from_node(project_id: &str, keyword: &str, node: &VideoNode) -> Self {
        Self {
            project_id: project_id.to_string(),
            id: node.id.clone(),
            title: node.title.clone(),
            keyword: keyword.to_string(),
            date: node.collected_at,
            views: metric(node.view_count),
            likes: metric(node.like_count),
            comments: metric(node.comment_count),
            depth: node.depth,
            recommended_count: node.recommended_count,
            recommendations: node.recommendations.clone(),
        }
    }

    /// True when this record belongs to the given dedup key
    pub fn matches(
        &self,
        project_id: &str,
        keyword: &str,
        video_id: &str,
        date: DateTime<Utc>,
    ) -> bool {
        self.project_id == project_id
            && self.keyword == keyword
            && self.id == video_id
            && self.date.date_naive() == date.date_naive()
    }
}

/// The full ranked result of one run, as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRecord {
    pub project_id: String,
    pub keyword: String,
    pub date: DateTime<Utc>,
    pub videos: Vec<VideoNode>,
}

fn metric(value: Option<u64>) -> i64 {
    value
        .and_then(|v| i64::try_from(v).ok())
        .unwrap_or(UNKNOWN_METRIC)
}

/// A document store the crawler can record runs in
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Whether a watched record exists for this key on the same UTC day
    async fn already_recorded_today(
        &self,
        project_id: &str,
        keyword: &str,
        video_id: &str,
        date: DateTime<Utc>,
    ) -> Result<bool, PersistError>;

    async fn find_video(&self, id: &str) -> Result<Option<VideoRecord>, PersistError>;

    async fn insert_video(&self, record: VideoRecord) -> Result<(), PersistError>;

    async fn append_watched(&self, record: WatchedRecord) -> Result<(), PersistError>;

    async fn save_collection(&self, record: CollectionRecord) -> Result<(), PersistError>;
}

/// Counts of what happened to each video during a store write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreReport {
    pub collection_saved: bool,
    pub stored: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum VideoOutcome {
    Stored,
    Skipped,
    Failed,
}

// Writes the collection record, then every video independently
//
// Parameters:
//   store: the document store to write to
//   project_id: the project the records belong to
//   result: the ranked run to store
//
// Returns: StoreReport with one outcome per video
//   A failed write is logged and counted, the other videos still go through
pub async fn write_store_records(
    store: &dyn RecordStore,
    project_id: &str,
    result: &CrawlResult,
) -> StoreReport {
    let mut report = StoreReport::default();

    let collection = CollectionRecord {
        project_id: project_id.to_string(),
        keyword: result.keyword.clone(),
        date: result.run_date,
        videos: result.videos.clone(),
    };
    match store.save_collection(collection).await {
        Ok(()) => report.collection_saved = true,
        Err(e) => warn!(keyword = %result.keyword, error = %e, "failed to store collection"),
    }

    let outcomes: Vec<VideoOutcome> = stream::iter(&result.videos)
        .map(move |node| async move {
            match store_video(store, project_id, &result.keyword, node).await {
                Ok(true) => VideoOutcome::Stored,
                Ok(false) => VideoOutcome::Skipped,
                Err(e) => {
                    warn!(id = %node.id, error = %e, "failed to store video");
                    VideoOutcome::Failed
                }
            }
        })
        .buffer_unordered(STORE_CONCURRENCY)
        .collect()
        .await;

    for outcome in outcomes {
        match outcome {
            VideoOutcome::Stored => report.stored += 1,
            VideoOutcome::Skipped => report.skipped += 1,
            VideoOutcome::Failed => report.failed += 1,
        }
    }

    report
}

// Stores one video: the video record (first time only) and a watched record
//
// Parameters:
//   store: the document store to write to
//   project_id, keyword: the collection this sighting belongs to
//   node: the video as ranked in this run
//
// Returns: Result<bool, PersistError>
//   Ok(true): a watched record was appended
//   Ok(false): already recorded today, nothing written
async fn store_video(
    store: &dyn RecordStore,
    project_id: &str,
    keyword: &str,
    node: &VideoNode,
) -> Result<bool, PersistError> {
    if store
        .already_recorded_today(project_id, keyword, &node.id, node.collected_at)
        .await?
    {
        debug!(id = %node.id, "already recorded today");
        return Ok(false);
    }

    if store.find_video(&node.id).await?.is_none() {
        store.insert_video(VideoRecord::from(node)).await?;
    }

    store
        .append_watched(WatchedRecord::from_node(project_id, keyword, node))
        .await?;
    Ok(true)
}

#[derive(Debug, Default)]
struct MemoryState {
    videos: HashMap<String, VideoRecord>,
    watched: Vec<WatchedRecord>,
    collections: Vec<CollectionRecord>,
}

/// A store that keeps everything in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, PersistError> {
        self.state
            .lock()
            .map_err(|_| PersistError::write_failed("memory store", "lock poisoned"))
    }

    pub fn video_count(&self) -> usize {
        self.lock().map(|s| s.videos.len()).unwrap_or(0)
    }

    pub fn watched(&self) -> Vec<WatchedRecord> {
        self.lock().map(|s| s.watched.clone()).unwrap_or_default()
    }

    pub fn collections(&self) -> Vec<CollectionRecord> {
        self.lock().map(|s| s.collections.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn already_recorded_today(
        &self,
        project_id: &str,
        keyword: &str,
        video_id: &str,
        date: DateTime<Utc>,
    ) -> Result<bool, PersistError> {
        let state = self.lock()?;
        Ok(state
            .watched
            .iter()
            .any(|w| w.matches(project_id, keyword, video_id, date)))
    }

    async fn find_video(&self, id: &str) -> Result<Option<VideoRecord>, PersistError> {
        Ok(self.lock()?.videos.get(id).cloned())
    }

    async fn insert_video(&self, record: VideoRecord) -> Result<(), PersistError> {
        self.lock()?
            .videos
            .entry(record.id.clone())
            .or_insert(record);
        Ok(())
    }

    async fn append_watched(&self, record: WatchedRecord) -> Result<(), PersistError> {
        self.lock()?.watched.push(record);
        Ok(())
    }

    async fn save_collection(&self, record: CollectionRecord) -> Result<(), PersistError> {
        self.lock()?.collections.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FetchedVideo;
    use chrono::{Duration, TimeZone};

    fn node(id: &str, collected_at: DateTime<Utc>) -> VideoNode {
        let mut video = FetchedVideo::new(id, id.to_uppercase());
        video.collected_at = collected_at;
        video.view_count = Some(42);
        VideoNode::from_fetched(video, 1)
    }

    fn result(keyword: &str, nodes: Vec<VideoNode>) -> CrawlResult {
        CrawlResult {
            keyword: keyword.to_string(),
            run_date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            videos: nodes,
        }
    }

    #[test]
    fn test_watched_record_uses_unknown_sentinel() {
        let day = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let record = WatchedRecord::from_node("p", "cats", &node("a", day));

        assert_eq!(record.views, 42);
        assert_eq!(record.likes, UNKNOWN_METRIC);
        assert_eq!(record.comments, UNKNOWN_METRIC);
        assert_eq!(record.date, day);
    }

    #[test]
    fn test_matches_same_calendar_day_only() {
        let morning = Utc.with_ymd_and_hms(2024, 5, 1, 0, 5, 0).unwrap();
        let record = WatchedRecord::from_node("p", "cats", &node("a", morning));

        assert!(record.matches("p", "cats", "a", morning + Duration::hours(23)));
        assert!(!record.matches("p", "cats", "a", morning + Duration::days(1)));
        assert!(!record.matches("other", "cats", "a", morning));
        assert!(!record.matches("p", "dogs", "a", morning));
        assert!(!record.matches("p", "cats", "b", morning));
    }

    #[tokio::test]
    async fn test_write_store_records() {
        let day = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let store = MemoryStore::new();
        let result = result("cats", vec![node("a", day), node("b", day)]);

        let report = write_store_records(&store, "p", &result).await;

        assert!(report.collection_saved);
        assert_eq!(report.stored, 2);
        assert_eq!(store.video_count(), 2);
        assert_eq!(store.watched().len(), 2);
        assert_eq!(store.collections().len(), 1);
    }

    #[tokio::test]
    async fn test_same_day_rerun_is_skipped() {
        let day = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let store = MemoryStore::new();

        write_store_records(&store, "p", &result("cats", vec![node("a", day)])).await;
        let later = result("cats", vec![node("a", day + Duration::hours(3))]);
        let report = write_store_records(&store, "p", &later).await;

        assert_eq!(report.skipped, 1);
        assert_eq!(report.stored, 0);
        assert_eq!(store.watched().len(), 1);
        // the collection snapshot is recorded for every run
        assert_eq!(store.collections().len(), 2);

        // a different keyword is a different watch
        let report = write_store_records(&store, "p", &result("dogs", vec![node("a", day)])).await;
        assert_eq!(report.stored, 1);
        assert_eq!(store.video_count(), 1);
    }

    // A store whose writes fail for one video id
    struct FlakyStore {
        inner: MemoryStore,
        broken_id: &'static str,
    }

    #[async_trait]
    impl RecordStore for FlakyStore {
        async fn already_recorded_today(
            &self,
            project_id: &str,
            keyword: &str,
            video_id: &str,
            date: DateTime<Utc>,
        ) -> Result<bool, PersistError> {
            self.inner
                .already_recorded_today(project_id, keyword, video_id, date)
                .await
        }

        async fn find_video(&self, id: &str) -> Result<Option<VideoRecord>, PersistError> {
            self.inner.find_video(id).await
        }

        async fn insert_video(&self, record: VideoRecord) -> Result<(), PersistError> {
            if record.id == self.broken_id {
                return Err(PersistError::write_failed("video", "disk full"));
            }
            self.inner.insert_video(record).await
        }

        async fn append_watched(&self, record: WatchedRecord) -> Result<(), PersistError> {
            self.inner.append_watched(record).await
        }

        async fn save_collection(&self, _record: CollectionRecord) -> Result<(), PersistError> {
            Err(PersistError::write_failed("collection", "disk full"))
        }
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_others() {
        let day = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let store = FlakyStore {
            inner: MemoryStore::new(),
            broken_id: "b",
        };
        let result = result("cats", vec![node("a", day), node("b", day), node("c", day)]);

        let report = write_store_records(&store, "p", &result).await;

        assert!(!report.collection_saved);
        assert_eq!(report.failed, 1);
        assert_eq!(report.stored, 2);
        assert_eq!(store.inner.watched().len(), 2);
    }
}
