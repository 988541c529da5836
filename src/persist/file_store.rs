// src/persist/file_store.rs
// =============================================================================
// A document store kept in a plain directory.
//
// Layout:
//   <dir>/videos.json        id -> VideoRecord (rewritten on insert)
//   <dir>/watched.jsonl      one WatchedRecord per line (append only)
//   <dir>/collections.jsonl  one CollectionRecord per line (append only)
//
// The existing videos and watched records are loaded when the store is
// opened, so dedup checks never touch the disk. A tokio Mutex serializes
// writers within the process.
// =============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::store::{CollectionRecord, RecordStore, VideoRecord, WatchedRecord};
use crate::error::PersistError;

const VIDEOS_FILE: &str = "videos.json";
const WATCHED_FILE: &str = "watched.jsonl";
const COLLECTIONS_FILE: &str = "collections.jsonl";

#[derive(Debug, Default)]
struct FileState {
    videos: HashMap<String, VideoRecord>,
    watched: Vec<WatchedRecord>,
}

pub struct FileStore {
    dir: PathBuf,
    state: Mutex<FileState>,
}

impl FileStore {
    // Opens (or creates) a store rooted at `dir`
    //
    // Parameters:
    //   dir: the store directory, created if missing
    //
    // Returns: Result<FileStore, PersistError>
    //   Error: the directory could not be created, or an existing file in it
    //          could not be read or parsed
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;

        let videos = match fs::read_to_string(dir.join(VIDEOS_FILE)).await {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        let watched = read_lines(&dir.join(WATCHED_FILE)).await?;

        Ok(Self {
            dir,
            state: Mutex::new(FileState { videos, watched }),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn append_line<T: Serialize>(&self, file: &str, record: &T) -> Result<(), PersistError> {
        let path = self.dir.join(file);
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| PersistError::write_failed(path.display().to_string(), e))?;
        handle
            .write_all(line.as_bytes())
            .await
            .map_err(|e| PersistError::write_failed(path.display().to_string(), e))?;
        handle.flush().await?;
        Ok(())
    }
}

// Reads a JSON-lines file, treating a missing file as empty
async fn read_lines(path: &Path) -> Result<Vec<WatchedRecord>, PersistError> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(PersistError::from))
        .collect()
}

#[async_trait]
impl RecordStore for FileStore {
    async fn already_recorded_today(
        &self,
        project_id: &str,
        keyword: &str,
        video_id: &str,
        date: DateTime<Utc>,
    ) -> Result<bool, PersistError> {
        let state = self.state.lock().await;
        Ok(state
            .watched
            .iter()
            .any(|w| w.matches(project_id, keyword, video_id, date)))
    }

    async fn find_video(&self, id: &str) -> Result<Option<VideoRecord>, PersistError> {
        Ok(self.state.lock().await.videos.get(id).cloned())
    }

    // The file is written first; memory only changes once it is on disk
    async fn insert_video(&self, record: VideoRecord) -> Result<(), PersistError> {
        let mut state = self.state.lock().await;
        if state.videos.contains_key(&record.id) {
            return Ok(());
        }

        let mut videos = state.videos.clone();
        videos.insert(record.id.clone(), record);

        let path = self.dir.join(VIDEOS_FILE);
        let json = serde_json::to_string_pretty(&videos)?;
        fs::write(&path, json)
            .await
            .map_err(|e| PersistError::write_failed(path.display().to_string(), e))?;

        state.videos = videos;
        Ok(())
    }

    async fn append_watched(&self, record: WatchedRecord) -> Result<(), PersistError> {
        let mut state = self.state.lock().await;
        self.append_line(WATCHED_FILE, &record).await?;
        state.watched.push(record);
        Ok(())
    }

    async fn save_collection(&self, record: CollectionRecord) -> Result<(), PersistError> {
        // hold the lock so concurrent appends don't interleave
        let _guard = self.state.lock().await;
        self.append_line(COLLECTIONS_FILE, &record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CrawlResult, FetchedVideo, VideoNode};
    use crate::persist::write_store_records;
    use chrono::TimeZone;

    fn result(keyword: &str) -> CrawlResult {
        let mut video = FetchedVideo::new("a", "A");
        video.collected_at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        CrawlResult {
            keyword: keyword.to_string(),
            run_date: video.collected_at,
            videos: vec![VideoNode::from_fetched(video, 0)],
        }
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let tmp = tempfile::tempdir().unwrap();

        let store = FileStore::open(tmp.path()).await.unwrap();
        let report = write_store_records(&store, "p", &result("cats")).await;
        assert_eq!(report.stored, 1);
        drop(store);

        let reopened = FileStore::open(tmp.path()).await.unwrap();
        assert!(reopened.find_video("a").await.unwrap().is_some());

        let report = write_store_records(&reopened, "p", &result("cats")).await;
        assert_eq!(report.skipped, 1);

        let collections = std::fs::read_to_string(tmp.path().join(COLLECTIONS_FILE)).unwrap();
        assert_eq!(collections.lines().count(), 2);

        let watched = std::fs::read_to_string(tmp.path().join(WATCHED_FILE)).unwrap();
        assert_eq!(watched.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_failed_video_write_leaves_store_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::open(tmp.path()).await.unwrap();
        // a directory where videos.json should be makes the write fail
        std::fs::create_dir(tmp.path().join(VIDEOS_FILE)).unwrap();

        let result = result("cats");
        let node = &result.videos[0];
        let outcome = store.insert_video(VideoRecord::from(node)).await;

        assert!(matches!(outcome, Err(PersistError::WriteFailed { .. })));
        assert!(store.find_video("a").await.unwrap().is_none());

        // once the disk is writable again the same record goes in
        std::fs::remove_dir(tmp.path().join(VIDEOS_FILE)).unwrap();
        store.insert_video(VideoRecord::from(node)).await.unwrap();
        assert!(store.find_video("a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_open_empty_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::open(tmp.path().join("fresh")).await.unwrap();

        assert!(store.dir().exists());
        assert!(store.find_video("nope").await.unwrap().is_none());
    }
}
