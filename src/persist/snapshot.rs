// src/persist/snapshot.rs
// =============================================================================
// Writes a crawl result to a pretty-printed JSON file.
//
// File name: <results-dir>/<keyword-slug>-<run date>.json
//   e.g. results/lofi-hip-hop-2024-05-01T08-30-00Z.json
//
// The keyword is slugged and the timestamp uses '-' instead of ':' so the
// name is valid on every filesystem. Writing the same result twice
// overwrites the same file.
// =============================================================================

use std::path::{Path, PathBuf};

use crate::error::PersistError;
use crate::model::CrawlResult;

pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, result: &CrawlResult) -> PathBuf {
        let file = format!(
            "{}-{}.json",
            slugify(&result.keyword),
            result.run_date.format("%Y-%m-%dT%H-%M-%SZ")
        );
        self.dir.join(file)
    }

    // Writes the snapshot, creating the results directory if needed
    //
    // Parameters:
    //   result: the ranked run to save
    //
    // Returns: Result<PathBuf, PersistError>
    //   Success: the path that was written
    //   Error: WriteFailed naming the directory or file that could not be written
    pub async fn write(&self, result: &CrawlResult) -> Result<PathBuf, PersistError> {
        let path = self.path_for(result);
        let json = serde_json::to_string_pretty(result)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PersistError::write_failed(self.dir.display().to_string(), e))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| PersistError::write_failed(path.display().to_string(), e))?;

        Ok(path)
    }
}

// Lowercases the keyword and collapses anything that isn't alphanumeric
// into single dashes
fn slugify(keyword: &str) -> String {
    let mut slug = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "keyword".to_string()
    } else {
        slug.to_string()
    }
}
