//! Registry of tracked URLs for the scheduled re-scrape job.
//!
//! A plain text file with one URL per line. URLs are appended the first time
//! they are tracked and never removed; duplicates are detected by exact
//! string match only.

use crate::error::TrackError;
use crate::utils::ensure_parent_dir;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

#[derive(Debug)]
pub struct UrlRegistry {
    path: PathBuf,
    lock: Mutex<()>,
}

impl UrlRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        UrlRegistry {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `url` unless it is already listed.
    ///
    /// Returns `true` when the URL was added.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), %url))]
    pub async fn ensure_present(&self, url: &str) -> Result<bool, TrackError> {
        let _guard = self.lock.lock().await;

        let existing = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(TrackError::storage(self.path.display(), e)),
        };

        if existing.lines().any(|line| line == url) {
            debug!("URL already registered");
            return Ok(false);
        }

        let mut entry = String::new();
        if !existing.is_empty() && !existing.ends_with('\n') {
            entry.push('\n');
        }
        entry.push_str(url);
        entry.push('\n');

        ensure_parent_dir(&self.path)
            .await
            .map_err(|e| TrackError::storage(self.path.display(), e))?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| TrackError::storage(self.path.display(), e))?;
        file.write_all(entry.as_bytes())
            .await
            .map_err(|e| TrackError::storage(self.path.display(), e))?;
        file.flush()
            .await
            .map_err(|e| TrackError::storage(self.path.display(), e))?;

        info!("Registered URL for scheduled tracking");
        Ok(true)
    }
}
