//! history.rs: persisted, append-only list of announcements already forwarded.
//!
//! The store is read once at the start of a run and written once at the end.
//! Deduplication is by `href`; link-less records never match anything and are
//! therefore forwarded on every run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::announcement::AnnouncementRecord;
use crate::error::PersistenceError;

pub type History = Vec<AnnouncementRecord>;

pub const DEFAULT_HISTORY_PATH: &str = "duyurular.json";

/// Records of `current` whose `href` does not occur in `previous`, in order.
pub fn diff_new(
    current: &[AnnouncementRecord],
    previous: &[AnnouncementRecord],
) -> Vec<AnnouncementRecord> {
    let seen: HashSet<&str> = previous.iter().filter_map(|a| a.href.as_deref()).collect();

    tracing::debug!(
        previous = previous.len(),
        current = current.len(),
        known_hrefs = seen.len(),
        "diffing announcements"
    );

    current
        .iter()
        .filter(|a| match a.href.as_deref() {
            Some(href) => !seen.contains(href),
            None => true,
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored history. A missing or corrupt file yields an empty history.
    pub async fn load(&self) -> History {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no history file yet");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "error reading history file: {e}");
                return Vec::new();
            }
        };

        match serde_json::from_str::<History>(&raw) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "history file is corrupt, starting empty: {e}"
                );
                Vec::new()
            }
        }
    }

    /// Write `previous ++ new_ones`, replacing the old file atomically.
    /// Returns the number of records written.
    pub async fn persist(
        &self,
        previous: &[AnnouncementRecord],
        new_ones: &[AnnouncementRecord],
    ) -> Result<usize, PersistenceError> {
        let all: Vec<&AnnouncementRecord> = previous.iter().chain(new_ones.iter()).collect();
        let mut body = serde_json::to_vec_pretty(&all)?;
        body.push(b'\n');

        let io_err = |source: std::io::Error| PersistenceError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await.map_err(io_err)?;
        }

        let tmp = self.tmp_path();
        let written = match fs::write(&tmp, &body).await {
            Ok(()) => fs::rename(&tmp, &self.path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            // a failed write can leave a partial temp file behind
            let _ = fs::remove_file(&tmp).await;
            return Err(io_err(e));
        }

        tracing::info!(
            path = %self.path.display(),
            count = all.len(),
            bytes = body.len(),
            "saved announcements"
        );
        Ok(all.len())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_HISTORY_PATH.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
