//! Append-only JSON-lines activity log.
//!
//! One `ActivityEntry` per line. No rotation or indexing: `recent` scans the
//! whole file.

use super::StorageError;
use crate::models::ActivityEntry;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct ActivityLog {
    path: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            write_lock: Mutex::new(()),
        }
    }

    /// A log that records nothing.
    pub fn disabled() -> Self {
        Self {
            path: None,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one entry. Appends are serialised so lines never interleave.
    pub async fn append(&self, entry: &ActivityEntry) -> Result<(), StorageError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };

        let mut line = serde_json::to_string(entry)
            .map_err(|e| StorageError::Other(format!("Failed to serialize activity: {}", e)))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Other(format!("Failed to create log dir: {}", e)))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| StorageError::Other(format!("Failed to open activity log: {}", e)))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StorageError::Other(format!("Failed to write activity log: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| StorageError::Other(format!("Failed to flush activity log: {}", e)))?;
        Ok(())
    }

    /// Append, logging instead of failing. Activity is never worth failing a request over.
    pub async fn record(&self, entry: ActivityEntry) {
        if let Err(e) = self.append(&entry).await {
            warn!(
                action = %entry.action,
                entity_id = %entry.entity_id,
                "Failed to record activity: {}",
                e
            );
        }
    }

    /// Newest entries for a manuscript, at most `limit`.
    pub async fn recent(
        &self,
        manuscript_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ActivityEntry>, StorageError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(Vec::new());
        };

        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::Other(format!(
                    "Failed to read activity log: {}",
                    e
                )));
            }
        };

        let entries = contents
            .lines()
            .rev()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<ActivityEntry>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping malformed activity line: {}", e);
                    None
                }
            })
            .filter(|entry| entry.manuscript_id == Some(manuscript_id))
            .take(limit)
            .collect();
        Ok(entries)
    }
}
