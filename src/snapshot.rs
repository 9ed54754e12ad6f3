use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::{CacheEntry, CacheStore};
use crate::display::Display;
use crate::filesystem::{self, FSDeleteError};
use crate::logging;

static SNAPSHOT_FILE_NAME: &str = "run_cache.json";

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("access snapshot '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("snapshot '{path}' is not valid json: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Disk copy of a run cache, written at teardown so the values a run produced can be inspected.
/// A run never reads it back: it is discarded when the next run starts.
#[derive(Clone, Debug)]
pub struct FSSnapshot {
    pub cache_directory: PathBuf,
}

#[derive(Serialize, Deserialize, Debug)]
struct RunSnapshot {
    written_at: DateTime<Local>,
    entries: BTreeMap<String, CacheEntry>,
}

impl FSSnapshot {
    pub fn new(cache_directory: PathBuf) -> Self {
        logging::trace!("Snapshot directory: {}", cache_directory.to_display());
        FSSnapshot { cache_directory }
    }

    pub fn path(&self) -> PathBuf {
        self.cache_directory.join(SNAPSHOT_FILE_NAME)
    }

    /// Entries of the last finished run, or `None` when there is no snapshot or it is older
    /// than `validity_period`.
    pub async fn load(
        &self,
        validity_period: Duration,
    ) -> Result<Option<Vec<CacheEntry>>, SnapshotError> {
        let file = self.path();
        if !file.exists() {
            logging::trace!("No snapshot file found: '{}'", file.to_display());
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&file)
            .await
            .map_err(|source| SnapshotError::Io {
                path: file.to_display(),
                source,
            })?;
        let snapshot: RunSnapshot =
            serde_json::from_str(&content).map_err(|source| SnapshotError::Json {
                path: file.to_display(),
                source,
            })?;

        if Local::now() - snapshot.written_at >= validity_period {
            logging::trace!("Snapshot expired: '{}'", file.to_display());
            return Ok(None);
        }
        logging::debug!("Snapshot loaded: '{}'", file.to_display());
        Ok(Some(snapshot.entries.into_values().collect()))
    }

    /// Fills `cache` with the entries of the last finished run, for post-mortem inspection.
    /// Returns `false`, leaving `cache` untouched, when no valid snapshot exists.
    pub async fn inspect_into(
        &self,
        cache: &CacheStore,
        validity_period: Duration,
    ) -> Result<bool, SnapshotError> {
        match self.load(validity_period).await? {
            Some(entries) => {
                cache.restore(entries).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn save(&self, entries: Vec<CacheEntry>) -> Result<(), SnapshotError> {
        let file = self.path();
        let snapshot = RunSnapshot {
            written_at: Local::now(),
            entries: entries
                .into_iter()
                .map(|entry| (entry.key.clone(), entry))
                .collect(),
        };

        let content =
            serde_json::to_string_pretty(&snapshot).map_err(|source| SnapshotError::Json {
                path: file.to_display(),
                source,
            })?;
        tokio::fs::write(&file, content)
            .await
            .map_err(|source| SnapshotError::Io {
                path: file.to_display(),
                source,
            })?;
        logging::debug!("Snapshot saved: '{}'", file.to_display());
        Ok(())
    }

    pub async fn discard(&self) -> Result<(), FSDeleteError> {
        filesystem::delete_file(&self.path()).await
    }
}
