use colored::{ColoredString, Colorize};
use thiserror::Error;

use crate::configuration::{ConfigurationError, ConfigurationInitializationError};
use crate::filesystem::{DirectoryCreationError, FSDeleteError};
use crate::scheduler::SchedulingError;
use crate::snapshot::SnapshotError;

pub trait Advice {
    fn advice(&self) -> Option<ColoredString>;
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    SchedulingError(#[from] SchedulingError),
    #[error(transparent)]
    SnapshotError(#[from] SnapshotError),
    #[error(transparent)]
    DirectoryCreationError(#[from] DirectoryCreationError),
    #[error(transparent)]
    FSDeleteError(#[from] FSDeleteError),
    #[error(transparent)]
    ConfigurationError(#[from] ConfigurationError),
    #[error(transparent)]
    ConfigurationInitializationError(#[from] ConfigurationInitializationError),
    #[error("Cache directory unknown, but required to keep a snapshot of the run cache")]
    CacheDirectoryUnknown,
}

impl Advice for RunError {
    fn advice(&self) -> Option<ColoredString> {
        match self {
            RunError::SchedulingError(e) => e.advice(),
            RunError::CacheDirectoryUnknown => Some(
                "Set 'CASECACHE_CACHE_DIR' or use the 'memory' cache level.".yellow(),
            ),
            _ => None,
        }
    }
}
