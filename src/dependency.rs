use std::collections::HashMap;

use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::cache::CacheStore;
use crate::errors::Advice;

/// Declares that a test case needs `key` in the run cache, written by `prerequisite`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependence {
    pub prerequisite: String,
    pub key: String,
}

impl Dependence {
    pub fn new(prerequisite: impl Into<String>, key: impl Into<String>) -> Self {
        Dependence {
            prerequisite: prerequisite.into(),
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDeclaration {
    pub dependent: String,
    pub prerequisite: String,
    pub key: String,
}

impl DependencyDeclaration {
    pub fn new(dependent: &str, dependence: &Dependence) -> Self {
        DependencyDeclaration {
            dependent: dependent.to_string(),
            prerequisite: dependence.prerequisite.clone(),
            key: dependence.key.clone(),
        }
    }

    /// Holds when `prerequisite` executed at least once in this run (`executions` counts
    /// executions per case id) and `key` is in the run cache.
    pub async fn check(
        &self,
        cache: &CacheStore,
        executions: &HashMap<String, usize>,
    ) -> Result<(), MissingDependencyError> {
        let executed = executions
            .get(&self.prerequisite)
            .is_some_and(|count| *count > 0);
        let reason = if !executed {
            MissingReason::PrerequisiteNotExecuted
        } else if !cache.contains(&self.key).await {
            MissingReason::KeyAbsent
        } else {
            return Ok(());
        };
        Err(MissingDependencyError {
            dependent: self.dependent.clone(),
            prerequisite: self.prerequisite.clone(),
            key: self.key.clone(),
            reason,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingReason {
    #[strum(to_string = "the prerequisite has not executed in this run")]
    PrerequisiteNotExecuted,
    #[strum(to_string = "the key is absent from the run cache")]
    KeyAbsent,
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("'{dependent}' needs key '{key}' from '{prerequisite}', but {reason}")]
pub struct MissingDependencyError {
    pub dependent: String,
    pub prerequisite: String,
    pub key: String,
    pub reason: MissingReason,
}

impl Advice for MissingDependencyError {
    fn advice(&self) -> Option<ColoredString> {
        let hint = match self.reason {
            MissingReason::PrerequisiteNotExecuted => format!(
                "Select '{}' along with '{}', or enable prerequisite resolution.",
                self.prerequisite, self.dependent
            ),
            MissingReason::KeyAbsent => format!(
                "Check that '{}' passes and writes '{}' into the cache.",
                self.prerequisite, self.key
            ),
        };
        Some(hint.yellow())
    }
}

/// How a prerequisite shared by several dependents is executed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum RunPolicy {
    /// Executes once per run; its cache writes are visible to every dependent.
    #[default]
    #[strum(to_string = "shared", serialize = "shared_run")]
    Shared,
    /// Executes again before each dependent.
    #[strum(to_string = "isolated", serialize = "isolated_run")]
    Isolated,
}
