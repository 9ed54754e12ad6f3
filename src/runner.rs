use std::any::Any;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_recursion::async_recursion;
use chrono::{Duration, Local};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::cache::CacheStore;
use crate::case::{Suite, TestCase, TestContext};
use crate::configuration::{self, Configuration, ConfigurationError};
use crate::dependency::RunPolicy;
use crate::errors::RunError;
use crate::filesystem;
use crate::logging;
use crate::report::{CaseReport, RunReport, TestOutcome};
use crate::scheduler::{Plan, Selection};
use crate::snapshot::FSSnapshot;

/// Where the run cache lives. `Full` also writes a snapshot of it at teardown.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum CacheLevel {
    #[default]
    Memory,
    Full,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub policy: RunPolicy,
    pub resolve_prerequisites: bool,
    pub cache_level: CacheLevel,
    pub cache_directory: Option<PathBuf>,
    pub selection: Selection,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            policy: RunPolicy::Shared,
            resolve_prerequisites: true,
            cache_level: CacheLevel::Memory,
            cache_directory: None,
            selection: Selection::All,
        }
    }
}

impl Settings {
    pub fn from_configuration(cfg: &impl Configuration) -> Result<Self, ConfigurationError> {
        Ok(Settings {
            policy: cfg.run_policy()?,
            resolve_prerequisites: cfg.resolve_prerequisites()?,
            cache_level: cfg.cache_level()?,
            cache_directory: cfg.cache_directory()?,
            selection: Selection::All,
        })
    }

    /// Resolves the layered configuration and applies its output options to the logger.
    pub fn load(config_file: Option<PathBuf>) -> Result<Self, RunError> {
        let cfg = configuration::get(config_file)?;
        configuration::apply_output(&cfg)?;
        Ok(Settings::from_configuration(&cfg)?)
    }

    pub fn with_policy(mut self, policy: RunPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_resolve_prerequisites(mut self, resolve_prerequisites: bool) -> Self {
        self.resolve_prerequisites = resolve_prerequisites;
        self
    }

    pub fn with_snapshot(mut self, cache_directory: PathBuf) -> Self {
        self.cache_level = CacheLevel::Full;
        self.cache_directory = Some(cache_directory);
        self
    }
}

pub struct Runner {
    cache: Arc<CacheStore>,
    settings: Settings,
}

impl Runner {
    pub fn new(cache: Arc<CacheStore>, settings: Settings) -> Self {
        Runner { cache, settings }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs the selected cases of `suite`. The cache is cleared before the first case
    /// and after the last one; a failing case never stops the run.
    pub async fn run(&self, suite: &Suite) -> Result<RunReport, RunError> {
        let plan = Plan::build(
            suite,
            &self.settings.selection,
            self.settings.resolve_prerequisites,
        )?;
        let snapshot = self.snapshot()?;
        self.start(snapshot.as_ref()).await?;
        logging::info!(
            "Run started: {} test case(s), {} policy",
            plan.len(),
            self.settings.policy
        );

        let mut executions: HashMap<String, usize> = HashMap::new();
        let mut refresh_failures: HashMap<String, TestOutcome> = HashMap::new();
        let mut reports = Vec::with_capacity(plan.len());
        for id in plan.ids() {
            let Some(case) = suite.get(id) else {
                continue;
            };
            if self.settings.policy == RunPolicy::Isolated {
                self.refresh_prerequisites(
                    suite,
                    &plan,
                    case,
                    &mut executions,
                    &mut refresh_failures,
                )
                .await;
            }
            let (outcome, duration) = self.execute_checked(case, &mut executions).await;
            reports.push(CaseReport {
                id: id.clone(),
                outcome,
                executions: 0,
                duration,
            });
        }
        for report in &mut reports {
            report.executions = executions.get(&report.id).copied().unwrap_or(0);
            if report.outcome.is_passed() {
                if let Some(failure) = refresh_failures.remove(&report.id) {
                    report.outcome = failure;
                }
            }
        }

        self.teardown(snapshot.as_ref()).await?;
        let report = RunReport::new(reports);
        logging::info!(
            "Run finished: {} passed, {} failed, {} missing dependencies",
            report.passed,
            report.failed,
            report.missing_dependencies
        );
        Ok(report)
    }

    fn snapshot(&self) -> Result<Option<FSSnapshot>, RunError> {
        match self.settings.cache_level {
            CacheLevel::Memory => Ok(None),
            CacheLevel::Full => {
                let directory = self
                    .settings
                    .cache_directory
                    .clone()
                    .ok_or(RunError::CacheDirectoryUnknown)?;
                Ok(Some(FSSnapshot::new(directory)))
            }
        }
    }

    async fn start(&self, snapshot: Option<&FSSnapshot>) -> Result<(), RunError> {
        self.cache.clear().await;
        if let Some(snapshot) = snapshot {
            filesystem::create_directory(&snapshot.cache_directory).await?;
            snapshot.discard().await?;
        }
        Ok(())
    }

    async fn teardown(&self, snapshot: Option<&FSSnapshot>) -> Result<(), RunError> {
        let entries = self.cache.entries().await;
        self.cache.clear().await;
        if let Some(snapshot) = snapshot {
            snapshot.save(entries).await?;
        }
        Ok(())
    }

    /// Executes again every planned prerequisite of `case`, deepest first. The keys `case`
    /// expects from a prerequisite are dropped beforehand so only a fresh write satisfies them.
    /// The first outcome that did not pass is kept per prerequisite in `failures`.
    #[async_recursion]
    async fn refresh_prerequisites(
        &self,
        suite: &Suite,
        plan: &Plan,
        case: &TestCase,
        executions: &mut HashMap<String, usize>,
        failures: &mut HashMap<String, TestOutcome>,
    ) {
        let mut prerequisites: Vec<&str> = Vec::new();
        for dependence in case.dependencies() {
            if !prerequisites.contains(&dependence.prerequisite.as_str()) {
                prerequisites.push(&dependence.prerequisite);
            }
        }

        for prerequisite_id in prerequisites {
            if !plan.contains(prerequisite_id) {
                continue;
            }
            let Some(prerequisite) = suite.get(prerequisite_id) else {
                continue;
            };
            self.refresh_prerequisites(suite, plan, prerequisite, executions, failures)
                .await;
            for dependence in case.dependencies() {
                if dependence.prerequisite == prerequisite_id {
                    self.cache.remove(&dependence.key).await;
                }
            }
            let (outcome, _) = self.execute_checked(prerequisite, executions).await;
            if !outcome.is_passed() {
                logging::warning!(
                    "Prerequisite '{}' of '{}' did not pass when executed again",
                    prerequisite_id,
                    case.id()
                );
                failures
                    .entry(prerequisite_id.to_string())
                    .or_insert(outcome);
            }
        }
    }

    async fn execute_checked(
        &self,
        case: &TestCase,
        executions: &mut HashMap<String, usize>,
    ) -> (TestOutcome, Duration) {
        let started = Local::now();
        for declaration in case.declarations() {
            if let Err(missing) = declaration.check(&self.cache, executions).await {
                logging::warning!("{}", missing);
                return (TestOutcome::MissingDependency(missing), Local::now() - started);
            }
        }
        let outcome = self.execute(case, executions).await;
        (outcome, Local::now() - started)
    }

    async fn execute(
        &self,
        case: &TestCase,
        executions: &mut HashMap<String, usize>,
    ) -> TestOutcome {
        *executions.entry(case.id().to_string()).or_insert(0) += 1;
        logging::debug!("Execute '{}'", case.id());

        let ctx = TestContext::new(case.id(), self.cache.clone());
        let outcome = match tokio::spawn(case.invoke(ctx)).await {
            Ok(Ok(())) => TestOutcome::Passed,
            Ok(Err(e)) => TestOutcome::Failed {
                message: format!("{:#}", e),
            },
            Err(join_error) if join_error.is_panic() => TestOutcome::Failed {
                message: format!("panicked: {}", panic_message(join_error.into_panic())),
            },
            Err(join_error) => TestOutcome::Failed {
                message: join_error.to_string(),
            },
        };
        logging::trace!("'{}' finished: {:?}", case.id(), outcome);
        outcome
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return message.to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic payload".to_string()
}
