use chrono::Duration;
use colored::{ColoredString, Colorize};
use serde::{Serialize, Serializer};

use crate::dependency::MissingDependencyError;
use crate::display::Display;
use crate::errors::Advice;
use crate::logging::{self, Message, Stdout, StdoutError, Verbosity};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    /// The body returned an error or panicked.
    Failed { message: String },
    /// The body was not executed: a declared prerequisite did not execute or its key was absent.
    MissingDependency(MissingDependencyError),
}

impl TestOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub id: String,
    pub outcome: TestOutcome,
    /// How many times the body ran, prerequisite re-executions included.
    pub executions: usize,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(duration.num_milliseconds())
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub cases: Vec<CaseReport>,
    pub passed: usize,
    pub failed: usize,
    pub missing_dependencies: usize,
}

impl RunReport {
    pub fn new(cases: Vec<CaseReport>) -> Self {
        let mut report = RunReport {
            cases,
            ..RunReport::default()
        };
        for case in &report.cases {
            match case.outcome {
                TestOutcome::Passed => report.passed += 1,
                TestOutcome::Failed { .. } => report.failed += 1,
                TestOutcome::MissingDependency(_) => report.missing_dependencies += 1,
            }
        }
        report
    }

    pub fn get(&self, id: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|case| case.id == id)
    }

    pub fn outcome(&self, id: &str) -> Option<&TestOutcome> {
        self.get(id).map(|case| &case.outcome)
    }

    pub fn success(&self) -> bool {
        self.failed == 0 && self.missing_dependencies == 0
    }

    pub fn print(&self) -> Result<(), StdoutError> {
        logging::stdoutln(self)
    }
}

impl Stdout for RunReport {}

impl Message for RunReport {
    fn standard(&self, verbosity: Verbosity) -> ColoredString {
        if verbosity == Verbosity::Quiet {
            return ColoredString::from("");
        }

        let mut lines = Vec::with_capacity(self.cases.len() + 1);
        for case in &self.cases {
            let timing = if verbosity == Verbosity::Normal {
                String::new()
            } else {
                format!(" ({}x, {})", case.executions, case.duration.to_display())
            };
            match &case.outcome {
                TestOutcome::Passed => {
                    lines.push(format!("{} {}{}", "PASS".green().bold(), case.id, timing))
                }
                TestOutcome::Failed { message } => lines.push(format!(
                    "{} {}{}: {}",
                    "FAIL".red().bold(),
                    case.id,
                    timing,
                    message
                )),
                TestOutcome::MissingDependency(missing) => {
                    lines.push(format!(
                        "{} {}{}: {}",
                        "MISSING DEPENDENCY".magenta().bold(),
                        case.id,
                        timing,
                        missing
                    ));
                    if let Some(advice) = missing.advice() {
                        lines.push(format!("    {}", advice));
                    }
                }
            }
        }

        let summary = format!(
            "{} passed, {} failed, {} missing dependencies",
            self.passed, self.failed, self.missing_dependencies
        );
        let summary = if self.success() {
            summary.green()
        } else {
            summary.red()
        };
        lines.push(format!("\n{}", summary.bold()));

        ColoredString::from(lines.join("\n").as_str())
    }
}
