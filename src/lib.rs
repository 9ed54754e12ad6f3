//! Run-scoped shared cache and declared dependencies for API test suites.
//!
//! A [`Suite`] holds [`TestCase`]s. A case may declare that it depends on another
//! case and on a key that case writes into the run [`CacheStore`]. The [`Runner`]
//! orders cases so prerequisites run first, checks the declared keys before a
//! dependent runs, and clears the cache at the start and end of every run.

pub mod cache;
pub mod case;
pub mod configuration;
pub mod dependency;
pub mod display;
pub mod errors;
pub mod filesystem;
pub mod logging;
pub mod report;
pub mod runner;
pub mod scheduler;
pub mod snapshot;

pub use cache::{CacheEntry, CacheError, CacheStore};
pub use case::{CaseResult, Parametrized, Suite, TestCase, TestContext};
pub use dependency::{
    Dependence, DependencyDeclaration, MissingDependencyError, MissingReason, RunPolicy,
};
pub use errors::{Advice, RunError};
pub use report::{CaseReport, RunReport, TestOutcome};
pub use runner::{CacheLevel, Runner, Settings};
pub use scheduler::{Plan, SchedulingError, Selection};
