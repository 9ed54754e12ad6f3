use std::path::PathBuf;

use crate::configuration::{Configuration, ConfigurationError};
use crate::dependency::RunPolicy;
use crate::logging::Verbosity;
use crate::runner::CacheLevel;

pub struct DefaultConfiguration;

impl Configuration for DefaultConfiguration {
    fn run_policy(&self) -> Result<RunPolicy, ConfigurationError> {
        Ok(RunPolicy::Shared)
    }

    fn resolve_prerequisites(&self) -> Result<bool, ConfigurationError> {
        Ok(true)
    }

    fn cache_level(&self) -> Result<CacheLevel, ConfigurationError> {
        Ok(CacheLevel::Memory)
    }

    fn cache_directory(&self) -> Result<Option<PathBuf>, ConfigurationError> {
        Ok(dirs::cache_dir().map(|mut d| {
            d.push("casecache");
            d
        }))
    }

    fn no_color(&self) -> Result<Option<bool>, ConfigurationError> {
        Ok(None)
    }

    fn verbosity(&self) -> Result<Verbosity, ConfigurationError> {
        Ok(Verbosity::Normal)
    }
}
