use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::configuration::default::DefaultConfiguration;
use crate::configuration::env::EnvironmentVariablesConfiguration;
use crate::configuration::files::FSConfiguration;
use crate::dependency::RunPolicy;
use crate::logging::{self, Verbosity};
use crate::runner::CacheLevel;

pub mod default;

pub mod env;

pub mod files;

#[derive(Debug, Error)]
pub enum ConfigurationInitializationError {
    #[error(transparent)]
    SystemError {
        #[from]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

/// Environment variables override the configuration file, which overrides the defaults.
pub fn get(
    config_file: Option<PathBuf>,
) -> Result<impl Configuration, ConfigurationInitializationError> {
    let cfg_file = get_config_file(config_file)
        .map_err(Arc::from)
        .map_err(|e| ConfigurationInitializationError::SystemError { source: e })?;
    let cfg = FSConfiguration::new(cfg_file, DefaultConfiguration)
        .map_err(Arc::from)
        .map_err(|e| ConfigurationInitializationError::SystemError { source: e })?;
    Ok(EnvironmentVariablesConfiguration::new(cfg))
}

#[derive(Debug, Error)]
pub enum FSRessourcesError {
    #[error(transparent)]
    EnvVarError {
        #[from]
        source: env::UnreadableVarError,
    },
}

pub fn get_config_file(explicit: Option<PathBuf>) -> Result<Option<PathBuf>, FSRessourcesError> {
    if let Some(cfg_path) = explicit {
        return Ok(Some(cfg_path));
    } else if let Some(cfg_path) = env::get_config_file()? {
        return Ok(Some(cfg_path));
    } else if let Some(mut cfg_dir) = files::get_directory() {
        cfg_dir.push("casecache.toml");
        return Ok(Some(cfg_dir));
    }
    Ok(None)
}

/// Applies the output options (verbosity, colors) to the process-wide logger.
pub fn apply_output(cfg: &impl Configuration) -> Result<(), ConfigurationError> {
    if let Some(no_color) = cfg.no_color()? {
        colored::control::set_override(!no_color);
    }
    logging::init(false, cfg.verbosity()?);
    Ok(())
}

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error(transparent)]
    EnvVarError(#[from] env::UnreadableVarError),
    #[error("value '{got}' is not valid ('{expected}') - loaded from {origin}")]
    InvalidValueError {
        got: String,
        expected: String,
        origin: String,
    },
}

pub trait Configuration {
    fn run_policy(&self) -> Result<RunPolicy, ConfigurationError>;

    fn resolve_prerequisites(&self) -> Result<bool, ConfigurationError>;

    fn cache_level(&self) -> Result<CacheLevel, ConfigurationError>;

    fn cache_directory(&self) -> Result<Option<PathBuf>, ConfigurationError>;

    fn no_color(&self) -> Result<Option<bool>, ConfigurationError>;

    fn verbosity(&self) -> Result<Verbosity, ConfigurationError>;
}

pub(crate) fn parse_option<T: std::str::FromStr>(
    value: &str,
    expected: &str,
    origin: String,
) -> Result<T, ConfigurationError> {
    value
        .parse::<T>()
        .map_err(|_| ConfigurationError::InvalidValueError {
            got: value.to_string(),
            expected: expected.to_string(),
            origin,
        })
}
