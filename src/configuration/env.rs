use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::configuration::{parse_option, Configuration, ConfigurationError};
use crate::dependency::RunPolicy;
use crate::logging::Verbosity;
use crate::runner::CacheLevel;

#[derive(Debug, Error, PartialEq)]
#[error("Could not read value of environment variable {name}: {source}")]
pub struct UnreadableVarError {
    name: String,
    source: env::VarError,
}

fn var(name: &str) -> Result<Option<String>, UnreadableVarError> {
    match std::env::var(name) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(UnreadableVarError {
            name: name.to_string(),
            source: e,
        }),
    }
}

fn with_prefix(base_name: &str) -> String {
    format!("CASECACHE_{}", base_name)
}

fn bool_var(var_name: &str) -> Result<Option<bool>, ConfigurationError> {
    match var(var_name)? {
        None => Ok(None),
        Some(val) => match val.to_lowercase().as_str() {
            "1" | "true" => Ok(Some(true)),
            "0" | "false" => Ok(Some(false)),
            _ => Err(ConfigurationError::InvalidValueError {
                got: val,
                expected: "[0,1,true,false]".to_string(),
                origin: format!("env var '{}'", var_name),
            }),
        },
    }
}

pub fn get_config_file() -> Result<Option<PathBuf>, UnreadableVarError> {
    if let Some(cfg_file) = var(&with_prefix("CONFIG"))? {
        return Ok(Some(PathBuf::from(cfg_file)));
    }
    Ok(None)
}

pub struct EnvironmentVariablesConfiguration<T: Configuration> {
    default: T,
}

impl<T: Configuration> EnvironmentVariablesConfiguration<T> {
    pub fn new(default: T) -> Self {
        EnvironmentVariablesConfiguration { default }
    }
}

impl<T: Configuration> Configuration for EnvironmentVariablesConfiguration<T> {
    fn run_policy(&self) -> Result<RunPolicy, ConfigurationError> {
        let var_name = with_prefix("RUN_POLICY");
        if let Some(val) = var(&var_name)? {
            return parse_option(
                &val,
                "[shared,isolated]",
                format!("env var '{}'", var_name),
            );
        }
        self.default.run_policy()
    }

    fn resolve_prerequisites(&self) -> Result<bool, ConfigurationError> {
        if let Some(resolve) = bool_var(&with_prefix("RESOLVE_PREREQUISITES"))? {
            return Ok(resolve);
        }
        self.default.resolve_prerequisites()
    }

    fn cache_level(&self) -> Result<CacheLevel, ConfigurationError> {
        let var_name = with_prefix("CACHE_LEVEL");
        if let Some(val) = var(&var_name)? {
            return parse_option(&val, "[memory,full]", format!("env var '{}'", var_name));
        }
        self.default.cache_level()
    }

    fn cache_directory(&self) -> Result<Option<PathBuf>, ConfigurationError> {
        if let Some(dir) = var(&with_prefix("CACHE_DIR"))? {
            return Ok(Some(PathBuf::from(dir)));
        }
        self.default.cache_directory()
    }

    fn no_color(&self) -> Result<Option<bool>, ConfigurationError> {
        if let Some(no_color) = bool_var(&with_prefix("NO_COLOR"))? {
            return Ok(Some(no_color));
        }
        self.default.no_color()
    }

    fn verbosity(&self) -> Result<Verbosity, ConfigurationError> {
        let var_name = with_prefix("VERBOSITY");
        if let Some(val) = var(&var_name)? {
            return parse_option(
                &val,
                "[quiet,normal,info,debug,trace]",
                format!("env var '{}'", var_name),
            );
        }
        self.default.verbosity()
    }
}
