use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::configuration::{parse_option, Configuration, ConfigurationError};
use crate::dependency::RunPolicy;
use crate::display::Display;
use crate::logging::Verbosity;
use crate::runner::CacheLevel;

pub fn get_directory() -> Option<PathBuf> {
    dirs::config_dir().map(|mut d| {
        d.push("casecache");
        d
    })
}

pub struct FSConfiguration<T: Configuration> {
    cfg: Option<MainConfiguration>,
    origin: String,
    default: T,
}

impl<T: Configuration> FSConfiguration<T> {
    pub fn new(cfg_file: Option<PathBuf>, default: T) -> Result<Self, MainConfigurationInitError> {
        let origin = match &cfg_file {
            Some(path) => format!("file '{}'", path.to_display()),
            None => "configuration file".to_string(),
        };
        let cfg = MainConfiguration::from(cfg_file)?;
        Ok(FSConfiguration {
            cfg,
            origin,
            default,
        })
    }

    fn run(&self) -> Option<&RunConfiguration> {
        self.cfg.as_ref().and_then(|cfg| cfg.run.as_ref())
    }

    fn cache(&self) -> Option<&CacheConfiguration> {
        self.cfg.as_ref().and_then(|cfg| cfg.cache.as_ref())
    }

    fn output(&self) -> Option<&OutputConfiguration> {
        self.cfg.as_ref().and_then(|cfg| cfg.output.as_ref())
    }
}

impl<T: Configuration> Configuration for FSConfiguration<T> {
    fn run_policy(&self) -> Result<RunPolicy, ConfigurationError> {
        if let Some(policy) = self.run().and_then(|run| run.policy.as_ref()) {
            return parse_option(policy, "[shared,isolated]", self.origin.clone());
        }
        self.default.run_policy()
    }

    fn resolve_prerequisites(&self) -> Result<bool, ConfigurationError> {
        if let Some(resolve) = self.run().and_then(|run| run.resolve_prerequisites) {
            return Ok(resolve);
        }
        self.default.resolve_prerequisites()
    }

    fn cache_level(&self) -> Result<CacheLevel, ConfigurationError> {
        if let Some(level) = self.cache().and_then(|cache| cache.level.as_ref()) {
            return parse_option(level, "[memory,full]", self.origin.clone());
        }
        self.default.cache_level()
    }

    fn cache_directory(&self) -> Result<Option<PathBuf>, ConfigurationError> {
        if let Some(directory) = self.cache().and_then(|cache| cache.directory.as_ref()) {
            return Ok(Some(directory.clone()));
        }
        self.default.cache_directory()
    }

    fn no_color(&self) -> Result<Option<bool>, ConfigurationError> {
        if let Some(no_color) = self.output().and_then(|output| output.no_color) {
            return Ok(Some(no_color));
        }
        self.default.no_color()
    }

    fn verbosity(&self) -> Result<Verbosity, ConfigurationError> {
        if let Some(verbosity) = self.output().and_then(|output| output.verbosity.as_ref()) {
            return parse_option(
                verbosity,
                "[quiet,normal,info,debug,trace]",
                self.origin.clone(),
            );
        }
        self.default.verbosity()
    }
}

#[derive(Deserialize, Serialize, Default)]
pub struct MainConfiguration {
    pub run: Option<RunConfiguration>,
    pub cache: Option<CacheConfiguration>,
    pub output: Option<OutputConfiguration>,
}

#[derive(Debug, Error)]
pub enum MainConfigurationInitError {
    #[error("Check existence of configuration file ({path}): {source}")]
    ExistenceCheck {
        path: String,
        source: std::io::Error,
    },
    #[error("Read configuration file ({path}): {source}")]
    ReadConfigurationFile {
        path: String,
        source: std::io::Error,
    },
    #[error("Could not deserialize configuration file ({path}): {source}")]
    ConfigurationFileDeserialization {
        path: String,
        source: toml::de::Error,
    },
}

impl MainConfiguration {
    fn from(path: Option<PathBuf>) -> Result<Option<Self>, MainConfigurationInitError> {
        let Some(path) = path else {
            return Ok(None);
        };
        let exists = path
            .try_exists()
            .map_err(|e| MainConfigurationInitError::ExistenceCheck {
                path: path.to_display(),
                source: e,
            })?;
        if !exists {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| {
            MainConfigurationInitError::ReadConfigurationFile {
                path: path.to_display(),
                source: e,
            }
        })?;
        let result: MainConfiguration = toml::from_str(&content).map_err(|e| {
            MainConfigurationInitError::ConfigurationFileDeserialization {
                path: path.to_display(),
                source: e,
            }
        })?;
        Ok(Some(result))
    }
}

#[derive(Deserialize, Serialize)]
pub struct RunConfiguration {
    pub policy: Option<String>,
    pub resolve_prerequisites: Option<bool>,
}

#[derive(Deserialize, Serialize)]
pub struct CacheConfiguration {
    pub level: Option<String>,
    pub directory: Option<PathBuf>,
}

#[derive(Deserialize, Serialize)]
pub struct OutputConfiguration {
    pub no_color: Option<bool>,
    pub verbosity: Option<String>,
}

#[cfg(test)]
mod tests {
    use crate::configuration::default::DefaultConfiguration;

    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("casecache.toml");
        std::fs::write(&file, content).unwrap();
        (dir, file)
    }

    #[test]
    fn test_get_directory() {
        let result = get_directory();
        assert_eq!(
            result,
            dirs::config_dir().map(|mut d| {
                d.push("casecache");
                d
            })
        );
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = FSConfiguration::new(
            Some(dir.path().join("casecache.toml")),
            DefaultConfiguration,
        )
        .unwrap();

        assert_eq!(cfg.run_policy().unwrap(), RunPolicy::Shared);
        assert!(cfg.resolve_prerequisites().unwrap());
        assert_eq!(cfg.cache_level().unwrap(), CacheLevel::Memory);
    }

    #[test]
    fn test_file_values() {
        let (_dir, file) = write_config(
            r#"
[run]
policy = "isolated"
resolve_prerequisites = false

[cache]
level = "full"
directory = "/tmp/casecache-run"

[output]
no_color = true
verbosity = "debug"
"#,
        );

        let cfg = FSConfiguration::new(Some(file), DefaultConfiguration).unwrap();

        assert_eq!(cfg.run_policy().unwrap(), RunPolicy::Isolated);
        assert!(!cfg.resolve_prerequisites().unwrap());
        assert_eq!(cfg.cache_level().unwrap(), CacheLevel::Full);
        assert_eq!(
            cfg.cache_directory().unwrap(),
            Some(PathBuf::from("/tmp/casecache-run"))
        );
        assert_eq!(cfg.no_color().unwrap(), Some(true));
        assert_eq!(cfg.verbosity().unwrap(), Verbosity::Debug);
    }

    #[test]
    fn test_invalid_value() {
        let (_dir, file) = write_config("[run]\npolicy = \"parallel\"\n");

        let cfg = FSConfiguration::new(Some(file), DefaultConfiguration).unwrap();

        match cfg.run_policy() {
            Err(ConfigurationError::InvalidValueError { got, origin, .. }) => {
                assert_eq!(got, "parallel");
                assert!(origin.contains("casecache.toml"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_file() {
        let (_dir, file) = write_config("[run\npolicy = ");

        let result = FSConfiguration::new(Some(file), DefaultConfiguration);

        assert!(matches!(
            result,
            Err(MainConfigurationInitError::ConfigurationFileDeserialization { .. })
        ));
    }
}
