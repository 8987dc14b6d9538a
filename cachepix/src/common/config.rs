use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::error::{Error, Result};
use crate::image::DEFAULT_ALIGNMENT;
use crate::ops::Backend;

/// Runtime settings for the front end, loaded from YAML.
///
/// ```yaml
/// alignment: 64
/// backend: avx2
/// log_level: info
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stride alignment applied to loaded buffers. Must be a power of two.
    pub alignment: usize,
    /// Forced backend. `None` auto-detects.
    pub backend: Option<Backend>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alignment: DEFAULT_ALIGNMENT,
            backend: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Config> {
        let config: Config = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&yaml)?;
        tracing::debug!(path = %path.as_ref().display(), ?config, "Loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.alignment.is_power_of_two() {
            return Err(Error::Config(format!(
                "alignment {} is not a power of two",
                self.alignment
            )));
        }
        if self.log_level.trim().is_empty() {
            return Err(Error::Config("log_level must not be empty".to_string()));
        }
        common::log_setup::parse_filter(&self.log_level)
            .map_err(|e| Error::Config(format!("{:#}", e)))?;
        Ok(())
    }

    /// Returns the forced backend if it is available, or the detected one.
    pub fn resolve_backend(&self) -> Result<Backend> {
        match self.backend {
            Some(backend) if backend.is_available() => Ok(backend),
            Some(backend) => Err(Error::UnsupportedBackend(backend)),
            None => Ok(Backend::detect()),
        }
    }
}
