use std::path::Path;
use tracing::{debug, warn};

use super::GeneratorConfig;
use crate::error::{Error, Result};

impl GeneratorConfig {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist. Environment overrides are applied afterwards.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: GeneratorConfig = toml::from_str(&content)?;
            debug!("Loaded generator configuration from {}", path.display());
            config
        } else {
            debug!(
                "No configuration at {}, using defaults",
                path.display()
            );
            GeneratorConfig::default()
        };

        config.merge_env_vars();
        config.validate()?;
        Ok(config)
    }

    pub fn merge_env_vars(&mut self) {
        self.merge_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup, so tests need not touch the
    /// process environment.
    pub fn merge_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("PAGEFORGE_LARGE_THRESHOLD") {
            match value.parse() {
                Ok(v) => self.scale.large = v,
                Err(_) => warn!("Ignoring invalid PAGEFORGE_LARGE_THRESHOLD: {}", value),
            }
        }

        if let Some(value) = lookup("PAGEFORGE_VERY_LARGE_THRESHOLD") {
            match value.parse() {
                Ok(v) => self.scale.very_large = v,
                Err(_) => warn!("Ignoring invalid PAGEFORGE_VERY_LARGE_THRESHOLD: {}", value),
            }
        }

        if let Some(value) = lookup("PAGEFORGE_FLUSH_BATCH_SIZE") {
            match value.parse() {
                Ok(v) => self.rotation.flush_batch_size = v,
                Err(_) => warn!("Ignoring invalid PAGEFORGE_FLUSH_BATCH_SIZE: {}", value),
            }
        }

        if let Some(value) = lookup("PAGEFORGE_ROTATION_WINDOW") {
            match humantime_serde::re::humantime::parse_duration(&value) {
                Ok(v) => self.rotation.window = v,
                Err(_) => warn!("Ignoring invalid PAGEFORGE_ROTATION_WINDOW: {}", value),
            }
        }
    }

    /// Parse configuration from TOML text without touching the environment
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GeneratorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
