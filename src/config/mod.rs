//! Configuration for wikiredirects

mod import;
mod logging;
mod output;
mod resolve;

pub use import::ImportConfig;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use output::OutputConfig;
pub use resolve::ResolveConfig;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "wikiredirects.toml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Dump reading configuration
    #[serde(default)]
    pub import: ImportConfig,
    /// Redirect resolution configuration
    #[serde(default)]
    pub resolve: ResolveConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| {
                anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
            })?;
        let config = Self::from_toml(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file '{}': {}", path.display(), e))?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate all configuration fields.
    ///
    /// Every problem is collected and reported in one error.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        // Resolution
        if self.resolve.max_depth == 0 {
            errors.push("resolve.max_depth must be positive".to_string());
        }
        if self.resolve.partitions == Some(0) {
            errors.push("resolve.partitions must be positive".to_string());
        }
        if self.resolve.threads == Some(0) {
            errors.push("resolve.threads must be positive".to_string());
        }

        // Import
        if let Some(ref base_url) = self.import.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                errors.push(format!(
                    "import.base_url must be an http(s) URL, got '{}'",
                    base_url
                ));
            }
        }
        if self.import.max_records == Some(0) {
            errors.push("import.max_records must be positive".to_string());
        }

        // Output
        if self.output.dir.as_os_str().is_empty() {
            errors.push("output.dir must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}
