//! Configuration management for autodeps
//!
//! Settings are loaded from environment variables with sensible defaults.
//! Command-line arguments override them in the binary.
//!
//! # Environment Variables
//!
//! - `AUTODEPS_LOG_LEVEL`: Logging level - default: "info"
//! - `AUTODEPS_CACHE_ENABLED`: Reuse parsed transcripts (true|false) - default: "false"
//! - `AUTODEPS_CACHE_FILE`: Parse cache location - default: "logparse.cache.json"
//! - `AUTODEPS_OUTPUT_NAME`: Per-directory document filename - default: "AutoBuildDeps.yaml"
//! - `AUTODEPS_OVERRIDES`: Override document used when none is given - default: "autogen.yaml"
//!
//! # Example
//!
//! ```no_run
//! use autodeps::AutodepsConfig;
//!
//! let config = AutodepsConfig::default();
//! config.validate().expect("Invalid configuration");
//! println!("{}", config);
//! ```

use crate::model::Conventions;
use crate::util::logging::parse_level;
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_CACHE_ENABLED: bool = false;
const DEFAULT_CACHE_FILE: &str = "logparse.cache.json";
const DEFAULT_OUTPUT_NAME: &str = "AutoBuildDeps.yaml";
const DEFAULT_OVERRIDES_FILE: &str = "autogen.yaml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Main configuration structure for autodeps
#[derive(Debug, Clone)]
pub struct AutodepsConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Reuse a previously parsed transcript when it is still fresh
    pub cache_enabled: bool,

    /// Where the parse cache lives
    pub cache_file: PathBuf,

    /// Filename of each emitted dependency document
    pub output_name: String,

    /// Override document consulted when none is given explicitly
    pub overrides_file: PathBuf,

    /// Build-tree naming conventions
    pub conventions: Conventions,
}

impl Default for AutodepsConfig {
    fn default() -> Self {
        let log_level = env::var("AUTODEPS_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let cache_enabled = env::var("AUTODEPS_CACHE_ENABLED")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(DEFAULT_CACHE_ENABLED);

        let cache_file = env::var("AUTODEPS_CACHE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_FILE));

        let output_name =
            env::var("AUTODEPS_OUTPUT_NAME").unwrap_or_else(|_| DEFAULT_OUTPUT_NAME.to_string());

        let overrides_file = env::var("AUTODEPS_OVERRIDES")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_OVERRIDES_FILE));

        Self {
            log_level,
            cache_enabled,
            cache_file,
            output_name,
            overrides_file,
            conventions: Conventions::default(),
        }
    }
}

impl AutodepsConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the log level is unknown, the output name is
    /// not a plain filename, or the conventions are inconsistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if parse_level(&self.log_level).is_none() {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        if self.output_name.is_empty() || self.output_name.contains('/') {
            return Err(ConfigError::ValidationFailed(format!(
                "Output name must be a plain filename, got '{}'",
                self.output_name
            )));
        }

        if self.conventions.compilers.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "At least one compiler name is required".to_string(),
            ));
        }

        if self
            .conventions
            .shared_extensions
            .contains(&self.conventions.static_extension)
        {
            return Err(ConfigError::ValidationFailed(format!(
                "Extension '{}' cannot be both static and shared",
                self.conventions.static_extension
            )));
        }

        Ok(())
    }
}

impl fmt::Display for AutodepsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Autodeps Configuration:")?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Cache Enabled: {}", self.cache_enabled)?;
        writeln!(f, "  Cache File: {}", self.cache_file.display())?;
        writeln!(f, "  Output Name: {}", self.output_name)?;
        writeln!(f, "  Overrides: {}", self.overrides_file.display())?;
        writeln!(
            f,
            "  Nested Root Marker: {}",
            self.conventions.nested_root_marker
        )?;
        Ok(())
    }
}
