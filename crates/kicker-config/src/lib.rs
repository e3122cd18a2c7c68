//! Configuration parsing and validation for session-kicker
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Media server connection, poll cadence, quota and enforcement settings
//! - Command-line / environment overrides applied before validation
//! - Validation with clear error messages

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Values supplied outside the config file (CLI flags, environment)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub server_url: Option<String>,
    pub api_key: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    fn apply(&self, raw: &mut RawConfig) {
        if let Some(url) = &self.server_url {
            raw.server.url = Some(url.clone());
        }
        if let Some(key) = &self.api_key {
            raw.server.api_key = Some(key.clone());
        }
        if let Some(dir) = &self.data_dir {
            raw.service.data_dir = Some(dir.clone());
        }
    }
}

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Config> {
    load_config_with_overrides(path, &ConfigOverrides::default())
}

/// Load a TOML file, apply overrides, then validate
pub fn load_config_with_overrides(
    path: impl AsRef<Path>,
    overrides: &ConfigOverrides,
) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config_with_overrides(&content, overrides)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    parse_config_with_overrides(content, &ConfigOverrides::default())
}

pub fn parse_config_with_overrides(
    content: &str,
    overrides: &ConfigOverrides,
) -> ConfigResult<Config> {
    let mut raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    overrides.apply(&mut raw);

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Config::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;
