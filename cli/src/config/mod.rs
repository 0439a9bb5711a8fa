//! Configuration management for mdeoff.
//!
//! The config file is read-only input: the console never writes it back.

pub mod paths;
pub mod settings;

pub use paths::config_file;
pub use settings::{ApiConfig, AuthConfig, ConsoleConfig};

use std::path::Path;

use crate::error::{ConsoleError, Result};

/// Load configuration from the default config file.
///
/// If the config file doesn't exist, returns default configuration.
pub fn load_config() -> Result<ConsoleConfig> {
    let path = config_file()?;
    load_config_from(&path)
}

/// Load configuration from a specific path.
///
/// If the file doesn't exist, returns default configuration.
pub fn load_config_from(path: &Path) -> Result<ConsoleConfig> {
    if !path.exists() {
        return Ok(ConsoleConfig::default().with_env_overrides());
    }

    let contents = std::fs::read_to_string(path)?;
    let config: ConsoleConfig =
        toml::from_str(&contents).map_err(|e| ConsoleError::ConfigRead(e.to_string()))?;

    Ok(config.with_env_overrides())
}
