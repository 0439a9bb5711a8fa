//! Platform-specific path utilities for mdeoff.

use std::path::PathBuf;

use crate::error::{ConsoleError, Result};

/// Get the configuration directory for mdeoff.
///
/// - Linux: `~/.config/mdeoff`
/// - macOS: `~/Library/Application Support/mdeoff`
/// - Windows: `%APPDATA%\mdeoff`
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| ConsoleError::Config("Cannot determine config directory".to_string()))?;
    Ok(base.join("mdeoff"))
}

/// Get the main configuration file path.
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}
