//! Configuration file resolution and loading
//!
//! Services resolve settings in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! This module provides the pieces shared by every service: locating the
//! TOML file, parsing it, and reading non-empty environment variables.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Application directory name used under the platform config/data dirs
pub const APP_DIR_NAME: &str = "bridge";

/// Locate the TOML config file for a service
///
/// Priority:
/// 1. Explicit path (command-line argument)
/// 2. Path in the named environment variable
/// 3. `<config_dir>/bridge/<file_name>` if it exists
///
/// Returns `None` when no file is configured or found. An explicit path
/// (CLI or ENV) is returned even when it does not exist so the caller can
/// report it.
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env_non_empty(env_var_name) {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(file_name));
    match user_config {
        Some(path) if path.exists() => Some(path),
        _ => None,
    }
}

/// Load and deserialize a TOML config file
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Read an environment variable, treating empty or whitespace-only values as unset
pub fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| is_valid_key(v))
}

/// Validate a key or identifier value (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Get OS-dependent default data folder for Bridge services
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./bridge_data"))
}
