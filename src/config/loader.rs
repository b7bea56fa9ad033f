//! Configuration file discovery and loading.

use crate::config::schema::VkDiagConfig;
use crate::error::{Result, VkDiagError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default config location: `<config_dir>/vkdiag/config.yml`.
pub fn default_config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("vkdiag").join("config.yml"))
}

/// Load a single config file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<VkDiagConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            VkDiagError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            VkDiagError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content into a config.
///
/// Empty content yields the defaults.
pub fn parse_config(content: &str, source_path: &Path) -> Result<VkDiagConfig> {
    if content.trim().is_empty() {
        return Ok(VkDiagConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| VkDiagError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load config with optional path override.
///
/// An explicit path must exist. Without one, the default location is used
/// when present and the built-in defaults otherwise.
pub fn load_config(config_override: Option<&Path>) -> Result<VkDiagConfig> {
    if let Some(path) = config_override {
        debug!("Loading config from {}", path.display());
        return load_config_file(path);
    }

    match default_config_path() {
        Some(path) if path.is_file() => {
            debug!("Loading config from {}", path.display());
            load_config_file(&path)
        }
        _ => {
            debug!("No config file, using defaults");
            Ok(VkDiagConfig::default())
        }
    }
}
