//! Configuration loading and parsing for vkdiag.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//!
//! # Example
//!
//! ```
//! use vkdiag::config::load_config;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join("config.yml");
//! fs::write(&path, "drivers:\n  warning_months: 12\n").unwrap();
//!
//! let config = load_config(Some(&path)).unwrap();
//! assert_eq!(config.drivers.warning_months, 12);
//! assert_eq!(config.drivers.advisory_months, 2);
//! ```
//!
//! # Configuration File Location
//!
//! `--config <path>` wins; otherwise `<config_dir>/vkdiag/config.yml` is
//! used when it exists.

pub mod loader;
pub mod schema;

pub use loader::{default_config_path, load_config, load_config_file, parse_config};
pub use schema::{
    DriverSettings, KnownLayerConfig, LayerSettings, LoaderSettings, UpdateSettings, VkDiagConfig,
    DEFAULT_RELEASES_URL,
};
