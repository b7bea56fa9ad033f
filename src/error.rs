//! Error types for vkdiag operations.
//!
//! This module defines [`VkDiagError`], the primary error type used by the
//! CLI and plumbing layers, [`StoreError`] for classified failures reported
//! by the registry store and elevation collaborators, and a [`Result`] type
//! alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - The scan engine never propagates [`StoreError`]; it matches on the
//!   error kind and downgrades the relevant outcome flag instead
//! - Use `VkDiagError` for failures that end a command (bad config, missing
//!   snapshot)
//! - Use `anyhow::Error` (via `VkDiagError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for vkdiag operations.
#[derive(Debug, Error)]
pub enum VkDiagError {
    /// Configuration file not found at the requested location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Registry snapshot file does not exist.
    #[error("Registry snapshot not found: {path}")]
    SnapshotNotFound { path: PathBuf },

    /// Registry snapshot has an unexpected shape.
    #[error("Invalid registry snapshot at {path}: {message}")]
    SnapshotParseError { path: PathBuf, message: String },

    /// A store operation failed outside of the scan engine.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for vkdiag operations.
pub type Result<T> = std::result::Result<T, VkDiagError>;

/// Classified failure from a store or elevation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The key or value does not exist.
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// The caller lacks write access to the key.
    #[error("Access denied: {path}")]
    AccessDenied { path: String },

    /// Elevation was requested but could not be obtained.
    #[error("Elevation failed: {message}")]
    ElevationFailed { message: String },

    /// Any other store failure.
    #[error("Store operation failed on {path}: {message}")]
    Failed { path: String, message: String },
}

/// Coarse classification of a [`StoreError`], for policy matching and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    NotFound,
    AccessDenied,
    ElevationFailed,
    Failed,
}

impl StoreError {
    /// The classification of this error.
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::NotFound { .. } => StoreErrorKind::NotFound,
            StoreError::AccessDenied { .. } => StoreErrorKind::AccessDenied,
            StoreError::ElevationFailed { .. } => StoreErrorKind::ElevationFailed,
            StoreError::Failed { .. } => StoreErrorKind::Failed,
        }
    }
}

/// Result type alias for store collaborator calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_not_found_displays_path() {
        let err = VkDiagError::ConfigNotFound {
            path: PathBuf::from("/etc/vkdiag/config.yml"),
        };
        assert!(err.to_string().contains("/etc/vkdiag/config.yml"));
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = VkDiagError::ConfigParseError {
            path: PathBuf::from("/config.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/config.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn snapshot_parse_error_displays_message() {
        let err = VkDiagError::SnapshotParseError {
            path: PathBuf::from("machine.json"),
            message: "root must be an object".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("machine.json"));
        assert!(msg.contains("root must be an object"));
    }

    #[test]
    fn store_error_kinds() {
        let denied = StoreError::AccessDenied {
            path: "HKEY_LOCAL_MACHINE\\SOFTWARE".into(),
        };
        assert_eq!(denied.kind(), StoreErrorKind::AccessDenied);

        let elevation = StoreError::ElevationFailed {
            message: "user declined".into(),
        };
        assert_eq!(elevation.kind(), StoreErrorKind::ElevationFailed);

        let failed = StoreError::Failed {
            path: "x".into(),
            message: "boom".into(),
        };
        assert_eq!(failed.kind(), StoreErrorKind::Failed);
        assert!(failed.to_string().contains("boom"));
    }

    #[test]
    fn store_error_converts_into_crate_error() {
        let err: VkDiagError = StoreError::NotFound { path: "k".into() }.into();
        assert!(matches!(err, VkDiagError::Store(_)));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: VkDiagError = io_err.into();
        assert!(matches!(err, VkDiagError::Io(_)));
    }
}
