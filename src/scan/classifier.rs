//! Registration entry classification.
//!
//! Decides whether a registered path is usable and extracts the metadata
//! the duplicate and known-bad checks need from layer manifests. Every
//! function here is total: malformed input degrades to a fallback value.

use tracing::debug;

use crate::probe::{file_name, parent_dir, resolve_relative, FileProber};
use crate::store::{PathValue, RegValue};
use crate::version::Version;

use super::manifest::{LayerManifest, LayerRecord};

/// Whether a registered path points at an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Broken,
}

impl Validity {
    pub fn is_broken(&self) -> bool {
        matches!(self, Validity::Broken)
    }
}

/// Classify a single registered path.
pub fn validate(prober: &dyn FileProber, path: &str) -> Validity {
    if prober.exists(path) {
        Validity::Valid
    } else {
        Validity::Broken
    }
}

/// Validation result of a value holding one or more paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathCheck {
    /// Paths that exist, in stored order.
    pub valid: Vec<String>,
    /// Paths that do not exist, in stored order.
    pub invalid: Vec<String>,
}

impl PathCheck {
    /// A value is broken when any of its paths is.
    pub fn is_broken(&self) -> bool {
        !self.invalid.is_empty()
    }
}

/// Validate every path in a driver registration value.
pub fn check_paths(prober: &dyn FileProber, value: &PathValue) -> PathCheck {
    let mut check = PathCheck::default();
    for path in value.paths() {
        match validate(prober, path) {
            Validity::Valid => check.valid.push(path.to_string()),
            Validity::Broken => check.invalid.push(path.to_string()),
        }
    }
    check
}

/// Layer registrations store a DWORD; exactly `0` means enabled.
pub fn is_enabled(raw: Option<&RegValue>) -> bool {
    matches!(raw, Some(RegValue::Dword(0)))
}

/// A layer registration as seen during one scan pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationEntry {
    pub path: String,
    pub enabled: bool,
    pub broken: bool,
    pub conflicting: bool,
}

impl RegistrationEntry {
    /// Classify a registered path and its raw stored value.
    pub fn classify(prober: &dyn FileProber, path: &str, raw: Option<&RegValue>) -> Self {
        Self {
            path: path.to_string(),
            enabled: is_enabled(raw),
            broken: validate(prober, path).is_broken(),
            conflicting: false,
        }
    }

    /// Base file name of the registered manifest.
    pub fn file_name(&self) -> &str {
        file_name(&self.path)
    }
}

/// Display and version metadata of one layer definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDescriptor {
    pub title: String,
    pub library_version: Option<Version>,
    pub api_version: Option<Version>,
}

impl LayerDescriptor {
    /// Descriptor used when a manifest can't be read.
    pub fn fallback(manifest_path: &str) -> Self {
        Self {
            title: file_name(manifest_path).to_string(),
            library_version: None,
            api_version: None,
        }
    }

    /// Whether neither version is known.
    pub fn is_unversioned(&self) -> bool {
        self.library_version.is_none() && self.api_version.is_none()
    }
}

/// Read a layer manifest into descriptors, one per layer definition.
///
/// Never fails: unreadable, empty, or malformed manifests, and manifests
/// without layer definitions, yield a single fallback descriptor.
pub fn parse_layer_manifest(prober: &dyn FileProber, path: &str) -> Vec<LayerDescriptor> {
    let content = match prober.read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!("Failed to read layer manifest {}: {}", path, e);
            return vec![LayerDescriptor::fallback(path)];
        }
    };
    if content.trim_start_matches('\u{feff}').trim().is_empty() {
        return vec![LayerDescriptor::fallback(path)];
    }

    let manifest = match LayerManifest::parse(&content) {
        Ok(manifest) => manifest,
        Err(e) => {
            debug!("Failed to parse layer manifest {}: {}", path, e);
            return vec![LayerDescriptor::fallback(path)];
        }
    };

    let records = manifest.into_records();
    if records.is_empty() {
        return vec![LayerDescriptor::fallback(path)];
    }

    records
        .iter()
        .map(|record| describe_layer(prober, path, record))
        .collect()
}

/// The descriptor that drives conflict detection for a manifest.
pub fn primary_descriptor(prober: &dyn FileProber, path: &str) -> LayerDescriptor {
    parse_layer_manifest(prober, path)
        .into_iter()
        .next()
        .unwrap_or_else(|| LayerDescriptor::fallback(path))
}

fn describe_layer(prober: &dyn FileProber, manifest_path: &str, record: &LayerRecord) -> LayerDescriptor {
    let manifest_name = file_name(manifest_path);

    let library_version_raw = record
        .library_path
        .as_deref()
        .filter(|lib| !lib.trim().is_empty())
        .map(|lib| resolve_relative(parent_dir(manifest_path), lib))
        .filter(|lib| prober.exists(lib))
        .and_then(|lib| prober.file_version(&lib))
        .filter(|v| !v.trim().is_empty());

    let api_version_raw = record
        .api_version
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let name = record
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .or(record.name.as_deref())
        .unwrap_or(manifest_name);

    let mut title = strip_layer_suffix(name).to_string();
    if let Some(lib) = &library_version_raw {
        title.push_str(&format!(", v{}", lib.trim()));
    }
    if let Some(api) = api_version_raw {
        title.push_str(&format!(", API v{}", api));
    }
    title.push_str(&format!(" ({})", manifest_name));

    LayerDescriptor {
        title,
        library_version: Version::parse_opt(library_version_raw.as_deref()),
        api_version: Version::parse_opt(api_version_raw),
    }
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let cut = s.len().checked_sub(suffix.len())?;
    if s.is_char_boundary(cut) && s[cut..].eq_ignore_ascii_case(suffix) {
        Some(&s[..cut])
    } else {
        None
    }
}

/// Drop a trailing " vulkan layer" or, failing that, " layer".
fn strip_layer_suffix(name: &str) -> &str {
    let name = name.trim();
    strip_suffix_ignore_case(name, " vulkan layer")
        .or_else(|| strip_suffix_ignore_case(name, " layer"))
        .map(str::trim_end)
        .unwrap_or(name)
}
