//! Configuration schema definitions for vkdiag.
//!
//! Maps the optional `config.yml` onto typed settings. Every field has a
//! default, so an empty file is a valid configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::scan::{KnownLayer, ScanSettings};
use crate::version::Version;

/// Release list queried by the update check.
pub const DEFAULT_RELEASES_URL: &str = "https://api.github.com/repos/13xforever/vkdiag/releases";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VkDiagConfig {
    /// Layer checks
    pub layers: LayerSettings,

    /// Driver checks
    pub drivers: DriverSettings,

    /// Vulkan loader check
    pub loader: LoaderSettings,

    /// Update check
    pub updates: UpdateSettings,
}

/// Layer check settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerSettings {
    /// Incompatible layers added to the built-in table
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub known_problematic: Vec<KnownLayerConfig>,
}

/// A configured incompatible layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownLayerConfig {
    /// Manifest file name, e.g. `overlay64.json`
    pub file: String,

    /// First library version that works; omit to always disable
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_version",
        deserialize_with = "deserialize_version"
    )]
    pub min_version: Option<Version>,
}

/// Driver check settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    /// Display services added to the built-in blocklist
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service_blocklist: Vec<String>,

    /// Driver age in months before an update is suggested
    pub advisory_months: u32,

    /// Driver age in months before an update is required
    pub warning_months: u32,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            service_blocklist: Vec::new(),
            advisory_months: 2,
            warning_months: 6,
        }
    }
}

/// Loader check settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Directory holding `vulkan-1.dll`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_dir: Option<String>,
}

/// Update check settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateSettings {
    /// Check for newer releases on startup
    pub check: bool,

    /// Release list endpoint
    pub releases_url: String,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            check: true,
            releases_url: DEFAULT_RELEASES_URL.to_string(),
        }
    }
}

impl VkDiagConfig {
    /// Build scan settings from the built-in tables plus configured extras.
    ///
    /// Configured layers override built-in entries with the same file name.
    pub fn scan_settings(&self, now: DateTime<Utc>) -> ScanSettings {
        let mut settings = ScanSettings {
            now,
            driver_advisory_months: self.drivers.advisory_months,
            driver_warning_months: self.drivers.warning_months,
            ..ScanSettings::default()
        };

        for layer in &self.layers.known_problematic {
            settings
                .known_problematic_layers
                .retain(|known| !known.file_name.eq_ignore_ascii_case(&layer.file));
            settings
                .known_problematic_layers
                .push(KnownLayer::new(layer.file.clone(), layer.min_version));
        }

        for service in &self.drivers.service_blocklist {
            if !settings
                .service_blocklist
                .iter()
                .any(|s| s.eq_ignore_ascii_case(service))
            {
                settings.service_blocklist.push(service.clone());
            }
        }

        if let Some(dir) = &self.loader.system_dir {
            settings.system_dir = dir.clone();
        }

        settings
    }
}

fn serialize_version<S: Serializer>(version: &Option<Version>, serializer: S) -> Result<S::Ok, S::Error> {
    match version {
        Some(v) => serializer.serialize_str(&v.to_string()),
        None => serializer.serialize_none(),
    }
}

fn deserialize_version<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Version>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| s.parse::<Version>().map_err(serde::de::Error::custom))
        .transpose()
}
