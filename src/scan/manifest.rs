//! Layer manifest documents.
//!
//! A layer manifest is the JSON file a layer registration points at. It
//! either lists several layers under `layers` or describes one under the
//! legacy `layer` field; files in the wild sometimes carry both.

use std::collections::HashMap;

use serde::Deserialize;

/// Top-level manifest document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerManifest {
    #[serde(default)]
    pub file_format_version: Option<String>,

    #[serde(default)]
    pub layers: Option<Vec<LayerRecord>>,

    #[serde(default)]
    pub layer: Option<LayerRecord>,
}

/// One layer definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerRecord {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, rename = "type")]
    pub layer_type: Option<String>,

    #[serde(default)]
    pub library_path: Option<String>,

    #[serde(default)]
    pub api_version: Option<String>,

    #[serde(default)]
    pub implementation_version: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub enable_environment: Option<HashMap<String, String>>,

    #[serde(default)]
    pub disable_environment: Option<HashMap<String, String>>,
}

impl LayerManifest {
    /// Parse manifest JSON, tolerating a UTF-8 byte order mark.
    pub fn parse(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content.trim_start_matches('\u{feff}'))
    }

    /// All layer definitions in file order, legacy `layer` last.
    pub fn into_records(self) -> Vec<LayerRecord> {
        let mut records = self.layers.unwrap_or_default();
        records.extend(self.layer);
        records
    }
}
