//! Explicit driver and layer registrations.
//!
//! Checks the legacy explicit driver registration keys, then every layer
//! registration scope: two hives, two layer kinds, and the native and
//! 32-bit registry views. Broken entries are removed, known incompatible
//! layers and older duplicates are disabled, each only when its fix mode
//! is on.

use std::fmt;

use tracing::{debug, info};

use crate::probe::FileProber;
use crate::store::{join_key_path, Hive, KeyHandle, RegistryStore};
use crate::version::Version;

use super::classifier::{primary_descriptor, validate, LayerDescriptor, RegistrationEntry};
use super::duplicates::{find_duplicate, resolve_winner, Winner};
use super::outcome::{Report, ScanOutcome, StatusMark, Tone};
use super::repair::RepairExecutor;
use super::{ScanOptions, ScanSettings};

/// Native registry view of the Khronos keys.
pub const KHRONOS_BASE: &str = "SOFTWARE\\Khronos\\Vulkan";

/// 32-bit registry view of the Khronos keys.
pub const KHRONOS_BASE_WOW: &str = "SOFTWARE\\WOW6432Node\\Khronos\\Vulkan";

const DRIVERS_KEY: &str = "Drivers";

/// A layer that is disabled on sight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownLayer {
    /// Manifest file name, compared case-insensitively.
    pub file_name: String,
    /// Versions at or above this one are fine. `None` means every version
    /// is incompatible.
    pub min_version: Option<Version>,
}

impl KnownLayer {
    pub fn new(file_name: impl Into<String>, min_version: Option<Version>) -> Self {
        Self {
            file_name: file_name.into(),
            min_version,
        }
    }

    /// Whether a layer with this library version must be disabled.
    pub fn is_incompatible(&self, library_version: Option<Version>) -> bool {
        match (self.min_version, library_version) {
            (Some(min), Some(version)) => version < min,
            _ => true,
        }
    }
}

/// Built-in known incompatible layers.
pub fn default_known_problematic_layers() -> Vec<KnownLayer> {
    let obs_fixed = Some(Version::full(1, 2, 2, 0));
    vec![
        KnownLayer::new("MirillisActionVulkanLayer.json", None),
        KnownLayer::new("ow-vulkan-overlay64.json", None),
        KnownLayer::new("fpsmonvk64.json", None),
        KnownLayer::new("fpsmonvk32.json", None),
        KnownLayer::new("obs-vulkan64.json", obs_fixed),
        KnownLayer::new("obs-vulkan32.json", obs_fixed),
    ]
}

/// Find the known-layer entry for a manifest file name.
pub fn lookup_known_layer<'t>(table: &'t [KnownLayer], manifest_name: &str) -> Option<&'t KnownLayer> {
    table
        .iter()
        .find(|known| known.file_name.eq_ignore_ascii_case(manifest_name))
}

/// Implicit layers load automatically; explicit layers load on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Implicit,
    Explicit,
}

impl LayerKind {
    pub const ALL: [LayerKind; 2] = [LayerKind::Implicit, LayerKind::Explicit];

    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Implicit => "Implicit",
            LayerKind::Explicit => "Explicit",
        }
    }

    fn key_name(&self) -> &'static str {
        match self {
            LayerKind::Implicit => "ImplicitLayers",
            LayerKind::Explicit => "ExplicitLayers",
        }
    }
}

/// One registration scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerScope {
    pub hive: Hive,
    pub kind: LayerKind,
    /// Whether this is the 32-bit registry view.
    pub wow64: bool,
}

impl LayerScope {
    /// All scopes in report order: hive, then kind, then width.
    pub fn all() -> Vec<LayerScope> {
        let mut scopes = Vec::with_capacity(8);
        for hive in Hive::ALL {
            for kind in LayerKind::ALL {
                for wow64 in [false, true] {
                    scopes.push(LayerScope { hive, kind, wow64 });
                }
            }
        }
        scopes
    }

    pub fn bits(&self) -> &'static str {
        if self.wow64 {
            "32"
        } else {
            "64"
        }
    }

    /// Key path below the hive.
    pub fn key_path(&self) -> String {
        let base = if self.wow64 { KHRONOS_BASE_WOW } else { KHRONOS_BASE };
        join_key_path(base, self.kind.key_name())
    }
}

impl fmt::Display for LayerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} layers registration ({}, {}-bit)",
            self.kind.name(),
            self.hive,
            self.bits()
        )
    }
}

/// Per-scope result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeReport {
    pub scope: LayerScope,
    /// Entries left in the scope, in enumeration order.
    pub entries: Vec<RegistrationEntry>,
    pub broken: bool,
    pub removed_broken: bool,
    pub conflicts: bool,
    pub disabled_conflicts: bool,
}

impl ScopeReport {
    fn new(scope: LayerScope) -> Self {
        Self {
            scope,
            entries: Vec::new(),
            broken: false,
            removed_broken: true,
            conflicts: false,
            disabled_conflicts: true,
        }
    }
}

/// Result of the layer scan.
#[derive(Debug, Clone)]
pub struct LayerScanResult {
    pub report: Report,
    pub outcome: ScanOutcome,
    pub scopes: Vec<ScopeReport>,
}

/// Scans explicit driver and layer registrations.
pub struct LayerScanner<'a> {
    executor: RepairExecutor<'a>,
    prober: &'a dyn FileProber,
    options: ScanOptions,
    settings: &'a ScanSettings,
    outcome: ScanOutcome,
}

impl<'a> LayerScanner<'a> {
    pub fn new(
        executor: RepairExecutor<'a>,
        prober: &'a dyn FileProber,
        options: ScanOptions,
        settings: &'a ScanSettings,
    ) -> Self {
        Self {
            executor,
            prober,
            options,
            settings,
            outcome: ScanOutcome::new(),
        }
    }

    /// Run the scan. Explicit driver registration is only cleared when
    /// `has_proper_vulkan_drivers` is set.
    pub fn scan(mut self, has_proper_vulkan_drivers: bool) -> LayerScanResult {
        let mut report = Report::new();
        report.blank();
        report.heading("Vulkan registration information:");

        self.scan_explicit_drivers(&mut report, has_proper_vulkan_drivers);

        let mut scopes = Vec::new();
        for scope in LayerScope::all() {
            let result = self.scan_scope(scope);
            report_scope(&mut report, &result, self.prober);
            scopes.push(result);
        }

        LayerScanResult {
            report,
            outcome: self.outcome,
            scopes,
        }
    }

    fn open(&self, hive: Hive, path: &str, writable: bool) -> Option<KeyHandle> {
        match self.executor.store().open_key(hive, path, writable) {
            Ok(key) => key,
            Err(e) => {
                debug!("Failed to open {}\\{}: {}", hive, path, e);
                None
            }
        }
    }

    fn value_names(&self, key: &KeyHandle) -> Vec<String> {
        self.executor.store().value_names(key).unwrap_or_else(|e| {
            debug!("Failed to list values of {}: {}", key, e);
            Vec::new()
        })
    }

    fn scan_explicit_drivers(&mut self, report: &mut Report, has_proper_vulkan_drivers: bool) {
        let clear = self.options.clear && has_proper_vulkan_drivers;
        let writable = self.options.autofix || clear;

        let mut has_explicit = false;
        let mut removed_explicit = true;
        let mut broken = false;
        let mut removed_broken = true;

        for base in [KHRONOS_BASE, KHRONOS_BASE_WOW] {
            let path = join_key_path(base, DRIVERS_KEY);
            let Some(key) = self.open(Hive::LocalMachine, &path, writable) else {
                continue;
            };

            for driver_path in self.value_names(&key) {
                if validate(self.prober, &driver_path).is_broken() {
                    broken = true;
                    self.outcome.record_broken_entry();
                    let result = self.executor.remove_broken_entry(
                        &key,
                        &driver_path,
                        self.options.autofix,
                        &mut self.outcome,
                    );
                    removed_broken &= result.is_applied();
                } else {
                    has_explicit = true;
                    self.outcome.record_explicit_driver_reg();
                    let result = self.executor.clear_explicit_driver_reg(
                        &key,
                        &driver_path,
                        clear,
                        &mut self.outcome,
                    );
                    removed_explicit &= result.is_applied();
                }
            }
        }

        if (!has_explicit || removed_explicit) && (!broken || removed_broken) {
            report.status(Tone::Green, StatusMark::Ok, "No explicit driver registration entries");
        } else {
            report.status(Tone::Yellow, StatusMark::Warning, "Explicit driver registration issues");
        }

        if has_explicit {
            if removed_explicit {
                report.status(Tone::Green, StatusMark::Ok, "    Removed explicit driver registration");
            } else {
                report.status(
                    Tone::Yellow,
                    StatusMark::Warning,
                    "    Explicit driver registration present (legacy)",
                );
                if !has_proper_vulkan_drivers {
                    report.status(Tone::Yellow, StatusMark::Warning, "    Please update your GPU drivers");
                }
            }
        }

        if broken {
            if removed_broken {
                report.status(
                    Tone::Green,
                    StatusMark::Ok,
                    "    Removed broken explicit Vulkan driver registration entries",
                );
            } else {
                report.status(
                    Tone::Yellow,
                    StatusMark::Warning,
                    "    There are broken explicit Vulkan driver registration entries",
                );
            }
        }
    }

    fn scan_scope(&mut self, scope: LayerScope) -> ScopeReport {
        let mut result = ScopeReport::new(scope);
        let writable = self.options.autofix || self.options.disable_layers;
        let Some(key) = self.open(scope.hive, &scope.key_path(), writable) else {
            return result;
        };

        for layer_path in self.value_names(&key) {
            let raw = self.executor.store().get_value(&key, &layer_path).unwrap_or_else(|e| {
                debug!("Failed to read {} @{}: {}", key, layer_path, e);
                None
            });
            let mut entry = RegistrationEntry::classify(self.prober, &layer_path, raw.as_ref());

            if entry.broken {
                result.broken = true;
                self.outcome.record_broken_entry();
                let removal = self.executor.remove_broken_entry(
                    &key,
                    &layer_path,
                    self.options.autofix,
                    &mut self.outcome,
                );
                if removal.is_applied() {
                    info!("Removed broken layer registration {}", layer_path);
                    continue;
                }
                result.removed_broken = false;
            } else if entry.enabled {
                self.check_enabled_layer(&key, &mut entry, &mut result);
            }

            result.entries.push(entry);
        }

        result
    }

    fn check_enabled_layer(&mut self, key: &KeyHandle, entry: &mut RegistrationEntry, result: &mut ScopeReport) {
        let descriptor = primary_descriptor(self.prober, &entry.path);

        let settings = self.settings;
        if let Some(known) = lookup_known_layer(&settings.known_problematic_layers, entry.file_name()) {
            if known.is_incompatible(descriptor.library_version) {
                debug!("Known incompatible layer {}", entry.path);
                entry.enabled = !self.disable(key, &entry.path, result);
                entry.conflicting = true;
                return;
            }
        }

        let Some(index) = find_duplicate(&entry.path, &result.entries) else {
            return;
        };
        let incumbent_path = result.entries[index].path.clone();
        debug!("Found duplicate layer {}", entry.file_name());
        let incumbent = primary_descriptor(self.prober, &incumbent_path);

        match resolve_winner(&entry.path, &descriptor, &incumbent_path, &incumbent) {
            Winner::Candidate => {
                debug!("Disabling older layer {}", incumbent_path);
                let disabled = self.disable(key, &incumbent_path, result);
                let loser = &mut result.entries[index];
                loser.enabled = !disabled;
                loser.conflicting = true;
            }
            Winner::Incumbent => {
                debug!("Disabling current layer {}", entry.path);
                entry.enabled = !self.disable(key, &entry.path, result);
                entry.conflicting = true;
            }
        }
    }

    /// Disable a layer registration, returning whether it worked.
    fn disable(&mut self, key: &KeyHandle, path: &str, result: &mut ScopeReport) -> bool {
        result.conflicts = true;
        self.outcome.record_conflicting_layer();
        let applied = self
            .executor
            .disable_entry(key, path, self.options.disable_layers, &mut self.outcome)
            .is_applied();
        if !applied {
            result.disabled_conflicts = false;
        }
        applied
    }
}

fn report_scope(report: &mut Report, result: &ScopeReport, prober: &dyn FileProber) {
    let scope = result.scope;
    if result.entries.is_empty() {
        report.status(
            Tone::Green,
            StatusMark::Ok,
            format!(
                "No {}-bit {} layers registered in {}",
                scope.bits(),
                scope.kind.name().to_lowercase(),
                scope.hive
            ),
        );
        return;
    }

    let implicit = scope.kind == LayerKind::Implicit;
    let header = format!("{}:", scope);
    if result.broken && !result.removed_broken {
        if implicit {
            report.status(Tone::Red, StatusMark::Error, header);
        } else {
            report.status(Tone::Yellow, StatusMark::Warning, header);
        }
    } else if result.conflicts && !result.disabled_conflicts {
        report.status(Tone::Yellow, StatusMark::Warning, header);
    } else {
        report.status(Tone::Green, StatusMark::Ok, header);
    }

    for entry in &result.entries {
        let title = if entry.broken {
            LayerDescriptor::fallback(&entry.path).title
        } else {
            primary_descriptor(prober, &entry.path).title
        };
        let text = format!("    {}", title);

        if !entry.enabled {
            report.status(Tone::Green, StatusMark::Disabled, text);
        } else if entry.broken {
            let tone = if implicit { Tone::Red } else { Tone::Yellow };
            report.status(tone, StatusMark::Error, text);
        } else if entry.conflicting {
            report.status(Tone::Yellow, StatusMark::Warning, text);
            report.status(
                Tone::Cyan,
                StatusMark::Info,
                "        Please update the associated software or disable this layer",
            );
        } else {
            report.status(Tone::Green, StatusMark::Ok, text);
        }
    }
}
