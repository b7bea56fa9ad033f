//! Registration consistency analysis and repair.
//!
//! The engine walks device driver registrations and Vulkan layer
//! registrations, classifies every entry, and applies the fixes enabled in
//! [`ScanOptions`]. Each scanner returns a [`Report`] and a fresh
//! [`ScanOutcome`]; [`run_scans`] runs them in order and merges the results.
//!
//! # Modules
//!
//! - [`classifier`] - Entry validity and layer manifest metadata
//! - [`duplicates`] - Duplicate layer resolution
//! - [`repair`] - Best-effort store mutations
//! - [`drivers`] - Display adapter driver registrations
//! - [`layers`] - Explicit driver and layer registrations
//! - [`loader`] - System Vulkan loader version
//! - [`system`] - CPU, Windows release, and known incompatible packages
//! - [`outcome`] - Report lines and aggregate flags
//!
//! # Example
//!
//! ```
//! use vkdiag::elevation::NotRequired;
//! use vkdiag::probe::MemoryProber;
//! use vkdiag::scan::{run_scans, ScanOptions, ScanSettings};
//! use vkdiag::store::MemoryStore;
//!
//! let mut store = MemoryStore::new();
//! let prober = MemoryProber::new();
//! let run = run_scans(
//!     &mut store,
//!     &prober,
//!     &mut NotRequired,
//!     ScanOptions::default(),
//!     &ScanSettings::default(),
//! );
//! assert!(run.report.contains("Failed to enumerate GPU drivers"));
//! assert!(run.outcome.fixed_everything());
//! ```

pub mod classifier;
pub mod drivers;
pub mod duplicates;
pub mod layers;
pub mod loader;
pub mod manifest;
pub mod outcome;
pub mod repair;
pub mod system;

pub use drivers::{DeviceDriverInfo, DriverScanResult, DriverScanner};
pub use layers::{KnownLayer, LayerKind, LayerScanResult, LayerScanner, LayerScope, ScopeReport};
pub use outcome::{FixOption, Report, ReportLine, ScanOutcome, StatusMark, Tone};
pub use repair::{RepairExecutor, RepairResult};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::elevation::Elevation;
use crate::probe::FileProber;
use crate::store::RegistryStore;

/// Which fixes a scan may apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Remove broken entries.
    pub autofix: bool,
    /// Remove legacy explicit driver registration.
    pub clear: bool,
    /// Disable incompatible or duplicate layers.
    pub disable_layers: bool,
}

impl ScanOptions {
    /// Whether any fix mode is on.
    pub fn any(&self) -> bool {
        self.autofix || self.clear || self.disable_layers
    }
}

/// Tunable inputs of a scan.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Layers that are disabled on sight, optionally only below a version.
    pub known_problematic_layers: Vec<KnownLayer>,
    /// Display services that never make an inactive device reportable.
    pub service_blocklist: Vec<String>,
    /// Driver age in months that triggers an update advisory.
    pub driver_advisory_months: u32,
    /// Driver age in months that triggers a hard warning.
    pub driver_warning_months: u32,
    /// Directory holding the system Vulkan loader.
    pub system_dir: String,
    /// Reference time for driver age checks.
    pub now: DateTime<Utc>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            known_problematic_layers: layers::default_known_problematic_layers(),
            service_blocklist: drivers::DEFAULT_SERVICE_BLOCKLIST
                .iter()
                .map(|s| s.to_string())
                .collect(),
            driver_advisory_months: 2,
            driver_warning_months: 6,
            system_dir: loader::DEFAULT_SYSTEM_DIR.to_string(),
            now: Utc::now(),
        }
    }
}

/// Combined result of all scanners.
#[derive(Debug, Clone)]
pub struct ScanRun {
    pub report: Report,
    pub outcome: ScanOutcome,
    pub found_inactive: bool,
}

/// Run the environment, loader, driver, and layer scans in order.
///
/// The driver scan's proper-driver result feeds the layer scan, which only
/// clears explicit driver registration when proper drivers exist.
pub fn run_scans(
    store: &mut dyn RegistryStore,
    prober: &dyn FileProber,
    elevation: &mut dyn Elevation,
    options: ScanOptions,
    settings: &ScanSettings,
) -> ScanRun {
    debug!("Scanning with {:?}", options);
    let mut report = system::check_cpu(store);
    report.extend(system::check_os(store));
    report.extend(loader::check_loader(prober, &settings.system_dir));
    let mut outcome = ScanOutcome::new();

    let packages = system::check_packages(store);
    report.extend(packages.report);
    outcome.merge(&packages.outcome);

    let drivers = DriverScanner::new(
        RepairExecutor::new(&mut *store, &mut *elevation),
        prober,
        options,
        settings,
    )
    .scan();
    report.extend(drivers.report);
    outcome.merge(&drivers.outcome);

    let layers = LayerScanner::new(
        RepairExecutor::new(&mut *store, &mut *elevation),
        prober,
        options,
        settings,
    )
    .scan(drivers.has_vulkan_drivers);
    report.extend(layers.report);
    outcome.merge(&layers.outcome);

    ScanRun {
        report,
        outcome,
        found_inactive: drivers.found_inactive,
    }
}
