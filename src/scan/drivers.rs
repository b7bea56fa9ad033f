//! Display adapter driver registrations.
//!
//! Walks the device keys below the video root, splits them into active and
//! reportable inactive devices, and checks each active device's driver
//! metadata and Vulkan driver values.

use std::sync::LazyLock;

use chrono::{Months, NaiveDate};
use regex::Regex;
use tracing::{debug, warn};

use crate::probe::FileProber;
use crate::store::{Hive, KeyHandle, PathValue, RegistryStore};

use super::classifier::check_paths;
use super::outcome::{Report, ScanOutcome, StatusMark, Tone};
use super::repair::RepairExecutor;
use super::{ScanOptions, ScanSettings};

/// Root of the per-device video keys, below `HKEY_LOCAL_MACHINE`.
pub const VIDEO_ROOT: &str = "SYSTEM\\CurrentControlSet\\Control\\Video";

/// Services of placeholder display devices.
pub const DEFAULT_SERVICE_BLOCKLIST: [&str; 3] = ["BasicDisplay", "WUDFRd", "HyperVideo"];

/// Path-bearing Vulkan values of a device output key.
pub const VULKAN_DRIVER_VALUES: [&str; 6] = [
    "VulkanDriverName",
    "VulkanDriverNameWoW",
    "VulkanImplicitLayers",
    "VulkanImplicitLayersWow",
    "VulkanExplicitLayers",
    "VulkanExplicitLayersWow",
];

const VIDEO_SUBKEY: &str = "Video";
const FIRST_OUTPUT: &str = "0000";
const NO_DATE: &str = "no date available";

/// How a device key is treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceClass {
    Active,
    Inactive { name: String },
}

/// Driver metadata merged across a device's output keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDriverInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub date: Option<String>,
    pub has_proper_vulkan_registration: bool,
    pub has_broken_entries: bool,
    /// Cleared when any broken entry is left in place.
    pub removed_broken_entries: bool,
}

impl DeviceDriverInfo {
    fn new() -> Self {
        Self {
            removed_broken_entries: true,
            ..Self::default()
        }
    }

    /// Take each field from `key` unless an earlier output already set it.
    fn absorb(&mut self, store: &dyn RegistryStore, key: &KeyHandle) {
        if self.version.is_none() {
            self.version = store.get_string(key, "DriverVersion");
        }
        if self.date.is_none() {
            self.date = store.get_string(key, "DriverDate");
        }
        if self.name.is_none() {
            self.name = store.get_string(key, "DriverDesc");
        }
    }
}

/// Result of the driver scan.
#[derive(Debug, Clone)]
pub struct DriverScanResult {
    pub report: Report,
    pub outcome: ScanOutcome,
    /// Whether any reportable inactive device was found.
    pub found_inactive: bool,
    /// Whether any device has a valid Vulkan driver registration.
    pub has_vulkan_drivers: bool,
}

/// Scans display adapters and repairs broken Vulkan driver values.
pub struct DriverScanner<'a> {
    executor: RepairExecutor<'a>,
    prober: &'a dyn FileProber,
    options: ScanOptions,
    settings: &'a ScanSettings,
    outcome: ScanOutcome,
}

impl<'a> DriverScanner<'a> {
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

    pub fn scan(mut self) -> DriverScanResult {
        let mut report = Report::new();
        report.blank();

        let root = match self.open_root() {
            Some(root) => root,
            None => {
                report.status(Tone::Red, StatusMark::Error, "Failed to enumerate GPU drivers");
                return self.finish(report, false);
            }
        };

        let device_ids = match self.executor.store().subkey_names(&root) {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Failed to list devices under {}: {}", root, e);
                report.status(Tone::Red, StatusMark::Error, "Failed to enumerate GPU drivers");
                return self.finish(report, false);
            }
        };

        let mut active = Vec::new();
        let mut inactive = Vec::new();
        for id in device_ids {
            let device = match self.executor.store().open_subkey(&root, &id, false) {
                Ok(Some(device)) => device,
                Ok(None) => continue,
                Err(e) => {
                    debug!("Skipping device {}: {}", id, e);
                    continue;
                }
            };
            match classify_device(self.executor.store(), &device, &id, &self.settings.service_blocklist) {
                Some(DeviceClass::Active) => active.push((id, device)),
                Some(DeviceClass::Inactive { name }) => inactive.push(name),
                None => debug!("Skipping device {} without video key", id),
            }
        }

        report.heading(format!(
            "Found {} active GPU{}:",
            active.len(),
            if active.len() == 1 { "" } else { "s" }
        ));

        for name in &inactive {
            report.status(Tone::Default, StatusMark::Inactive, name.clone());
        }
        for (id, device) in &active {
            let info = self.inspect_device(device);
            self.report_device(&mut report, id, &info);
        }

        self.finish(report, !inactive.is_empty())
    }

    fn open_root(&self) -> Option<KeyHandle> {
        match self.executor.store().open_key(Hive::LocalMachine, VIDEO_ROOT, false) {
            Ok(root) => root,
            Err(e) => {
                warn!("Failed to open video root: {}", e);
                None
            }
        }
    }

    fn finish(self, report: Report, found_inactive: bool) -> DriverScanResult {
        DriverScanResult {
            report,
            has_vulkan_drivers: self.outcome.has_proper_vulkan_drivers(),
            outcome: self.outcome,
            found_inactive,
        }
    }

    fn inspect_device(&mut self, device: &KeyHandle) -> DeviceDriverInfo {
        let mut info = DeviceDriverInfo::new();
        let outputs = match self.executor.store().subkey_names(device) {
            Ok(names) => names,
            Err(e) => {
                debug!("Failed to list outputs of {}: {}", device, e);
                Vec::new()
            }
        };

        for output in outputs.iter().filter(|name| is_output_key(name)) {
            let key = match self
                .executor
                .store()
                .open_subkey(device, output, self.options.autofix)
            {
                Ok(Some(key)) => key,
                Ok(None) => continue,
                Err(e) => {
                    debug!("Skipping output {} of {}: {}", output, device, e);
                    continue;
                }
            };
            info.absorb(self.executor.store(), &key);
            for value_name in VULKAN_DRIVER_VALUES {
                self.check_driver_value(&key, value_name, &mut info);
            }
        }

        info
    }

    fn check_driver_value(&mut self, key: &KeyHandle, value_name: &str, info: &mut DeviceDriverInfo) {
        let raw = match self.executor.store().get_value(key, value_name) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Failed to read {} @{}: {}", key, value_name, e);
                return;
            }
        };
        let value = PathValue::from_raw(raw);
        if value == PathValue::Absent {
            return;
        }

        let check = check_paths(self.prober, &value);
        if value_name.starts_with("VulkanDriverName") && !check.valid.is_empty() {
            info.has_proper_vulkan_registration = true;
            self.outcome.record_proper_vulkan_driver();
        }
        if !check.is_broken() {
            return;
        }

        debug!("Broken paths in {} @{}: {:?}", key, value_name, check.invalid);
        info.has_broken_entries = true;
        self.outcome.record_broken_entry();
        let result = self.executor.replace_driver_value(
            key,
            value_name,
            &check.valid,
            self.options.autofix,
            &mut self.outcome,
        );
        if !result.is_applied() {
            info.removed_broken_entries = false;
        }
    }

    fn report_device(&mut self, report: &mut Report, id: &str, info: &DeviceDriverInfo) {
        let name = match &info.name {
            Some(name) => name.clone(),
            None => {
                warn!("Device {} has no driver description", id);
                self.outcome.downgrade_everything_is_fine();
                report.status(Tone::Red, StatusMark::Error, id);
                report.status(
                    Tone::Red,
                    StatusMark::Error,
                    "    Broken driver registration, please reinstall your video driver",
                );
                self.report_vulkan_entries(report, info);
                return;
            }
        };

        let (tone, mark) = if info.has_broken_entries && !info.removed_broken_entries {
            (Tone::Yellow, StatusMark::Warning)
        } else if info.has_proper_vulkan_registration {
            (Tone::Green, StatusMark::Vulkan)
        } else {
            (Tone::Green, StatusMark::Ok)
        };
        report.status(tone, mark, name);

        if let Some(version) = &info.version {
            let date = info.date.as_deref().map(str::trim).filter(|d| !d.is_empty());
            let text = format!(
                "    Driver version: {} ({})",
                version,
                date.unwrap_or(NO_DATE)
            );
            report.status(Tone::Default, StatusMark::Ok, text);
            match date.and_then(parse_driver_date) {
                Some(date) => self.report_driver_age(report, date),
                None => debug!("No usable driver date for driver {}", version),
            }
        }

        self.report_vulkan_entries(report, info);
    }

    fn report_driver_age(&mut self, report: &mut Report, date: NaiveDate) {
        let today = self.settings.now.date_naive();
        let older_than = |months: u32| {
            today
                .checked_sub_months(Months::new(months))
                .is_some_and(|cutoff| date < cutoff)
        };

        if older_than(self.settings.driver_warning_months) {
            self.outcome.downgrade_everything_is_fine();
            report.status(Tone::Red, StatusMark::Error, "    Please update your video driver");
        } else if older_than(self.settings.driver_advisory_months) {
            report.status(Tone::Yellow, StatusMark::Warning, "    Please update your video driver");
        }
    }

    fn report_vulkan_entries(&self, report: &mut Report, info: &DeviceDriverInfo) {
        if info.has_proper_vulkan_registration {
            report.status(Tone::Green, StatusMark::Vulkan, "    Proper Vulkan driver registration");
        }
        if info.has_broken_entries {
            if info.removed_broken_entries {
                report.status(
                    Tone::Green,
                    StatusMark::Ok,
                    "    Removed broken Vulkan registration entries",
                );
            } else {
                report.status(
                    Tone::Yellow,
                    StatusMark::Warning,
                    "    Has broken Vulkan registration entries",
                );
            }
        }
    }
}

/// Classify a device key.
///
/// Returns `None` for keys that are not display devices or that are
/// inactive placeholders not worth reporting.
pub fn classify_device(
    store: &dyn RegistryStore,
    device: &KeyHandle,
    id: &str,
    blocklist: &[String],
) -> Option<DeviceClass> {
    let subkeys = store.subkey_names(device).ok()?;
    let has = |name: &str| subkeys.iter().any(|k| k.eq_ignore_ascii_case(name));

    if !has(VIDEO_SUBKEY) {
        return None;
    }
    if has(FIRST_OUTPUT) {
        return Some(DeviceClass::Active);
    }

    let video = store.open_subkey(device, VIDEO_SUBKEY, false).ok()??;
    let service = match store.get_value(&video, "Service") {
        Ok(Some(value)) => value.as_str().map(str::to_string).unwrap_or_default(),
        _ => return None,
    };
    if blocklist.iter().any(|blocked| blocked.eq_ignore_ascii_case(&service)) {
        return None;
    }

    let name = store
        .get_string(&video, "DeviceDesc")
        .and_then(|desc| desc.rsplit(';').next().map(str::to_string))
        .or_else(|| (!service.is_empty()).then(|| service.clone()))
        .unwrap_or_else(|| id.to_string());
    Some(DeviceClass::Inactive { name })
}

/// Whether a sub key name is a numbered output such as `0000`.
pub fn is_output_key(name: &str) -> bool {
    name.len() == 4 && name.bytes().all(|b| b.is_ascii_digit())
}

static LENIENT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})\D+(\d{1,2})\D+(\d{4})").unwrap());

/// Parse a `MM-DD-YYYY` driver date, falling back to any
/// month/day/year digit groups.
pub fn parse_driver_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%m-%d-%Y") {
        return Some(date);
    }
    let caps = LENIENT_DATE.captures(raw)?;
    let month = caps[1].parse().ok()?;
    let day = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
