//! System Vulkan loader check.

use tracing::debug;

use crate::probe::FileProber;
use crate::version::Version;

use super::outcome::{Report, StatusMark, Tone};

/// Default location of the system loader library.
pub const DEFAULT_SYSTEM_DIR: &str = "C:\\Windows\\System32";

/// Minimum loader version per loader ABI.
pub const EXPECTED_LOADER_VERSIONS: [(&str, Version); 1] = [("1", Version::full(1, 2, 141, 0))];

/// Report the version of each installed loader ABI.
///
/// Loaders at or above the expected version are shown in green, older or
/// unparseable ones without color. No loader at all is an error.
pub fn check_loader(prober: &dyn FileProber, system_dir: &str) -> Report {
    let mut report = Report::new();
    let mut found = false;

    for (abi, expected) in EXPECTED_LOADER_VERSIONS {
        let path = format!("{}\\vulkan-{}.dll", system_dir.trim_end_matches(['\\', '/']), abi);
        if !prober.exists(&path) {
            debug!("No loader at {}", path);
            continue;
        }
        found = true;

        let Some(raw) = prober.file_version(&path).filter(|v| !v.trim().is_empty()) else {
            debug!("Loader {} has no version resource", path);
            continue;
        };
        let tone = match Version::parse(&raw) {
            Some(version) if version >= expected => Tone::Green,
            _ => Tone::Default,
        };
        report.status(tone, StatusMark::Ok, format!("System Vulkan loader version: {}", raw.trim()));
    }

    if !found {
        report.status(
            Tone::Red,
            StatusMark::Error,
            "No Vulkan Loader library was found; please reinstall latest GPU drivers",
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::MemoryProber;
    use crate::scan::ReportLine;

    fn tone_of(report: &Report) -> Tone {
        match report.lines().first() {
            Some(ReportLine::Status { tone, .. }) => *tone,
            other => panic!("unexpected line {:?}", other),
        }
    }

    #[test]
    fn current_loader_is_green() {
        let prober = MemoryProber::new().with_library("C:\\Windows\\System32\\vulkan-1.dll", "1.3.280.0");
        let report = check_loader(&prober, DEFAULT_SYSTEM_DIR);
        assert!(report.contains("System Vulkan loader version: 1.3.280.0"));
        assert_eq!(tone_of(&report), Tone::Green);
    }

    #[test]
    fn old_loader_is_plain() {
        let prober = MemoryProber::new().with_library("D:\\sys\\vulkan-1.dll", "1.1.130.0");
        let report = check_loader(&prober, "D:\\sys\\");
        assert_eq!(tone_of(&report), Tone::Default);
    }

    #[test]
    fn missing_loader_is_an_error() {
        let report = check_loader(&MemoryProber::new(), DEFAULT_SYSTEM_DIR);
        assert!(report.contains("No Vulkan Loader library was found"));
        assert_eq!(tone_of(&report), Tone::Red);
    }
}
