//! Host environment checks: CPU, Windows release, and installed packages
//! known to interfere with Vulkan.

use tracing::debug;

use crate::store::{Hive, KeyHandle, RegValue, RegistryStore};

use super::outcome::{Report, ScanOutcome, StatusMark, Tone};

pub const CPU_KEY: &str = "HARDWARE\\DESCRIPTION\\System\\CentralProcessor\\0";
pub const OS_KEY: &str = "SOFTWARE\\Microsoft\\Windows NT\\CurrentVersion";

/// Package repositories, machine-wide first.
pub const PACKAGE_REPOSITORIES: [(Hive, &str); 2] = [
    (
        Hive::LocalMachine,
        "SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\AppModel\\PackageRepository\\Packages",
    ),
    (
        Hive::CurrentUser,
        "Software\\Classes\\Local Settings\\Software\\Microsoft\\Windows\\CurrentVersion\\AppModel\\Repository\\Packages",
    ),
];

/// Package families that break or shadow native Vulkan drivers.
pub const KNOWN_PACKAGES: [(&str, &str); 1] = [(
    "Microsoft.D3DMappingLayers_8wekyb3d8bbwe",
    "OpenCL, OpenGL, and Vulkan Compatibility Pack",
)];

/// First build still in mainstream support.
pub const SUPPORTED_BUILD: u32 = 19041;

const END_OF_SERVICE: &str =
    "    This version of Windows has reached the End of Service status for mainstream support";

/// Report the processor name.
pub fn check_cpu(store: &dyn RegistryStore) -> Report {
    let mut report = Report::new();
    let name = open(store, Hive::LocalMachine, CPU_KEY)
        .and_then(|key| store.get_string(&key, "ProcessorNameString"));
    match name {
        Some(name) => report.status(Tone::Cyan, StatusMark::Info, format!("CPU: {}", name.trim())),
        None => debug!("No processor name in {}", CPU_KEY),
    }
    report
}

/// Windows version as read from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsVersion {
    pub major: u32,
    pub minor: u32,
    pub build: Option<u32>,
}

impl OsVersion {
    /// Read the version values of the `CurrentVersion` key.
    ///
    /// Windows 10 and later carry DWORD major/minor numbers; older
    /// releases only have the dotted `CurrentVersion` string.
    pub fn read(store: &dyn RegistryStore, key: &KeyHandle) -> Option<Self> {
        let dword = |name: &str| match store.get_value(key, name) {
            Ok(Some(RegValue::Dword(v))) => Some(v),
            _ => None,
        };
        let (major, minor) = match (
            dword("CurrentMajorVersionNumber"),
            dword("CurrentMinorVersionNumber"),
        ) {
            (Some(major), Some(minor)) => (major, minor),
            _ => {
                let legacy = store.get_string(key, "CurrentVersion")?;
                let mut parts = legacy.trim().split('.');
                let major = parts.next()?.parse().ok()?;
                let minor = parts.next()?.parse().ok()?;
                (major, minor)
            }
        };
        let build = store
            .get_string(key, "CurrentBuild")
            .or_else(|| store.get_string(key, "CurrentBuildNumber"))
            .and_then(|b| b.trim().parse().ok());
        Some(Self { major, minor, build })
    }

    /// Marketing name of the release, such as `10 21H2` or `8.1`.
    pub fn release_name(&self) -> Option<String> {
        windows_release_name(self.major, self.minor, self.build)
    }
}

impl std::fmt::Display for OsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.build {
            Some(build) => write!(f, "{}.{}.{}", self.major, self.minor, build),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

/// Map a Windows version to its release name.
pub fn windows_release_name(major: u32, minor: u32, build: Option<u32>) -> Option<String> {
    let fixed = |s: &str| Some(s.to_string());
    match (major, minor) {
        (5, 0) => fixed("2000"),
        (5, 1) => fixed("XP"),
        (5, 2) => fixed("XP x64"),
        (6, 0) => fixed("Vista"),
        (6, 1) => fixed("7"),
        (6, 2) => fixed("8"),
        (6, 3) => fixed("8.1"),
        (10, _) => {
            let b = build?;
            let name = match b {
                v if v < 10240 => format!("10 TH1 Build {}", v),
                10240 => "10 1507".into(),
                v if v < 10586 => format!("10 TH2 Build {}", v),
                10586 => "10 1511".into(),
                v if v < 14393 => format!("10 RS1 Build {}", v),
                14393 => "10 1607".into(),
                v if v < 15063 => format!("10 RS2 Build {}", v),
                15063 => "10 1703".into(),
                v if v < 16299 => format!("10 RS3 Build {}", v),
                16299 => "10 1709".into(),
                v if v < 17134 => format!("10 RS4 Build {}", v),
                17134 => "10 1803".into(),
                v if v < 17763 => format!("10 RS5 Build {}", v),
                17763 => "10 1809".into(),
                v if v < 18362 => format!("10 19H1 Build {}", v),
                18362 => "10 1903".into(),
                18363 => "10 1909".into(),
                v if v < 19041 => format!("10 20H1 Build {}", v),
                19041 => "10 2004".into(),
                19042 => "10 20H2".into(),
                19043 => "10 21H1".into(),
                19044 => "10 21H2".into(),
                v if v < 21390 => format!("10 Dev Build {}", v),
                v if v < 22000 => format!("11 Internal Build {}", v),
                22000 => "11 21H2".into(),
                v => format!("11 Dev Build {}", v),
            };
            Some(name)
        }
        _ => None,
    }
}

/// Report the Windows product name and version.
///
/// Releases before Windows 10 and Windows 10 builds before 20H1 get an
/// end-of-service warning. The outcome is never affected.
pub fn check_os(store: &dyn RegistryStore) -> Report {
    let mut report = Report::new();
    let Some(key) = open(store, Hive::LocalMachine, OS_KEY) else {
        debug!("No OS information in {}", OS_KEY);
        return report;
    };

    let name = store
        .get_string(&key, "ProductName")
        .unwrap_or_else(|| "Windows".to_string());

    let Some(version) = OsVersion::read(store, &key) else {
        let raw = store.get_string(&key, "CurrentVersion").unwrap_or_default();
        report.status(Tone::Default, StatusMark::Ok, format!("OS: {}", name));
        report.status(Tone::Default, StatusMark::Ok, format!("Version: {}", raw));
        return report;
    };

    let (os_tone, os_mark, ver_tone, ver_mark) = if version.major < 10 {
        (Tone::Yellow, StatusMark::Warning, Tone::Yellow, StatusMark::Warning)
    } else if version.build.unwrap_or(0) < SUPPORTED_BUILD {
        (Tone::Default, StatusMark::Ok, Tone::Yellow, StatusMark::Warning)
    } else {
        (Tone::Green, StatusMark::Ok, Tone::Green, StatusMark::Ok)
    };

    let mut text = version.to_string();
    if let Some(release) = version.release_name() {
        text.push_str(&format!(" (Windows {})", release));
    }
    report.status(os_tone, os_mark, format!("OS: {}", name));
    report.status(ver_tone, ver_mark, format!("Version: {}", text));
    if ver_mark != StatusMark::Ok {
        report.status(ver_tone, StatusMark::Warning, END_OF_SERVICE);
    }
    report
}

/// An installed package matching a known family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub full_name: String,
    pub title: String,
    pub version: String,
}

/// Result of the installed package check.
#[derive(Debug, Clone)]
pub struct PackageScanResult {
    pub report: Report,
    pub outcome: ScanOutcome,
    pub found: Vec<InstalledPackage>,
}

/// Split a package full name into its family name and version.
///
/// Full names look like `Name_Version_Arch_ResourceId_PublisherId`, with an
/// empty resource id in most cases.
pub fn package_family(full_name: &str) -> Option<(String, &str)> {
    let parts: Vec<&str> = full_name.split('_').collect();
    if parts.len() != 5 || parts[0].is_empty() || parts[4].is_empty() {
        return None;
    }
    Some((format!("{}_{}", parts[0], parts[4]), parts[1]))
}

/// List installed packages of known incompatible families.
pub fn check_packages(store: &dyn RegistryStore) -> PackageScanResult {
    let mut found: Vec<InstalledPackage> = Vec::new();

    for (hive, path) in PACKAGE_REPOSITORIES {
        let Some(repo) = open(store, hive, path) else {
            continue;
        };
        let names = store.subkey_names(&repo).unwrap_or_default();
        for full_name in names {
            let Some((family, version)) = package_family(&full_name) else {
                continue;
            };
            let Some((_, known_title)) = KNOWN_PACKAGES
                .iter()
                .find(|(id, _)| id.eq_ignore_ascii_case(&family))
            else {
                continue;
            };
            if found.iter().any(|p| p.full_name.eq_ignore_ascii_case(&full_name)) {
                continue;
            }

            // Display names are usually indirect resource strings.
            let title = store
                .open_subkey(&repo, &full_name, false)
                .ok()
                .flatten()
                .and_then(|key| store.get_string(&key, "DisplayName"))
                .filter(|name| !name.starts_with('@'))
                .unwrap_or_else(|| known_title.to_string());
            debug!("Found package {} in {}", full_name, hive);
            found.push(InstalledPackage {
                title,
                version: version.to_string(),
                full_name,
            });
        }
    }

    let mut report = Report::new();
    let mut outcome = ScanOutcome::new();
    if !found.is_empty() {
        outcome.downgrade_everything_is_fine();
        report.blank();
        report.status(Tone::Yellow, StatusMark::Warning, "Potentially incompatible software:");
        for package in &found {
            report.status(
                Tone::Yellow,
                StatusMark::Warning,
                format!("    {} v{}", package.title, package.version),
            );
        }
    }

    PackageScanResult {
        report,
        outcome,
        found,
    }
}

fn open(store: &dyn RegistryStore, hive: Hive, path: &str) -> Option<KeyHandle> {
    store.open_key(hive, path, false).ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::ReportLine;
    use crate::store::MemoryStore;

    const PACK: &str = "Microsoft.D3DMappingLayers_1.2302.1.0_x64__8wekyb3d8bbwe";

    fn os_store(product: &str, major: u32, build: &str) -> MemoryStore {
        MemoryStore::new()
            .with_value(Hive::LocalMachine, OS_KEY, "ProductName", RegValue::String(product.into()))
            .with_value(Hive::LocalMachine, OS_KEY, "CurrentMajorVersionNumber", RegValue::Dword(major))
            .with_value(Hive::LocalMachine, OS_KEY, "CurrentMinorVersionNumber", RegValue::Dword(0))
            .with_value(Hive::LocalMachine, OS_KEY, "CurrentBuild", RegValue::String(build.into()))
    }

    fn line(report: &Report, needle: &str) -> (Tone, StatusMark) {
        match report.find(needle) {
            Some(ReportLine::Status { tone, mark, .. }) => (*tone, *mark),
            other => panic!("unexpected line {:?}", other),
        }
    }

    #[test]
    fn release_names() {
        assert_eq!(windows_release_name(5, 1, Some(2600)).as_deref(), Some("XP"));
        assert_eq!(windows_release_name(6, 1, Some(7601)).as_deref(), Some("7"));
        assert_eq!(windows_release_name(6, 3, None).as_deref(), Some("8.1"));
        assert_eq!(windows_release_name(6, 4, Some(9841)), None);
        assert_eq!(windows_release_name(10, 0, Some(10240)).as_deref(), Some("10 1507"));
        assert_eq!(windows_release_name(10, 0, Some(17000)).as_deref(), Some("10 RS4 Build 17000"));
        assert_eq!(windows_release_name(10, 0, Some(18363)).as_deref(), Some("10 1909"));
        assert_eq!(windows_release_name(10, 0, Some(19040)).as_deref(), Some("10 20H1 Build 19040"));
        assert_eq!(windows_release_name(10, 0, Some(19044)).as_deref(), Some("10 21H2"));
        assert_eq!(windows_release_name(10, 0, Some(19045)).as_deref(), Some("10 Dev Build 19045"));
        assert_eq!(windows_release_name(10, 0, Some(21996)).as_deref(), Some("11 Internal Build 21996"));
        assert_eq!(windows_release_name(10, 0, Some(22000)).as_deref(), Some("11 21H2"));
        assert_eq!(windows_release_name(10, 0, Some(22631)).as_deref(), Some("11 Dev Build 22631"));
        assert_eq!(windows_release_name(10, 0, None), None);
        assert_eq!(windows_release_name(4, 0, Some(1381)), None);
    }

    #[test]
    fn current_windows_is_green() {
        let report = check_os(&os_store("Windows 10 Pro", 10, "22631"));
        assert_eq!(line(&report, "OS: Windows 10 Pro"), (Tone::Green, StatusMark::Ok));
        assert_eq!(
            line(&report, "Version: 10.0.22631 (Windows 11 Dev Build 22631)"),
            (Tone::Green, StatusMark::Ok)
        );
        assert!(!report.contains("End of Service"));
    }

    #[test]
    fn builds_before_20h1_are_out_of_service() {
        let report = check_os(&os_store("Windows 10 Home", 10, "18363"));
        assert_eq!(line(&report, "OS: Windows 10 Home"), (Tone::Default, StatusMark::Ok));
        assert_eq!(
            line(&report, "Version: 10.0.18363 (Windows 10 1909)"),
            (Tone::Yellow, StatusMark::Warning)
        );
        assert!(report.contains("reached the End of Service status for mainstream support"));

        let report = check_os(&os_store("Windows 10 Home", 10, "19041"));
        assert!(!report.contains("End of Service"));
    }

    #[test]
    fn legacy_windows_reads_dotted_version() {
        let store = MemoryStore::new()
            .with_value(Hive::LocalMachine, OS_KEY, "ProductName", RegValue::String("Windows 7 Ultimate".into()))
            .with_value(Hive::LocalMachine, OS_KEY, "CurrentVersion", RegValue::String("6.1".into()))
            .with_value(Hive::LocalMachine, OS_KEY, "CurrentBuildNumber", RegValue::String("7601".into()));
        let report = check_os(&store);
        assert_eq!(line(&report, "OS: Windows 7 Ultimate"), (Tone::Yellow, StatusMark::Warning));
        assert_eq!(
            line(&report, "Version: 6.1.7601 (Windows 7)"),
            (Tone::Yellow, StatusMark::Warning)
        );
        assert!(report.contains("End of Service"));
    }

    #[test]
    fn missing_os_key_reports_nothing() {
        assert!(check_os(&MemoryStore::new()).lines().is_empty());
        assert!(check_cpu(&MemoryStore::new()).lines().is_empty());
    }

    #[test]
    fn cpu_name_is_trimmed() {
        let store = MemoryStore::new().with_value(
            Hive::LocalMachine,
            CPU_KEY,
            "ProcessorNameString",
            RegValue::String("AMD Ryzen 7 7800X3D 8-Core Processor         ".into()),
        );
        let report = check_cpu(&store);
        assert_eq!(
            line(&report, "CPU: AMD Ryzen 7 7800X3D 8-Core Processor"),
            (Tone::Cyan, StatusMark::Info)
        );
        assert_eq!(report.lines()[0].text(), "CPU: AMD Ryzen 7 7800X3D 8-Core Processor");
    }

    #[test]
    fn splits_package_full_names() {
        assert_eq!(
            package_family(PACK),
            Some(("Microsoft.D3DMappingLayers_8wekyb3d8bbwe".to_string(), "1.2302.1.0"))
        );
        assert_eq!(package_family("Microsoft.D3DMappingLayers_8wekyb3d8bbwe"), None);
        assert_eq!(package_family("_1.0_x64__pub"), None);
    }

    #[test]
    fn compatibility_pack_clears_everything_is_fine() {
        let (hive, repo) = PACKAGE_REPOSITORIES[0];
        let store = MemoryStore::new()
            .with_key(hive, &format!("{}\\{}", repo, PACK))
            .with_key(hive, &format!("{}\\{}", repo, "Microsoft.WindowsCalculator_11.2307.4.0_x64__8wekyb3d8bbwe"));
        let result = check_packages(&store);

        assert_eq!(result.found.len(), 1);
        assert!(!result.outcome.everything_is_fine());
        assert!(result.outcome.fixed_everything());
        assert!(result.outcome.fix_options().is_empty());
        assert_eq!(
            line(&result.report, "Potentially incompatible software:"),
            (Tone::Yellow, StatusMark::Warning)
        );
        assert!(result
            .report
            .contains("    OpenCL, OpenGL, and Vulkan Compatibility Pack v1.2302.1.0"));
    }

    #[test]
    fn package_in_both_repositories_is_listed_once() {
        let (machine, machine_repo) = PACKAGE_REPOSITORIES[0];
        let (user, user_repo) = PACKAGE_REPOSITORIES[1];
        let store = MemoryStore::new()
            .with_key(machine, &format!("{}\\{}", machine_repo, PACK))
            .with_value(
                user,
                &format!("{}\\{}", user_repo, PACK),
                "DisplayName",
                RegValue::String("@{Microsoft.D3DMappingLayers?ms-resource://AppStoreName}".into()),
            );
        let result = check_packages(&store);
        assert_eq!(result.found.len(), 1);
        assert_eq!(result.found[0].title, "OpenCL, OpenGL, and Vulkan Compatibility Pack");
    }

    #[test]
    fn plain_display_name_is_used() {
        let (hive, repo) = PACKAGE_REPOSITORIES[1];
        let store = MemoryStore::new().with_value(
            hive,
            &format!("{}\\{}", repo, PACK),
            "DisplayName",
            RegValue::String("Compatibility Pack".into()),
        );
        let result = check_packages(&store);
        assert!(result.report.contains("    Compatibility Pack v1.2302.1.0"));
    }

    #[test]
    fn no_packages_is_clean() {
        let result = check_packages(&MemoryStore::new());
        assert!(result.found.is_empty());
        assert!(result.report.lines().is_empty());
        assert_eq!(result.outcome, ScanOutcome::new());
    }
}
