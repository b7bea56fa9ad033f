//! Version checking against the published release list.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::scan::{Report, StatusMark, Tone};
use crate::version::Version;

/// Current version of vkdiag.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One entry of the release list.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl ReleaseInfo {
    /// Version from the tag, ignoring a leading `v`.
    pub fn version(&self) -> Option<Version> {
        Version::parse(self.tag_name.trim().trim_start_matches(['v', 'V']))
    }
}

/// Result of comparing the running version with the release list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    /// Running version.
    pub current: String,
    /// Newest stable release.
    pub latest: Option<Version>,
    /// Newest prerelease.
    pub latest_prerelease: Option<Version>,
}

impl UpdateInfo {
    fn current_version(&self) -> Version {
        Version::parse(&self.current).unwrap_or(Version::ZERO)
    }

    /// Newer stable release, if any.
    pub fn newer_release(&self) -> Option<Version> {
        self.latest.filter(|latest| *latest > self.current_version())
    }

    /// Prerelease newer than both the running version and the newest
    /// stable release, if any.
    pub fn newer_prerelease(&self) -> Option<Version> {
        let floor = self
            .latest
            .map_or(self.current_version(), |latest| latest.max(self.current_version()));
        self.latest_prerelease.filter(|pre| *pre > floor)
    }
}

/// Pick the newest stable and prerelease versions from a release list.
///
/// Tags that don't parse as versions are ignored.
pub fn evaluate(current: &str, releases: &[ReleaseInfo]) -> UpdateInfo {
    let newest = |prerelease: bool| {
        releases
            .iter()
            .filter(|r| r.prerelease == prerelease)
            .filter_map(ReleaseInfo::version)
            .max()
    };

    UpdateInfo {
        current: current.to_string(),
        latest: newest(false),
        latest_prerelease: newest(true),
    }
}

/// Fetch the release list.
pub fn fetch_releases(url: &str) -> Result<Vec<ReleaseInfo>> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(format!("vkdiag/{}", VERSION))
        .timeout(Duration::from_secs(10))
        .build()?;

    let response = client
        .get(url)
        .send()
        .with_context(|| format!("Failed to fetch {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Release list request failed with status {}", response.status());
    }

    response
        .json()
        .context("Failed to parse release list response")
}

/// Check the release list at `url` for newer versions.
pub fn check_for_updates(url: &str) -> Result<UpdateInfo> {
    let releases = fetch_releases(url)?;
    debug!("Fetched {} releases", releases.len());
    Ok(evaluate(VERSION, &releases))
}

/// Render the result of an update check.
pub fn version_report(current: &str, check: &Result<UpdateInfo>) -> Report {
    let mut report = Report::new();
    let title = format!("VkDiag version: {}", current);

    match check {
        Ok(info) => {
            if let Some(newer) = info.newer_release() {
                report.status(Tone::Yellow, StatusMark::Warning, title);
                report.status(
                    Tone::Yellow,
                    StatusMark::Warning,
                    format!("    Newer version available: {}", newer),
                );
            } else {
                report.status(Tone::Green, StatusMark::Ok, title);
            }
            if let Some(pre) = info.newer_prerelease() {
                report.status(
                    Tone::Default,
                    StatusMark::Ok,
                    format!("    Newer prerelease version available: {}", pre),
                );
            }
        }
        Err(e) => {
            debug!("Update check failed: {:#}", e);
            report.status(Tone::Default, StatusMark::Ok, title);
            report.status(Tone::Yellow, StatusMark::Warning, "    Failed to check for updates");
        }
    }

    report
}
