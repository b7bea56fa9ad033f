//! Release checking.
//!
//! Fetches the published release list, finds the newest stable release and
//! prerelease, and renders the version lines shown at the top of a run.

pub mod version;

pub use version::{
    check_for_updates, evaluate, fetch_releases, version_report, ReleaseInfo, UpdateInfo, VERSION,
};
