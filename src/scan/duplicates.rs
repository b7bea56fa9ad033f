//! Duplicate layer resolution.
//!
//! Two enabled registrations of the same manifest file name in one scope
//! load the same layer twice. The newer one (by library version, then API
//! version) stays enabled; the other is disabled.

use std::cmp::Ordering;

use crate::probe::file_name;
use crate::version::Version;

use super::classifier::{LayerDescriptor, RegistrationEntry};

/// Which side of a duplicate pair stays enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    /// The entry being processed now.
    Candidate,
    /// The entry processed earlier in the scope.
    Incumbent,
}

/// Index of the first earlier entry that duplicates `candidate_path`.
///
/// Only enabled, non-broken entries are considered; file names compare
/// case-insensitively.
pub fn find_duplicate(candidate_path: &str, processed: &[RegistrationEntry]) -> Option<usize> {
    let name = file_name(candidate_path);
    processed
        .iter()
        .position(|entry| !entry.broken && entry.enabled && entry.file_name().eq_ignore_ascii_case(name))
}

/// Decide which of two duplicate registrations to keep.
///
/// The candidate wins when either its library version or its API version
/// is greater, with unknown versions counting as zero. When no side knows
/// any version, the case-insensitively greater path wins.
pub fn resolve_winner(
    candidate_path: &str,
    candidate: &LayerDescriptor,
    incumbent_path: &str,
    incumbent: &LayerDescriptor,
) -> Winner {
    if candidate.is_unversioned() && incumbent.is_unversioned() {
        return match compare_ignore_case(candidate_path, incumbent_path) {
            Ordering::Greater => Winner::Candidate,
            _ => Winner::Incumbent,
        };
    }

    let lib = |d: &LayerDescriptor| d.library_version.unwrap_or(Version::ZERO);
    let api = |d: &LayerDescriptor| d.api_version.unwrap_or(Version::ZERO);

    if lib(candidate) > lib(incumbent) || api(candidate) > api(incumbent) {
        Winner::Candidate
    } else {
        Winner::Incumbent
    }
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_uppercase)
        .cmp(b.chars().flat_map(char::to_uppercase))
}
