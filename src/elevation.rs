//! Privilege elevation.
//!
//! Mutating the machine hive needs administrator rights. The scan engine
//! calls [`Elevation::ensure_elevated`] before every mutation attempt and
//! never assumes it already holds the privilege. How elevation happens
//! (relaunching through a UAC prompt, or doing nothing for a snapshot file)
//! is up to the implementation.

use crate::error::{StoreError, StoreResult};

/// Requests write privileges before a mutation.
pub trait Elevation {
    /// Make sure the process may mutate the store.
    ///
    /// Implementations may return immediately when already elevated. An
    /// error means the privilege could not be obtained; the caller treats
    /// it like any other failed mutation.
    fn ensure_elevated(&mut self) -> StoreResult<()>;
}

/// Elevation for stores that need no extra privilege, such as snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotRequired;

impl Elevation for NotRequired {
    fn ensure_elevated(&mut self) -> StoreResult<()> {
        Ok(())
    }
}

/// Elevation that counts requests and can be told to refuse them.
#[derive(Debug, Clone, Default)]
pub struct RecordingElevation {
    requests: usize,
    refuse: bool,
}

impl RecordingElevation {
    pub fn new() -> Self {
        Self::default()
    }

    /// An elevation requester that always fails.
    pub fn refusing() -> Self {
        Self {
            requests: 0,
            refuse: true,
        }
    }

    /// Number of times elevation was requested.
    pub fn requests(&self) -> usize {
        self.requests
    }
}

impl Elevation for RecordingElevation {
    fn ensure_elevated(&mut self) -> StoreResult<()> {
        self.requests += 1;
        if self.refuse {
            tracing::debug!("Elevation request refused");
            return Err(StoreError::ElevationFailed {
                message: "elevation was declined".to_string(),
            });
        }
        Ok(())
    }
}
