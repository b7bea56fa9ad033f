//! Best-effort repair of registration entries.
//!
//! Every repair is a single store mutation, attempted only when its fix mode
//! is on. Failures never leave this module as errors: they downgrade the
//! matching [`ScanOutcome`] flag and come back as [`RepairResult::Failed`]
//! so the caller can update its own scope status.

use tracing::{debug, warn};

use crate::elevation::Elevation;
use crate::error::{StoreError, StoreErrorKind, StoreResult};
use crate::store::{KeyHandle, RegValue, RegistryStore};

use super::outcome::ScanOutcome;

/// Value written to a layer registration to disable it.
pub const DISABLED_SENTINEL: u32 = 1;

/// Result of one repair attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairResult {
    /// The store was changed.
    Applied,
    /// The fix mode is off; nothing was attempted.
    Skipped,
    /// The mutation failed; the entry is left as it was.
    Failed(StoreError),
}

impl RepairResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, RepairResult::Applied)
    }
}

/// Which outcome flag a failed or skipped repair downgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Broken,
    Conflict,
    ExplicitDriver,
}

enum Mutation {
    Delete,
    Set(RegValue),
}

/// Applies repairs against a store, requesting elevation before each one.
pub struct RepairExecutor<'a> {
    store: &'a mut dyn RegistryStore,
    elevation: &'a mut dyn Elevation,
}

impl<'a> RepairExecutor<'a> {
    pub fn new(store: &'a mut dyn RegistryStore, elevation: &'a mut dyn Elevation) -> Self {
        Self { store, elevation }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &dyn RegistryStore {
        &*self.store
    }

    /// Delete a registration whose file no longer exists.
    pub fn remove_broken_entry(
        &mut self,
        key: &KeyHandle,
        name: &str,
        enabled: bool,
        outcome: &mut ScanOutcome,
    ) -> RepairResult {
        self.attempt(key, name, Mutation::Delete, enabled, Category::Broken, outcome)
    }

    /// Disable a layer registration by writing the disabled sentinel.
    pub fn disable_entry(
        &mut self,
        key: &KeyHandle,
        name: &str,
        enabled: bool,
        outcome: &mut ScanOutcome,
    ) -> RepairResult {
        let value = RegValue::Dword(DISABLED_SENTINEL);
        self.attempt(key, name, Mutation::Set(value), enabled, Category::Conflict, outcome)
    }

    /// Rewrite a driver value to hold only `valid_paths`.
    ///
    /// No paths deletes the value, one path stores a single string, and
    /// several paths store a multi-string in the given order.
    pub fn replace_driver_value(
        &mut self,
        key: &KeyHandle,
        name: &str,
        valid_paths: &[String],
        enabled: bool,
        outcome: &mut ScanOutcome,
    ) -> RepairResult {
        let mutation = match valid_paths {
            [] => Mutation::Delete,
            [single] => Mutation::Set(RegValue::String(single.clone())),
            many => Mutation::Set(RegValue::MultiString(many.to_vec())),
        };
        self.attempt(key, name, mutation, enabled, Category::Broken, outcome)
    }

    /// Delete a legacy explicit driver registration.
    pub fn clear_explicit_driver_reg(
        &mut self,
        key: &KeyHandle,
        name: &str,
        enabled: bool,
        outcome: &mut ScanOutcome,
    ) -> RepairResult {
        self.attempt(
            key,
            name,
            Mutation::Delete,
            enabled,
            Category::ExplicitDriver,
            outcome,
        )
    }

    fn attempt(
        &mut self,
        key: &KeyHandle,
        name: &str,
        mutation: Mutation,
        enabled: bool,
        category: Category,
        outcome: &mut ScanOutcome,
    ) -> RepairResult {
        if !enabled {
            debug!("Fix mode is off, leaving {} @{}", key, name);
            downgrade(category, outcome);
            return RepairResult::Skipped;
        }

        match self.apply(key, name, mutation) {
            Ok(()) => {
                debug!("Fixed {} @{}", key, name);
                RepairResult::Applied
            }
            Err(e) => {
                match e.kind() {
                    StoreErrorKind::AccessDenied | StoreErrorKind::ElevationFailed => {
                        warn!("Insufficient privileges to fix {} @{}: {}", key, name, e)
                    }
                    StoreErrorKind::NotFound | StoreErrorKind::Failed => {
                        warn!("Failed to fix {} @{}: {}", key, name, e)
                    }
                }
                downgrade(category, outcome);
                RepairResult::Failed(e)
            }
        }
    }

    fn apply(&mut self, key: &KeyHandle, name: &str, mutation: Mutation) -> StoreResult<()> {
        self.elevation.ensure_elevated()?;
        match mutation {
            Mutation::Delete => self.store.delete_value(key, name),
            Mutation::Set(value) => self.store.set_value(key, name, value),
        }
    }
}

fn downgrade(category: Category, outcome: &mut ScanOutcome) {
    match category {
        Category::Broken => outcome.downgrade_fixed_everything(),
        Category::Conflict => outcome.downgrade_disabled_conflicting_layers(),
        Category::ExplicitDriver => outcome.downgrade_removed_explicit_driver_reg(),
    }
}
