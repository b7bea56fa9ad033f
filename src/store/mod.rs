//! Hierarchical key/value store access.
//!
//! The scan engine never talks to a concrete registry. It consumes the
//! [`RegistryStore`] trait, which exposes just enough of a Windows-style
//! registry to enumerate keys, read typed values, and mutate values.
//!
//! # Modules
//!
//! - [`memory`] - In-memory store with JSON snapshot loading and saving

pub mod memory;

pub use memory::MemoryStore;

use std::fmt;

use crate::error::StoreResult;

/// A registry root hive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hive {
    /// Machine-wide settings (`HKEY_LOCAL_MACHINE`).
    LocalMachine,
    /// Per-user settings (`HKEY_CURRENT_USER`).
    CurrentUser,
}

impl Hive {
    /// All hives in scan order.
    pub const ALL: [Hive; 2] = [Hive::LocalMachine, Hive::CurrentUser];

    /// Full hive name as shown by registry tools.
    pub fn name(&self) -> &'static str {
        match self {
            Hive::LocalMachine => "HKEY_LOCAL_MACHINE",
            Hive::CurrentUser => "HKEY_CURRENT_USER",
        }
    }

    /// Parse a full or abbreviated hive name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "HKEY_LOCAL_MACHINE" | "HKLM" => Some(Hive::LocalMachine),
            "HKEY_CURRENT_USER" | "HKCU" => Some(Hive::CurrentUser),
            _ => None,
        }
    }
}

impl fmt::Display for Hive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed registry value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegValue {
    /// 32-bit integer (`REG_DWORD`).
    Dword(u32),
    /// Single string (`REG_SZ`).
    String(String),
    /// String list (`REG_MULTI_SZ`).
    MultiString(Vec<String>),
}

impl RegValue {
    /// The string payload, if this is a single string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RegValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if this is a DWORD.
    pub fn as_dword(&self) -> Option<u32> {
        match self {
            RegValue::Dword(v) => Some(*v),
            _ => None,
        }
    }
}

/// A value that may hold zero, one, or several file paths.
///
/// Driver registration values are either `REG_SZ` (one path) or
/// `REG_MULTI_SZ` (several paths); anything else carries no paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathValue {
    Absent,
    Single(String),
    Multi(Vec<String>),
}

impl PathValue {
    /// Interpret a raw store value as a path value.
    pub fn from_raw(raw: Option<RegValue>) -> Self {
        match raw {
            None | Some(RegValue::Dword(_)) => PathValue::Absent,
            Some(RegValue::String(s)) => PathValue::Single(s),
            Some(RegValue::MultiString(list)) => PathValue::Multi(list),
        }
    }

    /// The contained paths in stored order.
    pub fn paths(&self) -> Vec<&str> {
        match self {
            PathValue::Absent => Vec::new(),
            PathValue::Single(p) => vec![p.as_str()],
            PathValue::Multi(list) => list.iter().map(String::as_str).collect(),
        }
    }
}

/// An opened key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyHandle {
    pub hive: Hive,
    /// Backslash-separated path below the hive, without leading separator.
    pub path: String,
    /// Whether the key was opened with write access.
    pub writable: bool,
}

impl KeyHandle {
    /// Path of a sub key below this handle.
    pub fn child_path(&self, name: &str) -> String {
        join_key_path(&self.path, name)
    }
}

impl fmt::Display for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.hive)
        } else {
            write!(f, "{}\\{}", self.hive, self.path)
        }
    }
}

/// Join two backslash-separated key paths.
pub fn join_key_path(base: &str, child: &str) -> String {
    let base = base.trim_matches('\\');
    let child = child.trim_matches('\\');
    match (base.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{}\\{}", base, child),
    }
}

/// Access to a hierarchical key/value store.
///
/// Reads return `Ok(None)` for absent keys and values. Mutations may fail
/// with any [`StoreError`](crate::error::StoreError); callers classify the
/// failure rather than assume a cause.
pub trait RegistryStore {
    /// Open a key, returning `None` when it does not exist.
    fn open_key(&self, hive: Hive, path: &str, writable: bool) -> StoreResult<Option<KeyHandle>>;

    /// Names of the direct sub keys, in enumeration order.
    fn subkey_names(&self, key: &KeyHandle) -> StoreResult<Vec<String>>;

    /// Names of the values stored in the key, in enumeration order.
    fn value_names(&self, key: &KeyHandle) -> StoreResult<Vec<String>>;

    /// Read a value.
    fn get_value(&self, key: &KeyHandle, name: &str) -> StoreResult<Option<RegValue>>;

    /// Create or overwrite a value.
    fn set_value(&mut self, key: &KeyHandle, name: &str, value: RegValue) -> StoreResult<()>;

    /// Delete a value.
    fn delete_value(&mut self, key: &KeyHandle, name: &str) -> StoreResult<()>;

    /// Open a sub key of an already opened key.
    fn open_subkey(
        &self,
        key: &KeyHandle,
        name: &str,
        writable: bool,
    ) -> StoreResult<Option<KeyHandle>> {
        self.open_key(key.hive, &key.child_path(name), writable)
    }

    /// Read a non-empty string value, treating any failure as absence.
    fn get_string(&self, key: &KeyHandle, name: &str) -> Option<String> {
        match self.get_value(key, name) {
            Ok(Some(RegValue::String(s))) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}
