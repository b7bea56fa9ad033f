//! In-memory registry store.
//!
//! `MemoryStore` keeps an ordered, case-insensitive key tree per hive. It
//! backs the test suite and the `--snapshot` mode of the CLI, where a
//! machine's registry is exported to JSON and diagnosed offline.
//!
//! # Snapshot format
//!
//! ```json
//! {
//!   "HKEY_LOCAL_MACHINE": {
//!     "SOFTWARE": {
//!       "Khronos": {
//!         "Vulkan": {
//!           "ImplicitLayers": { "C:\\layers\\overlay.json": 0 }
//!         }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Objects are keys. Numbers are `REG_DWORD`, strings are `REG_SZ`, and
//! string arrays are `REG_MULTI_SZ`. Member order is enumeration order.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Result, StoreError, StoreResult, VkDiagError};

use super::{Hive, KeyHandle, RegValue, RegistryStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Node {
    values: Vec<(String, RegValue)>,
    subkeys: Vec<(String, Node)>,
}

impl Node {
    fn child(&self, name: &str) -> Option<&Node> {
        self.subkeys
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, node)| node)
    }

    fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.subkeys
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, node)| node)
    }

    fn child_or_insert(&mut self, name: &str) -> &mut Node {
        let idx = match self
            .subkeys
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(idx) => idx,
            None => {
                self.subkeys.push((name.to_string(), Node::default()));
                self.subkeys.len() - 1
            }
        };
        &mut self.subkeys[idx].1
    }

    fn value(&self, name: &str) -> Option<&RegValue> {
        self.values
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    fn set(&mut self, name: &str, value: RegValue) {
        match self
            .values
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1 = value,
            None => self.values.push((name.to_string(), value)),
        }
    }

    fn remove(&mut self, name: &str) -> bool {
        let before = self.values.len();
        self.values.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.values.len() != before
    }

    fn from_json(map: &Map<String, Value>, at: &str) -> std::result::Result<Node, String> {
        let mut node = Node::default();
        for (name, value) in map {
            let here = format!("{}\\{}", at, name);
            let taken = match value {
                Value::Object(_) => node.child(name).is_some(),
                _ => node.value(name).is_some(),
            };
            if taken {
                return Err(format!("{}: name differs from a sibling only by case", here));
            }
            match value {
                Value::Object(inner) => {
                    let child = Node::from_json(inner, &here)?;
                    node.subkeys.push((name.clone(), child));
                }
                Value::Number(n) => {
                    let dword = n
                        .as_u64()
                        .and_then(|v| u32::try_from(v).ok())
                        .ok_or_else(|| format!("{}: number is not a DWORD", here))?;
                    node.values.push((name.clone(), RegValue::Dword(dword)));
                }
                Value::String(s) => node.values.push((name.clone(), RegValue::String(s.clone()))),
                Value::Array(items) => {
                    let list = items
                        .iter()
                        .map(|item| item.as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| format!("{}: multi-string must contain strings", here))?;
                    node.values.push((name.clone(), RegValue::MultiString(list)));
                }
                Value::Bool(_) | Value::Null => {
                    return Err(format!("{}: unsupported value type", here));
                }
            }
        }
        Ok(node)
    }

    fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (name, value) in &self.values {
            let json = match value {
                RegValue::Dword(v) => Value::from(*v),
                RegValue::String(s) => Value::from(s.clone()),
                RegValue::MultiString(list) => Value::from(list.clone()),
            };
            map.insert(name.clone(), json);
        }
        for (name, child) in &self.subkeys {
            map.insert(name.clone(), child.to_json());
        }
        Value::Object(map)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('\\').filter(|s| !s.is_empty())
}

/// Ordered in-memory registry.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    machine: Node,
    user: Node,
    denied: Vec<(Hive, String)>,
    modified: bool,
}

impl MemoryStore {
    /// Create an empty store (no keys in either hive).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`insert_value`](Self::insert_value).
    pub fn with_value(mut self, hive: Hive, path: &str, name: &str, value: RegValue) -> Self {
        self.insert_value(hive, path, name, value);
        self
    }

    /// Builder-style variant of [`create_key`](Self::create_key).
    pub fn with_key(mut self, hive: Hive, path: &str) -> Self {
        self.create_key(hive, path);
        self
    }

    /// Create a key and any missing parents.
    pub fn create_key(&mut self, hive: Hive, path: &str) {
        let mut node = self.root_mut(hive);
        for seg in segments(path) {
            node = node.child_or_insert(seg);
        }
    }

    /// Insert a value, creating the key path as needed.
    pub fn insert_value(&mut self, hive: Hive, path: &str, name: &str, value: RegValue) {
        let mut node = self.root_mut(hive);
        for seg in segments(path) {
            node = node.child_or_insert(seg);
        }
        node.set(name, value);
    }

    /// Make every mutation at or below `path` fail with access denied.
    pub fn deny_writes(&mut self, hive: Hive, path: &str) {
        self.denied
            .push((hive, segments(path).collect::<Vec<_>>().join("\\")));
    }

    /// Inspect a stored value directly.
    pub fn value(&self, hive: Hive, path: &str, name: &str) -> Option<&RegValue> {
        self.find(hive, path)?.value(name)
    }

    /// Whether any mutation has been applied since the store was created.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Parse a JSON snapshot.
    pub fn from_json(content: &str) -> std::result::Result<Self, String> {
        let root: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
        let hives = root
            .as_object()
            .ok_or_else(|| "root must be an object of hives".to_string())?;

        let mut store = MemoryStore::new();
        for (name, body) in hives {
            let hive = Hive::from_name(name).ok_or_else(|| format!("unknown hive: {}", name))?;
            let body = body
                .as_object()
                .ok_or_else(|| format!("{}: hive must be an object", name))?;
            *store.root_mut(hive) = Node::from_json(body, hive.name())?;
        }
        Ok(store)
    }

    /// Serialize the store as a JSON snapshot.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for hive in Hive::ALL {
            let root = self.root(hive);
            if root != &Node::default() {
                map.insert(hive.name().to_string(), root.to_json());
            }
        }
        Value::Object(map)
    }

    /// Load a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotNotFound` if the file doesn't exist and
    /// `SnapshotParseError` if its content is not a valid snapshot.
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VkDiagError::SnapshotNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                VkDiagError::Io(e)
            }
        })?;

        Self::from_json(content.trim_start_matches('\u{feff}')).map_err(|message| {
            VkDiagError::SnapshotParseError {
                path: path.to_path_buf(),
                message,
            }
        })
    }

    /// Write the store to a snapshot file.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.to_json())
            .map_err(|e| VkDiagError::Other(e.into()))?;
        fs::write(path, content)?;
        Ok(())
    }

    fn root(&self, hive: Hive) -> &Node {
        match hive {
            Hive::LocalMachine => &self.machine,
            Hive::CurrentUser => &self.user,
        }
    }

    fn root_mut(&mut self, hive: Hive) -> &mut Node {
        match hive {
            Hive::LocalMachine => &mut self.machine,
            Hive::CurrentUser => &mut self.user,
        }
    }

    fn find(&self, hive: Hive, path: &str) -> Option<&Node> {
        let mut node = self.root(hive);
        for seg in segments(path) {
            node = node.child(seg)?;
        }
        Some(node)
    }

    fn find_mut(&mut self, hive: Hive, path: &str) -> Option<&mut Node> {
        let mut node = self.root_mut(hive);
        for seg in segments(path) {
            node = node.child_mut(seg)?;
        }
        Some(node)
    }

    fn is_denied(&self, hive: Hive, path: &str) -> bool {
        let path = segments(path).collect::<Vec<_>>().join("\\").to_lowercase();
        self.denied.iter().any(|(h, prefix)| {
            let prefix = prefix.to_lowercase();
            *h == hive
                && (prefix.is_empty()
                    || path == prefix
                    || path.starts_with(&format!("{}\\", prefix)))
        })
    }

    fn check_writable(&self, key: &KeyHandle) -> StoreResult<()> {
        if !key.writable || self.is_denied(key.hive, &key.path) {
            return Err(StoreError::AccessDenied {
                path: key.to_string(),
            });
        }
        Ok(())
    }

    fn node_for(&self, key: &KeyHandle) -> StoreResult<&Node> {
        self.find(key.hive, &key.path)
            .ok_or_else(|| StoreError::NotFound {
                path: key.to_string(),
            })
    }
}

impl RegistryStore for MemoryStore {
    fn open_key(&self, hive: Hive, path: &str, writable: bool) -> StoreResult<Option<KeyHandle>> {
        Ok(self.find(hive, path).map(|_| KeyHandle {
            hive,
            path: segments(path).collect::<Vec<_>>().join("\\"),
            writable,
        }))
    }

    fn subkey_names(&self, key: &KeyHandle) -> StoreResult<Vec<String>> {
        Ok(self
            .node_for(key)?
            .subkeys
            .iter()
            .map(|(n, _)| n.clone())
            .collect())
    }

    fn value_names(&self, key: &KeyHandle) -> StoreResult<Vec<String>> {
        Ok(self
            .node_for(key)?
            .values
            .iter()
            .map(|(n, _)| n.clone())
            .collect())
    }

    fn get_value(&self, key: &KeyHandle, name: &str) -> StoreResult<Option<RegValue>> {
        Ok(self.node_for(key)?.value(name).cloned())
    }

    fn set_value(&mut self, key: &KeyHandle, name: &str, value: RegValue) -> StoreResult<()> {
        self.check_writable(key)?;
        let display = key.to_string();
        let node = self
            .find_mut(key.hive, &key.path)
            .ok_or(StoreError::NotFound { path: display })?;
        node.set(name, value);
        self.modified = true;
        Ok(())
    }

    fn delete_value(&mut self, key: &KeyHandle, name: &str) -> StoreResult<()> {
        self.check_writable(key)?;
        let display = key.to_string();
        let node = self
            .find_mut(key.hive, &key.path)
            .ok_or_else(|| StoreError::NotFound {
                path: display.clone(),
            })?;
        if !node.remove(name) {
            return Err(StoreError::NotFound {
                path: format!("{} @{}", display, name),
            });
        }
        self.modified = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreErrorKind;
    use tempfile::TempDir;

    const LAYERS: &str = "SOFTWARE\\Khronos\\Vulkan\\ImplicitLayers";

    fn sample() -> MemoryStore {
        MemoryStore::new()
            .with_value(Hive::LocalMachine, LAYERS, "C:\\b.json", RegValue::Dword(0))
            .with_value(Hive::LocalMachine, LAYERS, "C:\\a.json", RegValue::Dword(1))
    }

    #[test]
    fn open_missing_key_returns_none() {
        let store = MemoryStore::new();
        let key = store
            .open_key(Hive::LocalMachine, "SOFTWARE\\Nope", false)
            .unwrap();
        assert!(key.is_none());
    }

    #[test]
    fn enumeration_preserves_insertion_order() {
        let store = sample();
        let key = store
            .open_key(Hive::LocalMachine, LAYERS, false)
            .unwrap()
            .unwrap();
        assert_eq!(
            store.value_names(&key).unwrap(),
            vec!["C:\\b.json".to_string(), "C:\\a.json".to_string()]
        );
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let store = sample();
        let key = store
            .open_key(Hive::LocalMachine, "software\\KHRONOS\\vulkan\\implicitlayers", false)
            .unwrap()
            .unwrap();
        assert_eq!(
            store.get_value(&key, "c:\\B.JSON").unwrap(),
            Some(RegValue::Dword(0))
        );
    }

    #[test]
    fn read_only_handle_rejects_writes() {
        let mut store = sample();
        let key = store
            .open_key(Hive::LocalMachine, LAYERS, false)
            .unwrap()
            .unwrap();
        let err = store.delete_value(&key, "C:\\b.json").unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::AccessDenied);
        assert!(!store.is_modified());
    }

    #[test]
    fn denied_subtree_rejects_writes() {
        let mut store = sample();
        store.deny_writes(Hive::LocalMachine, "SOFTWARE\\Khronos");
        let key = store
            .open_key(Hive::LocalMachine, LAYERS, true)
            .unwrap()
            .unwrap();
        let err = store
            .set_value(&key, "C:\\b.json", RegValue::Dword(1))
            .unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::AccessDenied);
    }

    #[test]
    fn writable_handle_mutates() {
        let mut store = sample();
        let key = store
            .open_key(Hive::LocalMachine, LAYERS, true)
            .unwrap()
            .unwrap();
        store
            .set_value(&key, "C:\\b.json", RegValue::Dword(1))
            .unwrap();
        store.delete_value(&key, "C:\\a.json").unwrap();

        assert!(store.is_modified());
        assert_eq!(
            store.value(Hive::LocalMachine, LAYERS, "C:\\b.json"),
            Some(&RegValue::Dword(1))
        );
        assert!(store.value(Hive::LocalMachine, LAYERS, "C:\\a.json").is_none());
    }

    #[test]
    fn deleting_missing_value_is_not_found() {
        let mut store = sample();
        let key = store
            .open_key(Hive::LocalMachine, LAYERS, true)
            .unwrap()
            .unwrap();
        let err = store.delete_value(&key, "C:\\zzz.json").unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::NotFound);
    }

    #[test]
    fn parses_snapshot_json() {
        let json = r#"{
            "HKLM": {
                "SYSTEM": {
                    "Video": {
                        "{guid}": {
                            "0000": {
                                "DriverDesc": "GPU",
                                "VulkanDriverName": ["a.json", "b.json"],
                                "Flag": 3
                            },
                            "Video": {}
                        }
                    }
                }
            }
        }"#;
        let store = MemoryStore::from_json(json).unwrap();
        let key = store
            .open_key(Hive::LocalMachine, "SYSTEM\\Video\\{guid}", false)
            .unwrap()
            .unwrap();
        assert_eq!(
            store.subkey_names(&key).unwrap(),
            vec!["0000".to_string(), "Video".to_string()]
        );
        assert_eq!(
            store.value(Hive::LocalMachine, "SYSTEM\\Video\\{guid}\\0000", "VulkanDriverName"),
            Some(&RegValue::MultiString(vec!["a.json".into(), "b.json".into()]))
        );
        assert_eq!(
            store.value(Hive::LocalMachine, "SYSTEM\\Video\\{guid}\\0000", "Flag"),
            Some(&RegValue::Dword(3))
        );
    }

    #[test]
    fn rejects_unknown_hive_and_bad_values() {
        assert!(MemoryStore::from_json(r#"{"HKEY_USERS": {}}"#).is_err());
        assert!(MemoryStore::from_json(r#"{"HKLM": {"x": true}}"#).is_err());
        assert!(MemoryStore::from_json(r#"{"HKLM": {"x": -1}}"#).is_err());
        assert!(MemoryStore::from_json(r#"{"HKLM": {"x": [1]}}"#).is_err());
        assert!(MemoryStore::from_json("[]").is_err());
    }

    #[test]
    fn rejects_names_differing_only_by_case() {
        let values = r#"{"HKLM": {"Layers": {"C:\\gone\\a.json": 0, "c:\\GONE\\A.json": 0}}}"#;
        let err = MemoryStore::from_json(values).unwrap_err();
        assert!(err.contains("only by case"));

        let keys = r#"{"HKCU": {"Software": {}, "SOFTWARE": {}}}"#;
        assert!(MemoryStore::from_json(keys).is_err());
    }

    #[test]
    fn value_and_key_may_share_a_name() {
        let json = r#"{"HKLM": {"Vulkan": 1, "vulkan": {}}}"#;
        let store = MemoryStore::from_json(json).unwrap();
        assert_eq!(store.value(Hive::LocalMachine, "", "Vulkan"), Some(&RegValue::Dword(1)));
        assert!(store.find(Hive::LocalMachine, "VULKAN").is_some());
    }

    #[test]
    fn snapshot_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("machine.json");
        let store = sample();
        store.save_snapshot(&path).unwrap();

        let loaded = MemoryStore::load_snapshot(&path).unwrap();
        let key = loaded
            .open_key(Hive::LocalMachine, LAYERS, false)
            .unwrap()
            .unwrap();
        assert_eq!(
            loaded.value_names(&key).unwrap(),
            vec!["C:\\b.json".to_string(), "C:\\a.json".to_string()]
        );
    }

    #[test]
    fn load_missing_snapshot_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = MemoryStore::load_snapshot(&temp.path().join("none.json")).unwrap_err();
        assert!(matches!(err, VkDiagError::SnapshotNotFound { .. }));
    }
}
