//! File existence and version probing.
//!
//! Registration entries are plain path strings taken from the store, so the
//! helpers here treat both `\` and `/` as separators regardless of the host
//! platform.
//!
//! # Example
//!
//! ```
//! use vkdiag::probe::{file_name, FileProber, MemoryProber};
//!
//! let prober = MemoryProber::new().with_file("C:\\layers\\obs-vulkan64.json", "{}");
//! assert!(prober.exists("c:\\LAYERS\\obs-vulkan64.json"));
//! assert_eq!(file_name("C:\\layers\\obs-vulkan64.json"), "obs-vulkan64.json");
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Access to the file system as seen by the scanners.
pub trait FileProber {
    /// Whether `path` is an existing regular file.
    fn exists(&self, path: &str) -> bool;

    /// The version string embedded in a library file, if any.
    fn file_version(&self, path: &str) -> Option<String>;

    /// Read a text file.
    fn read_to_string(&self, path: &str) -> std::io::Result<String>;
}

/// Prober backed by the real file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProber;

impl FileProber for FsProber {
    fn exists(&self, path: &str) -> bool {
        !path.is_empty() && Path::new(path).is_file()
    }

    fn file_version(&self, path: &str) -> Option<String> {
        let bytes = fs::read(path).ok()?;
        extract_file_version(&bytes)
    }

    fn read_to_string(&self, path: &str) -> std::io::Result<String> {
        fs::read_to_string(path)
    }
}

#[derive(Debug, Clone, Default)]
struct FakeFile {
    content: String,
    version: Option<String>,
}

/// Prober over an in-memory file table.
///
/// Lookups are case-insensitive and treat `/` and `\` alike, matching how
/// Windows resolves registration paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryProber {
    files: HashMap<String, FakeFile>,
}

impl MemoryProber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text file.
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(
            normalize(path),
            FakeFile {
                content: content.to_string(),
                version: None,
            },
        );
        self
    }

    /// Add a library file carrying an embedded version string.
    pub fn with_library(mut self, path: &str, version: &str) -> Self {
        self.files.insert(
            normalize(path),
            FakeFile {
                content: String::new(),
                version: Some(version.to_string()),
            },
        );
        self
    }

    /// Remove a file, as if it was uninstalled.
    pub fn remove(&mut self, path: &str) {
        self.files.remove(&normalize(path));
    }
}

impl FileProber for MemoryProber {
    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(&normalize(path))
    }

    fn file_version(&self, path: &str) -> Option<String> {
        self.files.get(&normalize(path))?.version.clone()
    }

    fn read_to_string(&self, path: &str) -> std::io::Result<String> {
        self.files
            .get(&normalize(path))
            .map(|f| f.content.clone())
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()))
    }
}

fn normalize(path: &str) -> String {
    path.replace('/', "\\").to_lowercase()
}

fn is_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

/// Final component of a path.
pub fn file_name(path: &str) -> &str {
    path.rsplit(is_separator).next().unwrap_or(path)
}

/// Everything before the final separator, or `""` for a bare name.
pub fn parent_dir(path: &str) -> &str {
    path.rfind(is_separator).map(|i| &path[..i]).unwrap_or("")
}

/// Whether a path is rooted (`\x`, `/x`, or a drive letter).
pub fn is_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    path.starts_with(is_separator)
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}

/// Resolve `rel` against `base_dir`, keeping absolute paths as they are.
pub fn resolve_relative(base_dir: &str, rel: &str) -> String {
    if is_absolute(rel) || base_dir.is_empty() {
        return rel.to_string();
    }
    let sep = if base_dir.contains('/') && !base_dir.contains('\\') {
        '/'
    } else {
        '\\'
    };
    let rel = rel
        .strip_prefix(".\\")
        .or_else(|| rel.strip_prefix("./"))
        .unwrap_or(rel);
    format!("{}{}{}", base_dir.trim_end_matches(is_separator), sep, rel)
}

const VS_FIXEDFILEINFO_SIGNATURE: [u8; 4] = [0xBD, 0x04, 0xEF, 0xFE];

/// Extract the file version from a PE image's version resource.
///
/// Prefers the `FileVersion` entry of the string table and falls back to
/// the binary `VS_FIXEDFILEINFO` block.
pub fn extract_file_version(bytes: &[u8]) -> Option<String> {
    string_table_version(bytes).or_else(|| fixed_file_version(bytes))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn string_table_version(bytes: &[u8]) -> Option<String> {
    let key: Vec<u8> = "FileVersion\0"
        .encode_utf16()
        .flat_map(u16::to_le_bytes)
        .collect();

    let mut start = 0;
    while let Some(pos) = find(&bytes[start..], &key) {
        let mut i = start + pos + key.len();
        // value is DWORD aligned; skip the zero padding
        while i + 1 < bytes.len() && bytes[i] == 0 && bytes[i + 1] == 0 {
            i += 2;
        }

        let mut units = Vec::new();
        while i + 1 < bytes.len() && units.len() < 128 {
            let unit = u16::from_le_bytes([bytes[i], bytes[i + 1]]);
            if unit == 0 {
                break;
            }
            units.push(unit);
            i += 2;
        }

        let value = String::from_utf16_lossy(&units).trim().to_string();
        if !value.is_empty() {
            return Some(value);
        }
        start += pos + key.len();
    }
    None
}

fn fixed_file_version(bytes: &[u8]) -> Option<String> {
    let pos = find(bytes, &VS_FIXEDFILEINFO_SIGNATURE)?;
    let read_u32 = |at: usize| -> Option<u32> {
        let slice = bytes.get(at..at + 4)?;
        Some(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
    };
    let ms = read_u32(pos + 8)?;
    let ls = read_u32(pos + 12)?;
    Some(format!(
        "{}.{}.{}.{}",
        ms >> 16,
        ms & 0xFFFF,
        ls >> 16,
        ls & 0xFFFF
    ))
}
