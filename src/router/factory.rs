//! Child storage factories for the multi-store router

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::{Config, SyncMode};
use crate::error::Result;
use crate::storage::{FileStorage, MemoryStorage, Storage};

/// Characters that never appear unescaped in a child file name
const DISALLOWED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '%', '~'];

/// Longest file name stem produced by `sanitize_super_tag`
const MAX_NAME_LEN: usize = 200;

/// Extension of child store files
const CHILD_EXTENSION: &str = "tfr";

/// Opens and releases the durable storage behind each child store
pub trait ChildFactory: Send + Sync {
    type Storage: Storage + Sync;

    /// Open (or create) the storage for `super_tag`
    fn open(&self, super_tag: &str) -> Result<Self::Storage>;

    /// The child is being evicted: persist and close its storage
    fn release(&self, super_tag: &str, storage: &mut Self::Storage) -> Result<()>;
}

// =============================================================================
// In-memory children
// =============================================================================

/// Children live in memory; an evicted child's bytes are parked until the
/// super-tag is opened again
#[derive(Debug, Default)]
pub struct MemoryChildFactory {
    parked: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryChildFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of evicted children waiting to be reopened
    pub fn parked_count(&self) -> usize {
        self.parked.lock().len()
    }
}

impl ChildFactory for MemoryChildFactory {
    type Storage = MemoryStorage;

    fn open(&self, super_tag: &str) -> Result<MemoryStorage> {
        let bytes = self.parked.lock().remove(super_tag).unwrap_or_default();
        Ok(MemoryStorage::from_bytes(bytes))
    }

    fn release(&self, super_tag: &str, storage: &mut MemoryStorage) -> Result<()> {
        let bytes = std::mem::take(storage).into_bytes();
        self.parked.lock().insert(super_tag.to_string(), bytes);
        Ok(())
    }
}

// =============================================================================
// File-backed children
// =============================================================================

/// One file per super-tag inside a directory
#[derive(Debug, Clone)]
pub struct FileChildFactory {
    dir: PathBuf,
    sync_mode: SyncMode,
}

impl FileChildFactory {
    /// Use `dir`, creating it if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            sync_mode: SyncMode::Never,
        })
    }

    /// Use the configured children directory and sync mode
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut factory = Self::new(config.children_dir())?;
        factory.sync_mode = config.sync_mode;
        Ok(factory)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the child for `super_tag`
    pub fn path_for(&self, super_tag: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", sanitize_super_tag(super_tag), CHILD_EXTENSION))
    }
}

impl ChildFactory for FileChildFactory {
    type Storage = FileStorage;

    fn open(&self, super_tag: &str) -> Result<FileStorage> {
        FileStorage::open_with(self.path_for(super_tag), self.sync_mode)
    }

    fn release(&self, _super_tag: &str, storage: &mut FileStorage) -> Result<()> {
        storage.close()
    }
}

/// Turn a super-tag into a file-system-safe name
///
/// Disallowed characters, control characters and a leading `.` become `%XX`
/// escapes of their UTF-8 bytes. The empty tag maps to `%`. Names longer than
/// the limit are cut and suffixed with `~` and the CRC32 of the full tag.
pub fn sanitize_super_tag(tag: &str) -> String {
    if tag.is_empty() {
        return "%".to_string();
    }

    let mut out = String::with_capacity(tag.len());
    for (i, ch) in tag.char_indices() {
        let escape = DISALLOWED.contains(&ch) || ch.is_control() || (i == 0 && ch == '.');
        if escape {
            let mut buf = [0u8; 4];
            for b in ch.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "%{:02X}", b);
            }
        } else {
            out.push(ch);
        }
    }

    if out.len() > MAX_NAME_LEN {
        let mut cut = MAX_NAME_LEN - 9;
        while !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
        let _ = write!(out, "~{:08x}", crc32fast::hash(tag.as_bytes()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_tag_is_unchanged() {
        assert_eq!(sanitize_super_tag("users"), "users");
        assert_eq!(sanitize_super_tag("a.b-c_d"), "a.b-c_d");
    }

    #[test]
    fn test_sanitize_escapes_disallowed() {
        assert_eq!(sanitize_super_tag("a/b"), "a%2Fb");
        assert_eq!(sanitize_super_tag("50%"), "50%25");
        assert_eq!(sanitize_super_tag(".."), "%2E.");
        assert_eq!(sanitize_super_tag(""), "%");
        assert_eq!(sanitize_super_tag("tab\there"), "tab%09here");
    }

    #[test]
    fn test_sanitize_is_injective_for_escapes() {
        assert_ne!(sanitize_super_tag("a/b"), sanitize_super_tag("a%2Fb"));
    }

    #[test]
    fn test_sanitize_long_tag() {
        let long = "x".repeat(500);
        let name = sanitize_super_tag(&long);
        assert!(name.len() <= MAX_NAME_LEN);
        assert_eq!(name, sanitize_super_tag(&long));
        assert_ne!(name, sanitize_super_tag(&"x".repeat(501)));
    }
}
