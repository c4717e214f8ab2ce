//! Blob persistence substrate.
//!
//! The note collection persists as a single opaque blob under a fixed key;
//! every write replaces the whole value. `BlobStore` is the seam the
//! repository talks through, so the backing medium stays swappable:
//! `FileStore` for the real app, `MemoryStore` for tests and headless
//! embedding.

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

/// Keyed blob storage. Absent keys are `Ok(None)`, not errors.
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`, written atomically.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BlobStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read blob {}", path.display()))?;
        Ok(Some(contents))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create blob directory {}", self.dir.display()))?;

        // Atomic write: temp file then rename
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value)
            .with_context(|| format!("Failed to write temp file {}", tmp_path.display()))?;
        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e)
                .with_context(|| format!("Failed to move temp file into {}", path.display()));
        }

        debug!(key, bytes = value.len(), "Blob saved");
        Ok(())
    }
}

/// In-memory store backed by a shared map: clones see each other's writes,
/// which lets a test keep a handle on the store it handed to a repository.
#[derive(Clone, Default)]
pub struct MemoryStore {
    blobs: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.blobs.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_missing_key_is_none() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(tmp.path());
        assert!(store.get("nothing_here").unwrap().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut store = FileStore::new(tmp.path().join("nested").join("dir"));
        store.set("notes_v1", r#"[{"x":1}]"#).unwrap();
        assert_eq!(
            store.get("notes_v1").unwrap().as_deref(),
            Some(r#"[{"x":1}]"#)
        );
    }

    #[test]
    fn test_file_store_overwrites_whole_value() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut store = FileStore::new(tmp.path());
        store.set("k", "first").unwrap();
        store.set("k", "second").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("second"));
        // No temp file left behind
        assert!(!tmp.path().join("k.json.tmp").exists());
    }

    #[test]
    fn test_memory_store_clones_share_blobs() {
        let mut writer = MemoryStore::new();
        let reader = writer.clone();
        writer.set("k", "v").unwrap();
        assert_eq!(reader.get("k").unwrap().as_deref(), Some("v"));
    }
}
