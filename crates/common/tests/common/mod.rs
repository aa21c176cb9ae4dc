//! Shared test utilities for registry integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ::common::prelude::{JsonStore, RegistryStore};
use tempfile::TempDir;

/// Set up a registry backed by a fresh storage document inside a temp dir.
pub fn setup_registry() -> (RegistryStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let storage = Arc::new(JsonStore::open(temp_dir.path().join("files.json")));
    (RegistryStore::new(storage, "test-machine"), temp_dir)
}

/// Create `rel` under `root` with `contents`, creating parents as needed.
pub fn write_file(root: &Path, rel: &str, contents: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

pub fn make_dir(root: &Path, rel: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(&path).unwrap();
    path
}
