use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use super::entry::Entry;
use crate::storage::{JsonStore, StorageError};

/// Prefix of the storage key holding the registry; the machine id follows.
pub const REGISTRY_KEY_PREFIX: &str = "FileDb:";

type Registry = HashMap<String, Entry>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to stat {path}: {source}")]
    StatTargetMissing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid entry name {0:?}: names cannot contain '/'")]
    InvalidName(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Persisted mapping of share names to entries.
///
/// The whole registry is one JSON object stored under a key scoped to the
/// machine id, so several machines can point at the same storage document
/// without clobbering each other. Every mutation reloads the registry,
/// applies the change and writes it back while holding `mutation_lock`.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    storage: Arc<JsonStore>,
    key: String,
    mutation_lock: Arc<RwLock<()>>,
}

impl RegistryStore {
    pub fn new(storage: Arc<JsonStore>, machine_id: &str) -> Self {
        Self {
            storage,
            key: format!("{}{}", REGISTRY_KEY_PREFIX, machine_id),
            mutation_lock: Arc::new(RwLock::new(())),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Register a file or directory that already exists on disk.
    ///
    /// `name` defaults to the base name of `path`. Directories get a unique
    /// name: if `name` is taken by an entry pointing somewhere else, `_1`,
    /// `_2`, ... is appended until a free name (or the entry for this very
    /// path) is found. Files are stored under `name` as is and replace any
    /// previous entry with that name. Names containing `/` are rejected,
    /// since they could never be resolved again.
    pub fn add_path(
        &self,
        path: &Path,
        name: Option<&str>,
        owner: &str,
    ) -> Result<Entry, RegistryError> {
        let path = clean_path(path);
        let metadata = fs::metadata(&path).map_err(|source| RegistryError::StatTargetMissing {
            path: path.clone(),
            source,
        })?;

        let base = match name.filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => base_name(&path),
        };
        if base.contains('/') {
            return Err(RegistryError::InvalidName(base));
        }

        let _guard = self.mutation_lock.write();
        let mut registry = self.load()?;

        let entry = if metadata.is_dir() {
            let name = unique_dir_name(&registry, &base, &path);
            Entry::directory(name, path, owner)
        } else {
            Entry::file(base, path, owner)
        };

        tracing::info!(
            name = %entry.name,
            kind = %entry.kind,
            path = ?entry.path,
            owner = %entry.owner,
            "registering entry"
        );
        registry.insert(entry.name.clone(), entry.clone());
        self.save(&registry)?;

        Ok(entry)
    }

    /// Register a text snippet. Its name is derived from the body, and an
    /// existing entry with the same name is replaced.
    pub fn add_text(&self, body: &str, owner: &str) -> Result<Entry, RegistryError> {
        let entry = Entry::text(body, owner);
        self.insert(entry.clone())?;
        Ok(entry)
    }

    /// Store `entry` under its own name, replacing whatever was there.
    pub fn insert(&self, entry: Entry) -> Result<(), RegistryError> {
        let _guard = self.mutation_lock.write();
        let mut registry = self.load()?;
        tracing::debug!(name = %entry.name, kind = %entry.kind, "inserting entry");
        registry.insert(entry.name.clone(), entry);
        self.save(&registry)
    }

    /// Delete an entry. Removing a name that is not registered is a no-op.
    ///
    /// Returns the removed entry, if there was one.
    pub fn remove(&self, name: &str) -> Result<Option<Entry>, RegistryError> {
        let _guard = self.mutation_lock.write();
        let mut registry = self.load()?;
        let removed = registry.remove(name);
        if removed.is_some() {
            tracing::info!(name, "removing entry");
            self.save(&registry)?;
        }
        Ok(removed)
    }

    pub fn get(&self, name: &str) -> Result<Option<Entry>, RegistryError> {
        let mut registry = self.load()?;
        Ok(registry.remove(name))
    }

    /// All entries, in no particular order.
    pub fn list(&self) -> Result<Vec<Entry>, RegistryError> {
        Ok(self.load()?.into_values().collect())
    }

    fn load(&self) -> Result<Registry, RegistryError> {
        Ok(self.storage.get(&self.key, Registry::new())?)
    }

    fn save(&self, registry: &Registry) -> Result<(), RegistryError> {
        Ok(self.storage.set(&self.key, registry)?)
    }
}

fn unique_dir_name(registry: &Registry, base: &str, path: &Path) -> String {
    let mut candidate = base.to_string();
    let mut suffix = 1usize;
    loop {
        match registry.get(&candidate) {
            Some(existing) if existing.path.as_deref() != Some(path) => {
                candidate = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            _ => return candidate,
        }
    }
}

/// Lexically normalize a path: drop `.` components and redundant
/// separators, fold `..` into its parent, and anchor relative paths at the
/// working directory.
pub(crate) fn clean_path(path: &Path) -> PathBuf {
    let anchored = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut cleaned = PathBuf::new();
    for component in anchored.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => cleaned.push(".."),
            },
            other => cleaned.push(other),
        }
    }
    cleaned
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
