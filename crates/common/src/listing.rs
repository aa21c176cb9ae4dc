use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::registry::{Entry, EntryKind, RegistryError, RegistryStore};

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("path does not exist: {0}")]
    NotFound(PathBuf),
    #[error("path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Listing shape shared by registry and filesystem listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Preview of a text entry; the full body is never listed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl From<Entry> for ListItem {
    fn from(entry: Entry) -> Self {
        let owner = Some(entry.owner).filter(|o| !o.is_empty());
        Self {
            kind: entry.kind,
            name: entry.name,
            path: entry.path.filter(|p| !p.as_os_str().is_empty()),
            owner,
            summary: entry.summary,
            size: None,
        }
    }
}

/// Every registered entry, sorted by name.
pub fn list_top(registry: &RegistryStore) -> Result<Vec<ListItem>, ListingError> {
    let mut items: Vec<ListItem> = registry.list()?.into_iter().map(ListItem::from).collect();
    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

/// Immediate children of `dir`, read from the live filesystem.
pub fn list_path(dir: &Path) -> Result<Vec<ListItem>, ListingError> {
    let metadata = match fs::metadata(dir) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ListingError::NotFound(dir.to_path_buf()))
        }
        Err(source) => {
            return Err(ListingError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };
    if !metadata.is_dir() {
        return Err(ListingError::NotADirectory(dir.to_path_buf()));
    }

    let read_err = |source| ListingError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut items = Vec::new();
    for child in fs::read_dir(dir).map_err(read_err)? {
        let child = child.map_err(read_err)?;
        let path = child.path();
        // follows symlinks, so a link to a directory lists as a directory
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::debug!(path = %path.display(), "skipping unreadable entry: {}", e);
                continue;
            }
        };
        let (kind, size) = if metadata.is_dir() {
            (EntryKind::Directory, None)
        } else {
            (EntryKind::File, Some(metadata.len()))
        };
        items.push(ListItem {
            kind,
            name: child.file_name().to_string_lossy().into_owned(),
            path: Some(path),
            owner: None,
            summary: None,
            size,
        });
    }

    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

/// Render a byte count for humans, e.g. `1.5 KB`.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "n/a".to_string();
    }
    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
