//! Client path resolution
//!
//! Download and browse requests carry a slash delimited path such as
//! `photos/2024/beach.jpg`. The first segment names a registry entry; the
//! rest (if any) points inside that entry when it is a directory.

use std::path::PathBuf;

use crate::registry::{Entry, RegistryError, RegistryStore};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid path: {0:?}")]
    InvalidPath(String),
    #[error("no shared entry named {0:?}")]
    EntryNotFound(String),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Outcome of resolving a client path.
///
/// An empty input resolves to the registry root: no segments, no root
/// name, no entry and an empty `resolved_path`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Non-empty segments of the input, in order
    pub segments: Vec<String>,
    /// First segment, i.e. the registry key
    pub root_name: String,
    /// Physical location of the root entry (empty for text entries)
    pub resolved_path: PathBuf,
    /// The root entry itself
    pub entry: Option<Entry>,
}

impl ResolvedPath {
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments below the root entry.
    pub fn remaining(&self) -> &[String] {
        self.segments.get(1..).unwrap_or_default()
    }

    /// The root entry's path joined with the remaining segments.
    ///
    /// `.` and `..` segments are refused so a request can never climb out
    /// of the shared entry.
    pub fn target_path(&self) -> Result<PathBuf, ResolveError> {
        let mut target = self.resolved_path.clone();
        for segment in self.remaining() {
            if segment == "." || segment == ".." || segment.contains('\\') {
                return Err(ResolveError::InvalidPath(self.segments.join("/")));
            }
            target.push(segment);
        }
        Ok(target)
    }
}

/// Resolve `raw` against `registry`.
pub fn resolve(registry: &RegistryStore, raw: &str) -> Result<ResolvedPath, ResolveError> {
    if raw.is_empty() {
        return Ok(ResolvedPath::default());
    }

    let segments: Vec<String> = raw
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let Some(root_name) = segments.first().cloned() else {
        return Err(ResolveError::InvalidPath(raw.to_string()));
    };

    let entry = registry
        .get(&root_name)?
        .ok_or_else(|| ResolveError::EntryNotFound(root_name.clone()))?;

    tracing::debug!(root = %root_name, depth = segments.len(), "resolved client path");

    Ok(ResolvedPath {
        resolved_path: entry.path.clone().unwrap_or_default(),
        segments,
        root_name,
        entry: Some(entry),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;
    use crate::storage::JsonStore;

    fn registry(dir: &TempDir) -> RegistryStore {
        RegistryStore::new(
            Arc::new(JsonStore::open(dir.path().join("files.json"))),
            "test",
        )
    }

    #[test]
    fn test_empty_path_is_root() {
        let dir = TempDir::new().unwrap();
        let resolved = resolve(&registry(&dir), "").unwrap();
        assert!(resolved.is_root());
        assert!(resolved.root_name.is_empty());
        assert_eq!(resolved.resolved_path, PathBuf::new());
        assert!(resolved.entry.is_none());
    }

    #[test]
    fn test_only_separators_is_invalid() {
        let dir = TempDir::new().unwrap();
        for raw in ["/", "//", "///"] {
            let err = resolve(&registry(&dir), raw).unwrap_err();
            assert!(matches!(err, ResolveError::InvalidPath(_)), "{raw}");
        }
    }

    #[test]
    fn test_unknown_root_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = resolve(&registry(&dir), "/ghost/file.txt").unwrap_err();
        assert!(matches!(err, ResolveError::EntryNotFound(name) if name == "ghost"));
    }

    #[test]
    fn test_nested_path_keeps_remaining_segments() {
        let dir = TempDir::new().unwrap();
        let shared = dir.path().join("photos");
        std::fs::create_dir(&shared).unwrap();
        let registry = registry(&dir);
        registry.add_path(&shared, None, "me").unwrap();

        let resolved = resolve(&registry, "//photos//2024/beach.jpg/").unwrap();
        assert_eq!(resolved.segments, vec!["photos", "2024", "beach.jpg"]);
        assert_eq!(resolved.root_name, "photos");
        assert_eq!(resolved.resolved_path, shared);
        assert_eq!(resolved.remaining(), ["2024", "beach.jpg"]);
        assert_eq!(
            resolved.target_path().unwrap(),
            shared.join("2024").join("beach.jpg")
        );
    }

    #[test]
    fn test_target_path_refuses_parent_segments() {
        let dir = TempDir::new().unwrap();
        let shared = dir.path().join("docs");
        std::fs::create_dir(&shared).unwrap();
        let registry = registry(&dir);
        registry.add_path(&shared, None, "me").unwrap();

        let resolved = resolve(&registry, "docs/../../etc/passwd").unwrap();
        assert!(matches!(
            resolved.target_path(),
            Err(ResolveError::InvalidPath(_))
        ));
    }
}
