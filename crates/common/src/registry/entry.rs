use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Longest name derived from a text body before it gets cut and suffixed.
pub const TEXT_NAME_LEN: usize = 20;
/// Length of the preview kept alongside a text body.
pub const TEXT_SUMMARY_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Text,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Text => "text",
        };
        f.write_str(s)
    }
}

/// One shared item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Registry key, also used as the display name
    pub name: String,
    /// Absolute location on disk, `None` for text entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Network address of whoever shared the entry
    #[serde(default, alias = "username")]
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, alias = "intro", skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Entry {
    pub fn file(name: impl Into<String>, path: PathBuf, owner: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::File,
            name: name.into(),
            path: Some(path),
            owner: owner.into(),
            content: None,
            summary: None,
        }
    }

    pub fn directory(name: impl Into<String>, path: PathBuf, owner: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Directory,
            ..Self::file(name, path, owner)
        }
    }

    /// Build a text entry, deriving its name and preview from the body.
    ///
    /// `/` in the derived name becomes `_` so the name stays a single path
    /// segment.
    pub fn text(body: impl Into<String>, owner: impl Into<String>) -> Self {
        let body = body.into();
        let name = if body.chars().count() > TEXT_NAME_LEN {
            format!("{}...", truncate_chars(&body, TEXT_NAME_LEN))
        } else {
            body.clone()
        }
        .replace('/', "_");
        let summary = truncate_chars(&body, TEXT_SUMMARY_LEN).to_string();

        Self {
            kind: EntryKind::Text,
            name,
            path: None,
            owner: owner.into(),
            content: Some(body),
            summary: Some(summary),
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind == EntryKind::Text
    }
}

/// Cut `s` after `max` characters without splitting a code point.
pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_keeps_body_as_name() {
        let entry = Entry::text("hello world", "1.2.3.4");
        assert_eq!(entry.kind, EntryKind::Text);
        assert_eq!(entry.name, "hello world");
        assert_eq!(entry.summary.as_deref(), Some("hello world"));
        assert_eq!(entry.content.as_deref(), Some("hello world"));
        assert_eq!(entry.owner, "1.2.3.4");
        assert!(entry.path.is_none());
    }

    #[test]
    fn test_long_text_is_truncated() {
        let body = "x".repeat(150);
        let entry = Entry::text(body.clone(), "1.2.3.4");
        assert_eq!(entry.name, format!("{}...", "x".repeat(20)));
        assert_eq!(entry.summary.as_ref().unwrap().chars().count(), 100);
        assert_eq!(entry.content.as_deref(), Some(body.as_str()));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let body = "é".repeat(25);
        let entry = Entry::text(body, "");
        assert_eq!(entry.name, format!("{}...", "é".repeat(20)));
    }

    #[test]
    fn test_text_name_has_no_slashes() {
        let entry = Entry::text("see https://example.com/page", "");
        assert_eq!(entry.name, "see https:__example....");
        assert_eq!(entry.content.as_deref(), Some("see https://example.com/page"));
    }

    #[test]
    fn test_legacy_field_names_deserialize() {
        let raw = r#"{"type":"text","name":"n","path":"","username":"10.0.0.1","content":"c","intro":"c"}"#;
        let entry: Entry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.owner, "10.0.0.1");
        assert_eq!(entry.summary.as_deref(), Some("c"));
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let entry = Entry::directory("d", PathBuf::from("/tmp/d"), "me");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "directory");
        assert!(json.get("content").is_none());
    }
}
