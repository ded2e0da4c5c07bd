//! Best-effort avatar side file (`avatars.json`).
//!
//! The file is a flat JSON object from sender id to an inline image string.
//! Any failure to find or parse it yields an empty map.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::descriptor::AvatarRef;

/// Prefix of the only accepted avatar encoding.
pub const INLINE_IMAGE_PREFIX: &str = "data:image/";

/// Sender id → inline image data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvatarMap {
    entries: HashMap<String, String>,
}

impl AvatarMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the avatar file named by `reference`, relative to `base_dir`.
    ///
    /// Returns an empty map when there is no reference, the file is missing,
    /// or its content is not a JSON object.
    pub fn load(base_dir: &Path, reference: Option<&AvatarRef>) -> Self {
        let Some(reference) = reference.filter(|r| !r.file.is_empty()) else {
            return Self::new();
        };
        let path = base_dir.join(&reference.file);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "avatar file unavailable");
                return Self::new();
            }
        };
        Self::parse(&content)
    }

    /// Parses avatar file content, keeping only inline image values.
    pub fn parse(content: &str) -> Self {
        match serde_json::from_str::<HashMap<String, Value>>(content) {
            Ok(raw) => raw
                .into_iter()
                .filter_map(|(id, value)| match value {
                    Value::String(data) => Some((id, data)),
                    _ => None,
                })
                .collect(),
            Err(e) => {
                tracing::debug!(error = %e, "avatar file is not a JSON object");
                Self::new()
            }
        }
    }

    pub fn get(&self, platform_id: &str) -> Option<&str> {
        self.entries.get(platform_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects `(id, data)` pairs, dropping values that aren't inline images.
impl FromIterator<(String, String)> for AvatarMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .filter(|(_, data)| data.starts_with(INLINE_IMAGE_PREFIX))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn test_parse_filters_values() {
        let content = format!(
            r#"{{"10001": "{PNG}", "10002": "https://example.com/a.png", "10003": null, "10004": 7, "10005": ""}}"#
        );
        let map = AvatarMap::parse(&content);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("10001"), Some(PNG));
        assert_eq!(map.get("10002"), None);
    }

    #[test]
    fn test_parse_garbage_is_empty() {
        assert!(AvatarMap::parse("[1, 2]").is_empty());
        assert!(AvatarMap::parse("{oops").is_empty());
    }

    #[test]
    fn test_load_from_bundle() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("avatars.json"),
            format!(r#"{{"42": "{PNG}"}}"#),
        )
        .unwrap();
        let reference = AvatarRef {
            file: "avatars.json".into(),
            count: 1,
        };
        let map = AvatarMap::load(dir.path(), Some(&reference));
        assert_eq!(map.get("42"), Some(PNG));
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempdir().unwrap();
        let reference = AvatarRef {
            file: "avatars.json".into(),
            count: 3,
        };
        assert!(AvatarMap::load(dir.path(), Some(&reference)).is_empty());
        assert!(AvatarMap::load(dir.path(), None).is_empty());
        assert!(AvatarMap::load(dir.path(), Some(&AvatarRef::default())).is_empty());
    }

    #[test]
    fn test_from_iterator() {
        let map: AvatarMap = [
            ("1".to_string(), PNG.to_string()),
            ("2".to_string(), "not an image".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(map.len(), 1);
    }
}
