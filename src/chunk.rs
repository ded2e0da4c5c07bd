//! Chunk path and record-count resolution across exporter versions.
//!
//! Path precedence is fixed: `relativePath`, then `file`, then
//! `<chunksDir>/<fileName>`. Count precedence: `count`, then `messages`,
//! then zero (unknown). Empty strings count as absent.

use std::fs;
use std::path::{Path, PathBuf};

use crate::descriptor::{ChunkEntry, non_empty};
use crate::error::{ChunkpackError, Result};

/// A chunk entry after path and count resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChunk {
    /// Position in the descriptor's chunk list
    pub index: usize,
    /// Path relative to the bundle directory, as declared or synthesized
    pub relative_path: String,
    /// Path joined onto the bundle directory
    pub path: PathBuf,
    /// Declared record count; 0 when the descriptor doesn't say
    pub expected_count: u64,
}

impl ResolvedChunk {
    /// On-disk size, or `None` if the file is absent or unreadable.
    pub fn file_size(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().filter(|m| m.is_file()).map(|m| m.len())
    }
}

/// Resolves [`ChunkEntry`] values against a bundle directory.
#[derive(Debug, Clone, Copy)]
pub struct ChunkLocator<'a> {
    base_dir: &'a Path,
    chunks_dir: &'a str,
}

impl<'a> ChunkLocator<'a> {
    /// Creates a locator for a bundle rooted at `base_dir` whose plan names
    /// `chunks_dir` as the chunk directory.
    pub fn new(base_dir: &'a Path, chunks_dir: &'a str) -> Self {
        Self {
            base_dir,
            chunks_dir,
        }
    }

    /// Relative path of a chunk, or `None` if the entry has no usable field.
    pub fn relative_path(&self, entry: &ChunkEntry) -> Option<String> {
        if let Some(path) = non_empty(entry.relative_path.as_deref()) {
            return Some(path.to_string());
        }
        if let Some(path) = non_empty(entry.file.as_deref()) {
            return Some(path.to_string());
        }
        let file_name = non_empty(entry.file_name.as_deref())?;
        let dir = self.chunks_dir.trim_end_matches('/');
        if dir.is_empty() {
            Some(file_name.to_string())
        } else {
            Some(format!("{dir}/{file_name}"))
        }
    }

    /// Resolves path and expected count for the entry at `index`.
    ///
    /// An entry with no path field is a defect in the bundle and yields
    /// [`ChunkpackError::ChunkPath`].
    pub fn resolve(&self, index: usize, entry: &ChunkEntry) -> Result<ResolvedChunk> {
        let relative_path = self
            .relative_path(entry)
            .ok_or_else(|| ChunkpackError::chunk_path(index))?;
        Ok(ResolvedChunk {
            index,
            path: self.base_dir.join(&relative_path),
            relative_path,
            expected_count: expected_count(entry),
        })
    }

    /// Sum of on-disk sizes of every resolvable, present chunk file.
    ///
    /// Unresolvable entries and missing files contribute zero.
    pub fn total_bytes(&self, entries: &[ChunkEntry]) -> u64 {
        entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| self.resolve(i, entry).ok())
            .filter_map(|chunk| chunk.file_size())
            .sum()
    }
}

/// Declared record count of a chunk: `count`, else `messages`, else 0.
pub fn expected_count(entry: &ChunkEntry) -> u64 {
    entry.count.or(entry.messages).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn legacy(file: &str, messages: u64) -> ChunkEntry {
        ChunkEntry {
            file: Some(file.to_string()),
            messages: Some(messages),
            ..ChunkEntry::default()
        }
    }

    fn current(file_name: &str, count: u64) -> ChunkEntry {
        ChunkEntry {
            index: Some(1),
            file_name: Some(file_name.to_string()),
            relative_path: Some(format!("chunks/{file_name}")),
            count: Some(count),
            ..ChunkEntry::default()
        }
    }

    // =========================================================================
    // Path precedence
    // =========================================================================

    #[test]
    fn test_relative_path_wins() {
        let locator = ChunkLocator::new(Path::new("/b"), "chunks");
        let entry = ChunkEntry {
            relative_path: Some("chunks/new.jsonl".into()),
            file: Some("chunks/old.jsonl".into()),
            file_name: Some("other.jsonl".into()),
            ..ChunkEntry::default()
        };
        assert_eq!(
            locator.relative_path(&entry).as_deref(),
            Some("chunks/new.jsonl")
        );
    }

    #[test]
    fn test_file_before_file_name() {
        let locator = ChunkLocator::new(Path::new("/b"), "chunks");
        let entry = ChunkEntry {
            file: Some("chunks/old.jsonl".into()),
            file_name: Some("other.jsonl".into()),
            ..ChunkEntry::default()
        };
        assert_eq!(
            locator.relative_path(&entry).as_deref(),
            Some("chunks/old.jsonl")
        );
    }

    #[test]
    fn test_file_name_synthesis_uses_chunks_dir() {
        let locator = ChunkLocator::new(Path::new("/b"), "parts/");
        let entry = ChunkEntry {
            file_name: Some("c1.jsonl".into()),
            ..ChunkEntry::default()
        };
        let chunk = locator.resolve(0, &entry).unwrap();
        assert_eq!(chunk.relative_path, "parts/c1.jsonl");
        assert_eq!(chunk.path, Path::new("/b/parts/c1.jsonl"));
    }

    #[test]
    fn test_empty_strings_are_absent() {
        let locator = ChunkLocator::new(Path::new("/b"), "chunks");
        let entry = ChunkEntry {
            relative_path: Some(String::new()),
            file: Some(String::new()),
            file_name: Some("c.jsonl".into()),
            ..ChunkEntry::default()
        };
        assert_eq!(
            locator.relative_path(&entry).as_deref(),
            Some("chunks/c.jsonl")
        );
    }

    #[test]
    fn test_unresolvable_entry() {
        let locator = ChunkLocator::new(Path::new("/b"), "chunks");
        let entry = ChunkEntry {
            count: Some(10),
            ..ChunkEntry::default()
        };
        let err = locator.resolve(4, &entry).unwrap_err();
        assert!(err.is_chunk_path());
        assert!(err.to_string().contains("#4"));
    }

    // =========================================================================
    // Count precedence and version compatibility
    // =========================================================================

    #[test]
    fn test_expected_count_precedence() {
        let both = ChunkEntry {
            count: Some(5),
            messages: Some(9),
            ..ChunkEntry::default()
        };
        assert_eq!(expected_count(&both), 5);
        assert_eq!(expected_count(&legacy("x", 9)), 9);
        assert_eq!(expected_count(&ChunkEntry::default()), 0);
    }

    #[test]
    fn test_legacy_and_current_resolve_equivalently() {
        let locator = ChunkLocator::new(Path::new("/bundle"), "chunks");
        let old = locator
            .resolve(0, &legacy("chunks/chunk_0001.jsonl", 42))
            .unwrap();
        let new = locator
            .resolve(0, &current("chunk_0001.jsonl", 42))
            .unwrap();
        assert_eq!(old, new);
    }

    // =========================================================================
    // Sizes
    // =========================================================================

    #[test]
    fn test_total_bytes_skips_missing_and_unresolvable() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("chunks")).unwrap();
        std::fs::write(dir.path().join("chunks/a.jsonl"), "0123456789").unwrap();
        std::fs::write(dir.path().join("chunks/b.jsonl"), "01234").unwrap();

        let entries = vec![
            legacy("chunks/a.jsonl", 1),
            current("b.jsonl", 1),
            current("missing.jsonl", 1),
            ChunkEntry::default(),
        ];
        let locator = ChunkLocator::new(dir.path(), "chunks");
        assert_eq!(locator.total_bytes(&entries), 15);
    }

    #[test]
    fn test_file_size_none_for_missing() {
        let locator = ChunkLocator::new(Path::new("/nowhere"), "chunks");
        let chunk = locator.resolve(0, &current("gone.jsonl", 1)).unwrap();
        assert_eq!(chunk.file_size(), None);
    }
}
