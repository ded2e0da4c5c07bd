//! Bundle descriptor (`manifest.json`) model and loader.
//!
//! A chunked-jsonl bundle looks like this on disk:
//!
//! ```text
//! bundle/
//! ├── manifest.json        descriptor: metadata, chat info, chunk plan
//! ├── avatars.json         optional, sender id -> data:image/... string
//! └── chunks/
//!     ├── chunk_0001.jsonl one record per line
//!     └── chunk_0002.jsonl
//! ```
//!
//! The descriptor's shape has drifted between exporter releases (see
//! [`ChunkEntry`]), so everything except `metadata.format` is optional here,
//! and a field of the wrong JSON type reads as absent. Structural completeness
//! is checked lazily by the components that consume each section.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ChunkpackError, Result};
use crate::event::ChatKind;
use crate::lenient;

/// The only `metadata.format` value this crate ingests.
pub const EXPECTED_FORMAT: &str = "chunked-jsonl";

/// Conventional file name of the descriptor inside a bundle.
pub const DESCRIPTOR_FILE_NAME: &str = "manifest.json";

/// Default chunk directory when the plan does not name one.
pub const DEFAULT_CHUNKS_DIR: &str = "chunks";

/// Top-level bundle descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub metadata: ExportMetadata,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub chat_info: ChatInfo,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub statistics: Statistics,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub chunked: ChunkPlan,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::or_none"
    )]
    pub avatars: Option<AvatarRef>,
}

/// Export-level metadata written by the exporter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub copyright: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub export_time: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub version: String,
    /// Must equal [`EXPECTED_FORMAT`]
    pub format: String,
}

/// Identity of the exported chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatInfo {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    /// `"group"` for group chats, anything else is a direct chat
    #[serde(default, rename = "type", deserialize_with = "lenient::text")]
    pub chat_type: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub self_uid: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub self_uin: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub self_name: Option<String>,
}

/// Statistics the exporter declares up front.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default, deserialize_with = "lenient::count_or_zero")]
    pub total_messages: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub chunk_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::or_none")]
    pub time_range: Option<TimeRange>,
    #[serde(default, deserialize_with = "lenient::or_none")]
    pub message_types: Option<HashMap<String, u64>>,
    #[serde(default, deserialize_with = "lenient::or_none")]
    pub senders: Option<Vec<SenderStat>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    #[serde(default, deserialize_with = "lenient::text")]
    pub start: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub end: String,
    #[serde(default)]
    pub duration_days: Option<f64>,
}

/// Per-sender message count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderStat {
    #[serde(default, deserialize_with = "lenient::text")]
    pub uid: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::count_or_zero")]
    pub message_count: u64,
    #[serde(default)]
    pub percentage: f64,
}

/// How the messages were split into chunk files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPlan {
    #[serde(default, deserialize_with = "lenient::string")]
    pub format: Option<String>,
    #[serde(default = "default_chunks_dir", deserialize_with = "chunks_dir")]
    pub chunks_dir: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub chunk_file_ext: String,
    #[serde(default, deserialize_with = "lenient::count")]
    pub max_messages_per_chunk: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub max_bytes_per_chunk: Option<u64>,
    #[serde(default, deserialize_with = "lenient::items")]
    pub chunks: Vec<ChunkEntry>,
}

impl Default for ChunkPlan {
    fn default() -> Self {
        Self {
            format: None,
            chunks_dir: default_chunks_dir(),
            chunk_file_ext: String::new(),
            max_messages_per_chunk: None,
            max_bytes_per_chunk: None,
            chunks: Vec::new(),
        }
    }
}

fn default_chunks_dir() -> String {
    DEFAULT_CHUNKS_DIR.to_string()
}

/// `chunksDir`, with `null` or a non-string read as the default directory.
fn chunks_dir<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::string(deserializer)?.unwrap_or_else(default_chunks_dir))
}

/// One declared chunk file.
///
/// Exporter 5.0 wrote `file` + `messages`; 5.5 and later write
/// `index` + `fileName` + `relativePath` + `count`. Use
/// [`ChunkLocator`](crate::chunk::ChunkLocator) rather than reading these
/// fields directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkEntry {
    // 5.0
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::string"
    )]
    pub file: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::count"
    )]
    pub messages: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::count"
    )]
    pub bytes: Option<u64>,
    // 5.5+
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::count"
    )]
    pub index: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::string"
    )]
    pub file_name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::string"
    )]
    pub relative_path: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::count"
    )]
    pub count: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::string"
    )]
    pub start: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::string"
    )]
    pub end: Option<String>,
}

/// Reference to the optional avatar side file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvatarRef {
    #[serde(default, deserialize_with = "lenient::text")]
    pub file: String,
    #[serde(default, deserialize_with = "lenient::count_or_zero")]
    pub count: u64,
}

impl Descriptor {
    /// Chat kind derived from `chatInfo.type`.
    pub fn chat_kind(&self) -> ChatKind {
        if self.chat_info.chat_type == "group" {
            ChatKind::Group
        } else {
            ChatKind::Private
        }
    }

    /// Exporting account: `selfUin`, else `selfUid`.
    pub fn owner_id(&self) -> Option<&str> {
        non_empty(self.chat_info.self_uin.as_deref())
            .or_else(|| non_empty(self.chat_info.self_uid.as_deref()))
    }

    /// Chat name, or `fallback` when the descriptor leaves it empty.
    pub fn chat_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        non_empty(Some(self.chat_info.name.as_str())).unwrap_or(fallback)
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Loads and validates a bundle descriptor.
///
/// Fails with [`ChunkpackError::Descriptor`] when the file cannot be read or
/// parsed, or when `metadata.format` is not [`EXPECTED_FORMAT`].
pub fn read_descriptor(path: impl AsRef<Path>) -> Result<Descriptor> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ChunkpackError::descriptor(path, e))?;
    parse_descriptor(&content).map_err(|err| err.at_path(path))
}

/// Parses and validates descriptor content already in memory.
///
/// Failures are [`ChunkpackError::InvalidDescriptor`], which carries no path.
pub fn parse_descriptor(content: &str) -> Result<Descriptor> {
    let descriptor: Descriptor = serde_json::from_str(content)
        .map_err(|e| ChunkpackError::InvalidDescriptor(e.into()))?;
    if descriptor.metadata.format != EXPECTED_FORMAT {
        return Err(ChunkpackError::unsupported_format(descriptor.metadata.format));
    }
    Ok(descriptor)
}
