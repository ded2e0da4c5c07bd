//! Events emitted by an ingestion run.
//!
//! A successful run always produces
//!
//! ```text
//! Progress  Meta  Progress*  Members  Messages*  Progress(done)  Done
//! ```
//!
//! and a failed one produces a single [`IngestEvent::Error`] and nothing else.

use serde::{Deserialize, Serialize};

use crate::error::ChunkpackError;
use crate::members::Participant;
use crate::message::NormalizedMessage;
use crate::progress::ProgressSnapshot;

/// Platform tag carried in [`ChatMeta`].
pub const PLATFORM_QQ: &str = "qq";

/// One step of an ingestion run.
#[derive(Debug)]
pub enum IngestEvent {
    Progress(ProgressSnapshot),
    Meta(ChatMeta),
    /// Every participant, emitted once
    Members(Vec<Participant>),
    /// One batch of messages, in encounter order
    Messages(Vec<NormalizedMessage>),
    /// Fatal; nothing follows
    Error(ChunkpackError),
    Done(IngestSummary),
}

impl IngestEvent {
    /// Short lowercase name of the variant.
    pub fn kind_name(&self) -> &'static str {
        match self {
            IngestEvent::Progress(_) => "progress",
            IngestEvent::Meta(_) => "meta",
            IngestEvent::Members(_) => "members",
            IngestEvent::Messages(_) => "messages",
            IngestEvent::Error(_) => "error",
            IngestEvent::Done(_) => "done",
        }
    }

    /// Returns `true` for the events that end a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, IngestEvent::Error(_) | IngestEvent::Done(_))
    }
}

/// Direct or group chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
}

impl std::fmt::Display for ChatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatKind::Private => write!(f, "private"),
            ChatKind::Group => write!(f, "group"),
        }
    }
}

/// Chat identity taken from the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMeta {
    pub name: String,
    pub platform: String,
    #[serde(rename = "type")]
    pub kind: ChatKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

/// Tallies reported when a run completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    /// Messages emitted across all batches
    pub message_count: u64,
    pub member_count: u64,
    /// Decoded records dropped for an unattributable sender or a bad timestamp
    pub skipped: u64,
    /// Chunks that were missing on disk or had no resolvable path
    pub missing_chunks: u64,
    /// Lines dropped because they didn't decode
    pub malformed_lines: u64,
    /// `statistics.totalMessages` from the descriptor
    pub expected_messages: u64,
}

impl IngestSummary {
    /// One-line description of everything that was dropped, or `None` if
    /// nothing was.
    pub fn skipped_description(&self) -> Option<String> {
        let mut parts = Vec::new();
        if self.skipped > 0 {
            parts.push(format!(
                "{} records skipped (missing sender id or invalid timestamp)",
                self.skipped
            ));
        }
        if self.malformed_lines > 0 {
            parts.push(format!("{} malformed lines dropped", self.malformed_lines));
        }
        if self.missing_chunks > 0 {
            parts.push(format!("{} chunks missing", self.missing_chunks));
        }
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}
