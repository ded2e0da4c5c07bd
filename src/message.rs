//! Canonical message model produced by ingestion.
//!
//! Every record that survives attribution and timestamp checks becomes one
//! [`NormalizedMessage`], tagged with a [`MessageKind`] from a fixed taxonomy.
//!
//! # Examples
//!
//! ```
//! use chunkpack::message::{MessageKind, NormalizedMessage};
//!
//! let msg = NormalizedMessage::new("10001", "Alice", 1_705_314_600, MessageKind::Text)
//!     .with_content("hello")
//!     .with_group_nickname("Ali");
//!
//! assert_eq!(msg.content(), Some("hello"));
//! assert_eq!(msg.kind.code(), 0);
//! ```
//!
//! ## Serialization
//!
//! ```
//! use chunkpack::message::{MessageKind, NormalizedMessage};
//!
//! let msg = NormalizedMessage::new("10001", "Alice", 0, MessageKind::RedPacket);
//! let json = serde_json::to_string(&msg)?;
//! assert!(json.contains("\"type\":\"RED_PACKET\""));
//! # Ok::<(), serde_json::Error>(())
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical message kind.
///
/// Downstream stores key on [`code`](Self::code), which is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    Text,
    Image,
    Voice,
    Video,
    File,
    Emoji,
    Link,
    Location,
    RedPacket,
    Transfer,
    Poke,
    Call,
    Share,
    Forward,
    System,
    Recall,
}

impl MessageKind {
    /// Stable numeric code.
    pub fn code(self) -> u8 {
        match self {
            MessageKind::Text => 0,
            MessageKind::Image => 1,
            MessageKind::Voice => 2,
            MessageKind::Video => 3,
            MessageKind::File => 4,
            MessageKind::Emoji => 5,
            MessageKind::Link => 7,
            MessageKind::Location => 8,
            MessageKind::RedPacket => 20,
            MessageKind::Transfer => 21,
            MessageKind::Poke => 22,
            MessageKind::Call => 23,
            MessageKind::Share => 24,
            MessageKind::Forward => 26,
            MessageKind::System => 80,
            MessageKind::Recall => 81,
        }
    }

    /// Upper-case tag, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Text => "TEXT",
            MessageKind::Image => "IMAGE",
            MessageKind::Voice => "VOICE",
            MessageKind::Video => "VIDEO",
            MessageKind::File => "FILE",
            MessageKind::Emoji => "EMOJI",
            MessageKind::Link => "LINK",
            MessageKind::Location => "LOCATION",
            MessageKind::RedPacket => "RED_PACKET",
            MessageKind::Transfer => "TRANSFER",
            MessageKind::Poke => "POKE",
            MessageKind::Call => "CALL",
            MessageKind::Share => "SHARE",
            MessageKind::Forward => "FORWARD",
            MessageKind::System => "SYSTEM",
            MessageKind::Recall => "RECALL",
        }
    }

    /// Returns all kinds in code order.
    pub fn all() -> &'static [MessageKind] {
        &[
            MessageKind::Text,
            MessageKind::Image,
            MessageKind::Voice,
            MessageKind::Video,
            MessageKind::File,
            MessageKind::Emoji,
            MessageKind::Link,
            MessageKind::Location,
            MessageKind::RedPacket,
            MessageKind::Transfer,
            MessageKind::Poke,
            MessageKind::Call,
            MessageKind::Share,
            MessageKind::Forward,
            MessageKind::System,
            MessageKind::Recall,
        ]
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        MessageKind::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == upper)
            .ok_or_else(|| format!("Unknown message kind: '{s}'"))
    }
}

/// One ingested message.
///
/// | Field | Description |
/// |-------|-------------|
/// | `platform_message_id` | Exporter's message id, if present |
/// | `sender_platform_id` | Key into the participant table |
/// | `sender_account_name` | Account name at the time of this message |
/// | `sender_group_nickname` | Group card at the time of this message |
/// | `timestamp` | Whole seconds since the Unix epoch |
/// | `kind` | Canonical kind (serialized as `type`) |
/// | `content` | Text, `None` when empty |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_message_id: Option<String>,
    pub sender_platform_id: String,
    pub sender_account_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_group_nickname: Option<String>,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub content: Option<String>,
}

impl NormalizedMessage {
    pub fn new(
        sender_platform_id: impl Into<String>,
        sender_account_name: impl Into<String>,
        timestamp: i64,
        kind: MessageKind,
    ) -> Self {
        Self {
            platform_message_id: None,
            sender_platform_id: sender_platform_id.into(),
            sender_account_name: sender_account_name.into(),
            sender_group_nickname: None,
            timestamp,
            kind,
            content: None,
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    #[must_use]
    pub fn with_platform_message_id(mut self, id: impl Into<String>) -> Self {
        self.platform_message_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_group_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.sender_group_nickname = Some(nickname.into());
        self
    }

    /// Sets the content; an empty string clears it.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        let content = content.into();
        self.content = (!content.is_empty()).then_some(content);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Send time as a UTC datetime.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}
