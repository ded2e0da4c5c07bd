//! Raw chunk records and their canonical accessors.
//!
//! One line of a chunk file deserializes into a [`RawRecord`]. Every field is
//! decoded leniently (ids and names may be strings or numbers, `null` or
//! mistyped values read as absent), so a record only fails to decode when the
//! line isn't a JSON object at all.
//!
//! Every place two exporter generations disagree on a field is resolved by one
//! accessor with a fixed precedence:
//!
//! | Accessor | Precedence |
//! |----------|------------|
//! | [`RawSender::platform_id`] | `uin`, `uid` |
//! | [`RawSender::account_name`] | `nickname`, `name`, platform id |
//! | [`RawTimestamp::to_unix_seconds`] | number (ms), numeric string (ms), RFC 3339, `YYYY-MM-DD HH:MM:SS` |

use chrono::{DateTime, Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::non_empty;
use crate::lenient;

/// Sender ids the exporter writes when it could not identify the sender.
pub const UNATTRIBUTED_IDS: &[&str] = &["0", "unknown", "未知"];

/// One decoded line of a chunk file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub seq: Option<String>,
    /// Milliseconds since the epoch
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
    /// Human-readable send time, informational only
    #[serde(default, deserialize_with = "lenient::string")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub sender: RawSender,
    #[serde(default, rename = "type", deserialize_with = "lenient::text")]
    pub msg_type: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub content: RawContent,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub recalled: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub system: Option<bool>,
}

/// Sender block of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSender {
    /// Internal id
    #[serde(default, deserialize_with = "lenient::string")]
    pub uid: Option<String>,
    /// Numeric platform id
    #[serde(default, deserialize_with = "lenient::string")]
    pub uin: Option<String>,
    /// Pre-resolved display name (group card if set, else nickname)
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    /// Raw account nickname
    #[serde(default, deserialize_with = "lenient::string")]
    pub nickname: Option<String>,
    /// Group-specific nickname, group chats only
    #[serde(default, deserialize_with = "lenient::string")]
    pub group_card: Option<String>,
    /// Friend alias set by the exporting account
    #[serde(default, deserialize_with = "lenient::string")]
    pub remark: Option<String>,
}

/// Content block of a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContent {
    #[serde(default, deserialize_with = "lenient::string")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub html: Option<String>,
    #[serde(default, deserialize_with = "lenient::items")]
    pub elements: Vec<RawElement>,
    #[serde(default, deserialize_with = "lenient::items")]
    pub resources: Vec<RawResource>,
    #[serde(default, deserialize_with = "lenient::items")]
    pub mentions: Vec<RawMention>,
}

/// Rich content element (text run, face, reply, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawElement {
    #[serde(default, rename = "type", deserialize_with = "lenient::text")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Typed attachment reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResource {
    #[serde(default, rename = "type", deserialize_with = "lenient::text")]
    pub kind: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::string"
    )]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMention {
    #[serde(default, deserialize_with = "lenient::string")]
    pub uid: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
}

/// Record timestamp as written by the exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
    /// Any other JSON value; never a valid send time
    Other(Value),
}

// ============================================================================
// Canonical accessors
// ============================================================================

impl RawRecord {
    pub fn is_recalled(&self) -> bool {
        self.recalled.unwrap_or(false)
    }

    /// System flag, or a `"system"` type tag.
    pub fn is_system(&self) -> bool {
        self.system.unwrap_or(false) || self.msg_type == "system"
    }

    /// Send time in whole seconds, if present and parseable.
    pub fn unix_seconds(&self) -> Option<i64> {
        self.timestamp.as_ref().and_then(RawTimestamp::to_unix_seconds)
    }
}

impl RawSender {
    /// Platform id: `uin`, else `uid`.
    ///
    /// Returns `None` when neither is set or the chosen value is one of
    /// [`UNATTRIBUTED_IDS`]. `uid` is not consulted when `uin` is a sentinel.
    pub fn platform_id(&self) -> Option<&str> {
        let id = non_empty(self.uin.as_deref()).or_else(|| non_empty(self.uid.as_deref()))?;
        (!UNATTRIBUTED_IDS.contains(&id)).then_some(id)
    }

    /// Account name: `nickname`, else `name`, else `platform_id`.
    pub fn account_name<'a>(&'a self, platform_id: &'a str) -> &'a str {
        non_empty(self.nickname.as_deref())
            .or_else(|| non_empty(self.name.as_deref()))
            .unwrap_or(platform_id)
    }

    pub fn group_nickname(&self) -> Option<&str> {
        non_empty(self.group_card.as_deref())
    }
}

impl RawContent {
    /// Plain text, empty when absent.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Declared type of the first resource.
    pub fn first_resource_kind(&self) -> Option<&str> {
        self.resources.first().map(|r| r.kind.as_str())
    }
}

impl RawTimestamp {
    /// Converts to whole seconds since the epoch (floor division).
    pub fn to_unix_seconds(&self) -> Option<i64> {
        match self {
            RawTimestamp::Millis(ms) => Some(ms.div_euclid(1000)),
            RawTimestamp::FractionalMillis(ms) if ms.is_finite() => {
                let secs = (ms / 1000.0).floor();
                (secs.abs() < i64::MAX as f64).then_some(secs as i64)
            }
            RawTimestamp::FractionalMillis(_) => None,
            RawTimestamp::Text(text) => parse_text_timestamp(text.trim()),
            RawTimestamp::Other(_) => None,
        }
    }
}

fn parse_text_timestamp(text: &str) -> Option<i64> {
    if text.is_empty() {
        return None;
    }
    if let Ok(ms) = text.parse::<i64>() {
        return Some(ms.div_euclid(1000));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

/// Returns `secs` if it falls in a calendar year within `min_year..=max_year`.
pub fn validate_year(secs: i64, min_year: i32, max_year: i32) -> Option<i64> {
    let year = DateTime::from_timestamp(secs, 0)?.year();
    (min_year..=max_year).contains(&year).then_some(secs)
}
