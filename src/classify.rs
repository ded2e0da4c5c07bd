//! Message kind classification.
//!
//! [`classify`] is a pure function of the record. Rules are tried in order and
//! the first match wins:
//!
//! 1. recalled flag → [`MessageKind::Recall`]
//! 2. system flag or `"system"` type tag → [`MessageKind::System`]
//! 3. first resource type, per [`resource_kind`]
//! 4. a sticker element ([`STICKER_ELEMENTS`]) → [`MessageKind::Emoji`]
//! 5. trimmed text against [`TEXT_RULES`]
//! 6. [`MessageKind::Text`]
//!
//! A resource type outside the known set does not stop the search; the record
//! falls through to rule 4.

use crate::message::MessageKind;
use crate::record::RawRecord;

/// Element tags that mark a sticker.
pub const STICKER_ELEMENTS: &[&str] = &["face", "market_face", "marketFace"];

/// How a [`TextRule`] matches the trimmed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Text contains the needle anywhere
    Contains(&'static str),
    /// Text is exactly the needle
    Exact(&'static str),
}

impl Pattern {
    pub fn matches(self, text: &str) -> bool {
        match self {
            Pattern::Contains(needle) => text.contains(needle),
            Pattern::Exact(needle) => text == needle,
        }
    }
}

/// A kind and the patterns that select it.
#[derive(Debug, Clone, Copy)]
pub struct TextRule {
    pub kind: MessageKind,
    pub patterns: &'static [Pattern],
}

/// Text heuristics, in priority order.
pub const TEXT_RULES: &[TextRule] = &[
    TextRule {
        kind: MessageKind::RedPacket,
        patterns: &[
            Pattern::Contains("QQ红包"),
            Pattern::Contains("发出了红包"),
            Pattern::Exact("[红包]"),
        ],
    },
    TextRule {
        kind: MessageKind::Transfer,
        patterns: &[Pattern::Contains("转账"), Pattern::Exact("[转账]")],
    },
    TextRule {
        kind: MessageKind::Poke,
        patterns: &[
            Pattern::Contains("拍了拍"),
            Pattern::Contains("戳了戳"),
            Pattern::Exact("[拍一拍]"),
        ],
    },
    TextRule {
        kind: MessageKind::Call,
        patterns: &[
            Pattern::Contains("语音通话"),
            Pattern::Contains("视频通话"),
            Pattern::Contains("通话时长"),
        ],
    },
    TextRule {
        kind: MessageKind::Share,
        patterns: &[
            Pattern::Exact("[分享]"),
            Pattern::Exact("[音乐]"),
            Pattern::Exact("[小程序]"),
        ],
    },
    TextRule {
        kind: MessageKind::Link,
        patterns: &[Pattern::Exact("[链接]"), Pattern::Exact("[卡片消息]")],
    },
    TextRule {
        kind: MessageKind::Location,
        patterns: &[Pattern::Exact("[位置]"), Pattern::Exact("[地理位置]")],
    },
    TextRule {
        kind: MessageKind::Forward,
        patterns: &[Pattern::Exact("[转发]"), Pattern::Exact("[聊天记录]")],
    },
];

/// Classifies a record into exactly one [`MessageKind`].
pub fn classify(record: &RawRecord) -> MessageKind {
    if record.is_recalled() {
        return MessageKind::Recall;
    }
    if record.is_system() {
        return MessageKind::System;
    }
    if let Some(kind) = record.content.first_resource_kind().and_then(resource_kind) {
        return kind;
    }
    if record
        .content
        .elements
        .iter()
        .any(|e| STICKER_ELEMENTS.contains(&e.kind.as_str()))
    {
        return MessageKind::Emoji;
    }
    classify_text(record.content.text())
}

/// Maps a declared resource type to a kind, `None` for unknown types.
pub fn resource_kind(resource_type: &str) -> Option<MessageKind> {
    match resource_type {
        "image" => Some(MessageKind::Image),
        "video" => Some(MessageKind::Video),
        "voice" | "audio" => Some(MessageKind::Voice),
        "file" => Some(MessageKind::File),
        "location" => Some(MessageKind::Location),
        _ => None,
    }
}

/// Applies [`TEXT_RULES`] to `text`, defaulting to [`MessageKind::Text`].
pub fn classify_text(text: &str) -> MessageKind {
    let text = text.trim();
    TEXT_RULES
        .iter()
        .find(|rule| rule.patterns.iter().any(|p| p.matches(text)))
        .map_or(MessageKind::Text, |rule| rule.kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RawContent, RawElement, RawResource};

    fn with_text(text: &str) -> RawRecord {
        RawRecord {
            content: RawContent {
                text: Some(text.to_string()),
                ..RawContent::default()
            },
            ..RawRecord::default()
        }
    }

    fn with_resource(kind: &str) -> RawRecord {
        let mut record = with_text("");
        record.content.resources.push(RawResource {
            kind: kind.to_string(),
            filename: None,
        });
        record
    }

    // =========================================================================
    // Flag precedence
    // =========================================================================

    #[test]
    fn test_recalled_overrides_everything() {
        let mut record = with_resource("image");
        record.recalled = Some(true);
        record.system = Some(true);
        assert_eq!(classify(&record), MessageKind::Recall);
    }

    #[test]
    fn test_system_flag_and_tag() {
        let mut record = with_text("[红包]");
        record.system = Some(true);
        assert_eq!(classify(&record), MessageKind::System);

        let mut record = with_resource("image");
        record.msg_type = "system".into();
        assert_eq!(classify(&record), MessageKind::System);
    }

    // =========================================================================
    // Resources and elements
    // =========================================================================

    #[test]
    fn test_resource_mapping() {
        assert_eq!(classify(&with_resource("image")), MessageKind::Image);
        assert_eq!(classify(&with_resource("video")), MessageKind::Video);
        assert_eq!(classify(&with_resource("voice")), MessageKind::Voice);
        assert_eq!(classify(&with_resource("audio")), MessageKind::Voice);
        assert_eq!(classify(&with_resource("file")), MessageKind::File);
        assert_eq!(classify(&with_resource("location")), MessageKind::Location);
    }

    #[test]
    fn test_first_resource_decides() {
        let mut record = with_resource("video");
        record.content.resources.push(RawResource {
            kind: "image".into(),
            filename: None,
        });
        assert_eq!(classify(&record), MessageKind::Video);
    }

    #[test]
    fn test_unknown_resource_falls_through() {
        let mut record = with_resource("hologram");
        record.content.text = Some("[转账]".into());
        assert_eq!(classify(&record), MessageKind::Transfer);

        let mut record = with_resource("hologram");
        record.content.elements.push(RawElement {
            kind: "face".into(),
            data: None,
        });
        assert_eq!(classify(&record), MessageKind::Emoji);
    }

    #[test]
    fn test_sticker_elements() {
        for tag in STICKER_ELEMENTS {
            let mut record = with_text("look");
            record.content.elements.push(RawElement {
                kind: (*tag).to_string(),
                data: None,
            });
            assert_eq!(classify(&record), MessageKind::Emoji, "{tag}");
        }
    }

    #[test]
    fn test_resource_beats_sticker() {
        let mut record = with_resource("image");
        record.content.elements.push(RawElement {
            kind: "market_face".into(),
            data: None,
        });
        assert_eq!(classify(&record), MessageKind::Image);
    }

    // =========================================================================
    // Text rules
    // =========================================================================

    #[test]
    fn test_text_rules() {
        let cases = [
            ("Alice发出了红包，请使用新版手机QQ查收", MessageKind::RedPacket),
            ("[QQ红包]恭喜发财", MessageKind::RedPacket),
            ("[红包]", MessageKind::RedPacket),
            ("向你转账 100.00 元", MessageKind::Transfer),
            ("Bob 拍了拍 Alice", MessageKind::Poke),
            ("[拍一拍]", MessageKind::Poke),
            ("通话时长 03:21", MessageKind::Call),
            ("[音乐]", MessageKind::Share),
            ("[小程序]", MessageKind::Share),
            ("[卡片消息]", MessageKind::Link),
            ("[地理位置]", MessageKind::Location),
            ("[聊天记录]", MessageKind::Forward),
            ("just words", MessageKind::Text),
            ("", MessageKind::Text),
        ];
        for (text, expected) in cases {
            assert_eq!(classify(&with_text(text)), expected, "{text}");
        }
    }

    #[test]
    fn test_exact_markers_need_whole_text() {
        assert_eq!(classify_text("see [链接] below"), MessageKind::Text);
        assert_eq!(classify_text("  [链接]\n"), MessageKind::Link);
    }

    #[test]
    fn test_rule_order() {
        // red packet is checked before transfer
        assert_eq!(classify_text("QQ红包转账"), MessageKind::RedPacket);
        assert_eq!(classify_text("拍了拍 语音通话"), MessageKind::Poke);
    }

    #[test]
    fn test_deterministic() {
        let record = with_text("通话时长 00:10");
        assert_eq!(classify(&record), classify(&record));
    }
}
