//! Participant aggregation.
//!
//! [`MemberTable`] is owned by one ingestion run. It is keyed by platform id
//! and keeps first-sighting order, so the emitted member list is stable.
//!
//! Update policy on a repeat sighting:
//!
//! | Field | Policy |
//! |-------|--------|
//! | `account_name` | latest wins |
//! | `group_nickname` | replaced only by a non-empty value |
//! | `avatar` | set once, never replaced |

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::avatars::AvatarMap;
use crate::record::RawSender;

/// Aggregated state for one sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub platform_id: String,
    pub account_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Participant {
    pub fn new(platform_id: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            platform_id: platform_id.into(),
            account_name: account_name.into(),
            group_nickname: None,
            avatar: None,
        }
    }

    /// Applies a later sighting.
    pub fn refresh(
        &mut self,
        account_name: &str,
        group_nickname: Option<&str>,
        avatar: Option<&str>,
    ) {
        if self.account_name != account_name {
            self.account_name = account_name.to_string();
        }
        if let Some(nickname) = group_nickname.filter(|n| !n.is_empty()) {
            self.group_nickname = Some(nickname.to_string());
        }
        if self.avatar.is_none() {
            self.avatar = avatar.map(str::to_string);
        }
    }
}

/// Sender identity resolved for a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub platform_id: String,
    pub account_name: String,
    pub group_nickname: Option<String>,
}

/// Deduplicated participant table in first-sighting order.
#[derive(Debug, Default)]
pub struct MemberTable {
    participants: Vec<Participant>,
    index: HashMap<String, usize>,
}

impl MemberTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a sighting of `sender`.
    ///
    /// Returns `None` when the sender has no usable platform id; the caller
    /// skips such records. Otherwise creates or refreshes the participant and
    /// returns the identity to stamp on the message.
    pub fn observe(&mut self, sender: &RawSender, avatars: &AvatarMap) -> Option<Attribution> {
        let platform_id = sender.platform_id()?;
        let account_name = sender.account_name(platform_id);
        let group_nickname = sender.group_nickname();
        let avatar = avatars.get(platform_id);

        match self.index.get(platform_id) {
            Some(&slot) => {
                self.participants[slot].refresh(account_name, group_nickname, avatar);
            }
            None => {
                let mut participant = Participant::new(platform_id, account_name);
                participant.group_nickname = group_nickname.map(str::to_string);
                participant.avatar = avatar.map(str::to_string);
                self.index
                    .insert(platform_id.to_string(), self.participants.len());
                self.participants.push(participant);
            }
        }

        Some(Attribution {
            platform_id: platform_id.to_string(),
            account_name: account_name.to_string(),
            group_nickname: group_nickname.map(str::to_string),
        })
    }

    pub fn get(&self, platform_id: &str) -> Option<&Participant> {
        self.index.get(platform_id).map(|&i| &self.participants[i])
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    /// Consumes the table, releasing the participants to the caller.
    pub fn into_participants(self) -> Vec<Participant> {
        self.participants
    }
}
