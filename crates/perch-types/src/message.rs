//! Inbound message types for Perch.
//!
//! A `Message` is a public post on the feed (mention, reply, or timeline
//! entry). A `DirectMessage` is a private message addressed to the agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Case-folded screen name, the key for all per-user state.
pub fn fold_username(username: &str) -> String {
    username.to_lowercase()
}

/// True when `a` and `b` name the same user under `fold_username`.
pub fn same_user(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Platform-assigned message identifier.
pub type MessageId = u64;

/// A user mention inside a message's text.
///
/// `start` and `end` are character offsets into the raw text (half-open
/// range), as reported by the platform's entity list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionEntity {
    pub screen_name: String,
    pub start: usize,
    pub end: usize,
}

impl MentionEntity {
    pub fn new(screen_name: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            screen_name: screen_name.into(),
            start,
            end,
        }
    }
}

/// A public message received from the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// Screen name of the author (without the leading `@`).
    pub author: String,
    /// Raw text. `None` for text-less items (e.g. media-only posts).
    #[serde(default)]
    pub text: Option<String>,
    /// Structured mention entities in text order.
    #[serde(default)]
    pub mentions: Vec<MentionEntity>,
    /// True when this message is a reshare of another message.
    #[serde(default)]
    pub is_reshare: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Case-insensitive author comparison.
    pub fn is_from(&self, username: &str) -> bool {
        same_user(&self.author, username)
    }

    /// The raw text, or an empty string when absent.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// A private message addressed to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: MessageId,
    pub sender: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl DirectMessage {
    pub fn is_from(&self, username: &str) -> bool {
        same_user(&self.sender, username)
    }
}
