//! Inbound event types for the Perch dispatch engine.
//!
//! `InboundEvent` is a closed set of event kinds, decided once at ingestion.
//! Each variant carries only the fields relevant to it.

use serde::{Deserialize, Serialize};

use crate::message::{DirectMessage, Message};

/// An event pushed by the inbound event source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Bulk notice sent once on connect (the account's friend id list).
    Connected {
        #[serde(default)]
        friend_ids: Vec<u64>,
    },

    /// A private message addressed to the agent.
    DirectMessage(DirectMessage),

    /// Someone followed an account (possibly the agent itself).
    Follow { follower: String },

    /// A public message with text (mention, reply, or timeline entry).
    Message(Message),

    /// Platform housekeeping notice (deletions, limit notices, ...).
    SystemNotice {
        #[serde(default)]
        name: String,
    },

    /// Anything the source could not classify.
    #[serde(other)]
    Unknown,
}

impl InboundEvent {
    /// Short, stable name of the event kind (used in log fields).
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Connected { .. } => "connected",
            InboundEvent::DirectMessage(_) => "direct_message",
            InboundEvent::Follow { .. } => "follow",
            InboundEvent::Message(_) => "message",
            InboundEvent::SystemNotice { .. } => "system_notice",
            InboundEvent::Unknown => "unknown",
        }
    }
}
