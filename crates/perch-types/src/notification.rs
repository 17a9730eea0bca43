//! Lifecycle notifications emitted by the dispatch engine.
//!
//! All variants are Clone + Send + Sync for use with tokio broadcast channels.

use serde::{Deserialize, Serialize};

use crate::message::{DirectMessage, Message};
use crate::reply::ReplyContext;

/// A named notification for caller-registered handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// The engine is configured and about to consume events.
    Startup { username: String },

    /// The event stream delivered its connect notice.
    Connected { friend_count: usize },

    /// A message that directly mentions the agent.
    Mention {
        message: Message,
        context: ReplyContext,
    },

    /// A message seen passively on the timeline.
    Timeline {
        message: Message,
        context: ReplyContext,
    },

    /// A private message to the agent.
    DirectMessage { message: DirectMessage },

    /// Someone followed the agent.
    Follow { follower: String },
}

impl Notification {
    /// Handler name for this notification.
    pub fn name(&self) -> &'static str {
        match self {
            Notification::Startup { .. } => "startup",
            Notification::Connected { .. } => "connected",
            Notification::Mention { .. } => "mention",
            Notification::Timeline { .. } => "timeline",
            Notification::DirectMessage { .. } => "direct_message",
            Notification::Follow { .. } => "follow",
        }
    }
}
