//! Outbound action types.
//!
//! `OutboundAction` is the record of one call made against the platform
//! sink. `Engagement` is what the engine reports back to its caller.

use serde::{Deserialize, Serialize};

use crate::message::MessageId;

/// One outbound call to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OutboundAction {
    Reply { in_reply_to: MessageId, text: String },
    Favorite { id: MessageId },
    Retweet { id: MessageId },
    Block { username: String },
    Follow { username: String },
    DirectMessage { username: String, text: String },
}

impl OutboundAction {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundAction::Reply { .. } => "reply",
            OutboundAction::Favorite { .. } => "favorite",
            OutboundAction::Retweet { .. } => "retweet",
            OutboundAction::Block { .. } => "block",
            OutboundAction::Follow { .. } => "follow",
            OutboundAction::DirectMessage { .. } => "direct_message",
        }
    }
}

/// Why the engine declined to engage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    /// The target user is on the blacklist.
    Blacklisted,
    /// The target looks automated and the one allowed exchange is spent.
    SuspectedBot,
    /// Unsolicited reply to a user with no pester credit left.
    PesterExhausted,
}

/// Result of an engagement request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Engagement {
    /// The action was sent to the platform.
    Performed,
    /// The platform reported the action as already done.
    AlreadySatisfied,
    /// The engine chose not to act.
    Suppressed { reason: SuppressReason },
}

impl Engagement {
    pub fn suppressed(reason: SuppressReason) -> Self {
        Engagement::Suppressed { reason }
    }

    /// True for `Performed` and `AlreadySatisfied`.
    pub fn is_done(&self) -> bool {
        matches!(self, Engagement::Performed | Engagement::AlreadySatisfied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_action_serializes_tagged() {
        let action = OutboundAction::Reply {
            in_reply_to: 5,
            text: "@carol hi".to_string(),
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"action\":\"reply\""));
        assert!(json.contains("\"in_reply_to\":5"));
        assert_eq!(action.name(), "reply");
    }

    #[test]
    fn test_engagement_is_done() {
        assert!(Engagement::Performed.is_done());
        assert!(Engagement::AlreadySatisfied.is_done());
        assert!(!Engagement::suppressed(SuppressReason::SuspectedBot).is_done());
    }
}
