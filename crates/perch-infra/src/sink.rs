//! Dry-run action sink.
//!
//! Logs every outbound action and keeps a record instead of calling a
//! platform. Favorites, retweets, and follows are remembered so a repeat is
//! reported as `AlreadyPerformed`, the way a real platform answers.

use std::sync::Mutex;

use dashmap::DashSet;
use perch_core::sink::ActionSink;
use perch_types::action::OutboundAction;
use perch_types::error::ActionError;
use perch_types::message::{MessageId, fold_username};

#[derive(Default)]
pub struct RecordingSink {
    actions: Mutex<Vec<OutboundAction>>,
    favorited: DashSet<MessageId>,
    retweeted: DashSet<MessageId>,
    following: DashSet<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every action recorded so far, in order.
    pub fn actions(&self) -> Vec<OutboundAction> {
        self.actions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record(&self, action: OutboundAction) {
        match serde_json::to_string(&action) {
            Ok(json) => tracing::info!(action = action.name(), %json, "dry run"),
            Err(err) => tracing::warn!("Failed to serialize action: {err}"),
        }
        self.actions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(action);
    }
}

impl ActionSink for RecordingSink {
    async fn send_reply(&self, in_reply_to: MessageId, text: &str) -> Result<(), ActionError> {
        self.record(OutboundAction::Reply {
            in_reply_to,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn favorite(&self, id: MessageId) -> Result<(), ActionError> {
        if !self.favorited.insert(id) {
            return Err(ActionError::AlreadyPerformed { action: "favorite" });
        }
        self.record(OutboundAction::Favorite { id });
        Ok(())
    }

    async fn retweet(&self, id: MessageId) -> Result<(), ActionError> {
        if !self.retweeted.insert(id) {
            return Err(ActionError::AlreadyPerformed { action: "retweet" });
        }
        self.record(OutboundAction::Retweet { id });
        Ok(())
    }

    async fn block(&self, username: &str) -> Result<(), ActionError> {
        self.following.remove(&fold_username(username));
        self.record(OutboundAction::Block {
            username: username.to_string(),
        });
        Ok(())
    }

    async fn follow(&self, username: &str) -> Result<(), ActionError> {
        if !self.following.insert(fold_username(username)) {
            return Err(ActionError::AlreadyPerformed { action: "follow" });
        }
        self.record(OutboundAction::Follow {
            username: username.to_string(),
        });
        Ok(())
    }

    async fn direct_message(&self, username: &str, text: &str) -> Result<(), ActionError> {
        self.record(OutboundAction::DirectMessage {
            username: username.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}

impl std::fmt::Debug for RecordingSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSink")
            .field("recorded", &self.actions().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_in_order() {
        let sink = RecordingSink::new();
        sink.send_reply(1, "@carol hi").await.unwrap();
        sink.block("spammer").await.unwrap();

        let names: Vec<_> = sink.actions().iter().map(OutboundAction::name).collect();
        assert_eq!(names, vec!["reply", "block"]);
    }

    #[tokio::test]
    async fn repeats_are_already_performed() {
        let sink = RecordingSink::new();
        sink.favorite(7).await.unwrap();
        let err = sink.favorite(7).await.unwrap_err();
        assert!(err.is_already_performed());

        sink.follow("Carol").await.unwrap();
        assert!(sink.follow("carol").await.unwrap_err().is_already_performed());

        // Replies are never deduplicated.
        sink.send_reply(7, "a").await.unwrap();
        sink.send_reply(7, "a").await.unwrap();
        assert_eq!(sink.actions().len(), 4);
    }
}
