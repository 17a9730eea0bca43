//! Test doubles shared by the engine and runner tests.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::Utc;
use perch_types::action::OutboundAction;
use perch_types::error::ActionError;
use perch_types::message::{MentionEntity, Message, MessageId};

use crate::sink::ActionSink;

/// Sink that records every call and reports repeated favorites/retweets as
/// already performed.
#[derive(Default)]
pub struct MockSink {
    pub actions: Mutex<Vec<OutboundAction>>,
    done: Mutex<HashSet<(String, MessageId)>>,
    /// When set, every call fails with this error.
    pub fail_with: Mutex<Option<ActionError>>,
}

impl MockSink {
    pub fn actions(&self) -> Vec<OutboundAction> {
        self.actions.lock().unwrap().clone()
    }

    fn record(&self, action: OutboundAction) -> Result<(), ActionError> {
        if let Some(err) = self.fail_with.lock().unwrap().clone() {
            return Err(err);
        }
        self.actions.lock().unwrap().push(action);
        Ok(())
    }

    fn once(&self, kind: &'static str, id: MessageId) -> Result<(), ActionError> {
        if !self.done.lock().unwrap().insert((kind.to_string(), id)) {
            return Err(ActionError::AlreadyPerformed { action: kind });
        }
        Ok(())
    }
}

impl ActionSink for MockSink {
    async fn send_reply(&self, in_reply_to: MessageId, text: &str) -> Result<(), ActionError> {
        self.record(OutboundAction::Reply {
            in_reply_to,
            text: text.to_string(),
        })
    }

    async fn favorite(&self, id: MessageId) -> Result<(), ActionError> {
        self.once("favorite", id)?;
        self.record(OutboundAction::Favorite { id })
    }

    async fn retweet(&self, id: MessageId) -> Result<(), ActionError> {
        self.once("retweet", id)?;
        self.record(OutboundAction::Retweet { id })
    }

    async fn block(&self, username: &str) -> Result<(), ActionError> {
        self.record(OutboundAction::Block {
            username: username.to_string(),
        })
    }

    async fn follow(&self, username: &str) -> Result<(), ActionError> {
        self.record(OutboundAction::Follow {
            username: username.to_string(),
        })
    }

    async fn direct_message(&self, username: &str, text: &str) -> Result<(), ActionError> {
        self.record(OutboundAction::DirectMessage {
            username: username.to_string(),
            text: text.to_string(),
        })
    }
}

/// A message from `author` whose `@name` mentions are located in `text`.
pub fn message(id: MessageId, author: &str, text: &str, mentioned: &[&str]) -> Message {
    let mentions = mentioned
        .iter()
        .map(|name| {
            let token = format!("@{name}");
            let byte = text.find(&token).expect("mention in text");
            let start = text[..byte].chars().count();
            MentionEntity::new(*name, start, start + token.chars().count())
        })
        .collect();
    Message {
        id,
        author: author.to_string(),
        text: Some(text.to_string()),
        mentions,
        is_reshare: false,
        created_at: Utc::now(),
    }
}
