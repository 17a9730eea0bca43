//! Interaction session data.
//!
//! A session is a rolling window of recent messages received from one user.
//! The engine uses it to detect automated reply loops.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{Message, fold_username};

/// Rolling interaction state for one user.
///
/// The user's credit is not stored here: it lives in the credit ledger under
/// the same lower-cased key, so a replaced session keeps sharing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionSession {
    /// Lower-cased username.
    pub username: String,
    /// Messages received from the user in this session, oldest first.
    pub received: Vec<Message>,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl InteractionSession {
    /// An empty session opened at `now`.
    pub fn new(username: &str, now: DateTime<Utc>) -> Self {
        Self {
            username: fold_username(username),
            received: Vec::new(),
            started_at: now,
            last_activity: now,
        }
    }

    /// Number of messages received in this session.
    pub fn len(&self) -> usize {
        self.received.len()
    }

    pub fn is_empty(&self) -> bool {
        self.received.is_empty()
    }
}
