//! Session tracker: one rolling interaction session per user.
//!
//! A session is reused while the user keeps talking and replaced with an
//! empty one once it has been idle for the expiry window. Receiving a
//! message also grows the author's credit in the shared ledger, so the two
//! tables move together.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use perch_types::config::AgentConfig;
use perch_types::message::{Message, fold_username};
use perch_types::session::InteractionSession;
use tracing::debug;

use crate::credit::CreditLedger;

/// Pester credit granted per received message.
const PESTER_PER_MESSAGE: i64 = 1;

/// Include credit granted per received message.
const INCLUDE_PER_MESSAGE: i64 = 2;

/// Timing and loop-breaker limits for sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Idle time after which a session is replaced.
    pub expiry: Duration,
    /// Messages a suspected bot may send before engagement stops.
    pub bot_exchange_cap: usize,
    /// Gap under which three messages count as rapid-fire.
    pub rapid_reply_window: Duration,
}

impl SessionPolicy {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            expiry: config.session_expiry(),
            bot_exchange_cap: config.bot_exchange_cap,
            rapid_reply_window: config.rapid_reply_window(),
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            expiry: Duration::from_secs(600),
            bot_exchange_cap: 2,
            rapid_reply_window: Duration::from_secs(30),
        }
    }
}

/// Table of live sessions keyed by lower-cased username.
pub struct SessionTracker {
    sessions: DashMap<String, InteractionSession>,
    ledger: Arc<CreditLedger>,
    policy: SessionPolicy,
}

impl SessionTracker {
    pub fn new(ledger: Arc<CreditLedger>, policy: SessionPolicy) -> Self {
        Self {
            sessions: DashMap::new(),
            ledger,
            policy,
        }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn ledger(&self) -> &Arc<CreditLedger> {
        &self.ledger
    }

    fn is_expired(&self, session: &InteractionSession, now: DateTime<Utc>) -> bool {
        let idle = now - session.last_activity;
        // A clock that moved backwards counts as fresh activity.
        match idle.to_std() {
            Ok(idle) => idle >= self.policy.expiry,
            Err(_) => false,
        }
    }

    /// Current session for `username` (see `session_for_at`).
    pub fn session_for(&self, username: &str) -> InteractionSession {
        self.session_for_at(username, Utc::now())
    }

    /// Session for `username` as of `now`.
    ///
    /// Returns the live session if it is younger than the expiry window;
    /// otherwise installs and returns a fresh empty one.
    pub fn session_for_at(&self, username: &str, now: DateTime<Utc>) -> InteractionSession {
        let key = fold_username(username);
        let mut entry = self
            .sessions
            .entry(key)
            .or_insert_with(|| InteractionSession::new(username, now));
        if self.is_expired(entry.value(), now) {
            debug!(%username, "session expired, starting fresh");
            *entry.value_mut() = InteractionSession::new(username, now);
        }
        entry.value().clone()
    }

    /// Record a message received from its author (see `receive_at`).
    pub fn receive(&self, message: &Message) -> InteractionSession {
        self.receive_at(message, Utc::now())
    }

    /// Append `message` to its author's session as of `now`.
    ///
    /// Refreshes an expired session first, bumps `last_activity`, and grows
    /// the author's pester and include credit. Returns the updated session.
    pub fn receive_at(&self, message: &Message, now: DateTime<Utc>) -> InteractionSession {
        let username = message.author.as_str();
        let key = fold_username(username);
        let snapshot = {
            let mut entry = self
                .sessions
                .entry(key)
                .or_insert_with(|| InteractionSession::new(username, now));
            if self.is_expired(entry.value(), now) {
                *entry.value_mut() = InteractionSession::new(username, now);
            }
            let session = entry.value_mut();
            session.received.push(message.clone());
            session.last_activity = now;
            session.clone()
        };

        self.ledger.credit_pester(username, PESTER_PER_MESSAGE);
        self.ledger.credit_include(username, INCLUDE_PER_MESSAGE);

        debug!(
            %username,
            message_id = message.id,
            history = snapshot.len(),
            "received message into session"
        );
        snapshot
    }

    /// Drop every session idle past the expiry window. Returns how many.
    pub fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !self.is_expired(session, now));
        before.saturating_sub(self.sessions.len())
    }

    /// Number of sessions currently held.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl std::fmt::Debug for SessionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTracker")
            .field("policy", &self.policy)
            .field("active_sessions", &self.sessions.len())
            .finish()
    }
}
