//! Dispatch engine: the orchestrator over one agent's inbound events.
//!
//! For each inbound event the engine decides between ignoring it and
//! notifying a named handler, deduplicating by message id, blocking
//! blacklisted authors, and feeding mentions into the author's session.
//! Reply requests from the caller pass through the loop breaker and the
//! credit gates before anything is sent.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use perch_types::action::{Engagement, SuppressReason};
use perch_types::config::AgentConfig;
use perch_types::error::{ActionError, ConfigError};
use perch_types::event::InboundEvent;
use perch_types::message::{DirectMessage, Message, same_user};
use perch_types::notification::Notification;
use perch_types::reply::ReplyContext;
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};

use super::blacklist::Blacklist;
use super::dedup::SeenMessages;
use crate::credit::CreditLedger;
use crate::mention::MentionResolver;
use crate::notify::NotificationBus;
use crate::session::{SessionPolicy, SessionTracker, should_continue};
use crate::sink::ActionSink;

/// Why an inbound event produced no notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// The agent's own message, DM, or follow.
    FromSelf,
    /// A message without text.
    NoText,
    /// A message id that was already processed.
    Duplicate,
    /// Platform housekeeping notice.
    SystemNotice,
    /// An event the source could not classify.
    Unknown,
}

/// Terminal result of handling one inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Ignored(IgnoreReason),
    Notified(Notification),
}

impl EventOutcome {
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            EventOutcome::Notified(n) => Some(n),
            EventOutcome::Ignored(_) => None,
        }
    }
}

/// What a reply answers.
#[derive(Debug, Clone, Copy)]
pub enum ReplyTarget<'a> {
    /// A public message, with the context produced when it was handled.
    Message {
        message: &'a Message,
        context: &'a ReplyContext,
    },
    /// A private message.
    Direct(&'a DirectMessage),
}

/// Counts from one maintenance pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub sessions_evicted: usize,
    pub credits_decayed: usize,
    /// Blacklist size after a reload, when one happened.
    pub blacklist_size: Option<usize>,
}

/// Orchestrates one agent's credit ledger, sessions, and outbound actions.
///
/// The ledger and tracker are `Arc`-shared so a maintenance job can hold
/// them too; every access goes through their per-entry locks.
pub struct DispatchEngine<S> {
    username: String,
    resolver: MentionResolver,
    ledger: Arc<CreditLedger>,
    sessions: Arc<SessionTracker>,
    blacklist: Blacklist,
    seen: SeenMessages,
    bus: NotificationBus,
    sink: S,
}

impl<S: ActionSink> DispatchEngine<S> {
    /// Build an engine from validated config.
    ///
    /// Fails fast with `ConfigError::MissingUsername` (or another
    /// `ConfigError`) before any event can be consumed.
    pub fn new(config: &AgentConfig, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let username = config.own_username()?.to_string();

        let ledger = Arc::new(CreditLedger::new());
        let sessions = Arc::new(SessionTracker::new(
            ledger.clone(),
            SessionPolicy::from_config(config),
        ));

        Ok(Self {
            resolver: MentionResolver::new(username.clone(), config.message_length_limit),
            username,
            ledger,
            sessions,
            blacklist: Blacklist::new(&config.blacklist),
            seen: SeenMessages::new(config.seen_capacity, config.seen_ttl()),
            bus: NotificationBus::default(),
            sink,
        })
    }

    /// Publish notifications on `bus` instead of a private one.
    pub fn with_bus(mut self, bus: NotificationBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn ledger(&self) -> &Arc<CreditLedger> {
        &self.ledger
    }

    pub fn sessions(&self) -> &Arc<SessionTracker> {
        &self.sessions
    }

    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn is_self(&self, username: &str) -> bool {
        same_user(username, &self.username)
    }

    fn notify(&self, notification: Notification) -> EventOutcome {
        debug!(agent = %self.username, handler = notification.name(), "notifying");
        self.bus.publish(notification.clone());
        EventOutcome::Notified(notification)
    }

    /// Announce that the engine is ready to consume events.
    pub fn startup(&self) -> Notification {
        info!(agent = %self.username, "agent starting");
        let notification = Notification::Startup {
            username: self.username.clone(),
        };
        self.bus.publish(notification.clone());
        notification
    }

    /// Reply context for `message` as this agent sees it right now.
    pub fn resolve(&self, message: &Message) -> ReplyContext {
        self.resolver
            .resolve(message, |name| self.ledger.can_include(name))
    }

    /// Handle one inbound event.
    pub async fn handle(&self, event: InboundEvent) -> EventOutcome {
        let span = info_span!("perch.handle", perch.agent = %self.username, perch.event.kind = event.kind());
        self.handle_inner(event).instrument(span).await
    }

    async fn handle_inner(&self, event: InboundEvent) -> EventOutcome {
        match event {
            InboundEvent::Connected { friend_ids } => {
                info!(agent = %self.username, friends = friend_ids.len(), "online");
                self.notify(Notification::Connected {
                    friend_count: friend_ids.len(),
                })
            }
            InboundEvent::DirectMessage(message) => {
                if message.is_from(&self.username) {
                    return EventOutcome::Ignored(IgnoreReason::FromSelf);
                }
                info!(sender = %message.sender, text = %message.text, "direct message");
                self.notify(Notification::DirectMessage { message })
            }
            InboundEvent::Follow { follower } => {
                if self.is_self(&follower) {
                    return EventOutcome::Ignored(IgnoreReason::FromSelf);
                }
                info!(%follower, "followed");
                self.notify(Notification::Follow { follower })
            }
            InboundEvent::Message(message) => self.handle_message(message).await,
            InboundEvent::SystemNotice { name } => {
                debug!(notice = %name, "system notice");
                EventOutcome::Ignored(IgnoreReason::SystemNotice)
            }
            InboundEvent::Unknown => {
                warn!("dropping unrecognized event");
                EventOutcome::Ignored(IgnoreReason::Unknown)
            }
        }
    }

    async fn handle_message(&self, message: Message) -> EventOutcome {
        if message.is_from(&self.username) {
            return EventOutcome::Ignored(IgnoreReason::FromSelf);
        }
        if message.text.is_none() {
            return EventOutcome::Ignored(IgnoreReason::NoText);
        }

        let context = self.resolve(&message);

        if self.blacklist.contains(&message.author) {
            info!(author = %message.author, "blocking blacklisted user");
            if let Err(e) = self.sink.block(&message.author).await {
                if !e.is_already_performed() {
                    warn!(author = %message.author, error = %e, "block failed");
                }
            }
        }

        if !self.seen.first_sighting(message.id) {
            debug!(message_id = message.id, "duplicate message, not notifying");
            return EventOutcome::Ignored(IgnoreReason::Duplicate);
        }

        if context.mentions_self {
            info!(author = %message.author, text = %message.text_or_empty(), "mention");
            self.sessions.receive(&message);
            self.notify(Notification::Mention { message, context })
        } else {
            self.notify(Notification::Timeline { message, context })
        }
    }

    /// Reply to `target` with `text`.
    ///
    /// Public replies pass the loop breaker and, when the message did not
    /// mention the agent, the author's pester credit. Every cc'd recipient is
    /// charged one include credit; the author of a direct mention is not.
    pub async fn reply(
        &self,
        target: ReplyTarget<'_>,
        text: &str,
    ) -> Result<Engagement, ActionError> {
        match target {
            ReplyTarget::Direct(message) => {
                if self.blacklist.contains(&message.sender) {
                    debug!(sender = %message.sender, "not replying to blacklisted sender");
                    return Ok(Engagement::suppressed(SuppressReason::Blacklisted));
                }
                info!(to = %message.sender, %text, "sending direct message");
                settle("direct_message", self.sink.direct_message(&message.sender, text).await)
            }
            ReplyTarget::Message { message, context } => {
                let author = message.author.as_str();

                let session = self.sessions.session_for(author);
                if !should_continue(&session, self.sessions.policy()) {
                    info!(%author, history = session.len(), "not replying to suspected bot");
                    return Ok(Engagement::suppressed(SuppressReason::SuspectedBot));
                }

                if !context.mentions_self && !self.ledger.can_pester(author) {
                    info!(%author, "not replying, leaving user alone");
                    return Ok(Engagement::suppressed(SuppressReason::PesterExhausted));
                }

                for recipient in &context.reply_recipients {
                    if context.mentions_self && same_user(recipient, author) {
                        continue;
                    }
                    self.ledger.debit_include(recipient, 1);
                }

                let full = context.compose(text);
                info!(in_reply_to = message.id, text = %full, "replying");
                settle("reply", self.sink.send_reply(message.id, &full).await)
            }
        }
    }

    pub async fn favorite(&self, message: &Message) -> Result<Engagement, ActionError> {
        if self.blacklist.contains(&message.author) {
            return Ok(Engagement::suppressed(SuppressReason::Blacklisted));
        }
        info!(message_id = message.id, "favoriting");
        settle("favorite", self.sink.favorite(message.id).await)
    }

    pub async fn retweet(&self, message: &Message) -> Result<Engagement, ActionError> {
        if self.blacklist.contains(&message.author) {
            return Ok(Engagement::suppressed(SuppressReason::Blacklisted));
        }
        info!(message_id = message.id, "retweeting");
        settle("retweet", self.sink.retweet(message.id).await)
    }

    pub async fn follow(&self, username: &str) -> Result<Engagement, ActionError> {
        if self.blacklist.contains(username) {
            return Ok(Engagement::suppressed(SuppressReason::Blacklisted));
        }
        info!(%username, "following");
        settle("follow", self.sink.follow(username).await)
    }

    /// Start a private conversation (not a reply).
    pub async fn direct_message(
        &self,
        username: &str,
        text: &str,
    ) -> Result<Engagement, ActionError> {
        if self.blacklist.contains(username) {
            return Ok(Engagement::suppressed(SuppressReason::Blacklisted));
        }
        info!(to = %username, %text, "sending direct message");
        settle("direct_message", self.sink.direct_message(username, text).await)
    }

    /// Swap the reloadable part of the blacklist. Names from the agent's
    /// config are always kept. Returns the new size.
    pub fn replace_blacklist<I, T>(&self, names: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.blacklist.replace(names)
    }

    /// Evict idle sessions and decay credit toward defaults.
    pub fn run_maintenance(&self, now: DateTime<Utc>) -> MaintenanceReport {
        let report = MaintenanceReport {
            sessions_evicted: self.sessions.evict_idle(now),
            credits_decayed: self.ledger.decay_toward_defaults(),
            blacklist_size: None,
        };
        debug!(
            agent = %self.username,
            sessions_evicted = report.sessions_evicted,
            credits_decayed = report.credits_decayed,
            "maintenance pass"
        );
        report
    }
}

/// Map a sink result onto an engagement, absorbing "already performed".
fn settle(action: &'static str, result: Result<(), ActionError>) -> Result<Engagement, ActionError> {
    match result {
        Ok(()) => Ok(Engagement::Performed),
        Err(e) if e.is_already_performed() => {
            info!(action, "already performed, treating as done");
            Ok(Engagement::AlreadySatisfied)
        }
        Err(e) => {
            warn!(action, error = %e, "outbound action failed");
            Err(e)
        }
    }
}

impl<S> std::fmt::Debug for DispatchEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("username", &self.username)
            .field("ledger", &self.ledger)
            .field("sessions", &self.sessions)
            .field("blacklist", &self.blacklist.len())
            .finish()
    }
}
