//! Agent runner: drives one dispatch engine from an inbound event stream.
//!
//! Events are consumed strictly in arrival order. Each notification the
//! engine produces is handed to the `ReplyComposer`; whatever it returns is
//! sent back through the engine's gates. The loop ends when the event
//! channel closes or the cancellation token fires.

use std::sync::Arc;

use perch_types::action::Engagement;
use perch_types::event::InboundEvent;
use perch_types::notification::Notification;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use super::composer::ReplyComposer;
use crate::dispatch::{DispatchEngine, EventOutcome, ReplyTarget};
use crate::sink::ActionSink;

/// Counters accumulated over one `run`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub events: u64,
    pub notified: u64,
    pub ignored: u64,
    /// Outbound actions that reached the platform (or were already done).
    pub engaged: u64,
    pub suppressed: u64,
    pub failed: u64,
}

impl RunStats {
    fn record(&mut self, result: &Result<Engagement, perch_types::error::ActionError>) {
        match result {
            Ok(engagement) if engagement.is_done() => self.engaged += 1,
            Ok(_) => self.suppressed += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Cut `text` to at most `budget` characters, on a char boundary.
///
/// A non-positive budget yields the empty string.
pub fn truncate_to_budget(text: &str, budget: i64) -> &str {
    if budget <= 0 {
        return "";
    }
    match text.char_indices().nth(budget as usize) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// An engine bound to a composer.
pub struct Agent<S, C> {
    engine: Arc<DispatchEngine<S>>,
    composer: C,
    follow_back: bool,
}

impl<S: ActionSink, C: ReplyComposer> Agent<S, C> {
    pub fn new(engine: Arc<DispatchEngine<S>>, composer: C) -> Self {
        Self {
            engine,
            composer,
            follow_back: false,
        }
    }

    /// Follow users back when they follow the agent.
    pub fn with_follow_back(mut self, follow_back: bool) -> Self {
        self.follow_back = follow_back;
        self
    }

    pub fn engine(&self) -> &Arc<DispatchEngine<S>> {
        &self.engine
    }

    /// Consume `events` until the channel closes or `cancel` fires.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<InboundEvent>,
        cancel: CancellationToken,
    ) -> RunStats {
        let span = info_span!("perch.agent.run", perch.agent = %self.engine.username());
        async move {
            let mut stats = RunStats::default();
            self.engine.startup();

            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("agent cancelled");
                        break;
                    }
                    event = events.recv() => event,
                };
                match event {
                    Some(event) => self.process(event, &mut stats).await,
                    None => {
                        info!("event source closed");
                        break;
                    }
                }
            }

            info!(
                events = stats.events,
                engaged = stats.engaged,
                suppressed = stats.suppressed,
                failed = stats.failed,
                "agent stopped"
            );
            stats
        }
        .instrument(span)
        .await
    }

    /// Handle one event and act on its notification.
    pub async fn process(&self, event: InboundEvent, stats: &mut RunStats) {
        stats.events += 1;
        let notification = match self.engine.handle(event).await {
            EventOutcome::Notified(notification) => notification,
            EventOutcome::Ignored(reason) => {
                debug!(?reason, "event ignored");
                stats.ignored += 1;
                return;
            }
        };
        stats.notified += 1;

        match &notification {
            Notification::Mention { message, context }
            | Notification::Timeline { message, context } => {
                let Some(body) = self.composer.compose(&notification).await else {
                    return;
                };
                let body = if context.fits(&body) {
                    body.as_str()
                } else {
                    warn!(
                        message_id = message.id,
                        budget = context.char_budget,
                        length = body.chars().count(),
                        "reply exceeds budget, truncating"
                    );
                    truncate_to_budget(&body, context.char_budget)
                };
                if body.is_empty() {
                    debug!(message_id = message.id, "nothing left to say after addressing");
                    return;
                }
                let result = self
                    .engine
                    .reply(ReplyTarget::Message { message, context }, body)
                    .await;
                stats.record(&result);
            }
            Notification::DirectMessage { message } => {
                let Some(body) = self.composer.compose(&notification).await else {
                    return;
                };
                let result = self.engine.reply(ReplyTarget::Direct(message), &body).await;
                stats.record(&result);
            }
            Notification::Follow { follower } if self.follow_back => {
                let result = self.engine.follow(follower).await;
                stats.record(&result);
            }
            _ => {}
        }
    }
}

impl<S, C> std::fmt::Debug for Agent<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("engine", &self.engine)
            .field("follow_back", &self.follow_back)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockSink, message};
    use perch_types::action::OutboundAction;
    use perch_types::config::AgentConfig;

    /// Replies with a fixed body to everything it is asked about.
    struct Echo(&'static str);

    impl ReplyComposer for Echo {
        async fn compose(&self, _notification: &Notification) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    /// Answers mentions only.
    struct MentionsOnly;

    impl ReplyComposer for MentionsOnly {
        async fn compose(&self, notification: &Notification) -> Option<String> {
            match notification {
                Notification::Mention { context, .. } => {
                    Some(format!("you said: {}", context.mentionless_text))
                }
                _ => None,
            }
        }
    }

    fn engine(limit: usize) -> Arc<DispatchEngine<MockSink>> {
        let mut config = AgentConfig::for_user("bot");
        config.message_length_limit = limit;
        Arc::new(DispatchEngine::new(&config, MockSink::default()).unwrap())
    }

    #[test]
    fn test_truncate_to_budget() {
        assert_eq!(truncate_to_budget("hello", 10), "hello");
        assert_eq!(truncate_to_budget("hello", 3), "hel");
        assert_eq!(truncate_to_budget("héllo", 2), "hé");
        assert_eq!(truncate_to_budget("hello", 0), "");
        assert_eq!(truncate_to_budget("hello", -4), "");
    }

    #[tokio::test]
    async fn test_run_replies_to_mentions_until_source_closes() {
        let agent = Agent::new(engine(140), MentionsOnly);
        let (tx, rx) = mpsc::channel(8);

        tx.send(InboundEvent::Message(message(1, "carol", "@bot ping", &["bot"])))
            .await
            .unwrap();
        tx.send(InboundEvent::Message(message(2, "dave", "just chatting", &[])))
            .await
            .unwrap();
        drop(tx);

        let stats = agent.run(rx, CancellationToken::new()).await;
        assert_eq!(stats.events, 2);
        assert_eq!(stats.notified, 2);
        assert_eq!(stats.engaged, 1);
        assert_eq!(
            agent.engine().sink().actions(),
            vec![OutboundAction::Reply {
                in_reply_to: 1,
                text: "@carol you said: ping".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_long_reply_is_truncated_to_budget() {
        // "@carol " leaves 3 characters.
        let agent = Agent::new(engine(10), Echo("abcdef"));
        let mut stats = RunStats::default();

        agent
            .process(
                InboundEvent::Message(message(3, "carol", "@bot hi", &["bot"])),
                &mut stats,
            )
            .await;

        assert_eq!(
            agent.engine().sink().actions(),
            vec![OutboundAction::Reply {
                in_reply_to: 3,
                text: "@carol abc".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_dm_is_answered_by_dm() {
        let agent = Agent::new(engine(140), Echo("hello back"));
        let mut stats = RunStats::default();
        let dm = perch_types::message::DirectMessage {
            id: 4,
            sender: "erin".to_string(),
            text: "hello".to_string(),
            created_at: chrono::Utc::now(),
        };

        agent.process(InboundEvent::DirectMessage(dm), &mut stats).await;

        assert_eq!(stats.engaged, 1);
        assert_eq!(
            agent.engine().sink().actions(),
            vec![OutboundAction::DirectMessage {
                username: "erin".to_string(),
                text: "hello back".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_follow_back_only_when_enabled() {
        let follow = || InboundEvent::Follow {
            follower: "frank".to_string(),
        };

        let quiet = Agent::new(engine(140), Echo("x"));
        let mut stats = RunStats::default();
        quiet.process(follow(), &mut stats).await;
        assert!(quiet.engine().sink().actions().is_empty());

        let friendly = Agent::new(engine(140), Echo("x")).with_follow_back(true);
        friendly.process(follow(), &mut stats).await;
        assert_eq!(
            friendly.engine().sink().actions(),
            vec![OutboundAction::Follow {
                username: "frank".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_cancel_stops_run() {
        let agent = Agent::new(engine(140), Echo("x"));
        let (_tx, rx) = mpsc::channel::<InboundEvent>(1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let stats = agent.run(rx, cancel).await;
        assert_eq!(stats, RunStats::default());
    }

    #[tokio::test]
    async fn test_failures_are_counted() {
        let agent = Agent::new(engine(140), Echo("pong"));
        *agent.engine().sink().fail_with.lock().unwrap() =
            Some(perch_types::error::ActionError::Transport("down".to_string()));
        let mut stats = RunStats::default();

        agent
            .process(
                InboundEvent::Message(message(5, "carol", "@bot ping", &["bot"])),
                &mut stats,
            )
            .await;
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.engaged, 0);
    }
}
