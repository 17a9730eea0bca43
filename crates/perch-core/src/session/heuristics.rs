//! Bot-likelihood heuristics over a session snapshot.
//!
//! Both checks are pure functions of the session and the policy. They are
//! evaluated fresh on every call so the verdict follows the history as it
//! grows or resets.

use chrono::Duration;
use perch_types::message::fold_username;
use perch_types::session::InteractionSession;

use super::tracker::SessionPolicy;

/// Username fragment used by auto-generated accounts.
const AUTOMATED_NAME_MARKER: &str = "ebooks";

/// Messages that make up one rapid-fire burst.
const BURST_LEN: usize = 3;

/// Whether the session looks like an automated account.
///
/// True when the last three messages arrived within the rapid-reply window
/// (most recent vs. third-most-recent `created_at`), or when the username
/// contains the automated-account marker.
pub fn is_bot(session: &InteractionSession, policy: &SessionPolicy) -> bool {
    if fold_username(&session.username).contains(AUTOMATED_NAME_MARKER) {
        return true;
    }

    let received = &session.received;
    if received.len() < BURST_LEN {
        return false;
    }

    let newest = received[received.len() - 1].created_at;
    let third = received[received.len() - BURST_LEN].created_at;
    let window = Duration::from_std(policy.rapid_reply_window).unwrap_or(Duration::MAX);
    newest - third < window
}

/// Whether the agent may keep engaging this user.
///
/// Suspected bots get engagement only while the session holds fewer than
/// `bot_exchange_cap` messages; everyone else always continues.
pub fn should_continue(session: &InteractionSession, policy: &SessionPolicy) -> bool {
    if is_bot(session, policy) {
        session.len() < policy.bot_exchange_cap
    } else {
        true
    }
}
