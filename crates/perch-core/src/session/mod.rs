//! Per-user interaction sessions and the bot-loop breaker.
//!
//! - `tracker` -- `SessionTracker` with expiry, receive, and idle eviction
//! - `heuristics` -- `is_bot` / `should_continue` over a session snapshot

pub mod heuristics;
pub mod tracker;

pub use heuristics::{is_bot, should_continue};
pub use tracker::{SessionPolicy, SessionTracker};
