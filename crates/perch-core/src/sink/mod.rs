//! ActionSink trait definition.
//!
//! The outbound side of the platform client. The engine calls these and
//! never retries; implementations report failures as `ActionError`, using
//! `ActionError::AlreadyPerformed` for actions the platform says were done
//! already.
//!
//! Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
//! Implementations live in perch-infra.

use perch_types::error::ActionError;
use perch_types::message::MessageId;

/// Outbound calls against the social platform.
pub trait ActionSink: Send + Sync {
    /// Post `text` as a reply to message `in_reply_to`.
    fn send_reply(
        &self,
        in_reply_to: MessageId,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), ActionError>> + Send;

    fn favorite(
        &self,
        id: MessageId,
    ) -> impl std::future::Future<Output = Result<(), ActionError>> + Send;

    fn retweet(
        &self,
        id: MessageId,
    ) -> impl std::future::Future<Output = Result<(), ActionError>> + Send;

    fn block(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<(), ActionError>> + Send;

    fn follow(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<(), ActionError>> + Send;

    fn direct_message(
        &self,
        username: &str,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), ActionError>> + Send;
}
