//! ReplyComposer trait: the caller-supplied text producer.
//!
//! The runner asks the composer what to say for each `Mention`, `Timeline`,
//! and `DirectMessage` notification. Returning `None` means "stay quiet".
//! Uses native async fn in traits (Rust 2024 edition).

use std::future::Future;

use perch_types::notification::Notification;

/// Produces reply text for a notification.
pub trait ReplyComposer: Send + Sync {
    /// Reply body for `notification`, without the `@` prefix.
    fn compose(&self, notification: &Notification) -> impl Future<Output = Option<String>> + Send;
}
