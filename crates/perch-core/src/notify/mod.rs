//! Notification delivery to caller-registered handlers.
//!
//! Provides a `NotificationBus` that distributes engine `Notification`s to
//! all subscribers via a `tokio::sync::broadcast` channel.

pub mod bus;

pub use bus::NotificationBus;
