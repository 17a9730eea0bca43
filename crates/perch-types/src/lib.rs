//! Shared domain types for Perch.
//!
//! This crate contains the data shapes that flow through the interaction
//! engine: inbound messages and events, per-user credit, interaction sessions,
//! reply context, outbound actions, notifications, configuration, and the
//! associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod action;
pub mod config;
pub mod credit;
pub mod error;
pub mod event;
pub mod message;
pub mod notification;
pub mod reply;
pub mod session;
