//! Infrastructure layer for Perch.
//!
//! Implements the ports defined in `perch-core` against local resources:
//! TOML config loading, a JSON-lines inbound event reader, a dry-run
//! recording action sink, a reloadable blacklist file, and the canned-reply
//! composer.

pub mod blacklist;
pub mod composer;
pub mod config;
pub mod sink;
pub mod source;
