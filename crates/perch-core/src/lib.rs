//! Interaction-throttling engine for Perch.
//!
//! This crate holds the engine components (credit ledger, session tracker,
//! mention resolver, dispatch engine) and the "ports" the infrastructure
//! layer implements (`ActionSink`). It depends only on `perch-types` --
//! never on `perch-infra` or any network or file IO crate.

pub mod agent;
pub mod credit;
pub mod dispatch;
pub mod maintenance;
pub mod mention;
pub mod notify;
pub mod session;
pub mod sink;

#[cfg(test)]
pub(crate) mod testing;
