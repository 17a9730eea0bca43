//! Per-user engagement credit.
//!
//! - `ledger` -- `CreditLedger`, the process-wide table of `UserCredit`

pub mod ledger;

pub use ledger::CreditLedger;
