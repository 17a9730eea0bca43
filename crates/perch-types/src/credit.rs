//! Per-user engagement credit.
//!
//! Pester credit gates unsolicited replies to a user; include credit gates
//! cc'ing a user in a reply they did not start. Both may go negative; only
//! the `can_*` predicates decide behaviour.

use serde::{Deserialize, Serialize};

use crate::message::fold_username;

/// Pester credit a user starts with on first reference.
pub const DEFAULT_PESTER_CREDIT: i64 = 1;

/// Include credit a user starts with on first reference.
pub const DEFAULT_INCLUDE_CREDIT: i64 = 2;

/// Engagement budget for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredit {
    /// Lower-cased username (ledger key).
    pub username: String,
    pub pester_credit: i64,
    pub include_credit: i64,
}

impl UserCredit {
    /// Fresh credit with the default balances. The username is lower-cased.
    pub fn new(username: &str) -> Self {
        Self {
            username: fold_username(username),
            pester_credit: DEFAULT_PESTER_CREDIT,
            include_credit: DEFAULT_INCLUDE_CREDIT,
        }
    }

    pub fn can_pester(&self) -> bool {
        self.pester_credit > 0
    }

    pub fn can_include(&self) -> bool {
        self.include_credit > 0
    }
}
