//! Credit ledger: the table of per-user pester and include credit.
//!
//! Entries are created lazily on first reference and keyed by lower-cased
//! username. Mutations take the entry's shard lock, so the inbound consumer
//! and the maintenance job never observe a half-applied change. There is no
//! clamp in either direction; callers gate on `can_pester` / `can_include`.

use dashmap::DashMap;
use perch_types::credit::{DEFAULT_INCLUDE_CREDIT, DEFAULT_PESTER_CREDIT, UserCredit};
use perch_types::message::fold_username;
use tracing::debug;

/// Process-wide table of `UserCredit`, shared via `Arc`.
#[derive(Default)]
pub struct CreditLedger {
    credits: DashMap<String, UserCredit>,
}

impl CreditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(username: &str) -> String {
        fold_username(username)
    }

    /// Apply `f` to the user's entry, creating it with defaults if absent.
    fn with_entry<R>(&self, username: &str, f: impl FnOnce(&mut UserCredit) -> R) -> R {
        let key = Self::key(username);
        let mut entry = self
            .credits
            .entry(key)
            .or_insert_with(|| UserCredit::new(username));
        f(entry.value_mut())
    }

    /// Current credit for `username` (created with defaults if absent).
    pub fn get(&self, username: &str) -> UserCredit {
        self.with_entry(username, |credit| credit.clone())
    }

    pub fn can_pester(&self, username: &str) -> bool {
        self.with_entry(username, |credit| credit.can_pester())
    }

    pub fn can_include(&self, username: &str) -> bool {
        self.with_entry(username, |credit| credit.can_include())
    }

    /// Subtract `n` from include credit. May go negative.
    pub fn debit_include(&self, username: &str, n: i64) {
        let balance = self.with_entry(username, |credit| {
            credit.include_credit -= n;
            credit.include_credit
        });
        debug!(%username, n, balance, "debited include credit");
    }

    pub fn credit_pester(&self, username: &str, n: i64) {
        self.with_entry(username, |credit| credit.pester_credit += n);
    }

    pub fn credit_include(&self, username: &str, n: i64) {
        self.with_entry(username, |credit| credit.include_credit += n);
    }

    /// Move every balance above its default one step back toward it.
    ///
    /// Balances at or below the default are left alone. Returns the number
    /// of users whose credit changed.
    pub fn decay_toward_defaults(&self) -> usize {
        let mut touched = 0;
        for mut entry in self.credits.iter_mut() {
            let credit = entry.value_mut();
            let mut changed = false;
            if credit.pester_credit > DEFAULT_PESTER_CREDIT {
                credit.pester_credit -= 1;
                changed = true;
            }
            if credit.include_credit > DEFAULT_INCLUDE_CREDIT {
                credit.include_credit -= 1;
                changed = true;
            }
            if changed {
                touched += 1;
            }
        }
        touched
    }

    /// Number of users with a ledger entry.
    pub fn len(&self) -> usize {
        self.credits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credits.is_empty()
    }

    /// Copy of every entry, sorted by username.
    pub fn snapshot(&self) -> Vec<UserCredit> {
        let mut all: Vec<UserCredit> = self.credits.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.username.cmp(&b.username));
        all
    }
}

impl std::fmt::Debug for CreditLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreditLedger")
            .field("users", &self.credits.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn first_reference_creates_defaults() {
        let ledger = CreditLedger::new();
        let credit = ledger.get("alice");
        assert_eq!(credit.pester_credit, 1);
        assert_eq!(credit.include_credit, 2);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let ledger = CreditLedger::new();
        ledger.credit_pester("Alice", 3);
        assert_eq!(ledger.get("ALICE").pester_credit, 4);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get("alice").username, "alice");
    }

    #[test]
    fn predicates_follow_balance() {
        let ledger = CreditLedger::new();
        assert!(ledger.can_pester("bob"));
        assert!(ledger.can_include("bob"));

        ledger.debit_include("bob", 2);
        assert!(!ledger.can_include("bob"));

        ledger.credit_pester("bob", -1);
        assert!(!ledger.can_pester("bob"));
    }

    #[test]
    fn debit_goes_negative_without_floor() {
        let ledger = CreditLedger::new();
        ledger.debit_include("carol", 5);
        assert_eq!(ledger.get("carol").include_credit, -3);
        ledger.credit_include("carol", 2);
        assert_eq!(ledger.get("carol").include_credit, -1);
        assert!(!ledger.can_include("carol"));
    }

    #[test]
    fn decay_stops_at_defaults() {
        let ledger = CreditLedger::new();
        ledger.credit_pester("dave", 2); // 3
        ledger.credit_include("dave", 1); // 3
        ledger.debit_include("erin", 4); // -2, below default

        assert_eq!(ledger.decay_toward_defaults(), 1);
        let dave = ledger.get("dave");
        assert_eq!(dave.pester_credit, 2);
        assert_eq!(dave.include_credit, 2);

        assert_eq!(ledger.decay_toward_defaults(), 1);
        assert_eq!(ledger.get("dave").pester_credit, 1);

        // Everything at or below default now.
        assert_eq!(ledger.decay_toward_defaults(), 0);
        assert_eq!(ledger.get("erin").include_credit, -2);
    }

    #[test]
    fn snapshot_is_sorted() {
        let ledger = CreditLedger::new();
        ledger.get("zed");
        ledger.get("amy");
        let names: Vec<String> = ledger.snapshot().into_iter().map(|c| c.username).collect();
        assert_eq!(names, vec!["amy", "zed"]);
    }

    #[tokio::test]
    async fn concurrent_credits_are_not_lost() {
        let ledger = Arc::new(CreditLedger::new());
        let mut handles = Vec::new();
        for _ in 0..50 {
            let l = ledger.clone();
            handles.push(tokio::spawn(async move {
                l.credit_pester("shared", 1);
                l.credit_include("shared", 2);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let credit = ledger.get("shared");
        assert_eq!(credit.pester_credit, 51);
        assert_eq!(credit.include_credit, 102);
    }
}
