//! Blacklist of users the agent never engages with.
//!
//! Names are stored case-folded and matched case-insensitively. Names given
//! at construction are pinned; a runtime reload swaps everything else.

use std::collections::HashSet;
use std::sync::RwLock;

use perch_types::message::fold_username;

#[derive(Debug, Default)]
pub struct Blacklist {
    pinned: HashSet<String>,
    names: RwLock<HashSet<String>>,
}

fn normalize(name: &str) -> String {
    fold_username(name.trim().trim_start_matches('@'))
}

fn normalize_all<I, S>(names: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| normalize(n.as_ref()))
        .filter(|n| !n.is_empty())
        .collect()
}

impl Blacklist {
    /// A blacklist whose `names` survive every `replace`.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pinned = normalize_all(names);
        Self {
            names: RwLock::new(pinned.clone()),
            pinned,
        }
    }

    pub fn contains(&self, username: &str) -> bool {
        let names = self.names.read().unwrap_or_else(|e| e.into_inner());
        names.contains(&normalize(username))
    }

    /// Swap in `names` plus the pinned names. Returns the new size.
    pub fn replace<I, S>(&self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fresh = normalize_all(names);
        fresh.extend(self.pinned.iter().cloned());
        let len = fresh.len();
        *self.names.write().unwrap_or_else(|e| e.into_inner()) = fresh;
        len
    }

    pub fn len(&self) -> usize {
        self.names.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
