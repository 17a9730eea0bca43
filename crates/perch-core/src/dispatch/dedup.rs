//! Bounded set of already-processed message ids.
//!
//! Redelivered events are dropped by id. The set is capped in size and each
//! id is forgotten after a time-to-live, so memory stays bounded on a
//! long-running stream.

use std::time::Duration;

use moka::sync::Cache;
use perch_types::message::MessageId;

/// Time-windowed, size-capped record of processed message ids.
pub struct SeenMessages {
    cache: Cache<MessageId, ()>,
}

impl SeenMessages {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    /// Record `id`. Returns `true` the first time, `false` for a repeat.
    pub fn first_sighting(&self, id: MessageId) -> bool {
        self.cache.entry(id).or_insert(()).is_fresh()
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.cache.contains_key(&id)
    }

    /// Approximate number of ids held.
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for SeenMessages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeenMessages")
            .field("capacity", &self.cache.policy().max_capacity())
            .field("ttl", &self.cache.policy().time_to_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_is_not_first_sighting() {
        let seen = SeenMessages::new(100, Duration::from_secs(60));
        assert!(seen.first_sighting(1));
        assert!(!seen.first_sighting(1));
        assert!(seen.first_sighting(2));
        assert!(seen.contains(1));
        assert!(!seen.contains(3));
    }

    #[test]
    fn size_is_bounded() {
        let seen = SeenMessages::new(50, Duration::from_secs(60));
        for id in 0..500 {
            seen.first_sighting(id);
        }
        assert!(seen.len() <= 50);
    }

    #[test]
    fn ids_expire_after_ttl() {
        let seen = SeenMessages::new(100, Duration::from_millis(50));
        assert!(seen.first_sighting(7));
        std::thread::sleep(Duration::from_millis(120));
        assert!(!seen.contains(7));
        assert!(seen.first_sighting(7));
    }
}
