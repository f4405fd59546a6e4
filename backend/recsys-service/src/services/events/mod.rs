use crate::models::{ItemId, UserId};
use dashmap::DashMap;
use std::collections::VecDeque;
use tracing::debug;

/// Bounded recent-interaction history per user, most recent first
///
/// Each user's history lives in its own `DashMap` entry, so `put` and `get`
/// for the same user are serialized by the entry's shard lock while other
/// users proceed independently.
pub struct EventStore {
    events: DashMap<UserId, VecDeque<ItemId>>,
    max_events_per_user: usize,
}

impl EventStore {
    pub fn new(max_events_per_user: usize) -> Self {
        Self {
            events: DashMap::new(),
            max_events_per_user,
        }
    }

    pub fn max_events_per_user(&self) -> usize {
        self.max_events_per_user
    }

    /// Record an interaction, evicting the oldest entries beyond the cap
    pub fn put(&self, user_id: UserId, item_id: ItemId) {
        let mut history = self
            .events
            .entry(user_id)
            .or_insert_with(|| VecDeque::with_capacity(self.max_events_per_user));
        history.push_front(item_id);
        history.truncate(self.max_events_per_user);

        debug!(
            user_id = user_id,
            item_id = item_id,
            history_len = history.len(),
            "Added event"
        );
    }

    /// Up to `k` most recent items; empty for unknown users
    pub fn get(&self, user_id: UserId, k: usize) -> Vec<ItemId> {
        let events: Vec<ItemId> = self
            .events
            .get(&user_id)
            .map(|history| history.iter().take(k).copied().collect())
            .unwrap_or_default();

        debug!(
            user_id = user_id,
            count = events.len(),
            "Retrieved events"
        );

        events
    }

    /// Full stored history for a user
    pub fn history(&self, user_id: UserId) -> Vec<ItemId> {
        self.get(user_id, self.max_events_per_user)
    }

    pub fn user_count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_history_eviction_keeps_most_recent() {
        let store = EventStore::new(3);
        assert_eq!(store.max_events_per_user(), 3);
        for item in [1, 2, 3, 4] {
            store.put(7, item);
        }

        assert_eq!(store.history(7), vec![4, 3, 2]);
    }

    #[test]
    fn test_get_limits_to_k() {
        let store = EventStore::new(10);
        for item in 1..=5 {
            store.put(1, item);
        }

        assert_eq!(store.get(1, 2), vec![5, 4]);
        assert_eq!(store.get(1, 100), vec![5, 4, 3, 2, 1]);
        assert!(store.get(1, 0).is_empty());
    }

    #[test]
    fn test_unknown_user_is_empty() {
        let store = EventStore::new(10);
        assert!(store.get(42, 10).is_empty());
        assert_eq!(store.user_count(), 0);
    }

    #[test]
    fn test_users_are_independent() {
        let store = EventStore::new(2);
        store.put(1, 10);
        store.put(2, 20);
        store.put(1, 11);

        assert_eq!(store.history(1), vec![11, 10]);
        assert_eq!(store.history(2), vec![20]);
    }

    #[test]
    fn test_repeated_item_is_kept_as_separate_event() {
        let store = EventStore::new(5);
        store.put(1, 3);
        store.put(1, 3);

        assert_eq!(store.history(1), vec![3, 3]);
    }

    #[test]
    fn test_concurrent_puts_respect_cap() {
        let store = Arc::new(EventStore::new(4));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..500 {
                        store.put(1, t * 1000 + i);
                        assert!(store.history(1).len() <= 4);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.history(1).len(), 4);
    }
}
