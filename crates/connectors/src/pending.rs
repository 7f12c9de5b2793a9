//! TTL-scoped store for short-lived provider handshake state.
//!
//! OAuth-style authorization flows need to park a small piece of
//! campaign-scoped state between the redirect and the callback. This store
//! replaces process-wide mutable maps: it is passed by reference into the
//! handshake collaborator and expires entries on its own.

use dashmap::DashMap;
use std::time::{Duration, Instant};

struct PendingEntry {
    value: String,
    inserted_at: Instant,
}

/// Lock-free key-value store whose entries expire after a fixed TTL.
pub struct PendingStateStore {
    store: DashMap<String, PendingEntry>,
    ttl: Duration,
}

impl PendingStateStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            store: DashMap::new(),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.store.insert(
            key.into(),
            PendingEntry {
                value: value.into(),
                inserted_at: Instant::now(),
            },
        );
    }

    /// Read without consuming. Returns `None` for missing or expired keys.
    pub fn get(&self, key: &str) -> Option<String> {
        let entry = self.store.get(key)?;
        if entry.inserted_at.elapsed() > self.ttl {
            drop(entry);
            self.store.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Consume one-shot state, the usual callback path: the entry is removed
    /// whether or not it had already expired.
    pub fn take(&self, key: &str) -> Option<String> {
        let (_, entry) = self.store.remove(key)?;
        if entry.inserted_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.value)
    }

    /// Drop expired entries. Call periodically from a maintenance task.
    pub fn evict_expired(&self) -> usize {
        let before = self.store.len();
        self.store
            .retain(|_, entry| entry.inserted_at.elapsed() <= self.ttl);
        before - self.store.len()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_consumes_state() {
        let store = PendingStateStore::new(600);
        store.put("state-abc", "campaign:42");
        assert_eq!(store.take("state-abc"), Some("campaign:42".to_string()));
        assert_eq!(store.take("state-abc"), None);
    }

    #[test]
    fn expired_entries_are_invisible() {
        let store = PendingStateStore::new(0);
        store.put("state-xyz", "campaign:7");
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.get("state-xyz"), None);
        assert_eq!(store.take("state-xyz"), None);
    }

    #[test]
    fn evict_expired_reports_removed_count() {
        let store = PendingStateStore::new(0);
        store.put("a", "1");
        store.put("b", "2");
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.evict_expired(), 2);
        assert!(store.is_empty());
    }
}
