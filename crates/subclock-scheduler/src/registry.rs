//! Subscription registry — callback address → live subscription.
//!
//! A single `RwLock<HashMap>` with short critical sections. Every mutation
//! happens under the write lock, so concurrent inserts for one key always
//! produce exactly one winner.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Concurrency-safe map holding at most one record per key.
pub struct Registry<V> {
    entries: RwLock<HashMap<String, V>>,
}

impl<V: Clone> Registry<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Store `record` iff `key` is absent. Returns `false` and leaves the
    /// existing entry untouched otherwise.
    pub fn insert(&self, key: impl Into<String>, record: V) -> bool {
        match self.write().entry(key.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.read().get(key).cloned()
    }

    /// Delete the entry for `key`, handing back what was stored.
    pub fn remove(&self, key: &str) -> Option<V> {
        self.write().remove(key)
    }

    /// Overwrite the entry for `key` iff it exists, handing back the
    /// displaced record. Never inserts.
    pub fn replace(&self, key: &str, record: V) -> Option<V> {
        self.write()
            .get_mut(key)
            .map(|slot| std::mem::replace(slot, record))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Point-in-time copy of every entry.
    pub fn snapshot(&self) -> Vec<(String, V)> {
        self.read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Remove and return every entry.
    pub fn drain(&self) -> Vec<(String, V)> {
        self.write().drain().collect()
    }

    // A panic while holding the lock cannot leave the map half-updated:
    // every mutation is a single HashMap call.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, V>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, V>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Clone> Default for Registry<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    #[test]
    fn test_insert_twice_keeps_first() {
        let registry = Registry::new();
        assert!(registry.insert("a-url", 100));
        assert!(!registry.insert("a-url", 200));
        assert_eq!(registry.get("a-url"), Some(100));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_returns_stored_record() {
        let registry = Registry::new();
        registry.insert("a-url", 100);
        assert_eq!(registry.remove("a-url"), Some(100));
        assert_eq!(registry.get("a-url"), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_missing() {
        let registry: Registry<u32> = Registry::new();
        assert_eq!(registry.remove("a-url"), None);
    }

    #[test]
    fn test_replace_missing_does_not_insert() {
        let registry = Registry::new();
        assert_eq!(registry.replace("a-url", 123), None);
        assert_eq!(registry.get("a-url"), None);
    }

    #[test]
    fn test_replace_existing() {
        let registry = Registry::new();
        registry.insert("a-url", 100);
        assert_eq!(registry.replace("a-url", 123), Some(100));
        assert_eq!(registry.get("a-url"), Some(123));
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let registry = Registry::new();
        assert!(registry.insert("http://Example.com", 1));
        assert!(registry.insert("http://example.com", 2));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_concurrent_inserts_single_winner() {
        let registry = Arc::new(Registry::new());
        let threads = 16;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let registry = registry.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.insert("http://localhost:5000", i)
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_drain_empties() {
        let registry = Registry::new();
        registry.insert("a", 1);
        registry.insert("b", 2);
        let mut drained = registry.drain();
        drained.sort();
        assert_eq!(drained, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
        assert!(registry.is_empty());
    }
}
