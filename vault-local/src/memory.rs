//! In-memory slot store.

use crate::{LocalStore, StoreError};
use dashmap::DashMap;
use std::sync::Arc;

/// Concurrent in-memory slot store.
///
/// Cloning shares the underlying slots, so a clone sees writes made through
/// the original. Used by tests and ephemeral runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    slots: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every slot.
    pub fn clear(&self) {
        self.slots.clear();
    }
}

impl LocalStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots.get(key).map(|v| v.clone()))
    }

    fn put_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.slots.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_and_remove() {
        let store = MemoryStore::new();
        assert!(store.get_raw("a").unwrap().is_none());

        store.put_raw("a", "1").unwrap();
        assert_eq!(store.get_raw("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.len(), 1);

        store.remove("a").unwrap();
        assert!(store.get_raw("a").unwrap().is_none());
        assert!(store.is_empty());
        // Removing again is fine.
        store.remove("a").unwrap();
    }

    #[test]
    fn clones_share_slots() {
        let store = MemoryStore::new();
        let clone = store.clone();
        store.put_raw("k", "v").unwrap();
        assert_eq!(clone.get_raw("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn typed_default_on_first_use() {
        let store = MemoryStore::new();
        let value: Vec<u32> = store.get_or("missing", vec![7]);
        assert_eq!(value, vec![7]);
    }

    #[test]
    fn typed_default_on_reshaped_slot() {
        let store = MemoryStore::new();
        store.put_raw("k", "not json at all").unwrap();
        let value: Vec<u32> = store.get_or("k", Vec::new());
        assert!(value.is_empty());
        // The strict accessor surfaces the decode failure instead.
        assert!(store.get::<Vec<u32>>("k").is_err());
    }

    #[test]
    fn typed_round_trip() {
        let store = MemoryStore::new();
        store.put("nums", &vec![1u32, 2, 3]).unwrap();
        let back: Vec<u32> = store.get_or("nums", Vec::new());
        assert_eq!(back, vec![1, 2, 3]);
    }
}
