//! Insertion-ordered map used by map stack items.
//!
//! Keys are primitive stack items compared with VM equality, so entries are
//! kept in a vector and looked up linearly; map cardinality is bounded by the
//! array-size limit, which keeps the scan cheap and the iteration order
//! deterministic.

use crate::stack_item::StackItem;

/// Key/value storage for a map stack item.
#[derive(Debug, Clone, Default)]
pub struct OrderedMap {
    entries: Vec<(StackItem, StackItem)>,
}

impl OrderedMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &StackItem) -> Option<&StackItem> {
        self.entries
            .iter()
            .find(|(k, _)| k.equals(key))
            .map(|(_, v)| v)
    }

    /// Whether a value is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &StackItem) -> bool {
        self.entries.iter().any(|(k, _)| k.equals(key))
    }

    /// Inserts or replaces the value under `key`.
    pub fn insert(&mut self, key: StackItem, value: StackItem) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k.equals(&key)) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Removes the entry under `key`, returning its value.
    pub fn remove(&mut self, key: &StackItem) -> Option<StackItem> {
        let index = self.entries.iter().position(|(k, _)| k.equals(key))?;
        Some(self.entries.remove(index).1)
    }

    /// The keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<StackItem> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    /// The values in insertion order.
    #[must_use]
    pub fn values(&self) -> Vec<StackItem> {
        self.entries.iter().map(|(_, v)| v.clone()).collect()
    }
}
