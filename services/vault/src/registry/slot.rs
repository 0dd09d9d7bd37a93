//! Dense set with O(1) insert and remove
//!
//! A [`RegistrySlot`] keeps its members in a dense `Vec` for ordered
//! iteration and a key → position map for membership and removal. Removal
//! swaps the last member into the vacated position and pops, so the order of
//! the remaining members is not insertion order after a removal.
//!
//! Only the dense array is serialized; the index is rebuilt on load.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySlot<K: Eq + Hash> {
    index: HashMap<K, usize>,
    items: Vec<K>,
}

impl<K: Eq + Hash> Default for RegistrySlot<K> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            items: Vec::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> RegistrySlot<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a member list; duplicates after the first are dropped
    pub fn from_items(items: impl IntoIterator<Item = K>) -> Self {
        let mut slot = Self::new();
        for key in items {
            slot.insert(key);
        }
        slot
    }

    /// Append `key`; returns false if already present
    pub fn insert(&mut self, key: K) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.items.len());
        self.items.push(key);
        true
    }

    /// Swap-and-pop removal; returns false if absent
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(position) = self.index.remove(key) else {
            return false;
        };

        let last = self.items.len() - 1;
        if position != last {
            let moved = self.items[last];
            self.items[position] = moved;
            self.index.insert(moved, position);
        }
        self.items.pop();
        true
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn position(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn as_slice(&self) -> &[K] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, K> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.items.clear();
    }

    /// Index and dense array describe the same set
    pub fn is_consistent(&self) -> bool {
        self.index.len() == self.items.len()
            && self
                .items
                .iter()
                .enumerate()
                .all(|(position, key)| self.index.get(key) == Some(&position))
    }
}

impl<'a, K: Copy + Eq + Hash> IntoIterator for &'a RegistrySlot<K> {
    type Item = &'a K;
    type IntoIter = std::slice::Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Copy + Eq + Hash + Serialize> Serialize for RegistrySlot<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, K: Copy + Eq + Hash + Deserialize<'de>> Deserialize<'de> for RegistrySlot<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<K>::deserialize(deserializer).map(Self::from_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut slot = RegistrySlot::new();
        assert!(slot.insert(7u32));
        assert!(!slot.insert(7u32));
        assert_eq!(slot.as_slice(), &[7]);
    }

    #[test]
    fn test_swap_and_pop() {
        let mut slot = RegistrySlot::from_items([1u32, 2, 3, 4]);
        assert!(slot.remove(&2));
        // last member moved into the hole
        assert_eq!(slot.as_slice(), &[1, 4, 3]);
        assert_eq!(slot.position(&4), Some(1));
        assert!(slot.is_consistent());

        assert!(slot.remove(&3));
        assert_eq!(slot.as_slice(), &[1, 4]);
        assert!(!slot.remove(&3));
    }

    #[test]
    fn test_remove_only_member() {
        let mut slot = RegistrySlot::from_items([9u32]);
        assert!(slot.remove(&9));
        assert!(slot.is_empty());
        assert!(slot.is_consistent());
    }

    #[test]
    fn test_serde_rebuilds_index() {
        let slot = RegistrySlot::from_items([5u32, 6, 7]);
        let bytes = bincode::serialize(&slot).unwrap();
        let restored: RegistrySlot<u32> = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, slot);
        assert!(restored.is_consistent());
    }
}
