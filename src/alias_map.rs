//! Many-keys-to-one-value store with substring ("fuzzy") lookup.
//!
//! Every alias points at a slot. Adding a value that is already stored under
//! another alias reuses that slot, so aliases of the same answer share one
//! canonical entry. Fuzzy lookup treats the query as a haystack and returns
//! the value of the first alias, in insertion order, contained in it.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

type SlotId = u64;

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    refs: usize,
}

#[derive(Debug, Clone)]
struct AliasEntry<K> {
    key: K,
    lowered: String,
}

/// A mapping from many alias keys to one shared value.
#[derive(Debug, Clone)]
pub struct AliasMap<K = String, V = String> {
    /// Aliases in insertion order; fuzzy lookup scans this.
    order: Vec<AliasEntry<K>>,
    index: HashMap<K, SlotId>,
    slots: HashMap<SlotId, Slot<V>>,
    next_slot: SlotId,
}

impl<K, V> Default for AliasMap<K, V> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            index: HashMap::new(),
            slots: HashMap::new(),
            next_slot: 0,
        }
    }
}

impl<K, V> AliasMap<K, V>
where
    K: AsRef<str> + Eq + Hash + Clone,
    V: PartialEq,
{
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` as an alias for `value`.
    ///
    /// Returns `false` (and stores nothing) when the key is empty or only
    /// whitespace, since an empty alias would be a substring of every query.
    pub fn add(&mut self, key: K, value: V) -> bool {
        if key.as_ref().trim().is_empty() {
            return false;
        }

        let slot = match self.slot_of_value(&value) {
            Some(existing) => existing,
            None => {
                let id = self.next_slot;
                self.next_slot += 1;
                self.slots.insert(id, Slot { value, refs: 0 });
                id
            }
        };

        match self.index.insert(key.clone(), slot) {
            Some(previous) if previous == slot => return true,
            Some(previous) => {
                self.release(previous);
            }
            None => {
                let lowered = key.as_ref().to_lowercase();
                self.order.push(AliasEntry { key, lowered });
            }
        }

        if let Some(s) = self.slots.get_mut(&slot) {
            s.refs += 1;
        }
        true
    }

    /// Fuzzy lookup: the value of the first alias (insertion order) that is a
    /// case-insensitive substring of `haystack`.
    pub fn get(&self, haystack: &str) -> Option<&V> {
        let haystack = haystack.to_lowercase();
        self.order
            .iter()
            .filter(|entry| !entry.lowered.is_empty())
            .find(|entry| haystack.contains(entry.lowered.as_str()))
            .and_then(|entry| self.index.get(&entry.key))
            .and_then(|slot| self.slots.get(slot))
            .map(|slot| &slot.value)
    }

    /// Exact alias lookup, no substring matching.
    pub fn get_exact<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index
            .get(key)
            .and_then(|slot| self.slots.get(slot))
            .map(|slot| &slot.value)
    }

    /// Remove an alias. The value is dropped with its last alias.
    ///
    /// Returns the value the alias pointed at when it was the last alias,
    /// `None` otherwise (including when the key was unknown).
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.index.remove(key)?;
        self.order
            .retain(|entry| Borrow::<Q>::borrow(&entry.key) != key);
        self.release(slot)
    }

    /// Whether `key` is a registered alias.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// All aliases currently pointing at `value`, in insertion order.
    pub fn aliases_of(&self, value: &V) -> Vec<&K> {
        let Some(slot) = self.slot_of_value(value) else {
            return Vec::new();
        };
        self.order
            .iter()
            .filter(|entry| self.index.get(&entry.key) == Some(&slot))
            .map(|entry| &entry.key)
            .collect()
    }

    /// Number of aliases.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the map holds no aliases.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of distinct values.
    pub fn value_count(&self) -> usize {
        self.slots.len()
    }

    fn slot_of_value(&self, value: &V) -> Option<SlotId> {
        self.slots
            .iter()
            .find(|(_, slot)| slot.value == *value)
            .map(|(id, _)| *id)
    }

    fn release(&mut self, slot: SlotId) -> Option<V> {
        let remaining = {
            let s = self.slots.get_mut(&slot)?;
            s.refs = s.refs.saturating_sub(1);
            s.refs
        };
        if remaining == 0 {
            self.slots.remove(&slot).map(|s| s.value)
        } else {
            None
        }
    }
}
