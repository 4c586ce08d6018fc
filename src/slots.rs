//! Fixed-capacity slot array backing a table

use std::mem;

use crate::key::Key;

/// A stored key-value pair
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Bucket<V> {
    /// The key in the key-value pair
    pub(crate) key: Key,
    /// The value associated with the key
    pub(crate) value: V,
}

/// State of one slot
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot<V> {
    /// Unused since the array was built; ends every probe walk
    Empty,
    /// Tombstone left by a deletion; walks step over it and insertion may reuse it
    Deleted,
    /// A live pair
    Full(Bucket<V>),
}

impl<V> Slot<V> {
    /// The live pair, if any
    pub(crate) fn bucket(&self) -> Option<&Bucket<V>> {
        match self {
            Self::Full(bucket) => Some(bucket),
            Self::Empty | Self::Deleted => None,
        }
    }
}

/// Array of slots plus the number of live pairs and tombstones.
///
/// The capacity never changes; growing a table means building a new
/// `SlotTable` and moving every live bucket into it, which drops the tombstones.
#[derive(Debug, Clone)]
pub(crate) struct SlotTable<V> {
    /// The slots
    slots: Box<[Slot<V>]>,
    /// Number of live pairs
    filled: usize,
    /// Number of tombstones
    deleted: usize,
}

impl<V> SlotTable<V> {
    /// Creates `capacity` empty slots
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self { slots: (0..capacity).map(|_| Slot::Empty).collect(), filled: 0, deleted: 0 }
    }

    /// Number of slots
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live pairs
    pub(crate) fn filled(&self) -> usize {
        self.filled
    }

    /// Number of slots that are not empty, live pairs and tombstones alike
    pub(crate) fn used(&self) -> usize {
        self.filled.saturating_add(self.deleted)
    }

    /// The slot at `index`, `None` if out of range
    pub(crate) fn slot(&self, index: usize) -> Option<&Slot<V>> {
        self.slots.get(index)
    }

    /// The live bucket at `index`, `None` if the slot holds no pair or is out of range
    pub(crate) fn get(&self, index: usize) -> Option<&Bucket<V>> {
        self.slots.get(index).and_then(Slot::bucket)
    }

    /// Mutable access to the live bucket at `index`
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Bucket<V>> {
        match self.slots.get_mut(index) {
            Some(Slot::Full(bucket)) => Some(bucket),
            _ => None,
        }
    }

    /// Stores a pair in an empty slot or over a tombstone.
    ///
    /// Returns false, leaving the table untouched, if the slot holds a live pair
    /// or is out of range.
    pub(crate) fn place(&mut self, index: usize, key: Key, value: V) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        match slot {
            Slot::Full(_) => return false,
            Slot::Deleted => self.deleted = self.deleted.saturating_sub(1),
            Slot::Empty => {}
        }
        *slot = Slot::Full(Bucket { key, value });
        self.filled = self.filled.saturating_add(1);
        true
    }

    /// Replaces the value stored at `index`, returning the previous one
    pub(crate) fn replace(&mut self, index: usize, value: V) -> Option<V> {
        self.get_mut(index).map(|bucket| mem::replace(&mut bucket.value, value))
    }

    /// Leaves a tombstone at `index`, returning the pair it held
    pub(crate) fn remove(&mut self, index: usize) -> Option<Bucket<V>> {
        let slot = self.slots.get_mut(index)?;
        match mem::replace(slot, Slot::Deleted) {
            Slot::Full(bucket) => {
                self.filled = self.filled.saturating_sub(1);
                self.deleted = self.deleted.saturating_add(1);
                Some(bucket)
            }
            other => {
                *slot = other;
                None
            }
        }
    }

    /// Raw slots, in physical order
    pub(crate) fn as_slice(&self) -> &[Slot<V>] {
        &self.slots
    }

    /// Consumes the table, yielding every live bucket in physical order
    pub(crate) fn into_buckets(self) -> impl Iterator<Item = Bucket<V>> {
        self.slots.into_vec().into_iter().filter_map(|slot| match slot {
            Slot::Full(bucket) => Some(bucket),
            Slot::Empty | Slot::Deleted => None,
        })
    }

    /// Empties every slot, tombstones included
    pub(crate) fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Empty;
        }
        self.filled = 0;
        self.deleted = 0;
    }
}
