//! Double-hashing probe sequences.
//!
//! A key's probe sequence starts at its primary index `h1` and visits
//! `(h1 + i·h2) mod capacity` for `i = 1, 2, …`. The step `h2` is never zero and
//! the capacity is prime, so `capacity - 1` steps visit every other slot exactly
//! once. All walks are bounded by that cycle.
//!
//! Deletion leaves a tombstone instead of emptying the slot, so every live key
//! stays reachable from its primary index without crossing an empty slot. Walks
//! step over tombstones and stop at the first empty slot.

use std::cell::Cell;

use crate::{
    error::{Result, TableError},
    hash::{self, HashStrategy},
    key::Key,
    slots::{Slot, SlotTable},
};

/// The two per-table salts, fixed when the table is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Salts {
    /// Salt of the primary hash, `a`
    pub primary: u64,
    /// Salt of the secondary (step) hash, `b`
    pub secondary: u64,
}

/// Where an insertion lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    /// The key is absent; this is the first tombstone or empty slot on its path
    Vacant(usize),
    /// The key is already stored in this slot
    Occupied(usize),
}

/// Slot indices after the primary one, `(start + i·step) mod capacity` for `i ≥ 1`
#[derive(Debug, Clone)]
pub(crate) struct ProbeSequence {
    /// Last yielded index
    index: usize,
    /// Distance between consecutive indices
    step: usize,
    /// Modulus of the walk
    capacity: usize,
    /// Indices left before the cycle closes
    remaining: usize,
}

impl ProbeSequence {
    /// Starts a walk at `start`; it yields `capacity - 1` indices
    pub(crate) fn new(start: usize, step: usize, capacity: usize) -> Self {
        Self { index: start, step, capacity, remaining: capacity.saturating_sub(1) }
    }
}

impl Iterator for ProbeSequence {
    type Item = usize;

    #[allow(clippy::arithmetic_side_effects)]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        // Both terms are below the capacity, so the sum cannot overflow
        self.index = (self.index + self.step) % self.capacity;
        Some(self.index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Strategy and salts of one table, applied to a slot array
#[derive(Clone, Copy)]
pub(crate) struct Prober<'a> {
    /// Hash strategy of the table
    strategy: &'a dyn HashStrategy,
    /// Salts of the table
    salts: Salts,
}

impl<'a> Prober<'a> {
    /// Creates a prober for the given strategy and salts
    pub(crate) fn new(strategy: &'a dyn HashStrategy, salts: Salts) -> Self {
        Self { strategy, salts }
    }
}

impl Prober<'_> {
    /// Primary index of `key` in a table of `capacity` slots
    pub(crate) fn primary(&self, key: &Key, capacity: usize) -> usize {
        hash::slot_index(self.strategy, key, capacity, self.salts.primary)
    }

    /// The walk following `start` for `key`
    fn walk(&self, key: &Key, start: usize, capacity: usize) -> ProbeSequence {
        let step = hash::step_size(self.strategy, key, capacity, self.salts.secondary);
        ProbeSequence::new(start, step, capacity)
    }

    /// Finds the slot holding `key`.
    ///
    /// Adds one to `comparisons` for every slot after the primary one that holds
    /// another key or a tombstone.
    pub(crate) fn locate<V>(
        &self,
        slots: &SlotTable<V>,
        key: &Key,
        comparisons: &Cell<u64>,
    ) -> Result<usize> {
        let capacity = slots.capacity();
        let start = self.primary(key, capacity);

        match slots.slot(start) {
            None | Some(Slot::Empty) => return Err(not_found(key)),
            Some(Slot::Full(bucket)) if bucket.key == *key => return Ok(start),
            Some(_) => {}
        }

        for index in self.walk(key, start, capacity) {
            match slots.slot(index) {
                None | Some(Slot::Empty) => return Err(not_found(key)),
                Some(Slot::Full(bucket)) if bucket.key == *key => return Ok(index),
                Some(_) => comparisons.set(comparisons.get().saturating_add(1)),
            }
        }

        tracing::warn!(%key, capacity, "probe sequence cycled through a full table");
        Err(not_found(key))
    }

    /// Finds where `key` goes: its current slot if it is stored, otherwise the
    /// first tombstone or empty slot on its path.
    ///
    /// A tombstone is only reused once the walk has reached an empty slot (or
    /// closed the cycle) without meeting the key further along.
    pub(crate) fn placement<V>(&self, slots: &SlotTable<V>, key: &Key) -> Result<Placement> {
        let capacity = slots.capacity();
        let start = self.primary(key, capacity);
        let mut tombstone = None;

        match slots.slot(start) {
            None | Some(Slot::Empty) => return Ok(Placement::Vacant(start)),
            Some(Slot::Full(bucket)) if bucket.key == *key => return Ok(Placement::Occupied(start)),
            Some(Slot::Deleted) => tombstone = Some(start),
            Some(Slot::Full(_)) => {}
        }

        for index in self.walk(key, start, capacity) {
            match slots.slot(index) {
                None | Some(Slot::Empty) => {
                    return Ok(Placement::Vacant(tombstone.unwrap_or(index)));
                }
                Some(Slot::Full(bucket)) if bucket.key == *key => {
                    return Ok(Placement::Occupied(index));
                }
                Some(Slot::Deleted) => {
                    tombstone.get_or_insert(index);
                }
                Some(Slot::Full(_)) => {}
            }
        }

        if let Some(index) = tombstone {
            return Ok(Placement::Vacant(index));
        }
        tracing::warn!(%key, capacity, "no free slot on a full probe cycle");
        Err(TableError::CapacityExhausted { capacity })
    }

    /// Stores a pair, overwriting the value of an existing key.
    ///
    /// Returns the previous value when the key was already present.
    pub(crate) fn insert<V>(&self, slots: &mut SlotTable<V>, key: Key, value: V) -> Result<Option<V>> {
        match self.placement(slots, &key)? {
            Placement::Occupied(index) => Ok(slots.replace(index, value)),
            Placement::Vacant(index) => {
                if slots.place(index, key, value) {
                    Ok(None)
                } else {
                    Err(TableError::CapacityExhausted { capacity: slots.capacity() })
                }
            }
        }
    }
}

/// Error for a key that is not stored
pub(crate) fn not_found(key: &Key) -> TableError {
    TableError::KeyNotFound { key: key.to_string() }
}
