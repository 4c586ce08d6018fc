use std::{cell::Cell, fmt, mem, sync::Arc};

use crate::{
    builder::TableBuilder,
    error::Result,
    hash::HashStrategy,
    key::{IntoKey, Key},
    prime,
    probe::{self, Prober, Salts},
    slots::{Bucket, Slot, SlotTable},
};

/// Capacity of a table built without an explicit one
pub const DEFAULT_CAPACITY: usize = 23;

/// Load factor at which the next insertion grows the table
pub const DEFAULT_RESIZE_THRESHOLD: f64 = 0.75;

/// A hash table with open addressing and double hashing.
///
/// Keys are strings or integers (see [`Key`]). Slots live in a single array
/// whose size is always prime; collisions are resolved by stepping through the
/// array by a second, salted hash of the key. When the load factor reaches the
/// resize threshold, the next insertion first grows the array to the smallest
/// prime `≥ 2·capacity + 1` and re-inserts every pair.
///
/// Lookups count the key comparisons they make. The counter is exposed through
/// [`comparison_count`](Self::comparison_count) for probe-length analysis.
///
/// Note: This implementation is not thread-safe. Callers sharing a table
/// between threads must serialize every call behind one lock.
pub struct HashTable<V> {
    /// The slots storing the key-value pairs
    slots: SlotTable<V>,
    /// Strategy used for both the primary index and the probe step
    strategy: Arc<dyn HashStrategy>,
    /// Salts of the primary and secondary hash, fixed for the table's lifetime
    salts: Salts,
    /// Load factor at which insertion resizes first
    resize_threshold: f64,
    /// Key comparisons made by lookups since the last reset
    comparisons: Cell<u64>,
}

impl<V> HashTable<V> {
    /// Creates an empty table with [`PrimeModHash`](crate::PrimeModHash), the
    /// default capacity and fresh random salts
    #[must_use]
    pub fn new() -> Self {
        TableBuilder::new().build()
    }

    /// Creates an empty table hashing with `strategy`
    #[must_use]
    pub fn with_strategy<S>(strategy: S) -> Self
    where
        S: HashStrategy + 'static,
    {
        TableBuilder::new().strategy(strategy).build()
    }

    /// Creates an empty table with at least `capacity` slots (rounded up to a prime)
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        TableBuilder::new().capacity(capacity).build()
    }

    /// Assembles a table from validated settings
    pub(crate) fn from_parts(
        capacity: usize,
        strategy: Arc<dyn HashStrategy>,
        salts: Salts,
        resize_threshold: f64,
    ) -> Self {
        tracing::trace!(capacity, strategy = strategy.name(), ?salts, "creating hash table");
        Self {
            slots: SlotTable::with_capacity(capacity),
            strategy,
            salts,
            resize_threshold,
            comparisons: Cell::new(0),
        }
    }

    /// Prober bound to this table's strategy and salts
    fn prober(&self) -> Prober<'_> {
        Prober::new(self.strategy.as_ref(), self.salts)
    }

    /// Inserts or updates a key-value pair.
    ///
    /// If the load factor has reached the resize threshold, the table grows
    /// before the pair is stored. Returns the previous value of the key.
    ///
    /// # Errors
    ///
    /// [`TableError::UnsupportedKeyType`](crate::TableError::UnsupportedKeyType)
    /// or [`TableError::Encoding`](crate::TableError::Encoding) for an invalid key,
    /// [`TableError::CapacityExhausted`](crate::TableError::CapacityExhausted) if
    /// no free slot can be found.
    pub fn set<K: IntoKey>(&mut self, key: K, value: V) -> Result<Option<V>> {
        let key = key.into_key()?;

        if self.load_factor() >= self.resize_threshold {
            self.resize()?;
        } else if self.used_factor() >= self.resize_threshold {
            self.drop_tombstones()?;
        }

        Prober::new(self.strategy.as_ref(), self.salts).insert(&mut self.slots, key, value)
    }

    /// Retrieves the value stored for `key`.
    ///
    /// Counts one comparison for a used primary slot plus one per probed slot
    /// that holds another key or a tombstone.
    ///
    /// # Errors
    ///
    /// [`TableError::KeyNotFound`](crate::TableError::KeyNotFound) if the key is
    /// absent, or a key conversion error.
    pub fn get<K: IntoKey>(&self, key: K) -> Result<&V> {
        let key = key.into_key()?;
        let index = self.find(&key)?;
        self.slots.get(index).map(|bucket| &bucket.value).ok_or_else(|| probe::not_found(&key))
    }

    /// Retrieves a mutable reference to the value stored for `key`
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn get_mut<K: IntoKey>(&mut self, key: K) -> Result<&mut V> {
        let key = key.into_key()?;
        let index = self.find(&key)?;
        self.slots
            .get_mut(index)
            .map(|bucket| &mut bucket.value)
            .ok_or_else(|| probe::not_found(&key))
    }

    /// Returns true if the table holds `key`. Invalid keys are never held.
    pub fn contains_key<K: IntoKey>(&self, key: K) -> bool {
        key.into_key().is_ok_and(|key| self.find(&key).is_ok())
    }

    /// Returns true if the primary slot of `key` has never been used, which
    /// proves the key is absent
    fn primary_is_empty(&self, key: &Key) -> bool {
        let start = self.prober().primary(key, self.capacity());
        matches!(self.slots.slot(start), None | Some(Slot::Empty))
    }

    /// Lookup shared by the read operations
    fn find(&self, key: &Key) -> Result<usize> {
        if self.primary_is_empty(key) {
            return Err(probe::not_found(key));
        }

        self.count_comparison();
        self.prober().locate(&self.slots, key, &self.comparisons)
    }

    /// Removes `key` and returns its value.
    ///
    /// The slot is left as a tombstone, so keys placed past it stay reachable.
    /// Tombstones are reused by later insertions and dropped on the next rebuild.
    ///
    /// # Errors
    ///
    /// [`TableError::KeyNotFound`](crate::TableError::KeyNotFound) if the key is
    /// absent, or a key conversion error.
    pub fn delete<K: IntoKey>(&mut self, key: K) -> Result<V> {
        let key = key.into_key()?;
        if self.primary_is_empty(&key) {
            return Err(probe::not_found(&key));
        }

        let index = self.prober().locate(&self.slots, &key, &self.comparisons)?;
        let Bucket { value, .. } = self.slots.remove(index).ok_or_else(|| probe::not_found(&key))?;
        Ok(value)
    }

    /// Grows the slot array to the next capacity
    fn resize(&mut self) -> Result<()> {
        let old_capacity = self.capacity();
        let new_capacity = prime::grown_capacity(old_capacity);
        let live = self.rebuild(new_capacity)?;

        tracing::debug!(old_capacity, new_capacity, live, "resized hash table");
        Ok(())
    }

    /// Rebuilds the slot array at its current capacity once tombstones push
    /// the used share of slots to the resize threshold
    fn drop_tombstones(&mut self) -> Result<()> {
        let capacity = self.capacity();
        let tombstones = self.slots.used().saturating_sub(self.len());
        let live = self.rebuild(capacity)?;

        tracing::debug!(capacity, live, tombstones, "dropped tombstones");
        Ok(())
    }

    /// Moves every live pair into a fresh slot array of `capacity` slots and
    /// returns how many were moved
    fn rebuild(&mut self, capacity: usize) -> Result<usize> {
        let prober = Prober::new(self.strategy.as_ref(), self.salts);
        let old = mem::replace(&mut self.slots, SlotTable::with_capacity(capacity));
        let live = old.filled();

        for Bucket { key, value } in old.into_buckets() {
            prober.insert(&mut self.slots, key, value)?;
        }
        Ok(live)
    }

    /// Number of key-value pairs in the table
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.filled()
    }

    /// Returns true if the table holds no pairs
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots, always a prime
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Current load factor, `len / capacity`
    #[must_use]
    #[allow(clippy::arithmetic_side_effects, clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.capacity() as f64
    }

    /// Share of slots holding a live pair or a tombstone
    #[allow(clippy::arithmetic_side_effects, clippy::cast_precision_loss)]
    fn used_factor(&self) -> f64 {
        self.slots.used() as f64 / self.capacity() as f64
    }

    /// Load factor at which the next insertion resizes first
    #[must_use]
    pub fn resize_threshold(&self) -> f64 {
        self.resize_threshold
    }

    /// Changes the resize threshold, clamped to `[0.05, 0.95]`
    pub fn set_resize_threshold(&mut self, threshold: f64) {
        self.resize_threshold = TableBuilder::clamp_threshold(threshold);
    }

    /// Salts of the primary and secondary hash
    #[must_use]
    pub fn salts(&self) -> Salts {
        self.salts
    }

    /// The active hash strategy, callable as `hash(key, capacity, salt)`.
    ///
    /// Exposed so analysis code can sample index assignment directly.
    #[must_use]
    pub fn hash_function(&self) -> &dyn HashStrategy {
        self.strategy.as_ref()
    }

    /// Key comparisons made by lookups since the last reset
    #[must_use]
    pub fn comparison_count(&self) -> u64 {
        self.comparisons.get()
    }

    /// Sets the comparison counter back to zero
    pub fn reset_comparison_count(&self) {
        self.comparisons.set(0);
    }

    /// Adds one to the comparison counter
    fn count_comparison(&self) {
        self.comparisons.set(self.comparisons.get().saturating_add(1));
    }

    /// Removes every pair, keeping the capacity and salts
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Returns an iterator over the key-value pairs in slot order
    #[must_use]
    #[allow(clippy::iter_without_into_iter)]
    pub fn iter(&self) -> Iter<'_, V> {
        Iter { slots: self.slots.as_slice().iter() }
    }
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for HashTable<V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            strategy: Arc::clone(&self.strategy),
            salts: self.salts,
            resize_threshold: self.resize_threshold,
            comparisons: self.comparisons.clone(),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for HashTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTable")
            .field("slots", &self.slots)
            .field("strategy", &self.strategy.name())
            .field("salts", &self.salts)
            .field("resize_threshold", &self.resize_threshold)
            .field("comparisons", &self.comparisons.get())
            .finish()
    }
}

/// Renders `{k1: v1, k2: v2}` in slot order; string keys are quoted and values
/// use their `Debug` form
impl<V: fmt::Debug> fmt::Display for HashTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (position, (key, value)) in self.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value:?}")?;
        }
        f.write_str("}")
    }
}

/// Iterator over the key-value pairs of the hash table, in slot order
#[derive(Debug, Clone)]
pub struct Iter<'a, V> {
    /// Remaining slots
    slots: std::slice::Iter<'a, Slot<V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a Key, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.slots.find_map(|slot| slot.bucket().map(|bucket| (&bucket.key, &bucket.value)))
    }
}

impl<'a, V> IntoIterator for &'a HashTable<V> {
    type Item = (&'a Key, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::TableError, hash::PrimeModHash};
    use proptest::prelude::*;
    use std::any::Any;

    /// Table with salts of 1, so integer keys hash to themselves
    fn identity_table<V>(capacity: usize) -> HashTable<V> {
        TableBuilder::new().capacity(capacity).salts(1, 1).build()
    }

    #[test]
    fn test_empty_table() {
        let table: HashTable<i32> = HashTable::new();
        assert_eq!(table.to_string(), "{}");
        assert_eq!(table.len(), 0);
        assert!(table.is_empty());
        assert!(table.load_factor().abs() < f64::EPSILON);
        assert_eq!(table.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_set_and_get() -> Result<()> {
        let mut table = HashTable::new();
        assert_eq!(table.set("key1", 1)?, None);
        assert_eq!(table.set("key2", 2)?, None);
        assert_eq!(table.set(3, 3)?, None);

        assert_eq!(table.get("key1")?, &1);
        assert_eq!(table.get("key2")?, &2);
        assert_eq!(table.get(3)?, &3);
        assert!(table.get("key4").is_err_and(|err| err.is_not_found()));
        Ok(())
    }

    #[test]
    fn test_update() -> Result<()> {
        let mut table = HashTable::new();
        assert_eq!(table.set("key1", 1)?, None);
        assert_eq!(table.set("key1", 10)?, Some(1));
        assert_eq!(table.get("key1")?, &10);
        assert_eq!(table.len(), 1);
        Ok(())
    }

    #[test]
    fn test_delete() -> Result<()> {
        let mut table = HashTable::new();
        table.set("key1", 1)?;
        table.set("key2", 2)?;

        assert_eq!(table.delete("key1")?, 1);
        assert!(table.get("key1").is_err());
        assert_eq!(table.get("key2")?, &2);
        assert_eq!(
            table.delete("key1"),
            Err(TableError::KeyNotFound { key: "\"key1\"".to_string() })
        );
        assert_eq!(table.len(), 1);
        Ok(())
    }

    #[test]
    fn test_delete_keeps_displaced_keys_reachable() -> Result<()> {
        let mut table = identity_table(7);
        // All three share primary slot 3
        table.set(3, "three")?;
        table.set(10, "ten")?;
        table.set(17, "seventeen")?;

        table.delete(3)?;
        assert_eq!(table.get(10)?, &"ten");
        assert_eq!(table.get(17)?, &"seventeen");

        table.delete(10)?;
        assert_eq!(table.get(17)?, &"seventeen");
        assert_eq!(table.len(), 1);
        Ok(())
    }

    #[test]
    fn test_update_after_delete_does_not_duplicate() -> Result<()> {
        let mut table = identity_table(7);
        table.set(3, 1)?;
        table.set(10, 2)?;
        table.delete(3)?;

        table.set(10, 20)?;
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(10)?, &20);
        assert_eq!(table.iter().count(), 1);
        Ok(())
    }

    #[test]
    fn test_delete_leaves_tombstone() -> Result<()> {
        let mut table = identity_table(7);
        table.set(3, 'a')?;
        table.set(10, 'b')?;

        table.delete(3)?;
        assert_eq!(table.len(), 1);
        assert_eq!(table.slots.used(), 2);

        // A new key on the same path reuses the tombstone
        table.set(24, 'c')?;
        assert_eq!(table.slots.get(3).map(|b| b.value), Some('c'));
        assert_eq!(table.slots.used(), 2);
        assert_eq!(table.get(10)?, &'b');
        Ok(())
    }

    #[test]
    fn test_tombstones_are_dropped_before_they_fill_the_table() -> Result<()> {
        let mut table = identity_table(7);
        for key in 0..4 {
            table.set(key, key)?;
        }
        for key in 0..3 {
            table.delete(key)?;
        }
        table.set(4, 4)?;
        table.set(5, 5)?;
        assert_eq!(table.slots.used(), 6);

        // 6 of 7 slots used but only 3 live: rebuilt in place, not grown
        table.set(6, 6)?;
        assert_eq!(table.capacity(), 7);
        assert_eq!(table.slots.used(), 4);
        assert_eq!(table.len(), 4);
        for key in 3..7 {
            assert_eq!(table.get(key)?, &key);
        }
        Ok(())
    }

    #[test]
    fn test_resize() -> Result<()> {
        let mut table = HashTable::with_capacity(5);
        table.set_resize_threshold(0.5);

        // 3 of 5 slots is above the threshold, so the fourth insert grows the table
        table.set("key1", 1)?;
        table.set("key2", 2)?;
        table.set("key3", 3)?;
        assert_eq!(table.capacity(), 5);
        table.set("key4", 4)?;
        assert_eq!(table.capacity(), 11);

        for (key, value) in [("key1", 1), ("key2", 2), ("key3", 3), ("key4", 4)] {
            assert_eq!(table.get(key)?, &value);
        }
        Ok(())
    }

    #[test]
    fn test_resize_keeps_salts() -> Result<()> {
        let mut table = TableBuilder::new().salts(11, 13).build();
        for n in 0..100 {
            table.set(n, n)?;
        }
        assert!(table.capacity() > DEFAULT_CAPACITY);
        assert_eq!(table.salts(), Salts { primary: 11, secondary: 13 });
        Ok(())
    }

    #[test]
    fn test_comparison_counter() -> Result<()> {
        let mut table = identity_table(7);
        // 3, 10 and 17 share primary slot 3 and land in slots 3, 6 and 2
        table.set(3, ())?;
        table.set(10, ())?;
        table.set(17, ())?;

        table.get(3)?;
        assert_eq!(table.comparison_count(), 1);

        // The primary slot counts, the probe that finds the key does not
        table.reset_comparison_count();
        table.get(10)?;
        assert_eq!(table.comparison_count(), 1);

        // One more for slot 6, which holds another key
        table.reset_comparison_count();
        table.get(17)?;
        assert_eq!(table.comparison_count(), 2);

        table.reset_comparison_count();
        assert!(table.get(4).is_err());
        assert_eq!(table.comparison_count(), 0);

        // Deletion counts only the missed probes
        table.delete(17)?;
        assert_eq!(table.comparison_count(), 1);
        Ok(())
    }

    #[test]
    fn test_get_mut() -> Result<()> {
        let mut table = HashTable::new();
        table.set("key1", 1)?;

        *table.get_mut("key1")? += 10;

        assert_eq!(table.get("key1")?, &11);
        Ok(())
    }

    #[test]
    fn test_clear() -> Result<()> {
        let mut table = HashTable::new();
        table.set("key1", 1)?;
        table.set("key2", 2)?;
        let salts = table.salts();

        table.clear();

        assert!(table.is_empty());
        assert!(!table.contains_key("key1"));
        assert_eq!(table.salts(), salts);
        Ok(())
    }

    #[test]
    fn test_display_in_slot_order() -> Result<()> {
        let mut table = identity_table(7);
        table.set(5, "five")?;
        table.set(1, "one")?;
        assert_eq!(table.to_string(), "{1: \"one\", 5: \"five\"}");

        let mut table = identity_table(7);
        table.set("a", 1.5)?;
        assert_eq!(table.to_string(), "{\"a\": 1.5}");
        Ok(())
    }

    #[test]
    fn test_invalid_keys_are_rejected() {
        let mut table: HashTable<i32> = HashTable::new();
        assert!(matches!(table.set(u64::MAX, 1), Err(TableError::Encoding { .. })));
        let float: &dyn Any = &1.5_f32;
        assert!(matches!(table.set(float, 1), Err(TableError::UnsupportedKeyType { .. })));
        assert!(table.is_empty());
    }

    #[test]
    fn test_hash_function_is_exposed() {
        let table: HashTable<()> = HashTable::with_strategy(PrimeModHash);
        assert_eq!(table.hash_function().name(), "prime-mod");
        assert_eq!(table.hash_function().hash(&Key::Int(5), 7, 3), 1);
    }

    /// One step of a random workload
    #[derive(Debug, Clone)]
    enum Op {
        /// Insert or update
        Set(i64, u16),
        /// Lookup
        Get(i64),
        /// Removal
        Delete(i64),
    }

    /// Random operations over a key space small enough to collide often
    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0_i64..60, any::<u16>()).prop_map(|(key, value)| Op::Set(key, value)),
            (0_i64..60).prop_map(Op::Get),
            (0_i64..60).prop_map(Op::Delete),
        ]
    }

    proptest! {
        #[test]
        fn matches_std_hashmap(ops in prop::collection::vec(op_strategy(), 1..400)) {
            let mut table = TableBuilder::new().capacity(5).salts(3, 7).build();
            let mut expected = std::collections::HashMap::new();
            for op in ops {
                match op {
                    Op::Set(key, value) => {
                        prop_assert_eq!(table.set(key, value)?, expected.insert(key, value));
                    }
                    Op::Get(key) => {
                        prop_assert_eq!(table.get(key).ok(), expected.get(&key));
                    }
                    Op::Delete(key) => {
                        prop_assert_eq!(table.delete(key).ok(), expected.remove(&key));
                    }
                }
                prop_assert_eq!(table.len(), expected.len());
                prop_assert_eq!(table.iter().count(), expected.len());
            }
            for (key, value) in &expected {
                prop_assert_eq!(table.get(*key)?, value);
            }
        }

        #[test]
        fn last_write_wins(ops in prop::collection::vec((0_i64..40, any::<i32>()), 1..200)) {
            let mut table = HashTable::new();
            let mut expected = std::collections::HashMap::new();
            for (key, value) in ops {
                table.set(key, value)?;
                expected.insert(key, value);
            }
            prop_assert_eq!(table.len(), expected.len());
            for (key, value) in &expected {
                prop_assert_eq!(table.get(*key)?, value);
            }
        }

        #[test]
        fn len_after_deletes(keys in prop::collection::hash_set(any::<i64>(), 0..150), cut in 0_usize..150) {
            let mut table = HashTable::new();
            for key in &keys {
                table.set(*key, *key)?;
            }
            let removed: Vec<i64> = keys.iter().copied().take(cut).collect();
            for key in &removed {
                prop_assert_eq!(table.delete(*key)?, *key);
            }
            prop_assert_eq!(table.len(), keys.len() - removed.len());
            for key in keys.iter().skip(removed.len()) {
                prop_assert_eq!(table.get(*key)?, key);
            }
        }

        #[test]
        fn load_factor_tracks_len(keys in prop::collection::vec(".{0,12}", 0..120)) {
            let mut table = HashTable::new();
            for key in &keys {
                table.set(key, ())?;
                let expected = table.len() as f64 / table.capacity() as f64;
                prop_assert!((table.load_factor() - expected).abs() < f64::EPSILON);
                prop_assert!(prime::is_prime(table.capacity()));
            }
        }
    }
}
