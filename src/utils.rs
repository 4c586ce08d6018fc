//! Utility functions and traits for `HashTable`

use crate::{
    error::Result,
    hash_table::HashTable,
    key::{IntoKey, Key},
};

/// Extension trait for tables that provides additional utility methods
pub trait HashTableExtensions<V> {
    /// Returns the keys of the table as a Vec, in slot order
    fn keys(&self) -> Vec<Key>;

    /// Returns the values of the table as a Vec, in slot order
    fn values(&self) -> Vec<V>;

    /// Returns the pairs of the table as a Vec, sorted by key
    fn sorted_pairs(&self) -> Vec<(Key, V)>;
}

impl<V: Clone> HashTableExtensions<V> for HashTable<V> {
    fn keys(&self) -> Vec<Key> {
        self.iter().map(|(k, _)| k.clone()).collect()
    }

    fn values(&self) -> Vec<V> {
        self.iter().map(|(_, v)| v.clone()).collect()
    }

    fn sorted_pairs(&self) -> Vec<(Key, V)> {
        let mut pairs: Vec<(Key, V)> = self.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
        pairs
    }
}

impl<V> HashTable<V> {
    /// Creates a table from an iterator of key-value pairs; later pairs win
    ///
    /// # Errors
    ///
    /// The first key conversion or insertion error.
    pub fn try_from_iter<K, I>(iter: I) -> Result<Self>
    where
        K: IntoKey,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut table = Self::new();
        table.try_extend(iter)?;
        Ok(table)
    }

    /// Inserts every pair of `iter`, stopping at the first error
    ///
    /// # Errors
    ///
    /// The first key conversion or insertion error.
    pub fn try_extend<K, I>(&mut self, iter: I) -> Result<()>
    where
        K: IntoKey,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in iter {
            self.set(key, value)?;
        }
        Ok(())
    }
}
