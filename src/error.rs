//! Error type shared by every table operation

/// Errors reported by [`HashTable`](crate::HashTable) operations.
///
/// Every failure is raised synchronously at the call site; nothing is retried
/// internally and a failed `set` or `delete` leaves the table unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// The key is neither a string nor an integer
    #[error("unsupported key type `{type_name}` (only strings and integers can be keys)")]
    UnsupportedKeyType {
        /// Name of the rejected type, as far as it is known
        type_name: &'static str,
    },

    /// The key has a supported type but cannot be encoded
    #[error("cannot encode key: {reason}")]
    Encoding {
        /// What made the key invalid
        reason: String,
    },

    /// Lookup or removal of a key that is not stored in the table
    #[error("key {key} doesn't exist in the table")]
    KeyNotFound {
        /// Rendered form of the missing key
        key: String,
    },

    /// A probe walked the whole table without finding a free slot.
    ///
    /// The resize policy keeps at least one slot free, so this indicates a broken
    /// invariant or a hash strategy that does not spread keys.
    #[error("probed all {capacity} slots without finding a free one")]
    CapacityExhausted {
        /// Capacity of the table at the time of the failure
        capacity: usize,
    },
}

impl TableError {
    /// Returns true for [`TableError::KeyNotFound`]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, TableError>;
