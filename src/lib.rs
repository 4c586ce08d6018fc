//! # Prime Hash
//!
//! A hash table built from scratch with open addressing and double hashing.
//!
//! Keys are strings or integers. Every key is first encoded as an integer (a
//! polynomial rolling hash for strings, the identity for integers), then mapped
//! to a slot by a pluggable [`HashStrategy`]. Collisions are resolved by double
//! hashing: the same strategy, with a second salt, yields a non-zero step through
//! a slot array whose size is always prime, so every probe sequence reaches every
//! slot.
//!
//! The table grows to the smallest prime `≥ 2·capacity + 1` once the load factor
//! reaches `0.75`, and counts the key comparisons made by lookups so probe
//! lengths can be studied from outside.
//!
//! ## Basic Usage
//!
//! ```rust
//! use primehash::HashTable;
//!
//! // Create a new table
//! let mut table = HashTable::new();
//!
//! // Insert values
//! table.set("answer", 42).unwrap();
//! table.set(53, 7).unwrap();
//!
//! // Retrieve values
//! assert_eq!(table.get("answer"), Ok(&42));
//!
//! // Update values
//! table.set(53, 8).unwrap();
//! assert_eq!(table.get(53), Ok(&8));
//! assert_eq!(table.len(), 2);
//!
//! // Remove values
//! table.delete("answer").unwrap();
//! assert!(table.get("answer").is_err());
//! ```
//!
//! ## Choosing a Hash Strategy
//!
//! ```rust
//! use primehash::{Crc32Hash, HashStrategy, HashTable, Key};
//!
//! let table: HashTable<()> = HashTable::with_strategy(Crc32Hash);
//!
//! // The active strategy can be sampled directly
//! let index = table.hash_function().hash(&Key::from("hello-world"), 23, 1);
//! assert_eq!(index, 22);
//! ```

/// Construction of tables with non-default settings
mod builder;
/// Error type shared by every table operation
mod error;
/// Hash strategies mapping keys to slot indices
mod hash;
/// The table façade
mod hash_table;
/// Table keys and their integer encoding
mod key;
/// Prime capacities
mod prime;
/// Double-hashing probe sequences
mod probe;
/// Fixed-capacity slot array
mod slots;
/// Utility functions and traits for the table
mod utils;

pub use builder::{MAX_RANDOM_SALT, TableBuilder};
pub use error::{Result, TableError};
pub use hash::{Crc32Hash, HashStrategy, PrimeModHash};
pub use hash_table::{DEFAULT_CAPACITY, DEFAULT_RESIZE_THRESHOLD, HashTable, Iter};
pub use key::{IntoKey, Key, ROLLING_BASE, ROLLING_MODULUS};
pub use prime::{grown_capacity, is_prime, next_prime};
pub use probe::Salts;
pub use utils::HashTableExtensions;
