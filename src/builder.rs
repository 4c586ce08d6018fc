//! Construction of tables with non-default settings

use std::{fmt, sync::Arc};

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    hash::{HashStrategy, PrimeModHash},
    hash_table::{DEFAULT_CAPACITY, DEFAULT_RESIZE_THRESHOLD, HashTable},
    prime,
    probe::Salts,
};

/// Largest salt drawn at random; salts are uniform over `[1, 2^32]`
pub const MAX_RANDOM_SALT: u64 = 1 << 32;

/// Lowest accepted resize threshold
const MIN_THRESHOLD: f64 = 0.05;

/// Highest accepted resize threshold; keeps a free slot for every insertion
const MAX_THRESHOLD: f64 = 0.95;

/// How the salts of a new table are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaltSource {
    /// Fresh values from the thread-local generator
    Random,
    /// Values from a generator seeded with the given seed
    Seeded(u64),
    /// Exactly these salts
    Fixed(Salts),
}

/// A builder for [`HashTable`], allowing you to specify capacity, resize
/// threshold, hash strategy and salts.
///
/// ```rust
/// use primehash::{Crc32Hash, TableBuilder};
///
/// let mut table = TableBuilder::new()
///     .capacity(100)
///     .resize_threshold(0.5)
///     .strategy(Crc32Hash)
///     .seed(7)
///     .build();
/// table.set("answer", 42).unwrap();
///
/// assert_eq!(table.capacity(), 101);
/// assert_eq!(table.get("answer"), Ok(&42));
/// ```
#[derive(Clone)]
pub struct TableBuilder {
    /// Requested capacity, rounded up to a prime on build
    capacity: usize,
    /// Load factor at which insertion resizes first
    resize_threshold: f64,
    /// Hash strategy shared with the table
    strategy: Arc<dyn HashStrategy>,
    /// Origin of the salts
    salts: SaltSource,
}

impl TableBuilder {
    /// Create a new builder with default parameters and [`PrimeModHash`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            resize_threshold: DEFAULT_RESIZE_THRESHOLD,
            strategy: Arc::new(PrimeModHash),
            salts: SaltSource::Random,
        }
    }

    /// Initial capacity; rounded up to the next prime (at least 2)
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Load factor at which insertion resizes first, clamped to `[0.05, 0.95]`
    #[must_use]
    pub fn resize_threshold(mut self, threshold: f64) -> Self {
        self.resize_threshold = Self::clamp_threshold(threshold);
        self
    }

    /// Hash strategy for both the primary index and the probe step
    #[must_use]
    pub fn strategy<S>(mut self, strategy: S) -> Self
    where
        S: HashStrategy + 'static,
    {
        self.strategy = Arc::new(strategy);
        self
    }

    /// Hash strategy already shared with other code
    #[must_use]
    pub fn shared_strategy(mut self, strategy: Arc<dyn HashStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Exact salts for the primary and secondary hash; zero is raised to one
    #[must_use]
    pub fn salts(mut self, primary: u64, secondary: u64) -> Self {
        self.salts =
            SaltSource::Fixed(Salts { primary: primary.max(1), secondary: secondary.max(1) });
        self
    }

    /// Draw the salts from a generator seeded with `seed`, for reproducible tables
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.salts = SaltSource::Seeded(seed);
        self
    }

    /// Builds an empty table
    #[must_use]
    pub fn build<V>(self) -> HashTable<V> {
        let salts = match self.salts {
            SaltSource::Random => random_salts(&mut rand::rng()),
            SaltSource::Seeded(seed) => random_salts(&mut StdRng::seed_from_u64(seed)),
            SaltSource::Fixed(salts) => salts,
        };
        let capacity = prime::next_prime(self.capacity);

        HashTable::from_parts(capacity, self.strategy, salts, self.resize_threshold)
    }

    /// Keeps a threshold inside the accepted range; NaN falls back to the default
    pub(crate) fn clamp_threshold(threshold: f64) -> f64 {
        if threshold.is_nan() {
            DEFAULT_RESIZE_THRESHOLD
        } else {
            threshold.clamp(MIN_THRESHOLD, MAX_THRESHOLD)
        }
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TableBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableBuilder")
            .field("capacity", &self.capacity)
            .field("resize_threshold", &self.resize_threshold)
            .field("strategy", &self.strategy.name())
            .field("salts", &self.salts)
            .finish()
    }
}

/// Two independent salts, uniform over `[1, 2^32]`
fn random_salts<R: Rng + ?Sized>(rng: &mut R) -> Salts {
    Salts {
        primary: rng.random_range(1..=MAX_RANDOM_SALT),
        secondary: rng.random_range(1..=MAX_RANDOM_SALT),
    }
}
