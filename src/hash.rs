//! Hash strategies mapping keys to slot indices.
//!
//! A strategy is a pure function of `(key, capacity, salt)`. The table calls it
//! with salt `a` for the primary index and with salt `b` for the double-hashing
//! step, so one strategy drives both halves of the probe sequence.

use crate::key::Key;

/// Maps a key to a slot index for a table of a given capacity.
///
/// Implementations should return a value in `[0, capacity)`; the table reduces
/// anything larger modulo the capacity. Closures of the shape
/// `Fn(&Key, usize, u64) -> usize` are strategies too, which lets analysis code
/// plug in experimental hash functions.
///
/// ```rust
/// use primehash::{HashStrategy, HashTable, Key};
///
/// let by_length = |key: &Key, capacity: usize, _salt: u64| {
///     key.as_str().map_or(0, str::len) % capacity
/// };
/// let mut table = HashTable::with_strategy(by_length);
/// table.set("four", 4).unwrap();
/// assert_eq!(table.hash_function().hash(&Key::from("four"), 23, 1), 4);
/// ```
pub trait HashStrategy: Send + Sync {
    /// Returns the slot index of `key`
    fn hash(&self, key: &Key, capacity: usize, salt: u64) -> usize;

    /// Short human-readable name of the strategy
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<F> HashStrategy for F
where
    F: Fn(&Key, usize, u64) -> usize + Send + Sync,
{
    fn hash(&self, key: &Key, capacity: usize, salt: u64) -> usize {
        self(key, capacity, salt)
    }
}

/// Multiplicative hashing over a prime modulus: `(salt · encode(key)) mod capacity`.
///
/// The modulus is the table capacity, which the table keeps prime so that the
/// salted products spread evenly over the slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrimeModHash;

impl PrimeModHash {
    /// Hashes an already encoded key.
    ///
    /// Uses the mathematical (non-negative) modulus, so negative integer keys
    /// land in range as well. Returns 0 for a zero capacity.
    #[must_use]
    #[allow(
        clippy::arithmetic_side_effects,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    pub fn hash_encoded(encoded: i64, capacity: usize, salt: u64) -> usize {
        if capacity == 0 {
            return 0;
        }

        let modulus = capacity as u128;
        let salt = u128::from(salt) % modulus;
        let encoded = i128::from(encoded).rem_euclid(modulus as i128) as u128;

        // Both factors are below 2^64, so the product cannot overflow
        (salt * encoded % modulus) as usize
    }
}

impl HashStrategy for PrimeModHash {
    fn hash(&self, key: &Key, capacity: usize, salt: u64) -> usize {
        Self::hash_encoded(key.encode(), capacity, salt)
    }

    fn name(&self) -> &'static str {
        "prime-mod"
    }
}

/// CRC32 checksum of the UTF-8 bytes of string keys, reduced modulo the capacity.
///
/// The checksum is the standard reflected CRC32 (polynomial `0xEDB88320`) and
/// ignores the salt. Integer keys fall back to [`PrimeModHash`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc32Hash;

impl Crc32Hash {
    /// Standard CRC32 checksum of `bytes`
    #[must_use]
    pub fn checksum(bytes: &[u8]) -> u32 {
        crc32fast::hash(bytes)
    }
}

impl HashStrategy for Crc32Hash {
    #[allow(clippy::cast_possible_truncation)]
    fn hash(&self, key: &Key, capacity: usize, salt: u64) -> usize {
        match key {
            Key::Str(s) => {
                let checksum = u64::from(Self::checksum(s.as_bytes()));
                checksum.checked_rem(capacity as u64).unwrap_or(0) as usize
            }
            Key::Int(_) => PrimeModHash.hash(key, capacity, salt),
        }
    }

    fn name(&self) -> &'static str {
        "crc32"
    }
}

/// Primary slot index of `key`, reduced into `[0, capacity)`
pub(crate) fn slot_index(
    strategy: &dyn HashStrategy,
    key: &Key,
    capacity: usize,
    salt: u64,
) -> usize {
    strategy.hash(key, capacity, salt).checked_rem(capacity).unwrap_or(0)
}

/// Double-hashing step of `key`; never zero so that a prime capacity is fully covered
pub(crate) fn step_size(strategy: &dyn HashStrategy, key: &Key, capacity: usize, salt: u64) -> usize {
    match slot_index(strategy, key, capacity, salt) {
        0 => 1,
        step => step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prime_mod_hash() {
        assert_eq!(PrimeModHash.hash(&Key::Int(5), 7, 3), 1);
        assert_eq!(PrimeModHash.hash(&Key::Int(0), 23, 12345), 0);
        // -2 mod 7
        assert_eq!(PrimeModHash.hash(&Key::Int(-1), 7, 2), 5);
    }

    #[test]
    fn test_prime_mod_hash_does_not_overflow() {
        assert_eq!(PrimeModHash::hash_encoded(i64::MAX, 1_000_003, u64::MAX), 975_488);
        assert_eq!(PrimeModHash::hash_encoded(i64::MIN, 97, 1 << 32), 48);
    }

    #[test]
    fn test_prime_mod_hash_uses_rolling_encoding() {
        let key = Key::from("ab");
        assert_eq!(PrimeModHash.hash(&key, 101, 1), 9603 % 101);
    }

    #[test]
    fn test_crc32_hash_of_strings() {
        // zlib.crc32(b"hello-world") == 2983461467
        assert_eq!(Crc32Hash::checksum(b"hello-world"), 2_983_461_467);
        assert_eq!(Crc32Hash.hash(&Key::from("hello-world"), 23, 99), 22);
        assert_eq!(Crc32Hash.hash(&Key::from("hello-world"), 47, 7), 26);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_crc32_check_value() {
        // Capacity above u32::MAX leaves the checksum unreduced
        let capacity = 1_usize << 33;
        assert_eq!(Crc32Hash.hash(&Key::from("123456789"), capacity, 1), 0xCBF4_3926);
    }

    #[test]
    fn test_crc32_delegates_integers() {
        for n in [-40_i64, 0, 7, 53, 1_000_000_007] {
            let key = Key::Int(n);
            assert_eq!(Crc32Hash.hash(&key, 23, 17), PrimeModHash.hash(&key, 23, 17));
        }
    }

    #[test]
    fn test_closure_strategy() {
        let constant = |_: &Key, _: usize, _: u64| -> usize { 100 };
        assert_eq!(constant.name(), "custom");
        // Out-of-range results are reduced
        assert_eq!(slot_index(&constant, &Key::Int(1), 23, 1), 100 % 23);
    }

    #[test]
    fn test_step_size_is_never_zero() {
        let zero = |_: &Key, _: usize, _: u64| -> usize { 0 };
        assert_eq!(step_size(&zero, &Key::Int(1), 23, 1), 1);
        assert_eq!(step_size(&PrimeModHash, &Key::Int(23), 23, 5), 1);
        assert_eq!(step_size(&PrimeModHash, &Key::Int(4), 23, 5), 20);
    }

    #[test]
    fn test_names() {
        assert_eq!(PrimeModHash.name(), "prime-mod");
        assert_eq!(Crc32Hash.name(), "crc32");
    }
}
