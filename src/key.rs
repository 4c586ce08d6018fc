//! Table keys and their integer encoding

use std::{
    any::{Any, type_name},
    fmt,
};

use crate::error::{Result, TableError};

/// Base of the polynomial rolling hash applied to string keys
pub const ROLLING_BASE: u64 = 97;

/// Prime modulus of the polynomial rolling hash applied to string keys
pub const ROLLING_MODULUS: u64 = 32_361_122_672_259_149;

/// A key stored in a [`HashTable`](crate::HashTable).
///
/// Only strings and 64-bit signed integers are keys. Anything else is rejected
/// when converted through [`IntoKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// A string key, encoded with the rolling hash
    Str(String),
    /// An integer key, encoded as itself
    Int(i64),
}

impl Key {
    /// Maps the key to its canonical integer.
    ///
    /// Strings use `Σ code_point(c_i) · 97^i mod 32361122672259149` over their
    /// characters; integers are returned unchanged. Equal keys always encode to
    /// the same integer.
    #[must_use]
    pub fn encode(&self) -> i64 {
        match self {
            Self::Str(s) => rolling_hash(s),
            Self::Int(n) => *n,
        }
    }

    /// Returns the string if this is a string key
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    /// Converts any value into a key, reporting the concrete type name on failure.
    ///
    /// ```rust
    /// use primehash::{Key, TableError};
    ///
    /// assert_eq!(Key::try_from_any(&7_u16), Ok(Key::Int(7)));
    /// assert!(matches!(
    ///     Key::try_from_any(&1.5_f64),
    ///     Err(TableError::UnsupportedKeyType { type_name: "f64" })
    /// ));
    /// ```
    ///
    /// # Errors
    ///
    /// [`TableError::UnsupportedKeyType`] when `T` is neither a string nor an
    /// integer type, [`TableError::Encoding`] when an integer does not fit in `i64`.
    pub fn try_from_any<T: Any>(value: &T) -> Result<Self> {
        let any: &dyn Any = value;
        any.into_key().map_err(|err| match err {
            TableError::UnsupportedKeyType { .. } => {
                TableError::UnsupportedKeyType { type_name: type_name::<T>() }
            }
            other => other,
        })
    }
}

/// Polynomial rolling hash over the characters of `s`
#[allow(
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]
fn rolling_hash(s: &str) -> i64 {
    let modulus = u128::from(ROLLING_MODULUS);
    let base = u128::from(ROLLING_BASE);

    let (hash, _) = s.chars().fold((0_u128, 1_u128), |(hash, power), c| {
        let term = u128::from(u32::from(c)) * power % modulus;
        ((hash + term) % modulus, power * base % modulus)
    });

    // Reduced below the modulus, which is smaller than i64::MAX
    hash as i64
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Conversion of caller-supplied values into a [`Key`].
///
/// Table operations accept any `IntoKey`, so `table.set("answer", 42)` and
/// `table.set(53, 1.618)` work without building keys by hand.
pub trait IntoKey {
    /// Performs the conversion
    ///
    /// # Errors
    ///
    /// [`TableError::UnsupportedKeyType`] or [`TableError::Encoding`] when the
    /// value cannot be a key.
    fn into_key(self) -> Result<Key>;
}

impl IntoKey for Key {
    fn into_key(self) -> Result<Key> {
        Ok(self)
    }
}

impl IntoKey for &Key {
    fn into_key(self) -> Result<Key> {
        Ok(self.clone())
    }
}

impl IntoKey for &str {
    fn into_key(self) -> Result<Key> {
        Ok(Key::from(self))
    }
}

impl IntoKey for String {
    fn into_key(self) -> Result<Key> {
        Ok(Key::Str(self))
    }
}

impl IntoKey for &String {
    fn into_key(self) -> Result<Key> {
        Ok(Key::Str(self.clone()))
    }
}

/// Integer types that always fit in `i64`
macro_rules! lossless_int_key {
    ($($t:ty),*) => {
        $(
            impl IntoKey for $t {
                fn into_key(self) -> Result<Key> {
                    Ok(Key::Int(i64::from(self)))
                }
            }
        )*
    };
}

/// Integer types that may fall outside the `i64` range
macro_rules! checked_int_key {
    ($($t:ty),*) => {
        $(
            impl IntoKey for $t {
                fn into_key(self) -> Result<Key> {
                    i64::try_from(self).map(Key::Int).map_err(|_| TableError::Encoding {
                        reason: format!("integer {self} is outside the signed 64-bit range"),
                    })
                }
            }
        )*
    };
}

lossless_int_key!(i8, i16, i32, i64, u8, u16, u32);
checked_int_key!(i128, isize, u64, u128, usize);

impl IntoKey for &dyn Any {
    fn into_key(self) -> Result<Key> {
        if let Some(s) = self.downcast_ref::<String>() {
            return s.into_key();
        }
        if let Some(s) = self.downcast_ref::<&'static str>() {
            return (*s).into_key();
        }
        if let Some(key) = self.downcast_ref::<Key>() {
            return key.into_key();
        }

        // Integer types, most common first
        macro_rules! downcast_int {
            ($($t:ty),*) => {
                $(
                    if let Some(n) = self.downcast_ref::<$t>() {
                        return (*n).into_key();
                    }
                )*
            };
        }
        downcast_int!(i64, i32, u32, u64, usize, isize, i16, u16, i8, u8, i128, u128);

        Err(TableError::UnsupportedKeyType { type_name: "unknown" })
    }
}
