//! Secret value types with automatic memory zeroing
//!
//! - [`SecretValue`]: bytes held in a `secrecy::SecretSlice`, zeroed on drop
//! - [`SecretMap`]: a collection of named values returned by map and bulk reads

use secrecy::{ExposeSecret, SecretSlice};
use std::collections::HashMap;

/// A resolved secret value with automatic memory zeroing on drop.
///
/// - Secret bytes are zeroed from memory when dropped
/// - Debug output shows `[REDACTED]` instead of the actual value
/// - Explicit `.expose()` call required to access the value
pub struct SecretValue {
    inner: SecretSlice<u8>,
}

impl SecretValue {
    /// Create a new secret value, moving the bytes into secure storage.
    #[must_use]
    pub fn new(value: Vec<u8>) -> Self {
        Self {
            inner: SecretSlice::from(value),
        }
    }

    /// Expose the secret bytes for use.
    ///
    /// The caller must ensure the exposed value is not logged or persisted.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.inner.expose_secret()
    }

    /// Expose the secret as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn expose_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(self.expose())
    }

    /// Length in bytes without exposing the value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expose().len()
    }

    /// Check if the value is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

impl From<&str> for SecretValue {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for SecretValue {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl Clone for SecretValue {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_vec())
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl std::fmt::Display for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Named secret values.
///
/// Returned by field-map reads (field name -> value) and bulk reads
/// (backend identifier -> serialized record). Values are zeroed when the
/// map is dropped.
#[derive(Default, Clone)]
pub struct SecretMap {
    values: HashMap<String, SecretValue>,
}

impl SecretMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a value, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<SecretValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Get a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SecretValue> {
        self.values.get(key)
    }

    /// Check if the map contains a key.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Check if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterate over keys.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SecretValue)> {
        self.values.iter()
    }
}

impl std::fmt::Debug for SecretMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("SecretMap")
            .field("count", &self.values.len())
            .field("keys", &keys)
            .finish()
    }
}
