//! Durable key/value storage contract.
//!
//! Every persisted record is a JSON document under a string key, the same
//! shape as browser `localStorage`. Services receive an
//! `Arc<dyn KeyValueStore>` at construction so tests can swap in
//! [`MemoryStore`]; the CLI uses a file-backed store from the storefront
//! crate.
//!
//! Reads and writes are synchronous. Callers never hold a store call across
//! an `.await`.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::types::IdentityId;

/// Errors from the backing store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing medium failed (disk, permissions, ...).
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized for writing.
    #[error("failed to encode record {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A stored record is not valid JSON for its expected type.
    ///
    /// Callers recover from this by discarding the record.
    #[error("corrupt persisted record {key}: {source}")]
    CorruptRecord {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Whether this is a recoverable corrupt-record error.
    #[must_use]
    pub const fn is_corrupt_record(&self) -> bool {
        matches!(self, Self::CorruptRecord { .. })
    }
}

/// A string-keyed, string-valued durable store.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the backing medium cannot be written.
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the backing medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and decode the JSON record under `key`.
///
/// # Errors
///
/// Returns `StorageError::CorruptRecord` if the stored text does not decode
/// as `T`, or any error from the store itself.
pub fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::CorruptRecord {
            key: key.to_owned(),
            source,
        })
}

/// Encode `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Returns `StorageError::Encode` if serialization fails, or any error from
/// the store itself.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_owned(),
        source,
    })?;
    store.set(key, raw)
}

/// Key layout of the persisted records.
///
/// The derivation is explicit so deployments (and tests) can namespace the
/// key space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    /// Key of the global active-identity record.
    pub identity: String,
    /// Prefix of per-identity cart keys; the identity id is appended.
    pub cart_prefix: String,
    /// Prefix of id alias records left behind by email changes; the id
    /// derived from the new email is appended.
    pub alias_prefix: String,
    /// Key of the admin order book.
    pub orders: String,
    /// Key of the announcement board.
    pub announcements: String,
    /// Key of the admin-managed product list.
    pub products: String,
}

impl StorageKeys {
    /// Keys under a custom namespace, e.g. `"test"` gives `test_user`,
    /// `test_cart_<id>`, `test_orders`, `test_announcements`, `test_products`.
    #[must_use]
    pub fn with_namespace(namespace: &str) -> Self {
        Self {
            identity: format!("{namespace}_user"),
            cart_prefix: format!("{namespace}_cart_"),
            alias_prefix: format!("{namespace}_alias_"),
            orders: format!("{namespace}_orders"),
            announcements: format!("{namespace}_announcements"),
            products: format!("{namespace}_products"),
        }
    }

    /// The cart key of an identity.
    #[must_use]
    pub fn cart_key(&self, identity: &IdentityId) -> String {
        format!("{}{identity}", self.cart_prefix)
    }

    /// The alias record redirecting `derived` to an existing identity id.
    #[must_use]
    pub fn alias_key(&self, derived: &IdentityId) -> String {
        format!("{}{derived}", self.alias_prefix)
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::with_namespace("styleaura")
    }
}

/// In-process store backed by an ordered map.
///
/// Used as the test fake and for sessions that need no durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys currently stored, in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keys_match_storefront_layout() {
        let keys = StorageKeys::default();
        assert_eq!(keys.identity, "styleaura_user");
        assert_eq!(keys.cart_key(&IdentityId::new("user-42")), "styleaura_cart_user-42");
        assert_eq!(keys.orders, "styleaura_orders");
        assert_eq!(keys.products, "styleaura_products");
        assert_eq!(keys.alias_key(&IdentityId::new("user-1a2b3c4d")), "styleaura_alias_user-1a2b3c4d");
    }

    #[test]
    fn test_json_helpers() {
        let store = MemoryStore::new();
        write_json(&store, "numbers", &vec![1, 2, 3]).unwrap();

        let read: Option<Vec<u32>> = read_json(&store, "numbers").unwrap();
        assert_eq!(read, Some(vec![1, 2, 3]));

        let missing: Option<Vec<u32>> = read_json(&store, "absent").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_corrupt_record_is_reported() {
        let store = MemoryStore::new();
        store.set("numbers", "{not json".to_string()).unwrap();

        let err = read_json::<Vec<u32>>(&store, "numbers").unwrap_err();
        assert!(err.is_corrupt_record());
        assert!(err.to_string().contains("numbers"));
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let store = MemoryStore::new();
        store.remove("nothing").unwrap();
        assert!(store.keys().is_empty());
    }
}
