//! Persistence for admin records.
//!
//! # Records
//!
//! - `styleaura_orders` - Every placed order, as one JSON array
//! - `styleaura_announcements` - The announcement board, as one JSON array
//! - `styleaura_products` - The admin-managed product list, seeded from the
//!   catalog file until the first edit
//!
//! All live in the same [`KeyValueStore`] as the storefront's identity and
//! carts. Key names come from [`styleaura_core::storage::StorageKeys`].

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;

use styleaura_core::storage::{KeyValueStore, StorageError, read_json, write_json};

/// A JSON array of records stored under one key.
///
/// Read-modify-write cycles through [`JsonCollection::update`] are
/// serialized, so concurrent updates from one process never lose writes.
pub struct JsonCollection<T> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    write_lock: Mutex<()>,
    /// What a missing key reads as.
    seed: Vec<T>,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Create a collection over `key` in `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self::seeded(store, key, Vec::new())
    }

    /// Create a collection that reads as `seed` until it is first written.
    #[must_use]
    pub fn seeded(store: Arc<dyn KeyValueStore>, key: impl Into<String>, seed: Vec<T>) -> Self {
        Self {
            store,
            key: key.into(),
            write_lock: Mutex::new(()),
            seed,
        }
    }

    /// The storage key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read every record. A missing key reads as the seed, which is empty
    /// unless the collection was built with [`Self::seeded`].
    ///
    /// A corrupt record is discarded with a warning and reads as the seed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read, or the corrupt
    /// record cannot be removed.
    pub fn load(&self) -> Result<Vec<T>, StorageError> {
        match read_json::<Vec<T>>(self.store.as_ref(), &self.key) {
            Ok(records) => Ok(records.unwrap_or_else(|| self.seed.clone())),
            Err(e) if e.is_corrupt_record() => {
                tracing::warn!(key = %self.key, error = %e, "Discarding corrupt collection");
                self.store.remove(&self.key)?;
                Ok(self.seed.clone())
            }
            Err(e) => Err(e),
        }
    }

    /// Load, change and write back the collection.
    ///
    /// Nothing is written when `change` fails.
    ///
    /// # Errors
    ///
    /// Returns the error from `change`, or a `StorageError` (converted into
    /// `E`) from loading or saving.
    pub fn update<R, E>(&self, change: impl FnOnce(&mut Vec<T>) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StorageError>,
    {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records = self.load()?;
        let result = change(&mut records)?;
        write_json(self.store.as_ref(), &self.key, &records)?;
        Ok(result)
    }
}

impl<T> fmt::Debug for JsonCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonCollection")
            .field("key", &self.key)
            .field("seed", &self.seed.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use styleaura_core::storage::MemoryStore;

    use super::*;

    fn numbers() -> (Arc<MemoryStore>, JsonCollection<u32>) {
        let store = Arc::new(MemoryStore::new());
        let collection = JsonCollection::new(store.clone(), "numbers");
        (store, collection)
    }

    #[test]
    fn test_missing_key_is_empty() {
        let (_, collection) = numbers();
        assert!(collection.load().unwrap().is_empty());
    }

    #[test]
    fn test_update_persists() {
        let (store, collection) = numbers();
        collection
            .update(|items| {
                items.push(7);
                Ok::<_, StorageError>(())
            })
            .unwrap();

        assert_eq!(store.get("numbers").unwrap().as_deref(), Some("[7]"));
        assert_eq!(collection.load().unwrap(), vec![7]);
    }

    #[test]
    fn test_failed_change_writes_nothing() {
        let (store, collection) = numbers();
        let result: Result<(), StorageError> = collection.update(|items| {
            items.push(1);
            Err(StorageError::Io(std::io::Error::other("rejected")))
        });

        assert!(result.is_err());
        assert!(store.get("numbers").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_collection_is_discarded() {
        let (store, collection) = numbers();
        store.set("numbers", "[1, 2".to_string()).unwrap();

        assert!(collection.load().unwrap().is_empty());
        assert!(store.get("numbers").unwrap().is_none());
    }

    #[test]
    fn test_seed_is_read_until_first_write() {
        let store = Arc::new(MemoryStore::new());
        let collection = JsonCollection::seeded(store.clone(), "numbers", vec![1, 2]);
        assert_eq!(collection.load().unwrap(), vec![1, 2]);

        collection
            .update(|items| {
                items.clear();
                Ok::<_, StorageError>(())
            })
            .unwrap();
        assert!(collection.load().unwrap().is_empty());
        assert_eq!(store.get("numbers").unwrap().as_deref(), Some("[]"));
    }
}
