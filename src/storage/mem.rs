use super::{Store, StorageError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory store, non-persistent; used in tests and throwaway setups.
///
/// Clones share the same backing map, so a handle kept aside observes
/// writes made through a clone handed to a [`crate::Controller`].
#[derive(Default, Clone)]
pub struct MemStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.lock().expect("store lock").get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.entries
            .lock()
            .expect("store lock")
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().expect("store lock").remove(key);
        Ok(())
    }

    fn keys_with_suffix(&self, suffix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .entries
            .lock()
            .expect("store lock")
            .keys()
            .filter(|k| k.ends_with(suffix))
            .cloned()
            .collect())
    }
}
