//! Persistent state: the controller long-term keypair and one pairing
//! record per paired accessory.
//!
//! The underlying [`Store`] is a plain byte-blob key-value interface so
//! callers can bring their own backend; [`FsStore`] keeps one file per key.
//! Pairing keys are hex-encoded so mDNS instance names with colons or other
//! transport-unsafe characters never reach the backend.

mod fs;
mod mem;

#[cfg(test)]
mod tests;

pub use fs::FsStore;
pub use mem::MemStore;

use serde::{Deserialize, Serialize};

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Byte-blob key-value store
pub trait Store: Send + Sync {
    /// Read a value; `None` if the key does not exist
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Write a value
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Delete a key; deleting a missing key is not an error
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// List keys ending in `suffix`
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails
    fn keys_with_suffix(&self, suffix: &str) -> Result<Vec<String>, StorageError>;
}

/// Controller long-term Ed25519 keypair, created once and never rotated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyPair {
    #[serde(rename = "publicKey")]
    pub public: Vec<u8>,
    #[serde(rename = "privateKey")]
    pub private: Vec<u8>,
}

/// Persisted record of a paired accessory
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pairing {
    /// Accessory id (mDNS instance name)
    pub id: String,
    /// Accessory long-term Ed25519 public key
    #[serde(rename = "publicKey")]
    pub public_key: Vec<u8>,
    /// Permission byte: 0 regular, 1 admin
    #[serde(default)]
    pub permission: u8,
}

/// Pairing permission values
pub mod permissions {
    /// Regular user
    pub const REGULAR: u8 = 0x00;
    /// Admin (may manage pairings)
    pub const ADMIN: u8 = 0x01;
}

const KEYPAIR_KEY: &str = "keypair";
const PAIRING_SUFFIX: &str = ".pairing";

fn key_for_pairing(id: &str) -> String {
    format!("{}{}", hex::encode(id.as_bytes()), PAIRING_SUFFIX)
}

/// Typed view over a raw [`Store`]
pub struct TypedStore {
    inner: Box<dyn Store>,
}

impl TypedStore {
    /// Wrap a raw store
    #[must_use]
    pub fn new(inner: Box<dyn Store>) -> Self {
        Self { inner }
    }

    /// Load the controller keypair, if one was saved
    ///
    /// # Errors
    ///
    /// Returns error on backend or decode failure
    pub fn keypair(&self) -> Result<Option<KeyPair>, StorageError> {
        let Some(bytes) = self.inner.get(KEYPAIR_KEY)? else {
            return Ok(None);
        };
        let keypair = serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(keypair))
    }

    /// Persist the controller keypair
    ///
    /// # Errors
    ///
    /// Returns error on backend or encode failure
    pub fn save_keypair(&self, keypair: &KeyPair) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(keypair)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.inner.set(KEYPAIR_KEY, &bytes)
    }

    /// Load the pairing record for an accessory id
    ///
    /// # Errors
    ///
    /// Returns error on backend or decode failure
    pub fn pairing(&self, id: &str) -> Result<Option<Pairing>, StorageError> {
        let Some(bytes) = self.inner.get(&key_for_pairing(id))? else {
            return Ok(None);
        };
        let pairing = serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(pairing))
    }

    /// Persist a pairing record
    ///
    /// # Errors
    ///
    /// Returns error on backend or encode failure
    pub fn save_pairing(&self, pairing: &Pairing) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(pairing)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.inner.set(&key_for_pairing(&pairing.id), &bytes)
    }

    /// Delete the pairing record for an accessory id
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails
    pub fn delete_pairing(&self, id: &str) -> Result<(), StorageError> {
        self.inner.delete(&key_for_pairing(id))
    }

    /// All stored pairing records; undecodable entries are skipped
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails to list keys
    pub fn pairings(&self) -> Result<Vec<Pairing>, StorageError> {
        let mut result = Vec::new();
        for key in self.inner.keys_with_suffix(PAIRING_SUFFIX)? {
            if let Some(bytes) = self.inner.get(&key)? {
                match serde_json::from_slice(&bytes) {
                    Ok(pairing) => result.push(pairing),
                    Err(e) => {
                        tracing::warn!(key, error = %e, "skipping undecodable pairing record");
                    }
                }
            }
        }
        Ok(result)
    }
}
