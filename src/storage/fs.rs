use super::{Store, StorageError};
use std::path::{Path, PathBuf};

/// Filesystem store: one file per key under a directory.
///
/// Colons are stripped from file names (not allowed on Windows); typed
/// callers hex-encode identifiers before they get here, so collisions are
/// not a concern in practice.
pub struct FsStore {
    path: PathBuf,
}

impl FsStore {
    /// Open (creating if needed) a store directory
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    fn file_for_key(&self, key: &str) -> PathBuf {
        self.path.join(sanitize_filename(key))
    }
}

impl Store for FsStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match std::fs::read(self.file_for_key(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        std::fs::write(self.file_for_key(key), value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.file_for_key(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys_with_suffix(&self, suffix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(suffix) {
                    keys.push(name.to_string());
                }
            }
        }
        Ok(keys)
    }
}

fn sanitize_filename(name: &str) -> String {
    name.replace(':', "")
}
