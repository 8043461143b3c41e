use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use super::{KeyValueStorage, StorageError, validate_key};

/// File-backed storage: each key is a `<key>.json` file under `root`.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so a reader never sees a half-written value. The directory is
/// created on first write.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidKey` if the key is not addressable.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        // ':' is not portable in file names; keys never contain '.'.
        Ok(self.root.join(format!("{}.json", key.replace(':', "."))))
    }
}

fn io_error(key: &str, source: std::io::Error) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        source,
    }
}

impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| io_error(key, e))?;

        let tmp = self.root.join(format!(".{key}-{}.tmp", Uuid::new_v4()).replace(':', "."));
        if let Err(e) = fs::write(&tmp, value).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(io_error(key, e));
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(io_error(key, e));
        }
        debug!(key, path = %path.display(), bytes = value.len(), "Wrote storage key");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key, path = %path.display(), "Removed storage key");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, e)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert_eq!(storage.get("cart").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_creates_directory_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        storage.set("cart", "[]").await.unwrap();
        storage.set("cart", "[1]").await.unwrap();

        assert_eq!(storage.get("cart").await.unwrap().as_deref(), Some("[1]"));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("cart.json")]);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.set("favorites", "[]").await.unwrap();
        storage.remove("favorites").await.unwrap();
        storage.remove("favorites").await.unwrap();
        assert_eq!(storage.get("favorites").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_namespaced_key_maps_to_portable_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.set("alice:cart", "[]").await.unwrap();
        assert!(dir.path().join("alice.cart.json").exists());
    }

    #[tokio::test]
    async fn test_dotted_key_cannot_alias_namespaced_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.set("alice:cart", "[1]").await.unwrap();
        let err = storage.set("alice.cart", "[2]").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
        assert_eq!(storage.get("alice:cart").await.unwrap().as_deref(), Some("[1]"));
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let err = storage.set("../escape", "[]").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
