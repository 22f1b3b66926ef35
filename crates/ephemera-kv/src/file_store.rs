//! Filesystem implementation of the `KeyValueStore` trait.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use ephemera_core::error::StoryError;
use ephemera_core::persistence::KeyValueStore;

/// Key-value store backed by one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::PersistenceWrite` if the directory cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoryError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            StoryError::PersistenceWrite(format!("cannot create {}: {e}", root.display()))
        })?;
        Ok(Self { root })
    }

    /// Returns the directory this store writes into.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoryError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoryError::Validation(format!("invalid key: {key:?}")));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoryError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoryError::PersistenceRead(format!(
                "cannot read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoryError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");

        tokio::fs::write(&tmp, value).await.map_err(|e| {
            StoryError::PersistenceWrite(format!("cannot write {}: {e}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            StoryError::PersistenceWrite(format!("cannot replace {}: {e}", path.display()))
        })?;

        debug!(key, bytes = value.len(), "persisted value");
        Ok(())
    }
}
