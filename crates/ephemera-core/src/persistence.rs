//! Persistence collaborator abstraction.
//!
//! The story store keeps its whole collection under a single key of a
//! local key-value store. Values are opaque structured text; the store is
//! responsible for (de)serialization.

use async_trait::async_trait;

use crate::error::StoryError;

/// Key-value persistence used by the story store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`, or `None` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoryError>;

    /// Replaces the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoryError>;
}
