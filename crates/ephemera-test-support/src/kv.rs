//! Test key-value stores: mock `KeyValueStore` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ephemera_core::error::StoryError;
use ephemera_core::persistence::KeyValueStore;

/// An in-memory key-value store that records every write.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<(String, String)>>,
}

impl MemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with `value` under `key`. The seed is not
    /// counted as a write.
    #[must_use]
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .values
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        store
    }

    /// Returns the current value under `key`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    /// Returns a snapshot of all writes in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoryError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoryError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        self.writes
            .lock()
            .unwrap()
            .push((key.to_owned(), value.to_owned()));
        Ok(())
    }
}

/// A key-value store whose reads succeed against a fixed seed but whose
/// writes always fail. Counts attempted writes so retry behaviour can be
/// asserted.
#[derive(Debug, Default)]
pub struct ReadOnlyKeyValueStore {
    seed: Option<(String, String)>,
    attempts: Mutex<usize>,
}

impl ReadOnlyKeyValueStore {
    /// Creates a store that returns `value` for `key` and rejects writes.
    #[must_use]
    pub fn with_value(key: &str, value: &str) -> Self {
        Self {
            seed: Some((key.to_owned(), value.to_owned())),
            attempts: Mutex::new(0),
        }
    }

    /// Returns the number of rejected writes.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn write_attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl KeyValueStore for ReadOnlyKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoryError> {
        Ok(self
            .seed
            .as_ref()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StoryError> {
        *self.attempts.lock().unwrap() += 1;
        Err(StoryError::PersistenceWrite("disk full".into()))
    }
}

/// A key-value store that always returns persistence errors. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingKeyValueStore;

#[async_trait]
impl KeyValueStore for FailingKeyValueStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoryError> {
        Err(StoryError::PersistenceRead("storage unavailable".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StoryError> {
        Err(StoryError::PersistenceWrite("storage unavailable".into()))
    }
}

/// An in-memory key-value store whose n-th read fails once. Every other
/// read and every write behaves like [`MemoryKeyValueStore`].
#[derive(Debug, Default)]
pub struct FlakyReadKeyValueStore {
    inner: MemoryKeyValueStore,
    fail_on_read: usize,
    reads: Mutex<usize>,
}

impl FlakyReadKeyValueStore {
    /// Creates a store seeded with `value` under `key` whose read number
    /// `fail_on_read` (1-based) returns `StoryError::PersistenceRead`.
    #[must_use]
    pub fn failing_read(key: &str, value: &str, fail_on_read: usize) -> Self {
        Self {
            inner: MemoryKeyValueStore::with_value(key, value),
            fail_on_read,
            reads: Mutex::new(0),
        }
    }

    /// Returns the current value under `key`.
    pub fn value(&self, key: &str) -> Option<String> {
        self.inner.value(key)
    }

    /// Returns the number of successful writes.
    pub fn write_count(&self) -> usize {
        self.inner.writes().len()
    }
}

#[async_trait]
impl KeyValueStore for FlakyReadKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoryError> {
        let read = {
            let mut reads = self.reads.lock().unwrap();
            *reads += 1;
            *reads
        };
        if read == self.fail_on_read {
            return Err(StoryError::PersistenceRead("input/output error".into()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoryError> {
        self.inner.set(key, value).await
    }
}
