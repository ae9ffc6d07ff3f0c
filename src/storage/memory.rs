//! In-memory storage backend for testing.
//!
//! Provides [`InMemoryStorage`], a thread-safe in-memory implementation of
//! [`super::Storage`]. Ideal for unit tests and throwaway sessions where
//! file I/O is undesirable.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{Storage, StorageKey};
use crate::error::{Result, StorefrontError};

/// Thread-safe in-memory storage.
///
/// # Example
///
/// ```rust
/// use freshmart::storage::{InMemoryStorage, Storage, StorageKey};
///
/// let storage = InMemoryStorage::new();
/// storage.write(StorageKey::Products, "[]").unwrap();
/// assert_eq!(storage.read(StorageKey::Products).unwrap().as_deref(), Some("[]"));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    /// Documents keyed by storage key.
    inner: Mutex<HashMap<StorageKey, String>>,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory storage.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the inner lock and applies a closure.
    fn with_lock<R>(&self, f: impl FnOnce(&mut HashMap<StorageKey, String>) -> R) -> Result<R> {
        let mut inner = self.inner.lock().map_err(|err| lock_error(&err))?;
        Ok(f(&mut inner))
    }
}

/// Wraps a mutex poison error.
fn lock_error<T>(err: &std::sync::PoisonError<T>) -> StorefrontError {
    StorefrontError::Storage(err.to_string().into())
}

impl Storage for InMemoryStorage {
    #[inline]
    fn read(&self, key: StorageKey) -> Result<Option<String>> {
        self.with_lock(|docs| docs.get(&key).cloned())
    }

    #[inline]
    fn write(&self, key: StorageKey, contents: &str) -> Result<()> {
        self.with_lock(|docs| {
            let _previous = docs.insert(key, contents.to_owned());
        })
    }

    #[inline]
    fn remove(&self, key: StorageKey) -> Result<()> {
        self.with_lock(|docs| {
            let _previous = docs.remove(&key);
        })
    }

    #[inline]
    fn clear(&self) -> Result<()> {
        self.with_lock(HashMap::clear)
    }
}
