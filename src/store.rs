//! Typed persistence on top of a raw [`Storage`] backend.
//!
//! Loading is forgiving: a missing key, a failed read, or a corrupt
//! document all fall back to the caller's default so that a damaged store
//! can never keep the storefront from starting. Saving is strict and
//! reports every failure.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::storage::{Storage, StorageKey};

/// Reads and writes whole entities as JSON documents.
#[derive(Debug)]
pub struct PersistedStore<S: Storage> {
    /// Raw key/value backend.
    storage: S,
}

impl<S: Storage> PersistedStore<S> {
    /// Wraps a storage backend.
    #[inline]
    #[must_use]
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Returns the underlying backend.
    #[inline]
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Unwraps the underlying backend.
    #[inline]
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Loads the entity stored under `key`, or `default` when it is
    /// missing or unreadable.
    #[tracing::instrument(skip_all, fields(key = %key))]
    pub fn load<T: DeserializeOwned>(&self, key: StorageKey, default: T) -> T {
        let raw = match self.storage.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(err) => {
                tracing::warn!(error = %err, "read failed, using default");
                return default;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "corrupt document, using default");
                default
            }
        }
    }

    /// Serializes `value` and writes it under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::StorefrontError::Serialization`] if the value
    /// cannot be encoded, or [`crate::error::StorefrontError::Storage`] if the
    /// backend write fails.
    #[tracing::instrument(skip_all, fields(key = %key))]
    pub fn save<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.storage.write(key, &raw)?;
        tracing::debug!(bytes = raw.len(), "saved");
        Ok(())
    }
}
