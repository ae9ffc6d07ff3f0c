//! Pluggable storage backends for persisting storefront state.
//!
//! A backend is a small key/value store holding one JSON document per
//! [`StorageKey`]. Typed loading and saving on top of it lives in
//! [`crate::store::PersistedStore`].

#[cfg(feature = "storage-file")]
mod file;
mod memory;

#[cfg(feature = "storage-file")]
pub use file::FileStorage;
pub use memory::InMemoryStorage;

use crate::error::Result;

/// The independently persisted top-level entities.
///
/// Key names carry a schema version suffix so that an incompatible layout
/// change can move to a fresh key instead of misreading old data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Registered users.
    Users,
    /// Catalog products.
    Products,
    /// Cart of the active session.
    Cart,
    /// Order ledger.
    Orders,
    /// Identifier of the signed-in user.
    Session,
}

impl StorageKey {
    /// Every key, in the order they are flushed.
    pub const ALL: [Self; 5] = [
        Self::Users,
        Self::Products,
        Self::Cart,
        Self::Orders,
        Self::Session,
    ];

    /// Versioned key name.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Users => "freshmart_users_v3",
            Self::Products => "freshmart_products_v3",
            Self::Cart => "freshmart_cart_v3",
            Self::Orders => "freshmart_orders_v3",
            Self::Session => "freshmart_session_v3",
        }
    }
}

impl core::fmt::Display for StorageKey {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Blocking storage backend for persisting storefront data.
///
/// All methods take `&self`; implementations should use interior
/// mutability (e.g. `Mutex`) for thread-safe mutation.
pub trait Storage: core::fmt::Debug + Send + Sync {
    /// Returns the raw document stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to read.
    fn read(&self, key: StorageKey) -> Result<Option<String>>;

    /// Replaces the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to write.
    fn write(&self, key: StorageKey, contents: &str) -> Result<()>;

    /// Deletes the document stored under `key`. Deleting a missing key is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to write.
    fn remove(&self, key: StorageKey) -> Result<()>;

    /// Removes all stored data.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to write.
    fn clear(&self) -> Result<()>;
}
