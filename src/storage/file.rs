//! JSON-file-based storage backend.
//!
//! Stores each [`StorageKey`] in a separate JSON file under a configurable
//! directory (default: `$XDG_DATA_HOME/freshmart/`).

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use super::{Storage, StorageKey};
use crate::error::{Result, StorefrontError};

/// Application name used for the XDG data directory.
const APP_NAME: &str = "freshmart";

/// Sentinel file used for cross-process file locking.
const LOCK_FILE: &str = "storage.lock";

/// File-backed storage that persists each entity as a JSON file.
///
/// # Concurrency
///
/// Thread safety within a single process is provided by an in-process
/// [`Mutex`]. Two processes sharing a directory are serialized by an
/// advisory lock on `storage.lock`: reads take a shared lock, writes an
/// exclusive one. There is no versioning, so the last writer wins.
///
/// # File layout
///
/// ```text
/// <dir>/
///   storage.lock                 (cross-process lock sentinel)
///   freshmart_users_v3.json
///   freshmart_products_v3.json
///   freshmart_cart_v3.json
///   freshmart_orders_v3.json
///   freshmart_session_v3.json
/// ```
#[derive(Debug)]
pub struct FileStorage {
    /// Root directory containing all JSON files.
    dir: PathBuf,
    /// Mutex serializing concurrent in-process access.
    lock: Mutex<()>,
    /// Sentinel file for cross-process advisory locking.
    lock_file: fs::File,
}

impl FileStorage {
    /// Creates a new file storage rooted at the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist, and opens
    /// (or creates) the `storage.lock` sentinel file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the lock
    /// file cannot be opened.
    #[inline]
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(storage_io_error)?;
        let lock_file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))
            .map_err(storage_io_error)?;
        tracing::debug!(dir = %dir.display(), "opened file storage");
        Ok(Self {
            dir,
            lock: Mutex::new(()),
            lock_file,
        })
    }

    /// Returns the default XDG-compliant data directory for this application.
    ///
    /// On Linux: `$XDG_DATA_HOME/freshmart/` (typically
    /// `~/.local/share/freshmart/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    #[inline]
    pub fn default_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|data_path| data_path.join(APP_NAME))
            .ok_or_else(|| {
                StorefrontError::Storage("could not determine platform data directory".into())
            })
    }

    /// Directory this storage writes into.
    #[inline]
    #[must_use]
    pub const fn dir(&self) -> &PathBuf {
        &self.dir
    }

    // ── Private helpers ─────────────────────────────────────────────

    /// Returns the full path of the file backing `key`.
    fn path(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.name()))
    }

    /// Acquires an in-process mutex guard and a shared (read) file lock,
    /// executes `op`, then releases the file lock.
    fn with_shared_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock_shared().map_err(storage_io_error)?;
        let result = op();
        // Only surface the unlock error when the operation succeeded;
        // otherwise the original error is more useful.
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Acquires an in-process mutex guard and an exclusive (write) file
    /// lock, executes `op`, then releases the file lock.
    fn with_exclusive_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock().map_err(storage_io_error)?;
        let result = op();
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Reads a document. Returns `None` if the file does not exist.
    fn read_document(&self, key: StorageKey) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(storage_io_error(err)),
        }
    }

    /// Atomically writes a document (write-to-tmp then rename).
    fn write_document(&self, key: StorageKey, contents: &str) -> Result<()> {
        let path = self.path(key);
        let tmp_path = self.dir.join(format!("{}.json.tmp", key.name()));
        fs::write(&tmp_path, contents).map_err(storage_io_error)?;
        fs::rename(&tmp_path, &path).map_err(storage_io_error)?;
        Ok(())
    }

    /// Deletes a document, ignoring a missing file.
    fn remove_document(&self, key: StorageKey) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_io_error(err)),
        }
    }
}

// ── Free-standing helpers ───────────────────────────────────────────────

/// Wraps an I/O error into a [`StorefrontError::Storage`].
fn storage_io_error(err: std::io::Error) -> StorefrontError {
    StorefrontError::Storage(Box::new(err))
}

/// Wraps a mutex poison error into a [`StorefrontError::Storage`].
fn lock_poison_error<T>(err: &std::sync::PoisonError<T>) -> StorefrontError {
    StorefrontError::Storage(err.to_string().into())
}

impl Storage for FileStorage {
    #[inline]
    fn read(&self, key: StorageKey) -> Result<Option<String>> {
        self.with_shared_lock(|| self.read_document(key))
    }

    #[inline]
    fn write(&self, key: StorageKey, contents: &str) -> Result<()> {
        self.with_exclusive_lock(|| self.write_document(key, contents))
    }

    #[inline]
    fn remove(&self, key: StorageKey) -> Result<()> {
        self.with_exclusive_lock(|| self.remove_document(key))
    }

    /// Deletes every entity file. The `storage.lock` sentinel is kept.
    #[inline]
    fn clear(&self) -> Result<()> {
        self.with_exclusive_lock(|| {
            for key in StorageKey::ALL {
                self.remove_document(key)?;
            }
            Ok(())
        })
    }
}
