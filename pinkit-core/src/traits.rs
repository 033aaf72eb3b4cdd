//! Injection seams for the two storage backends.
//!
//! The manager takes both stores as trait objects so that embedders supply
//! the platform secure store and tests supply in-memory doubles.

use async_trait::async_trait;

use crate::{error::PinResult, record::PinRecord};

/// Device-local secure key-value store, encrypted at rest by the platform.
///
/// Authoritative for the device currently in use. Keys are plain strings;
/// values are short hex strings (digest and salt material).
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Reads the value stored under `key`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store is unavailable or the stored
    /// data cannot be opened.
    async fn get(&self, key: &str) -> PinResult<Option<String>>;

    /// Writes `value` under `key`, replacing any existing entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be persisted.
    async fn set(&self, key: &str, value: &str) -> PinResult<()>;

    /// Deletes the entry under `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete cannot be persisted.
    async fn delete(&self, key: &str) -> PinResult<()>;
}

/// Remote per-user document store holding the cross-device PIN record.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches the PIN record for `user_id`, if the user document exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or the document cannot
    /// be decoded.
    async fn fetch(&self, user_id: &str) -> PinResult<Option<PinRecord>>;

    /// Merge-writes `record` into the user document, creating it if absent.
    ///
    /// `None` credential fields transmit as explicit nulls so a tombstone
    /// clears them rather than leaving stale values behind. Fields outside
    /// the PIN record are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the write does not reach the store.
    async fn merge(&self, user_id: &str, record: &PinRecord) -> PinResult<()>;

    /// Replaces the whole user document with `record`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write does not reach the store.
    async fn overwrite(&self, user_id: &str, record: &PinRecord) -> PinResult<()>;
}
