//! The PIN credential manager: set, verify, remove, and query protection.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use secrecy::{ExposeSecret, SecretString};

use crate::digest::{digests_match, generate_salt, pin_digest};
use crate::error::{PinError, PinResult};
use crate::record::PinRecord;
use crate::traits::{RemoteStore, SecureStore};

/// Secure-store key holding the hex PIN digest.
pub const WALLET_PIN_KEY: &str = "wallet_pin";
/// Secure-store key holding the hex salt.
pub const WALLET_PIN_SALT_KEY: &str = "wallet_pin_salt";

/// Manages a user's wallet-unlock PIN across the device secure store and the
/// remote document store.
///
/// Every operation returns a plain boolean. "Storage unavailable", "no PIN
/// configured", and "wrong PIN" are indistinguishable to callers; the
/// distinction exists internally as [`PinError`] and is logged, never
/// returned. Concurrent operations on the same user are not mutually
/// excluded; the last writer to each backend wins independently.
pub struct PinCredentialManager {
    secure: Arc<dyn SecureStore>,
    remote: Arc<dyn RemoteStore>,
}

impl PinCredentialManager {
    /// Creates a manager over the injected storage backends.
    #[must_use]
    pub fn new(secure: Arc<dyn SecureStore>, remote: Arc<dyn RemoteStore>) -> Self {
        Self { secure, remote }
    }

    /// Sets (or rotates) the wallet PIN for `user_id`.
    ///
    /// Generates a fresh salt, writes digest and salt to the secure store,
    /// then merges the protected record into the remote document. Returns
    /// `false` if either leg fails; a failed remote leg rolls back the local
    /// entries (best effort) so the device does not claim protection the
    /// backend never recorded.
    pub async fn set_pin(&self, user_id: &str, pin: &SecretString) -> bool {
        match self.try_set_pin(user_id, pin).await {
            Ok(()) => {
                tracing::debug!(user_id, "wallet pin set");
                true
            }
            Err(err) => {
                tracing::warn!(user_id, "set_pin failed: {err}");
                false
            }
        }
    }

    /// Checks `candidate` against the stored PIN for `user_id`.
    ///
    /// Resolves credentials from the secure store first; when absent, falls
    /// back to the remote record and backfills the secure store. Returns
    /// `false` on mismatch, missing configuration, or any storage failure.
    pub async fn verify_pin(&self, user_id: &str, candidate: &SecretString) -> bool {
        match self.try_verify_pin(user_id, candidate).await {
            Ok(()) => true,
            Err(PinError::Mismatch) => {
                tracing::debug!(user_id, "verify_pin: digest mismatch");
                false
            }
            Err(err) => {
                tracing::debug!(user_id, "verify_pin unavailable: {err}");
                false
            }
        }
    }

    /// Removes the wallet PIN for `user_id`.
    ///
    /// Clears the local entries and tombstones the remote record (fields
    /// nulled, `protected: false`). Returns `false` if either leg fails.
    pub async fn remove_pin(&self, user_id: &str) -> bool {
        match self.try_remove_pin(user_id).await {
            Ok(()) => {
                tracing::debug!(user_id, "wallet pin removed");
                true
            }
            Err(err) => {
                tracing::warn!(user_id, "remove_pin failed: {err}");
                false
            }
        }
    }

    /// Whether `user_id` currently has a PIN set.
    ///
    /// Local credential presence alone is sufficient to report `true`; the
    /// remote `protected` flag is consulted only when local state is absent.
    /// Disagreement between the two sources is not reconciled. Returns
    /// `false` on any lookup failure.
    pub async fn is_pin_protected(&self, user_id: &str) -> bool {
        match self.try_is_pin_protected(user_id).await {
            Ok(protected) => protected,
            Err(err) => {
                tracing::debug!(user_id, "is_pin_protected unavailable: {err}");
                false
            }
        }
    }

    async fn try_set_pin(&self, user_id: &str, pin: &SecretString) -> PinResult<()> {
        let salt = generate_salt();
        let digest = pin_digest(pin.expose_secret(), &salt);

        self.secure.set(WALLET_PIN_KEY, &digest).await?;
        self.secure.set(WALLET_PIN_SALT_KEY, &salt).await?;

        let record = PinRecord::active(digest, salt, unix_now());
        if let Err(err) = self.remote.merge(user_id, &record).await {
            // The local claim must not outlive a failed remote write.
            if let Err(cleanup_err) = self.clear_local().await {
                tracing::warn!(
                    user_id,
                    "local rollback after failed remote write also failed: {cleanup_err}"
                );
            }
            return Err(err);
        }
        Ok(())
    }

    async fn try_verify_pin(&self, user_id: &str, candidate: &SecretString) -> PinResult<()> {
        let (digest, salt) = match self.local_credentials().await? {
            Some(credentials) => credentials,
            None => self.restore_from_remote(user_id).await?,
        };

        let candidate_digest = pin_digest(candidate.expose_secret(), &salt);
        if digests_match(&candidate_digest, &digest) {
            Ok(())
        } else {
            Err(PinError::Mismatch)
        }
    }

    async fn try_remove_pin(&self, user_id: &str) -> PinResult<()> {
        self.clear_local().await?;
        self.remote
            .merge(user_id, &PinRecord::tombstone(unix_now()))
            .await
    }

    async fn try_is_pin_protected(&self, user_id: &str) -> PinResult<bool> {
        if self.local_credentials().await?.is_some() {
            return Ok(true);
        }
        Ok(self
            .remote
            .fetch(user_id)
            .await?
            .is_some_and(|record| record.protected))
    }

    /// Reads digest and salt from the secure store; both must be present and
    /// non-empty to count as configured.
    async fn local_credentials(&self) -> PinResult<Option<(String, String)>> {
        let digest = self.secure.get(WALLET_PIN_KEY).await?;
        let salt = self.secure.get(WALLET_PIN_SALT_KEY).await?;
        Ok(match (digest, salt) {
            (Some(digest), Some(salt)) if !digest.is_empty() && !salt.is_empty() => {
                Some((digest, salt))
            }
            _ => None,
        })
    }

    /// Fetches the remote record and backfills the secure store with it.
    ///
    /// The backfill is best effort: a failed local write is logged but must
    /// not fail the verification that triggered it.
    async fn restore_from_remote(&self, user_id: &str) -> PinResult<(String, String)> {
        let record = self
            .remote
            .fetch(user_id)
            .await?
            .ok_or(PinError::NotConfigured)?;
        if !record.is_usable() {
            return Err(PinError::NotConfigured);
        }
        let (Some(digest), Some(salt)) = (record.hashed_pin, record.pin_salt) else {
            return Err(PinError::NotConfigured);
        };

        if let Err(err) = self.secure.set(WALLET_PIN_KEY, &digest).await {
            tracing::warn!(user_id, "failed to backfill local pin digest: {err}");
        }
        if let Err(err) = self.secure.set(WALLET_PIN_SALT_KEY, &salt).await {
            tracing::warn!(user_id, "failed to backfill local pin salt: {err}");
        }
        tracing::debug!(user_id, "restored pin credentials from remote record");
        Ok((digest, salt))
    }

    async fn clear_local(&self) -> PinResult<()> {
        self.secure.delete(WALLET_PIN_KEY).await?;
        self.secure.delete(WALLET_PIN_SALT_KEY).await
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
