//! File-backed sealed key-value store.
//!
//! A small string map serialized with `ciborium` inside a versioned
//! envelope, sealed by the [`DeviceKeystore`], and persisted to a single
//! file via write-to-temp-then-rename. The whole map is resealed on every
//! mutation; it only ever holds a handful of short entries.

use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use zeroize::Zeroizing;

use crate::{
    error::{PinError, PinResult},
    traits::SecureStore,
};

use super::keystore::DeviceKeystore;

const ENVELOPE_VERSION: u32 = 1;
const SEALED_STORE_AD: &[u8] = b"pinkit:sealed-store:v1";

#[derive(Serialize, Deserialize)]
struct SealedEnvelope {
    version: u32,
    sealed_entries: Vec<u8>,
    updated_at: u64,
}

/// A [`SecureStore`] sealed by the device keystore and persisted to a file.
pub struct SealedStore {
    keystore: Arc<dyn DeviceKeystore>,
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl SealedStore {
    /// Opens the store at `path`, creating an empty one if the file does not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, carries an unsupported
    /// envelope version, or cannot be opened by the keystore.
    pub fn open(keystore: Arc<dyn DeviceKeystore>, path: impl Into<PathBuf>) -> PinResult<Self> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => decode_entries(keystore.as_ref(), &bytes)?,
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(PinError::SecureStore(format!(
                    "failed to read {}: {err}",
                    path.display()
                )))
            }
        };
        Ok(Self {
            keystore,
            path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> PinResult<()> {
        let mut plaintext = Zeroizing::new(Vec::new());
        ciborium::ser::into_writer(entries, &mut *plaintext)
            .map_err(|err| PinError::Serialization(err.to_string()))?;
        let sealed_entries = self.keystore.seal(SEALED_STORE_AD, &plaintext)?;

        let envelope = SealedEnvelope {
            version: ENVELOPE_VERSION,
            sealed_entries,
            updated_at: unix_now(),
        };
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&envelope, &mut bytes)
            .map_err(|err| PinError::Serialization(err.to_string()))?;

        write_atomic(&self.path, &bytes)
    }
}

#[async_trait::async_trait]
impl SecureStore for SealedStore {
    async fn get(&self, key: &str) -> PinResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PinResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    async fn delete(&self, key: &str) -> PinResult<()> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

fn decode_entries(
    keystore: &dyn DeviceKeystore,
    bytes: &[u8],
) -> PinResult<BTreeMap<String, String>> {
    let envelope: SealedEnvelope = ciborium::de::from_reader(bytes)
        .map_err(|err| PinError::Serialization(err.to_string()))?;
    if envelope.version != ENVELOPE_VERSION {
        return Err(PinError::UnsupportedEnvelopeVersion(envelope.version));
    }
    let plaintext = Zeroizing::new(keystore.open(SEALED_STORE_AD, &envelope.sealed_entries)?);
    ciborium::de::from_reader(plaintext.as_slice())
        .map_err(|err| PinError::Serialization(err.to_string()))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> PinResult<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes).map_err(|err| {
        PinError::SecureStore(format!("failed to write {}: {err}", tmp.display()))
    })?;
    std::fs::rename(&tmp, path).map_err(|err| {
        PinError::SecureStore(format!("failed to replace {}: {err}", path.display()))
    })
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
