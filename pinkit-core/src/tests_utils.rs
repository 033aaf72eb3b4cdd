//! In-memory doubles for the storage seams, shared across unit tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    Key, XChaCha20Poly1305, XNonce,
};
use rand::{rngs::OsRng, RngCore};

use crate::{
    error::{PinError, PinResult},
    record::PinRecord,
    secure::DeviceKeystore,
    traits::{RemoteStore, SecureStore},
};

pub(crate) struct InMemorySecureStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemorySecureStore {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().expect("lock").get(key).cloned()
    }

    pub(crate) fn clear(&self) {
        self.entries.lock().expect("lock").clear();
    }
}

impl Default for InMemorySecureStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecureStore for InMemorySecureStore {
    async fn get(&self, key: &str) -> PinResult<Option<String>> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| PinError::SecureStore("mutex poisoned".to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PinResult<()> {
        self.entries
            .lock()
            .map_err(|_| PinError::SecureStore("mutex poisoned".to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> PinResult<()> {
        self.entries
            .lock()
            .map_err(|_| PinError::SecureStore("mutex poisoned".to_string()))?
            .remove(key);
        Ok(())
    }
}

pub(crate) struct InMemoryRemote {
    records: Mutex<HashMap<String, PinRecord>>,
    fail_writes: AtomicBool,
}

impl InMemoryRemote {
    pub(crate) fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub(crate) fn record(&self, user_id: &str) -> Option<PinRecord> {
        self.records.lock().expect("lock").get(user_id).cloned()
    }

    pub(crate) fn insert(&self, user_id: &str, record: PinRecord) {
        self.records
            .lock()
            .expect("lock")
            .insert(user_id.to_string(), record);
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn write_error(&self) -> Option<PinError> {
        self.fail_writes
            .load(Ordering::SeqCst)
            .then(|| PinError::RemoteStore {
                url: "mem://remote".to_string(),
                status: Some(503),
                error: "injected write failure".to_string(),
            })
    }
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    async fn fetch(&self, user_id: &str) -> PinResult<Option<PinRecord>> {
        Ok(self.record(user_id))
    }

    async fn merge(&self, user_id: &str, record: &PinRecord) -> PinResult<()> {
        // The manager always writes the full field set, so merge and
        // overwrite coincide for the double.
        if let Some(err) = self.write_error() {
            return Err(err);
        }
        self.insert(user_id, record.clone());
        Ok(())
    }

    async fn overwrite(&self, user_id: &str, record: &PinRecord) -> PinResult<()> {
        self.merge(user_id, record).await
    }
}

pub(crate) struct InMemoryKeystore {
    key: [u8; 32],
}

impl InMemoryKeystore {
    pub(crate) fn new() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }
}

impl Default for InMemoryKeystore {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceKeystore for InMemoryKeystore {
    fn seal(&self, associated_data: &[u8], plaintext: &[u8]) -> PinResult<Vec<u8>> {
        let cipher = XChaCha20Poly1305::new(Key::from_slice(&self.key));
        let mut nonce_bytes = [0u8; 24];
        OsRng.fill_bytes(&mut nonce_bytes);
        let ciphertext = cipher
            .encrypt(
                XNonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext,
                    aad: associated_data,
                },
            )
            .map_err(|err| PinError::Crypto(err.to_string()))?;
        let mut out = Vec::with_capacity(nonce_bytes.len() + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn open(&self, associated_data: &[u8], ciphertext: &[u8]) -> PinResult<Vec<u8>> {
        if ciphertext.len() < 24 {
            return Err(PinError::InvalidEnvelope(
                "keystore ciphertext too short".to_string(),
            ));
        }
        let (nonce_bytes, payload) = ciphertext.split_at(24);
        let cipher = XChaCha20Poly1305::new(Key::from_slice(&self.key));
        cipher
            .decrypt(
                XNonce::from_slice(nonce_bytes),
                Payload {
                    msg: payload,
                    aad: associated_data,
                },
            )
            .map_err(|err| PinError::Crypto(err.to_string()))
    }
}
