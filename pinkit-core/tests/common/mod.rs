//! Shared test support for integration tests.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    Key, XChaCha20Poly1305, XNonce,
};
use pinkit_core::{secure::DeviceKeystore, PinError, PinResult};
use rand::{rngs::OsRng, RngCore};

/// Software stand-in for the device keystore: XChaCha20-Poly1305 under an
/// ephemeral in-memory key, nonce prepended to the ciphertext.
pub struct EphemeralKeystore {
    key: [u8; 32],
}

impl EphemeralKeystore {
    pub fn new() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }
}

impl Default for EphemeralKeystore {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceKeystore for EphemeralKeystore {
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
