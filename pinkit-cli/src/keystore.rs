//! Software keystore backed by a key file in the data directory.
//!
//! Desktop stand-in for the hardware keystore a device embedder would
//! provide: XChaCha20-Poly1305 under a locally persisted 32-byte key.

use std::{fs, io::ErrorKind, path::Path};

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    Key, XChaCha20Poly1305, XNonce,
};
use eyre::{eyre, Result, WrapErr};
use pinkit_core::{secure::DeviceKeystore, PinError, PinResult};
use rand::{rngs::OsRng, RngCore};

pub struct SoftwareKeystore {
    key: [u8; 32],
}

impl SoftwareKeystore {
    /// Loads the key file at `path`, generating one on first use.
    pub fn open(path: &Path) -> Result<Self> {
        let key = match fs::read(path) {
            Ok(bytes) => bytes
                .try_into()
                .map_err(|_| eyre!("key file {} is malformed", path.display()))?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let mut key = [0u8; 32];
                OsRng.fill_bytes(&mut key);
                fs::write(path, key)
                    .wrap_err_with(|| format!("failed to write {}", path.display()))?;
                restrict_permissions(path)?;
                key
            }
            Err(err) => {
                return Err(err)
                    .wrap_err_with(|| format!("failed to read {}", path.display()))
            }
        };
        Ok(Self { key })
    }
}

impl DeviceKeystore for SoftwareKeystore {
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

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .wrap_err_with(|| format!("failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_round_trip_across_reloads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("keystore.key");

        let keystore = SoftwareKeystore::open(&path).expect("open");
        let sealed = keystore.seal(b"ad", b"secret").expect("seal");

        let reloaded = SoftwareKeystore::open(&path).expect("reopen");
        assert_eq!(reloaded.open(b"ad", &sealed).expect("open sealed"), b"secret");
    }

    #[test]
    fn test_associated_data_mismatch_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let keystore = SoftwareKeystore::open(&dir.path().join("keystore.key")).expect("open");
        let sealed = keystore.seal(b"ad", b"secret").expect("seal");
        assert!(keystore.open(b"other", &sealed).is_err());
    }
}
