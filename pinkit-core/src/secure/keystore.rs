//! Device keystore seam for the sealed store.

use crate::error::PinResult;

/// The platform's encrypt-at-rest primitive.
///
/// Implementations wrap the hardware-backed keystore on device; the CLI and
/// tests substitute software keystores.
pub trait DeviceKeystore: Send + Sync {
    /// Seals `plaintext` under the device-bound key, authenticating
    /// `associated_data`.
    ///
    /// The associated data is not encrypted, but any mismatch when opening
    /// must fail.
    ///
    /// # Errors
    ///
    /// Returns an error if the keystore refuses the operation or the seal
    /// fails.
    fn seal(&self, associated_data: &[u8], plaintext: &[u8]) -> PinResult<Vec<u8>>;

    /// Opens `ciphertext` under the device-bound key, verifying
    /// `associated_data`.
    ///
    /// The same associated data used during sealing must be supplied or the
    /// open must fail.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails or the keystore cannot open.
    fn open(&self, associated_data: &[u8], ciphertext: &[u8]) -> PinResult<Vec<u8>>;
}
