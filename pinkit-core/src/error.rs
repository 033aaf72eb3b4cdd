//! Error types for PIN credential operations.

use thiserror::Error;

/// Result type for PIN credential operations.
pub type PinResult<T> = Result<T, PinError>;

/// Errors raised by PIN credential storage and verification.
///
/// None of these cross the public manager boundary: [`crate::PinCredentialManager`]
/// collapses every variant into a boolean result and logs the detail instead.
#[derive(Debug, Error)]
pub enum PinError {
    /// Errors coming from the device secure store.
    #[error("secure store error: {0}")]
    SecureStore(String),

    /// Errors coming from the remote document store.
    #[error("remote store error for {url} (status: {status:?}): {error}")]
    RemoteStore {
        /// URL of the failed request.
        url: String,
        /// HTTP status code, when a response was received.
        status: Option<u16>,
        /// Description of the failure.
        error: String,
    },

    /// Serialization/deserialization failures.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Cryptographic failures (keystore seal/open).
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Invalid or malformed sealed-store envelope.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// Unsupported sealed-store envelope version.
    #[error("unsupported envelope version: {0}")]
    UnsupportedEnvelopeVersion(u32),

    /// No usable PIN record exists for the account.
    #[error("pin not configured")]
    NotConfigured,

    /// The candidate PIN digest does not match the stored digest.
    #[error("pin mismatch")]
    Mismatch,
}
