//! Wallet-unlock PIN credential management.
//!
//! The crate revolves around [`PinCredentialManager`], which keeps a user's
//! wallet-unlock PIN in two places: a device-local [`SecureStore`] (encrypted
//! at rest by the platform) and a remote [`RemoteStore`] document used as a
//! cross-device backup. The local store is authoritative for the device in
//! use; the remote record is consulted only when local state is absent.
//!
//! All manager operations return plain booleans. Storage failures, missing
//! configuration, and digest mismatches are deliberately indistinguishable at
//! the public boundary; the internal error taxonomy is surfaced only through
//! `tracing` logs.
//!
//! # Security
//!
//! Stored records use a single-round salted SHA-256 digest. That format is
//! shared with records written by other devices, but it offers no meaningful
//! brute-force resistance for a short numeric PIN. Treat it as a wallet-unlock
//! gate on top of an already-authenticated account, never as the account's
//! primary secret.
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod digest;

mod error;
pub use error::{PinError, PinResult};

mod record;
pub use record::PinRecord;

mod traits;
pub use traits::{RemoteStore, SecureStore};

mod manager;
pub use manager::{PinCredentialManager, WALLET_PIN_KEY, WALLET_PIN_SALT_KEY};

pub mod remote;
pub mod secure;

// private modules
mod http_request;

#[cfg(test)]
pub(crate) mod tests_utils;
