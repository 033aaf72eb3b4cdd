//! Device-local secure storage.

mod keystore;
pub use keystore::DeviceKeystore;

mod sealed;
pub use sealed::SealedStore;
