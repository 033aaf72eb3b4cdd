//! Remote document store backends.

mod firestore;
pub use firestore::FirestoreRemote;
