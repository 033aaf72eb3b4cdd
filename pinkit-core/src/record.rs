//! Remote PIN record model.

use serde::{Deserialize, Serialize};

/// Per-user PIN document persisted in the remote store.
///
/// Protected records carry both credential fields; tombstoned records have
/// them nulled. Records are never hard-deleted remotely, only tombstoned, so
/// a document may exist with `protected: false` and no credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinRecord {
    /// Whether the account currently has a PIN set.
    pub protected: bool,
    /// Lowercase hex SHA-256 digest of `pin || salt`. Never the plaintext PIN.
    pub hashed_pin: Option<String>,
    /// Lowercase hex salt mixed into the digest.
    pub pin_salt: Option<String>,
    /// Unix timestamp (seconds) of the last mutation.
    pub updated_at: u64,
}

impl PinRecord {
    /// Builds a protected record from a freshly computed digest and salt.
    #[must_use]
    pub const fn active(hashed_pin: String, pin_salt: String, now: u64) -> Self {
        Self {
            protected: true,
            hashed_pin: Some(hashed_pin),
            pin_salt: Some(pin_salt),
            updated_at: now,
        }
    }

    /// Builds a tombstoned record with the credential fields nulled.
    #[must_use]
    pub const fn tombstone(now: u64) -> Self {
        Self {
            protected: false,
            hashed_pin: None,
            pin_salt: None,
            updated_at: now,
        }
    }

    /// Whether the record claims protection and carries both credential
    /// fields non-empty.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.protected
            && self.hashed_pin.as_deref().is_some_and(|d| !d.is_empty())
            && self.pin_salt.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_record_is_usable() {
        let record = PinRecord::active("digest".to_string(), "salt".to_string(), 123);
        assert!(record.is_usable());
        assert_eq!(record.updated_at, 123);
    }

    #[test]
    fn test_tombstone_is_not_usable() {
        let record = PinRecord::tombstone(456);
        assert!(!record.is_usable());
        assert!(record.hashed_pin.is_none());
        assert!(record.pin_salt.is_none());
    }

    #[test]
    fn test_protected_record_with_empty_credentials_is_not_usable() {
        let record = PinRecord {
            protected: true,
            hashed_pin: Some(String::new()),
            pin_salt: Some("salt".to_string()),
            updated_at: 0,
        };
        assert!(!record.is_usable());
    }

    #[test]
    fn test_serializes_with_camel_case_field_names() {
        let record = PinRecord::active("d".to_string(), "s".to_string(), 1);
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["hashedPin"], "d");
        assert_eq!(json["pinSalt"], "s");
        assert_eq!(json["protected"], true);
        assert_eq!(json["updatedAt"], 1);
    }
}
