//! Firestore-style REST document backend.
//!
//! Talks to a document API shaped like the Firestore v1 REST surface: user
//! documents live at `{base_url}/users/{user_id}`, field values travel in
//! typed wrappers (`stringValue`, `booleanValue`, `integerValue`,
//! `nullValue`), and merge writes are PATCH requests with an
//! `updateMask.fieldPaths` query listing exactly the written fields.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::{
    error::{PinError, PinResult},
    http_request::Request,
    record::PinRecord,
    traits::RemoteStore,
};

/// Field paths written by every PIN mutation; merge writes mask to exactly
/// these so the rest of the user document is untouched.
const MERGE_MASK: &str = "updateMask.fieldPaths=protected\
    &updateMask.fieldPaths=hashedPin\
    &updateMask.fieldPaths=pinSalt\
    &updateMask.fieldPaths=updatedAt";

/// [`RemoteStore`] implementation over a Firestore-style REST document API.
pub struct FirestoreRemote {
    request: Request,
    base_url: String,
    bearer_token: Option<String>,
}

impl FirestoreRemote {
    /// Creates a client for the document API rooted at `base_url`
    /// (e.g. `https://firestore.googleapis.com/v1/projects/{p}/databases/(default)/documents`).
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not HTTPS. Use [`Self::insecure`]
    /// for local emulators.
    pub fn new(base_url: &str) -> PinResult<Self> {
        if !base_url.starts_with("https://") {
            return Err(PinError::RemoteStore {
                url: base_url.to_string(),
                status: None,
                error: "base url must be https".to_string(),
            });
        }
        Ok(Self::insecure(base_url))
    }

    /// Creates a client without the HTTPS requirement, for local emulators
    /// and tests only.
    #[must_use]
    pub fn insecure(base_url: &str) -> Self {
        Self {
            request: Request::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: None,
        }
    }

    /// Attaches a bearer token sent with every request.
    #[must_use]
    pub fn with_bearer_token(mut self, token: &str) -> Self {
        self.bearer_token = Some(token.to_string());
        self
    }

    fn document_url(&self, user_id: &str) -> String {
        format!("{}/users/{user_id}", self.base_url)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => builder.header("Authorization", format!("Bearer {token}")),
            None => builder,
        }
    }

    async fn write(&self, user_id: &str, record: &PinRecord, mask: Option<&str>) -> PinResult<()> {
        let url = mask.map_or_else(
            || self.document_url(user_id),
            |mask| format!("{}?{mask}", self.document_url(user_id)),
        );
        let body = json!({ "fields": encode_fields(record) });
        let builder = self.authorize(self.request.patch(&url).json(&body));
        let response = self.request.handle(builder).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(PinError::RemoteStore {
                url,
                status: Some(status.as_u16()),
                error: "document write rejected".to_string(),
            })
        }
    }
}

#[async_trait]
impl RemoteStore for FirestoreRemote {
    async fn fetch(&self, user_id: &str) -> PinResult<Option<PinRecord>> {
        let url = self.document_url(user_id);
        let builder = self.authorize(self.request.get(&url));
        let response = self.request.handle(builder).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(PinError::RemoteStore {
                url,
                status: Some(status.as_u16()),
                error: "document fetch rejected".to_string(),
            });
        }
        let document: Value = response
            .json()
            .await
            .map_err(|err| PinError::Serialization(format!("invalid document body: {err}")))?;
        // A document may exist with profile fields but no PIN fields yet;
        // that decodes as an unprotected record.
        Ok(Some(decode_fields(document.get("fields").unwrap_or(&Value::Null))))
    }

    async fn merge(&self, user_id: &str, record: &PinRecord) -> PinResult<()> {
        self.write(user_id, record, Some(MERGE_MASK)).await
    }

    async fn overwrite(&self, user_id: &str, record: &PinRecord) -> PinResult<()> {
        self.write(user_id, record, None).await
    }
}

fn encode_fields(record: &PinRecord) -> Value {
    json!({
        "protected": { "booleanValue": record.protected },
        "hashedPin": credential_value(record.hashed_pin.as_deref()),
        "pinSalt": credential_value(record.pin_salt.as_deref()),
        "updatedAt": { "integerValue": record.updated_at.to_string() },
    })
}

fn credential_value(value: Option<&str>) -> Value {
    value.map_or_else(
        || json!({ "nullValue": null }),
        |value| json!({ "stringValue": value }),
    )
}

fn decode_fields(fields: &Value) -> PinRecord {
    PinRecord {
        protected: fields
            .get("protected")
            .and_then(|value| value.get("booleanValue"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
        hashed_pin: string_field(fields, "hashedPin"),
        pin_salt: string_field(fields, "pinSalt"),
        updated_at: fields
            .get("updatedAt")
            .and_then(|value| value.get("integerValue"))
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0),
    }
}

fn string_field(fields: &Value, name: &str) -> Option<String> {
    fields
        .get(name)
        .and_then(|value| value.get("stringValue"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}
