//! Document store for the Firestore REST API.
//!
//! Firestore returns documents as typed values
//! (`{"fields": {"groups": {"mapValue": {"fields": {...}}}}}`); this module
//! decodes them to plain JSON before handing them to callers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use super::{DocumentStore, StoreError};
use crate::auth::Identity;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for Firestore REST endpoints
const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Collection holding one document per user, keyed by user id
const USERS_COLLECTION: &str = "users";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Firestore client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct FirestoreClient {
    client: Client,
    project_id: String,
}

impl FirestoreClient {
    pub fn new(project_id: impl Into<String>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            project_id: project_id.into(),
        })
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}/{}",
            FIRESTORE_BASE_URL, self.project_id, collection, id
        )
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn read_user_document(&self, identity: &Identity) -> Result<Option<Value>, StoreError> {
        let url = self.document_url(USERS_COLLECTION, identity.uid.as_str());
        debug!(uid = %identity.uid, "Reading user document");

        let response = self
            .client
            .get(&url)
            .bearer_auth(identity.id_token())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(uid = %identity.uid, "User document does not exist");
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::from_status(status, &body));
        }

        let document: FirestoreDocument = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("Failed to parse document: {}", e)))?;

        Ok(Some(decode_fields(&document.fields)))
    }
}

// ============================================================================
// Value Decoding
// ============================================================================

/// Decode a Firestore `fields` map into a plain JSON object
pub fn decode_fields(fields: &Map<String, Value>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), decode_value(value)))
            .collect(),
    )
}

/// Decode a single typed Firestore value.
///
/// Integers arrive as strings and are turned back into numbers; timestamps,
/// bytes and references stay strings. Unknown shapes decode to null.
pub fn decode_value(value: &Value) -> Value {
    let Some(object) = value.as_object() else {
        return Value::Null;
    };
    let Some((kind, inner)) = object.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => decode_integer(inner),
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "stringValue" | "timestampValue" | "bytesValue" | "referenceValue" => inner.clone(),
        "geoPointValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => inner
            .get("fields")
            .and_then(Value::as_object)
            .map(decode_fields)
            .unwrap_or_else(|| Value::Object(Map::new())),
        other => {
            warn!(kind = other, "Unknown Firestore value type");
            Value::Null
        }
    }
}

fn decode_integer(inner: &Value) -> Value {
    match inner {
        Value::String(s) => s
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .unwrap_or(Value::Null),
        Value::Number(n) => Value::Number(n.clone()),
        _ => Value::Null,
    }
}
