//! Firestore REST Client — Document Store Adapter
//!
//! Talks to the Firestore REST v1 API (`GET`/`PATCH`/`DELETE` on
//! `projects/{pid}/databases/{db}/documents/...`) with retries and
//! exponential backoff on transient failures. Translates between plain
//! `serde_json::Value` documents and Firestore's typed value JSON.

use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::credentials::Credentials;
use crate::error::PersistenceError;
use crate::ports::document_store::{Document, DocumentStore};

/// Default Firestore REST endpoint.
const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Configuration for the Firestore HTTP client.
#[derive(Debug, Clone)]
pub struct FirestoreClientConfig {
  /// Per-request timeout.
  pub timeout: Duration,
  /// Maximum retries on transient errors (429, 5xx, transport).
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
}

impl Default for FirestoreClientConfig {
  fn default() -> Self {
    Self {
      timeout: Duration::from_secs(30),
      max_retries: 3,
      retry_base_delay: Duration::from_millis(200),
    }
  }
}

/// HTTP client for the Firestore REST v1 API.
pub struct FirestoreClient {
  /// Underlying HTTP client.
  http: Client,
  /// API root, e.g. `https://firestore.googleapis.com/v1`.
  base_url: String,
  /// `projects/{pid}/databases/{db}/documents` path segment.
  documents_root: String,
  /// API key appended to every request.
  api_key: String,
  /// Client configuration.
  config: FirestoreClientConfig,
}

impl FirestoreClient {
  /// Create a new Firestore client from loaded credentials.
  ///
  /// Construction builds the HTTP client only; no network call is made
  /// until the first operation.
  pub fn new(
    creds: &Credentials,
    config: FirestoreClientConfig,
  ) -> Result<Self, PersistenceError> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(5)
      .build()
      .map_err(|e| PersistenceError::init(format!("failed to build HTTP client: {e}")))?;

    let base_url = creds
      .base_url
      .clone()
      .unwrap_or_else(|| FIRESTORE_BASE_URL.to_string());

    Ok(Self {
      http,
      base_url: base_url.trim_end_matches('/').to_string(),
      documents_root: format!(
        "projects/{}/databases/{}/documents",
        creds.project_id, creds.database_id
      ),
      api_key: creds.api_key.clone(),
      config,
    })
  }

  fn doc_url(&self, collection: &str, doc_id: &str) -> String {
    format!(
      "{}/{}/{}/{}?key={}",
      self.base_url, self.documents_root, collection, doc_id, self.api_key
    )
  }

  fn collection_url(&self, collection: &str, page_token: Option<&str>) -> String {
    let mut url = format!(
      "{}/{}/{}?key={}&pageSize=300",
      self.base_url, self.documents_root, collection, self.api_key
    );
    if let Some(token) = page_token {
      url.push_str("&pageToken=");
      url.push_str(token);
    }
    url
  }

  /// Send a request, retrying transient failures with backoff.
  ///
  /// Returns the response for 2xx and 404 (callers decide what a missing
  /// document means); retries 429 and 5xx; any other status is an error.
  async fn send_with_retry(
    &self,
    op: &'static str,
    request: RequestBuilder,
  ) -> Result<Response, PersistenceError> {
    let mut last_error = None;

    for attempt in 0..=self.config.max_retries {
      if attempt > 0 {
        let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
        debug!(op, attempt, delay_ms = delay.as_millis(), "Retrying request");
        sleep(delay).await;
      }

      let req = request
        .try_clone()
        .ok_or_else(|| PersistenceError::operation(op, anyhow!("request not cloneable")))?;

      match req.send().await {
        Ok(response) => match response.status() {
          status if status.is_success() => return Ok(response),
          StatusCode::NOT_FOUND => return Ok(response),
          StatusCode::TOO_MANY_REQUESTS => {
            warn!(op, "Rate limited by Firestore, backing off");
            last_error = Some(anyhow!("rate limited"));
          }
          status if status.is_server_error() => {
            warn!(op, status = %status, "Server error, retrying");
            last_error = Some(anyhow!("server error: {status}"));
          }
          status => {
            let body = response.text().await.unwrap_or_default();
            return Err(PersistenceError::operation(
              op,
              anyhow!("API error {status}: {body}"),
            ));
          }
        },
        Err(e) => {
          warn!(op, error = %e, attempt, "Request failed");
          last_error = Some(e.into());
        }
      }
    }

    Err(PersistenceError::operation(
      op,
      last_error.unwrap_or_else(|| anyhow!("max retries exceeded")),
    ))
  }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
  async fn read(
    &self,
    collection: &str,
    doc_id: &str,
  ) -> Result<Option<Document>, PersistenceError> {
    let url = self.doc_url(collection, doc_id);
    let response = self.send_with_retry("read", self.http.get(&url)).await?;

    if response.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }

    let wire: WireDocument = response
      .json()
      .await
      .map_err(|e| PersistenceError::operation("read", e))?;
    Ok(Some(wire.into_document()))
  }

  async fn write(
    &self,
    collection: &str,
    doc_id: &str,
    fields: &Value,
  ) -> Result<(), PersistenceError> {
    let url = self.doc_url(collection, doc_id);
    let body = json!({ "fields": encode_fields(fields)? });
    let request = self.http.patch(&url).json(&body);

    let response = self.send_with_retry("write", request).await?;
    if response.status() == StatusCode::NOT_FOUND {
      let body = response.text().await.unwrap_or_default();
      return Err(PersistenceError::operation(
        "write",
        anyhow!("target not found: {body}"),
      ));
    }
    Ok(())
  }

  async fn delete(
    &self,
    collection: &str,
    doc_id: &str,
  ) -> Result<(), PersistenceError> {
    let url = self.doc_url(collection, doc_id);
    // Firestore returns 200 for deletes of missing documents; 404 here
    // would only come from a bad path, which we also treat as done.
    self.send_with_retry("delete", self.http.delete(&url)).await?;
    Ok(())
  }

  async fn list(&self, collection: &str) -> Result<Vec<Document>, PersistenceError> {
    let mut documents = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
      let url = self.collection_url(collection, page_token.as_deref());
      let response = self.send_with_retry("list", self.http.get(&url)).await?;

      if response.status() == StatusCode::NOT_FOUND {
        // Empty collections don't exist as resources.
        return Ok(documents);
      }

      let page: ListResponse = response
        .json()
        .await
        .map_err(|e| PersistenceError::operation("list", e))?;

      documents.extend(page.documents.into_iter().map(WireDocument::into_document));

      match page.next_page_token {
        Some(token) if !token.is_empty() => page_token = Some(token),
        _ => return Ok(documents),
      }
    }
  }
}

// ---- Wire types ----

/// Firestore document as it appears on the wire.
#[derive(Debug, Deserialize)]
struct WireDocument {
  /// Full resource name; the document ID is the last path segment.
  name: String,
  #[serde(default)]
  fields: Map<String, Value>,
  #[serde(rename = "updateTime")]
  update_time: Option<DateTime<Utc>>,
}

impl WireDocument {
  fn into_document(self) -> Document {
    let id = self
      .name
      .rsplit('/')
      .next()
      .unwrap_or(&self.name)
      .to_string();
    Document {
      id,
      fields: decode_fields(&self.fields),
      update_time: self.update_time,
    }
  }
}

/// Response body for collection listing.
#[derive(Debug, Deserialize)]
struct ListResponse {
  #[serde(default)]
  documents: Vec<WireDocument>,
  #[serde(rename = "nextPageToken")]
  next_page_token: Option<String>,
}

// ---- Value codec ----

/// Encode a JSON object into Firestore's typed `fields` map.
///
/// Document bodies must be objects; scalars at the top level are a
/// caller error surfaced as an operation failure.
fn encode_fields(value: &Value) -> Result<Map<String, Value>, PersistenceError> {
  match value {
    Value::Object(map) => Ok(
      map
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect(),
    ),
    other => Err(PersistenceError::operation(
      "write",
      anyhow!("document body must be a JSON object, got {other}"),
    )),
  }
}

/// Encode one JSON value into Firestore's typed value representation.
fn encode_value(value: &Value) -> Value {
  match value {
    Value::Null => json!({ "nullValue": null }),
    Value::Bool(b) => json!({ "booleanValue": b }),
    Value::Number(n) => {
      if let Some(i) = n.as_i64() {
        // Firestore transports integers as strings
        json!({ "integerValue": i.to_string() })
      } else {
        json!({ "doubleValue": n.as_f64() })
      }
    }
    Value::String(s) => json!({ "stringValue": s }),
    Value::Array(items) => json!({
      "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
    }),
    Value::Object(map) => json!({
      "mapValue": {
        "fields": map
          .iter()
          .map(|(k, v)| (k.clone(), encode_value(v)))
          .collect::<Map<String, Value>>()
      }
    }),
  }
}

/// Decode Firestore's typed `fields` map back into a JSON object.
fn decode_fields(fields: &Map<String, Value>) -> Value {
  Value::Object(
    fields
      .iter()
      .map(|(k, v)| (k.clone(), decode_value(v)))
      .collect(),
  )
}

/// Decode one Firestore typed value into plain JSON.
fn decode_value(value: &Value) -> Value {
  let Some(map) = value.as_object() else {
    return Value::Null;
  };

  if let Some((kind, inner)) = map.iter().next() {
    match kind.as_str() {
      "nullValue" => Value::Null,
      "booleanValue" => inner.clone(),
      "integerValue" => inner
        .as_str()
        .and_then(|s| s.parse::<i64>().ok())
        .map_or_else(|| inner.clone(), Value::from),
      "doubleValue" => inner.clone(),
      "stringValue" | "timestampValue" | "referenceValue" => inner.clone(),
      "arrayValue" => Value::Array(
        inner
          .get("values")
          .and_then(Value::as_array)
          .map(|items| items.iter().map(decode_value).collect())
          .unwrap_or_default(),
      ),
      "mapValue" => inner
        .get("fields")
        .and_then(Value::as_object)
        .map_or_else(|| json!({}), decode_fields),
      _ => Value::Null,
    }
  } else {
    Value::Null
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_codec_preserves_representative_document() {
    let doc = json!({
      "symbol": "BTC/USDT",
      "position": 0.25,
      "episodes": 1000,
      "open": true,
      "note": null,
      "legs": ["spot", "perp"],
      "limits": { "stop_loss": 0.02 }
    });

    let encoded = encode_fields(&doc).unwrap();
    assert_eq!(encoded["episodes"], json!({ "integerValue": "1000" }));
    assert_eq!(encoded["position"], json!({ "doubleValue": 0.25 }));

    let decoded = decode_fields(&encoded);
    assert_eq!(decoded, doc);
  }

  #[test]
  fn test_non_object_body_rejected() {
    let result = encode_fields(&json!(42));
    assert!(matches!(result, Err(PersistenceError::Operation { .. })));
  }

  #[test]
  fn test_document_id_from_resource_name() {
    let wire = WireDocument {
      name: "projects/p/databases/(default)/documents/trades/t-9".to_string(),
      fields: Map::new(),
      update_time: None,
    };
    assert_eq!(wire.into_document().id, "t-9");
  }
}
