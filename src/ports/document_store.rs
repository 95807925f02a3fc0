//! Document Store Port — Remote Persistence Interface
//!
//! Defines the trait for reading and writing semi-structured documents
//! in a remote store, keyed by collection and document ID. Document
//! bodies are plain `serde_json::Value` maps; the adapter owns the
//! translation to the provider's wire format.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PersistenceError;

/// A document fetched from the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
  /// Document ID within its collection.
  pub id: String,
  /// Document body as a JSON object.
  pub fields: Value,
  /// Server-side last update time, when the store reports one.
  pub update_time: Option<DateTime<Utc>>,
}

/// Kind of change observed on a polled collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
  /// Document appeared since the previous poll.
  Added,
  /// Document's update time (or body) changed.
  Modified,
  /// Document disappeared since the previous poll.
  Removed,
}

/// A single change event emitted by `stream_updates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChange {
  /// What happened.
  pub kind: ChangeKind,
  /// The document after the change (last known body for removals).
  pub document: Document,
}

/// Trait for remote document persistence providers.
///
/// All operations are keyed by `(collection, doc_id)`. Errors carry the
/// underlying cause as `PersistenceError::Operation`.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
  /// Fetch one document. `Ok(None)` when it doesn't exist.
  async fn read(
    &self,
    collection: &str,
    doc_id: &str,
  ) -> Result<Option<Document>, PersistenceError>;

  /// Create or overwrite one document.
  async fn write(
    &self,
    collection: &str,
    doc_id: &str,
    fields: &Value,
  ) -> Result<(), PersistenceError>;

  /// Delete one document. Deleting a missing document is not an error.
  async fn delete(
    &self,
    collection: &str,
    doc_id: &str,
  ) -> Result<(), PersistenceError>;

  /// List every document in a collection.
  async fn list(&self, collection: &str) -> Result<Vec<Document>, PersistenceError>;
}
