//! Persistence Gateway — Guarded Lifecycle Around the Document Store
//!
//! One gateway exists per process. It is constructed (cheaply) at startup
//! and passed explicitly to whatever needs persistence; clones share the
//! same inner state, so every caller observes the same connection
//! lifecycle:
//!
//! ```text
//! Uninitialized ──connect()──▶ Disabled   (no project ID configured)
//!                           └▶ Connected  (credentials + client OK)
//!                           └▶ Failed     (credentials or client error)
//! ```
//!
//! The transition happens at most once; concurrent first-time callers
//! serialize on an exclusive lock and all see the same outcome. A failed
//! gateway never retries implicitly — recovery goes through
//! `reconnect()`, which resets to `Uninitialized` first.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{error, info, warn};

use super::credentials::Credentials;
use super::firestore::{FirestoreClient, FirestoreClientConfig};
use crate::config::PersistenceConfig;
use crate::error::PersistenceError;
use crate::ports::document_store::{
    ChangeKind, Document, DocumentChange, DocumentStore,
};

/// Externally observable gateway state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    /// `connect()` has not run yet.
    Uninitialized,
    /// No project ID configured; all operations are rejected no-ops.
    Disabled,
    /// Live client established.
    Connected,
    /// Initialization failed; stays failed until `reconnect()`.
    Failed,
}

impl GatewayStatus {
    /// Lowercase name for logs and error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Disabled => "disabled",
            Self::Connected => "connected",
            Self::Failed => "failed",
        }
    }
}

/// Internal state, holding the live store when connected.
enum GatewayState {
    Uninitialized,
    Disabled,
    Connected(Arc<dyn DocumentStore>),
    Failed(String),
}

impl GatewayState {
    const fn status(&self) -> GatewayStatus {
        match self {
            Self::Uninitialized => GatewayStatus::Uninitialized,
            Self::Disabled => GatewayStatus::Disabled,
            Self::Connected(_) => GatewayStatus::Connected,
            Self::Failed(_) => GatewayStatus::Failed,
        }
    }
}

struct Inner {
    config: PersistenceConfig,
    state: RwLock<GatewayState>,
}

/// Process-wide handle to the remote document store.
///
/// Cheap to clone; all clones are the same handle.
#[derive(Clone)]
pub struct PersistenceGateway {
    inner: Arc<Inner>,
}

impl PersistenceGateway {
    /// Create an unconnected gateway. No I/O happens here.
    pub fn new(config: PersistenceConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                state: RwLock::new(GatewayState::Uninitialized),
            }),
        }
    }

    /// One-time connection attempt using the configured credentials file.
    ///
    /// - Empty project ID → `Disabled`, returns `Ok`.
    /// - Credentials/client failure or init timeout → `Failed`, returns
    ///   `Err(PersistenceError::Init)`. Never panics or aborts.
    /// - Repeat calls return the recorded outcome without retrying.
    ///
    /// May block on first call (file I/O, client construction); bounded
    /// by the configured init timeout.
    pub async fn connect(&self) -> Result<GatewayStatus, PersistenceError> {
        let config = self.inner.config.clone();
        self.connect_with(move || async move {
            let creds = Credentials::load(&config.credentials_path).await?;
            if creds.project_id != config.project_id {
                return Err(PersistenceError::init(format!(
                    "credentials project_id '{}' does not match configured '{}'",
                    creds.project_id, config.project_id
                )));
            }
            let client = FirestoreClient::new(&creds, FirestoreClientConfig::default())?;
            Ok(Arc::new(client) as Arc<dyn DocumentStore>)
        })
        .await
    }

    /// One-time connection attempt through an injected initializer.
    ///
    /// This is the guarded transition itself; `connect()` supplies the
    /// Firestore initializer, tests supply mocks. The initializer runs
    /// at most once per reset, under the state lock and the init
    /// timeout.
    pub async fn connect_with<F, Fut>(
        &self,
        init: F,
    ) -> Result<GatewayStatus, PersistenceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<dyn DocumentStore>, PersistenceError>>,
    {
        let mut state = self.inner.state.write().await;

        // A transition already happened: report it, never re-attempt.
        match &*state {
            GatewayState::Connected(_) => return Ok(GatewayStatus::Connected),
            GatewayState::Disabled => return Ok(GatewayStatus::Disabled),
            GatewayState::Failed(reason) => {
                return Err(PersistenceError::Init {
                    reason: reason.clone(),
                });
            }
            GatewayState::Uninitialized => {}
        }

        if !self.inner.config.is_enabled() {
            warn!("Firebase project ID not configured - persistence disabled");
            *state = GatewayState::Disabled;
            return Ok(GatewayStatus::Disabled);
        }

        let init_timeout = self.inner.config.init_timeout();
        match timeout(init_timeout, init()).await {
            Ok(Ok(store)) => {
                info!(
                    project_id = %self.inner.config.project_id,
                    "Persistence gateway connected"
                );
                *state = GatewayState::Connected(store);
                Ok(GatewayStatus::Connected)
            }
            Ok(Err(e)) => {
                let reason = e.to_string();
                error!(error = %reason, "Persistence initialization failed");
                *state = GatewayState::Failed(reason.clone());
                Err(PersistenceError::Init { reason })
            }
            Err(_) => {
                let reason = format!(
                    "initialization timed out after {}s",
                    init_timeout.as_secs()
                );
                error!("Persistence initialization timed out");
                *state = GatewayState::Failed(reason.clone());
                Err(PersistenceError::Init { reason })
            }
        }
    }

    /// Drop any recorded outcome and return to `Uninitialized`.
    ///
    /// The only sanctioned way out of `Failed`. A live connection is
    /// dropped as well, so use this deliberately.
    pub async fn reset(&self) {
        let mut state = self.inner.state.write().await;
        *state = GatewayState::Uninitialized;
    }

    /// Reset to `Uninitialized` and attempt a fresh connection.
    pub async fn reconnect(&self) -> Result<GatewayStatus, PersistenceError> {
        self.reset().await;
        self.connect().await
    }

    /// Current lifecycle state.
    pub async fn status(&self) -> GatewayStatus {
        self.inner.state.read().await.status()
    }

    /// Grab the live store, or the state-appropriate error.
    async fn store(&self) -> Result<Arc<dyn DocumentStore>, PersistenceError> {
        let state = self.inner.state.read().await;
        match &*state {
            GatewayState::Connected(store) => Ok(Arc::clone(store)),
            GatewayState::Disabled => {
                warn!("Persistence operation attempted while disabled");
                Err(PersistenceError::Disabled)
            }
            GatewayState::Uninitialized | GatewayState::Failed(_) => {
                Err(PersistenceError::NotConnected {
                    state: state.status().as_str(),
                })
            }
        }
    }

    /// Fetch one document. `Ok(None)` when it doesn't exist.
    pub async fn read_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> Result<Option<Document>, PersistenceError> {
        self.store().await?.read(collection, doc_id).await
    }

    /// Create or overwrite one document.
    pub async fn write_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: &Value,
    ) -> Result<(), PersistenceError> {
        self.store().await?.write(collection, doc_id, fields).await
    }

    /// Delete one document.
    pub async fn delete_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> Result<(), PersistenceError> {
        self.store().await?.delete(collection, doc_id).await
    }

    /// List every document in a collection.
    pub async fn list_documents(
        &self,
        collection: &str,
    ) -> Result<Vec<Document>, PersistenceError> {
        self.store().await?.list(collection).await
    }

    /// Stream changes to a collection by polling its listing.
    ///
    /// The first poll reports every existing document as `Added` (the
    /// initial snapshot), after which each tick diffs against the
    /// previous one. Remote errors are yielded inline and polling
    /// continues. The stream never ends on its own.
    pub async fn stream_updates(
        &self,
        collection: &str,
        poll_interval: Duration,
    ) -> Result<BoxStream<'static, Result<DocumentChange, PersistenceError>>, PersistenceError>
    {
        let store = self.store().await?;
        let state = PollState {
            store,
            collection: collection.to_string(),
            interval: poll_interval,
            seen: HashMap::new(),
            pending: VecDeque::new(),
            primed: false,
        };

        Ok(stream::unfold(state, |mut st| async move {
            loop {
                if let Some(item) = st.pending.pop_front() {
                    return Some((item, st));
                }
                if st.primed {
                    tokio::time::sleep(st.interval).await;
                }
                st.primed = true;
                match st.store.list(&st.collection).await {
                    Ok(docs) => st.diff(docs),
                    Err(e) => st.pending.push_back(Err(e)),
                }
            }
        })
        .boxed())
    }
}

/// Rolling state for the polling update stream.
struct PollState {
    store: Arc<dyn DocumentStore>,
    collection: String,
    interval: Duration,
    /// id → (update_time, last body), from the previous poll.
    seen: HashMap<String, (Option<DateTime<Utc>>, Value)>,
    pending: VecDeque<Result<DocumentChange, PersistenceError>>,
    primed: bool,
}

impl PollState {
    /// Diff a fresh listing against the previous one, queueing changes.
    fn diff(&mut self, docs: Vec<Document>) {
        let mut next = HashMap::with_capacity(docs.len());

        for doc in docs {
            let change = match self.seen.get(&doc.id) {
                None => Some(ChangeKind::Added),
                Some((prev_time, prev_fields)) => {
                    let modified = match (prev_time, &doc.update_time) {
                        (Some(a), Some(b)) => a != b,
                        // No server timestamps: fall back to body comparison
                        _ => prev_fields != &doc.fields,
                    };
                    modified.then_some(ChangeKind::Modified)
                }
            };

            next.insert(doc.id.clone(), (doc.update_time, doc.fields.clone()));
            if let Some(kind) = change {
                self.pending.push_back(Ok(DocumentChange { kind, document: doc }));
            }
        }

        // Removals, in stable id order
        let mut removed: Vec<_> = self
            .seen
            .iter()
            .filter(|(id, _)| !next.contains_key(*id))
            .map(|(id, (time, fields))| Document {
                id: id.clone(),
                fields: fields.clone(),
                update_time: *time,
            })
            .collect();
        removed.sort_by(|a, b| a.id.cmp(&b.id));
        for document in removed {
            self.pending.push_back(Ok(DocumentChange {
                kind: ChangeKind::Removed,
                document,
            }));
        }

        self.seen = next;
    }
}
