//! Credentials File Loading
//!
//! Reads the JSON credentials file referenced by the persistence
//! configuration. The file carries the project ID, the API key used for
//! Firestore REST calls, and optional overrides for the database ID and
//! base URL (the latter is what the emulator and tests point at).

use serde::Deserialize;
use tokio::fs;

use crate::error::PersistenceError;

/// Parsed contents of the credentials file.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    /// Firestore project ID. Must match the configured project ID.
    pub project_id: String,
    /// API key sent with every REST request.
    pub api_key: String,
    /// Database ID. Firestore's default database is `(default)`.
    #[serde(default = "default_database_id")]
    pub database_id: String,
    /// Base URL override for emulators and tests.
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_database_id() -> String {
    "(default)".to_string()
}

impl Credentials {
    /// Load and parse credentials from a JSON file.
    ///
    /// Any failure (missing file, malformed JSON, empty fields) is a
    /// `PersistenceError::Init` — the caller records it and the process
    /// keeps running without persistence.
    pub async fn load(path: &str) -> Result<Self, PersistenceError> {
        let raw = fs::read_to_string(path).await.map_err(|e| {
            PersistenceError::init(format!("failed to read credentials file {path}: {e}"))
        })?;

        let creds: Self = serde_json::from_str(&raw).map_err(|e| {
            PersistenceError::init(format!("malformed credentials file {path}: {e}"))
        })?;

        if creds.project_id.is_empty() {
            return Err(PersistenceError::init(format!(
                "credentials file {path} has an empty project_id"
            )));
        }
        if creds.api_key.is_empty() {
            return Err(PersistenceError::init(format!(
                "credentials file {path} has an empty api_key"
            )));
        }

        Ok(creds)
    }
}
