//! Persistence Adapters — Firestore REST Document Store
//!
//! Implements the `DocumentStore` port against the Firestore REST v1 API
//! and wraps it in a process-wide gateway with explicit lifecycle states
//! (uninitialized → disabled / connected / failed).

pub mod credentials;
pub mod firestore;
pub mod gateway;

pub use credentials::Credentials;
pub use firestore::{FirestoreClient, FirestoreClientConfig};
pub use gateway::{GatewayStatus, PersistenceGateway};
