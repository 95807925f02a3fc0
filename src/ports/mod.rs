//! Ports — Trait Seams Between the Core and Its Adapters
//!
//! The rest of the engine only ever sees these traits; concrete
//! transports (Firestore REST) live in `crate::adapters`.

pub mod document_store;
