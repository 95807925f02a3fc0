//! Quantfire — Configuration & Persistence Core
//!
//! Environment-driven trading configuration with validation, plus a
//! process-wide gateway to a remote document store (Firestore REST).
//! Re-exports all modules for integration tests.

pub mod adapters;
pub mod config;
pub mod error;
pub mod ports;
