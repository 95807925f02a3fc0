//! Adapters — Concrete Implementations of the Ports
//!
//! Only this layer knows about transports and wire formats. Everything
//! above it talks to the traits in `crate::ports`.

pub mod persistence;
