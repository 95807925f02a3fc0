//! Error Types — Configuration and Persistence Failures
//!
//! Configuration errors are fatal at startup; persistence errors never
//! crash the process. The trading engine is expected to keep running in
//! degraded mode (typically paper trading) without a working database.

use thiserror::Error;

/// Configuration loading/validation error. Aborts startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A parameter violated its valid range.
    #[error("{name} must be {requirement}, got {value}")]
    InvalidParameter {
        /// Parameter name as the operator knows it (the env var name).
        name: &'static str,
        /// Human-readable range, e.g. "in (0, 1]".
        requirement: &'static str,
        /// The offending value, stringified.
        value: String,
    },

    /// An environment override could not be parsed as the expected type.
    #[error("failed to parse {var}={value}: {reason}")]
    InvalidEnvValue {
        /// Environment variable name.
        var: &'static str,
        /// Raw value found in the environment.
        value: String,
        /// Parser error message.
        reason: String,
    },
}

/// Persistence gateway error. Never fatal to the process.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Remote client construction failed (missing/malformed credentials,
    /// remote API error, or init timeout). The gateway stays `Failed`
    /// until explicitly reconnected.
    #[error("persistence initialization failed: {reason}")]
    Init {
        /// What went wrong during construction.
        reason: String,
    },

    /// Operation attempted while persistence is disabled (no project ID
    /// configured). Always recoverable: the feature is unavailable.
    #[error("persistence is disabled: no project ID configured")]
    Disabled,

    /// Operation attempted before a successful `connect()`, or after a
    /// failed one. Callers must reconnect explicitly.
    #[error("persistence gateway is not connected (state: {state})")]
    NotConnected {
        /// Gateway state observed by the caller.
        state: &'static str,
    },

    /// A remote call failed after a successful connection. The original
    /// cause is attached for diagnostics.
    #[error("remote {op} failed: {source}")]
    Operation {
        /// Operation name ("read", "write", "delete", "list").
        op: &'static str,
        /// Underlying transport or API error.
        #[source]
        source: anyhow::Error,
    },
}

impl PersistenceError {
    /// Build an `Init` error from any displayable cause.
    pub fn init(cause: impl std::fmt::Display) -> Self {
        Self::Init {
            reason: cause.to_string(),
        }
    }

    /// Build an `Operation` error wrapping the original cause.
    pub fn operation(op: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Operation {
            op,
            source: source.into(),
        }
    }
}
