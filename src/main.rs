//! Quantfire — Preflight Entry Point
//!
//! Validates the deployment before the trading engine proper takes over.
//!
//! Wiring sequence:
//! 1. Load .env (local development overrides)
//! 2. Load environment config + validate (fatal on violation)
//! 3. Init tracing (JSON structured logging, env-filter)
//! 4. Construct the persistence gateway and attempt connect()
//!    (degrade gracefully on failure — persistence is never fatal)
//! 5. When connected, write a session heartbeat document so the
//!    deployment can be verified end to end

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};

use quantfire::adapters::persistence::{GatewayStatus, PersistenceGateway};
use quantfire::config::loader;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Local development overrides ───────────────────────
    dotenv::dotenv().ok();

    // ── 2. Load and validate configuration ───────────────────
    let config = loader::load_from_env().context("Failed to load configuration")?;

    // ── 3. Initialize structured JSON logging ────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.log_level)
                }),
        )
        .json()
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        paper_trading = config.execution.paper_trading,
        crypto = %config.data.sources.crypto,
        persistence_enabled = config.persistence.is_enabled(),
        "Starting quantfire preflight"
    );

    // ── 4. Bring up the persistence gateway ──────────────────
    let gateway = PersistenceGateway::new(config.persistence.clone());
    match gateway.connect().await {
        Ok(status) => {
            info!(status = status.as_str(), "Persistence gateway initialized");
        }
        Err(e) => {
            error!(error = %e, "Persistence unavailable - continuing in degraded mode");
        }
    }

    // ── 5. Heartbeat document proves write access ────────────
    if gateway.status().await == GatewayStatus::Connected {
        let session_id = uuid::Uuid::new_v4().to_string();
        let heartbeat = json!({
            "started_at": Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION"),
            "paper_trading": config.execution.paper_trading,
            "crypto_source": config.data.sources.crypto,
        });
        match gateway
            .write_document("engine_status", &session_id, &heartbeat)
            .await
        {
            Ok(()) => info!(session_id = %session_id, "Session heartbeat written"),
            Err(e) => warn!(error = %e, "Failed to write session heartbeat"),
        }
    }

    info!("Preflight complete");
    Ok(())
}
