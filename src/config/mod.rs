//! Configuration Module — Environment-driven Trading Parameters
//!
//! Builds a single immutable `TradingConfig` from environment variables
//! (with `.env` support) and hard defaults. The record is constructed once
//! at startup, validated, and passed explicitly to every component that
//! needs it — there is no global config instance.

pub mod loader;

use std::time::Duration;

/// Top-level trading engine configuration.
///
/// Immutable after construction. Loading twice from the same environment
/// yields field-for-field equal records.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingConfig {
  /// Data collection providers and cadence.
  pub data: DataConfig,
  /// Reinforcement-learning agent hyperparameters.
  pub agent: AgentConfig,
  /// Risk management limits.
  pub risk: RiskConfig,
  /// Order execution parameters.
  pub execution: ExecutionConfig,
  /// Remote document store (Firestore) parameters.
  pub persistence: PersistenceConfig,
  /// Log level (trace, debug, info, warn, error).
  pub log_level: String,
}

/// Data source mapping: domain → provider name.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSources {
  /// Crypto exchange feed (CRYPTO_EXCHANGE).
  pub crypto: String,
  /// Equities data provider (STOCKS_API).
  pub stocks: String,
  /// News provider (NEWS_API).
  pub news: String,
}

/// Data collection configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
  /// Provider per data domain.
  pub sources: DataSources,
  /// Market data refresh interval in seconds. Must be positive.
  pub update_interval_secs: u64,
  /// Historical lookback window in days. Must be positive.
  pub historical_days: u32,
}

/// RL agent hyperparameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
  /// Training episode count.
  pub episodes: u32,
  /// Learning rate, in (0, 1].
  pub learning_rate: f64,
  /// Reward discount factor (gamma), in [0, 1].
  pub discount_factor: f64,
  /// Exploration rate (epsilon), in [0, 1].
  pub exploration_rate: f64,
}

/// Risk management configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
  /// Maximum position size as a fraction of portfolio, in (0, 1].
  pub max_position_size: f64,
  /// Stop-loss threshold as a fraction of entry price. Must be positive.
  pub stop_loss_percent: f64,
  /// Maximum tolerated drawdown as a fraction of peak equity, in (0, 1].
  pub max_drawdown: f64,
}

/// Order execution configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
  /// Simulated trading mode — no real orders. Safe default: true.
  pub paper_trading: bool,
  /// Order placement timeout in seconds. Must be positive.
  pub order_timeout_secs: u64,
  /// Minimum market liquidity (quote currency) to trade against.
  pub min_liquidity: f64,
}

/// Remote document store configuration.
///
/// An empty `project_id` puts the persistence gateway into disabled
/// (no-op) mode rather than failing startup.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistenceConfig {
  /// Firestore project identifier (FIREBASE_PROJECT_ID). May be empty.
  pub project_id: String,
  /// Path to the credentials JSON file.
  pub credentials_path: String,
  /// Bound on remote client construction time, seconds.
  pub init_timeout_secs: u64,
}

impl PersistenceConfig {
  /// Whether persistence is configured at all.
  pub fn is_enabled(&self) -> bool {
    !self.project_id.is_empty()
  }

  /// Initialization timeout as a `Duration`.
  pub fn init_timeout(&self) -> Duration {
    Duration::from_secs(self.init_timeout_secs)
  }
}
