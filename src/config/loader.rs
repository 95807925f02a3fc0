//! Configuration Loader — Environment Loading and Validation
//!
//! Reads recognized environment variables (every parameter has an explicit
//! default), coerces types, validates all parameters, and provides clear
//! error messages for misconfiguration.

use std::fmt::Display;
use std::str::FromStr;

use tracing::{info, warn};

use super::{
  AgentConfig, DataConfig, DataSources, ExecutionConfig, PersistenceConfig,
  RiskConfig, TradingConfig,
};
use crate::error::ConfigError;

/// Load and validate configuration from the process environment.
///
/// # Errors
/// Returns `ConfigError` if:
/// - A numeric env override can't be parsed
/// - A validation rule is violated
///
/// A missing `FIREBASE_PROJECT_ID` is never an error — persistence
/// degrades to disabled mode instead.
pub fn load_from_env() -> Result<TradingConfig, ConfigError> {
  load_with(|var| std::env::var(var).ok())
}

/// Load configuration through an injected variable lookup.
///
/// Lets tests fabricate environments without mutating process state.
pub fn load_with<F>(lookup: F) -> Result<TradingConfig, ConfigError>
where
  F: Fn(&str) -> Option<String>,
{
  let config = TradingConfig {
    data: DataConfig {
      sources: DataSources {
        crypto: string_var(&lookup, "CRYPTO_EXCHANGE", "binance"),
        stocks: string_var(&lookup, "STOCKS_API", "yfinance"),
        news: string_var(&lookup, "NEWS_API", "newsapi.org"),
      },
      update_interval_secs: parse_var(&lookup, "UPDATE_INTERVAL", 60)?,
      historical_days: parse_var(&lookup, "HISTORICAL_DAYS", 365)?,
    },
    agent: AgentConfig {
      episodes: parse_var(&lookup, "RL_EPISODES", 1000)?,
      learning_rate: parse_var(&lookup, "RL_LEARNING_RATE", 0.001)?,
      discount_factor: parse_var(&lookup, "RL_DISCOUNT_FACTOR", 0.95)?,
      exploration_rate: parse_var(&lookup, "RL_EXPLORATION_RATE", 0.1)?,
    },
    risk: RiskConfig {
      max_position_size: parse_var(&lookup, "MAX_POSITION_SIZE", 0.1)?,
      stop_loss_percent: parse_var(&lookup, "STOP_LOSS_PERCENT", 0.02)?,
      max_drawdown: parse_var(&lookup, "MAX_DRAWDOWN", 0.15)?,
    },
    execution: ExecutionConfig {
      paper_trading: bool_var(&lookup, "PAPER_TRADING", "True"),
      order_timeout_secs: parse_var(&lookup, "ORDER_TIMEOUT", 30)?,
      min_liquidity: parse_var(&lookup, "MIN_LIQUIDITY", 10_000.0)?,
    },
    persistence: PersistenceConfig {
      project_id: string_var(&lookup, "FIREBASE_PROJECT_ID", ""),
      credentials_path: string_var(
        &lookup,
        "FIREBASE_CREDENTIALS_PATH",
        "firebase_credentials.json",
      ),
      init_timeout_secs: parse_var(&lookup, "PERSISTENCE_INIT_TIMEOUT", 30)?,
    },
    log_level: string_var(&lookup, "LOG_LEVEL", "info"),
  };

  validate(&config)?;

  info!(
    crypto = %config.data.sources.crypto,
    stocks = %config.data.sources.stocks,
    news = %config.data.sources.news,
    paper_trading = config.execution.paper_trading,
    persistence_enabled = config.persistence.is_enabled(),
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Read a string variable, falling back to its default.
fn string_var<F>(lookup: &F, var: &str, default: &str) -> String
where
  F: Fn(&str) -> Option<String>,
{
  lookup(var).unwrap_or_else(|| default.to_string())
}

/// Read a boolean variable.
///
/// Coercion is a case-insensitive comparison against the literal
/// `"true"`; any other value (including empty) is false.
fn bool_var<F>(lookup: &F, var: &str, default: &str) -> bool
where
  F: Fn(&str) -> Option<String>,
{
  lookup(var)
    .unwrap_or_else(|| default.to_string())
    .eq_ignore_ascii_case("true")
}

/// Read and parse a numeric variable, falling back to its default.
fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
  F: Fn(&str) -> Option<String>,
  T: FromStr,
  T::Err: Display,
{
  match lookup(var) {
    None => Ok(default),
    Some(raw) => raw.trim().parse().map_err(|e: T::Err| {
      ConfigError::InvalidEnvValue {
        var,
        value: raw.clone(),
        reason: e.to_string(),
      }
    }),
  }
}

/// Validate all configuration parameters.
///
/// Validation order is deterministic; the first violated invariant
/// aborts construction and no partially-valid record escapes.
fn validate(config: &TradingConfig) -> Result<(), ConfigError> {
  // Risk validation first — these are the safety-critical limits.
  ensure(
    config.risk.max_position_size > 0.0 && config.risk.max_position_size <= 1.0,
    "MAX_POSITION_SIZE",
    "in (0, 1]",
    config.risk.max_position_size,
  )?;
  ensure(
    config.risk.stop_loss_percent > 0.0,
    "STOP_LOSS_PERCENT",
    "positive",
    config.risk.stop_loss_percent,
  )?;

  // Degraded mode is a warning, not an error: live trading without a
  // project ID runs with persistence-dependent features disabled.
  if !config.persistence.is_enabled() && !config.execution.paper_trading {
    warn!("Firebase project ID not set - some features disabled");
  }

  ensure(
    config.data.update_interval_secs > 0,
    "UPDATE_INTERVAL",
    "positive",
    config.data.update_interval_secs,
  )?;
  ensure(
    config.data.historical_days > 0,
    "HISTORICAL_DAYS",
    "positive",
    config.data.historical_days,
  )?;
  ensure(
    config.agent.episodes > 0,
    "RL_EPISODES",
    "positive",
    config.agent.episodes,
  )?;
  ensure(
    config.agent.learning_rate > 0.0 && config.agent.learning_rate <= 1.0,
    "RL_LEARNING_RATE",
    "in (0, 1]",
    config.agent.learning_rate,
  )?;
  ensure(
    (0.0..=1.0).contains(&config.agent.discount_factor),
    "RL_DISCOUNT_FACTOR",
    "in [0, 1]",
    config.agent.discount_factor,
  )?;
  ensure(
    (0.0..=1.0).contains(&config.agent.exploration_rate),
    "RL_EXPLORATION_RATE",
    "in [0, 1]",
    config.agent.exploration_rate,
  )?;
  ensure(
    config.risk.max_drawdown > 0.0 && config.risk.max_drawdown <= 1.0,
    "MAX_DRAWDOWN",
    "in (0, 1]",
    config.risk.max_drawdown,
  )?;
  ensure(
    config.execution.order_timeout_secs > 0,
    "ORDER_TIMEOUT",
    "positive",
    config.execution.order_timeout_secs,
  )?;
  ensure(
    config.execution.min_liquidity >= 0.0,
    "MIN_LIQUIDITY",
    "non-negative",
    config.execution.min_liquidity,
  )?;
  ensure(
    config.persistence.init_timeout_secs > 0,
    "PERSISTENCE_INIT_TIMEOUT",
    "positive",
    config.persistence.init_timeout_secs,
  )?;

  Ok(())
}

fn ensure<T: Display>(
  ok: bool,
  name: &'static str,
  requirement: &'static str,
  value: T,
) -> Result<(), ConfigError> {
  if ok {
    Ok(())
  } else {
    Err(ConfigError::InvalidParameter {
      name,
      requirement,
      value: value.to_string(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn empty_env(_: &str) -> Option<String> {
    None
  }

  #[test]
  fn test_defaults_load_and_validate() {
    let config = load_with(empty_env).unwrap();
    assert_eq!(config.data.sources.crypto, "binance");
    assert_eq!(config.data.sources.stocks, "yfinance");
    assert_eq!(config.data.sources.news, "newsapi.org");
    assert!(config.execution.paper_trading);
    assert!(!config.persistence.is_enabled());
  }

  #[test]
  fn test_unparseable_override_names_the_var() {
    let result = load_with(|var| {
      (var == "UPDATE_INTERVAL").then(|| "sixty".to_string())
    });
    match result {
      Err(ConfigError::InvalidEnvValue { var, .. }) => {
        assert_eq!(var, "UPDATE_INTERVAL");
      }
      other => panic!("expected InvalidEnvValue, got {other:?}"),
    }
  }
}
