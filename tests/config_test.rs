//! Configuration Tests — Loading, Coercion, and Validation
//!
//! Exercises the loader through injected environments so tests never
//! mutate process state. Property tests cover the safety-critical
//! numeric invariants across random inputs.

use proptest::prelude::*;

use quantfire::config::loader::load_with;
use quantfire::error::ConfigError;

/// Build a lookup over a fixed set of variables.
fn env<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
    move |var| {
        vars.iter()
            .find(|(k, _)| *k == var)
            .map(|(_, v)| (*v).to_string())
    }
}

#[test]
fn defaults_match_the_documented_table() {
    let config = load_with(env(&[])).unwrap();

    assert_eq!(config.data.sources.crypto, "binance");
    assert_eq!(config.data.sources.stocks, "yfinance");
    assert_eq!(config.data.sources.news, "newsapi.org");
    assert_eq!(config.data.update_interval_secs, 60);
    assert_eq!(config.data.historical_days, 365);
    assert_eq!(config.agent.episodes, 1000);
    assert!((config.agent.learning_rate - 0.001).abs() < f64::EPSILON);
    assert!((config.agent.discount_factor - 0.95).abs() < f64::EPSILON);
    assert!((config.agent.exploration_rate - 0.1).abs() < f64::EPSILON);
    assert!((config.risk.max_position_size - 0.1).abs() < f64::EPSILON);
    assert!((config.risk.stop_loss_percent - 0.02).abs() < f64::EPSILON);
    assert!((config.risk.max_drawdown - 0.15).abs() < f64::EPSILON);
    assert!(config.execution.paper_trading);
    assert_eq!(config.execution.order_timeout_secs, 30);
    assert!((config.execution.min_liquidity - 10_000.0).abs() < f64::EPSILON);
    assert_eq!(config.persistence.project_id, "");
    assert_eq!(config.persistence.credentials_path, "firebase_credentials.json");
    assert_eq!(config.log_level, "info");
}

#[test]
fn paper_trading_coercion_is_case_insensitive() {
    for truthy in ["True", "TRUE", "true", "tRuE"] {
        let config = load_with(env(&[("PAPER_TRADING", truthy)])).unwrap();
        assert!(config.execution.paper_trading, "{truthy} should be true");
    }
    for falsy in ["false", "", "yes", "1", "paper"] {
        let config = load_with(env(&[("PAPER_TRADING", falsy)])).unwrap();
        assert!(!config.execution.paper_trading, "{falsy:?} should be false");
    }
}

#[test]
fn max_position_size_must_be_in_unit_interval() {
    for bad in ["0", "-0.1", "1.5"] {
        let result = load_with(env(&[("MAX_POSITION_SIZE", bad)]));
        match result {
            Err(ConfigError::InvalidParameter { name, .. }) => {
                assert_eq!(name, "MAX_POSITION_SIZE");
            }
            other => panic!("expected InvalidParameter for {bad}, got {other:?}"),
        }
    }

    // Boundary: exactly 1.0 is allowed
    let config = load_with(env(&[("MAX_POSITION_SIZE", "1.0")])).unwrap();
    assert!((config.risk.max_position_size - 1.0).abs() < f64::EPSILON);
}

#[test]
fn stop_loss_must_be_positive() {
    let result = load_with(env(&[("STOP_LOSS_PERCENT", "0")]));
    match result {
        Err(ConfigError::InvalidParameter { name, .. }) => {
            assert_eq!(name, "STOP_LOSS_PERCENT");
        }
        other => panic!("expected InvalidParameter, got {other:?}"),
    }
}

#[test]
fn position_size_is_validated_before_stop_loss() {
    // Both invalid: the first violated invariant must win.
    let result = load_with(env(&[
        ("MAX_POSITION_SIZE", "2.0"),
        ("STOP_LOSS_PERCENT", "-1"),
    ]));
    match result {
        Err(ConfigError::InvalidParameter { name, .. }) => {
            assert_eq!(name, "MAX_POSITION_SIZE");
        }
        other => panic!("expected InvalidParameter, got {other:?}"),
    }
}

#[test]
fn missing_project_id_is_not_an_error() {
    // Live trading without a project ID degrades (warns) but loads.
    let config = load_with(env(&[("PAPER_TRADING", "false")])).unwrap();
    assert!(!config.execution.paper_trading);
    assert!(!config.persistence.is_enabled());
}

#[test]
fn identical_environments_load_equal_records() {
    let vars = [
        ("CRYPTO_EXCHANGE", "kraken"),
        ("RL_LEARNING_RATE", "0.01"),
        ("MAX_POSITION_SIZE", "0.25"),
        ("FIREBASE_PROJECT_ID", "prod-engine"),
        ("PAPER_TRADING", "FALSE"),
    ];
    let first = load_with(env(&vars)).unwrap();
    let second = load_with(env(&vars)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn rl_hyperparameter_ranges_are_enforced() {
    for (var, bad) in [
        ("RL_LEARNING_RATE", "0"),
        ("RL_DISCOUNT_FACTOR", "1.01"),
        ("RL_EXPLORATION_RATE", "-0.1"),
    ] {
        let result = load_with(env(&[(var, bad)]));
        match result {
            Err(ConfigError::InvalidParameter { name, .. }) => assert_eq!(name, var),
            other => panic!("expected InvalidParameter for {var}={bad}, got {other:?}"),
        }
    }
}

proptest! {
    /// Every successfully loaded record satisfies the risk invariants.
    #[test]
    fn loaded_records_satisfy_risk_invariants(
        pos in -1.0f64..2.0,
        stop in -0.5f64..0.5,
    ) {
        let pos_s = pos.to_string();
        let stop_s = stop.to_string();
        let vars = [
            ("MAX_POSITION_SIZE", pos_s.as_str()),
            ("STOP_LOSS_PERCENT", stop_s.as_str()),
        ];
        match load_with(env(&vars)) {
            Ok(config) => {
                prop_assert!(config.risk.max_position_size > 0.0);
                prop_assert!(config.risk.max_position_size <= 1.0);
                prop_assert!(config.risk.stop_loss_percent > 0.0);
            }
            Err(e) => {
                prop_assert!(
                    pos <= 0.0 || pos > 1.0 || stop <= 0.0,
                    "rejected valid inputs pos={pos} stop={stop}: {e}"
                );
            }
        }
    }

    /// Boolean coercion accepts exactly the literal "true", any casing.
    #[test]
    fn paper_trading_coercion_property(raw in "[a-zA-Z]{0,6}") {
        let config = load_with(env(&[("PAPER_TRADING", raw.as_str())])).unwrap();
        prop_assert_eq!(
            config.execution.paper_trading,
            raw.eq_ignore_ascii_case("true")
        );
    }
}
