pub mod types;
pub mod validate;

pub use types::*;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use crate::types::RiskStrategy;

/// Load and merge all config JSON files into a single [`AgentConfig`],
/// then apply environment variable overrides and validate.
///
/// Expected directory layout:
/// ```text
/// config/
///   app.json
///   risk.json
///   strategies.json
///   yield.json
/// ```
///
/// # Environment variable overrides
///
/// | Env Var                  | Config Field                  |
/// |--------------------------|-------------------------------|
/// | `STRATEGY`               | `risk.risk_strategy`          |
/// | `CRITICAL_HEALTH_FACTOR` | `risk.critical_health_factor` |
/// | `CORRELATION_THRESHOLD`  | `risk.correlation_threshold`  |
/// | `MAX_DEBT_UTILIZATION`   | `risk.max_debt_utilization`   |
/// | `MAX_GAS_PRICE_GWEI`     | `risk.max_gas_price_gwei`     |
/// | `STAKING_APY`            | `yield_model.staking_apy`     |
/// | `SUPPLY_APY`             | `yield_model.supply_apy`      |
/// | `BORROW_APY`             | `yield_model.borrow_apy`      |
pub fn load_config(config_dir: &Path) -> Result<AgentConfig> {
    let read = |name: &str| -> Result<String> {
        let path = config_dir.join(name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))
    };

    let app: AppConfig = serde_json::from_str(&read("app.json")?).context("parsing app.json")?;

    let risk: RiskConfig =
        serde_json::from_str(&read("risk.json")?).context("parsing risk.json")?;

    let strategies: StrategyTable =
        serde_json::from_str(&read("strategies.json")?).context("parsing strategies.json")?;

    let yield_model: YieldConfig =
        serde_json::from_str(&read("yield.json")?).context("parsing yield.json")?;

    let mut config = AgentConfig {
        app,
        risk,
        strategies,
        yield_model,
    };

    apply_env_overrides(&mut config);
    validate::validate_config(&config)?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides to the loaded config.
///
/// Only non-empty env vars take effect. Parse failures are logged and skipped
/// (the JSON value remains).
fn apply_env_overrides(config: &mut AgentConfig) {
    if let Some(raw) = env_string("STRATEGY") {
        match RiskStrategy::from_str(&raw) {
            Ok(strategy) => {
                info!(%strategy, "env override: STRATEGY");
                config.risk.risk_strategy = strategy;
            }
            Err(e) => warn!(error = %e, "ignoring STRATEGY override"),
        }
    }

    let decimal_overrides: [(&str, &mut Decimal); 7] = [
        ("CRITICAL_HEALTH_FACTOR", &mut config.risk.critical_health_factor),
        ("CORRELATION_THRESHOLD", &mut config.risk.correlation_threshold),
        ("MAX_DEBT_UTILIZATION", &mut config.risk.max_debt_utilization),
        ("MAX_GAS_PRICE_GWEI", &mut config.risk.max_gas_price_gwei),
        ("STAKING_APY", &mut config.yield_model.staking_apy),
        ("SUPPLY_APY", &mut config.yield_model.supply_apy),
        ("BORROW_APY", &mut config.yield_model.borrow_apy),
    ];

    for (key, field) in decimal_overrides {
        if let Some(raw) = env_string(key) {
            match Decimal::from_str(&raw) {
                Ok(val) => {
                    info!(%val, "env override: {key}");
                    *field = val;
                }
                Err(_) => warn!(key, value = %raw, "ignoring unparsable env override"),
            }
        }
    }
}

/// Read a non-empty env var as a `String`.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serial_test::serial;
    use std::path::PathBuf;

    fn project_config_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
    }

    // -----------------------------------------------------------------------
    // Helper: write a minimal set of config JSON files to a temp dir.
    // -----------------------------------------------------------------------

    fn write_test_configs(dir: &Path) {
        std::fs::write(
            dir.join("app.json"),
            r#"{ "logging": { "log_dir": "logs" }, "alert_history_capacity": 50 }"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("risk.json"),
            r#"{
                "critical_health_factor": "1.3",
                "correlation_threshold": "0.9",
                "max_debt_utilization": "0.75",
                "max_gas_price_gwei": "100",
                "risk_strategy": "moderate"
            }"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("strategies.json"),
            r#"{
                "conservative": { "max_loops": 0, "target_hf": "1.9", "min_hf": "1.7", "rebalance_threshold": "0.10" },
                "balanced":     { "max_loops": 1, "target_hf": "1.7", "min_hf": "1.5", "rebalance_threshold": "0.15" },
                "moderate":     { "max_loops": 2, "target_hf": "1.6", "min_hf": "1.4", "rebalance_threshold": "0.20" },
                "aggressive":   { "max_loops": 3, "target_hf": "1.5", "min_hf": "1.3", "rebalance_threshold": "0.25" }
            }"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("yield.json"),
            r#"{ "staking_apy": "0.08", "supply_apy": "0.02", "borrow_apy": "0.05" }"#,
        )
        .unwrap();
    }

    /// Remove all agent-related env vars so tests don't interfere with each other.
    fn clean_agent_env() {
        for key in [
            "STRATEGY",
            "CRITICAL_HEALTH_FACTOR",
            "CORRELATION_THRESHOLD",
            "MAX_DEBT_UTILIZATION",
            "MAX_GAS_PRICE_GWEI",
            "STAKING_APY",
            "SUPPLY_APY",
            "BORROW_APY",
        ] {
            std::env::remove_var(key);
        }
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[test]
    #[serial]
    fn test_load_real_configs() {
        clean_agent_env();
        let dir = project_config_dir();
        if !dir.exists() {
            eprintln!("skipping: config dir not found at {}", dir.display());
            return;
        }
        let config = load_config(&dir).expect("config should load and validate");
        assert_eq!(config.risk.risk_strategy, RiskStrategy::Conservative);
        assert_eq!(config.strategies.aggressive.max_loops, 3);
        assert_eq!(config.yield_model.staking_apy, dec!(0.08));
    }

    #[test]
    #[serial]
    fn test_load_test_configs() {
        clean_agent_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());
        let config = load_config(tmp.path()).expect("test config should load");
        assert_eq!(config.risk.risk_strategy, RiskStrategy::Moderate);
        assert_eq!(config.risk.correlation_threshold, dec!(0.9));
        assert_eq!(config.app.alert_history_capacity, 50);
        assert_eq!(config.strategy_params().max_loops, 2);
        assert_eq!(config.strategy_params().min_hf, dec!(1.4));
    }

    #[test]
    #[serial]
    fn test_missing_config_file_errors() {
        clean_agent_env();
        let tmp = tempfile::tempdir().unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(
            err.to_string().contains("failed to read config file"),
            "expected file-not-found error, got: {err}"
        );
    }

    #[test]
    #[serial]
    fn test_malformed_json_errors() {
        clean_agent_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());
        std::fs::write(tmp.path().join("yield.json"), "{ not json").unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("yield.json"), "got: {err}");
    }

    #[test]
    #[serial]
    fn test_env_override_strategy() {
        clean_agent_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("STRATEGY", "AGGRESSIVE");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.risk.risk_strategy, RiskStrategy::Aggressive);
        assert_eq!(config.strategy_params().max_loops, 3);
        clean_agent_env();
    }

    #[test]
    #[serial]
    fn test_env_override_unknown_strategy_ignored() {
        clean_agent_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("STRATEGY", "degen");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.risk.risk_strategy, RiskStrategy::Moderate);
        clean_agent_env();
    }

    #[test]
    #[serial]
    fn test_env_override_thresholds() {
        clean_agent_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("CRITICAL_HEALTH_FACTOR", "1.25");
        std::env::set_var("MAX_GAS_PRICE_GWEI", "42.5");
        std::env::set_var("BORROW_APY", "0.06");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.risk.critical_health_factor, dec!(1.25));
        assert_eq!(config.risk.max_gas_price_gwei, dec!(42.5));
        assert_eq!(config.yield_model.borrow_apy, dec!(0.06));
        clean_agent_env();
    }

    #[test]
    #[serial]
    fn test_env_override_empty_string_ignored() {
        clean_agent_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("MAX_GAS_PRICE_GWEI", "");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.risk.max_gas_price_gwei, dec!(100));
        clean_agent_env();
    }

    #[test]
    #[serial]
    fn test_env_override_invalid_parse_ignored() {
        clean_agent_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("STAKING_APY", "eight percent");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.yield_model.staking_apy, dec!(0.08));
        clean_agent_env();
    }

    #[test]
    #[serial]
    fn test_env_override_failing_validation_rejected() {
        clean_agent_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        // Above the moderate/aggressive min_hf band.
        std::env::set_var("CRITICAL_HEALTH_FACTOR", "1.6");
        let err = load_config(tmp.path()).unwrap_err();
        assert!(
            err.to_string().contains("critical_health_factor"),
            "expected validation error, got: {err}"
        );
        clean_agent_env();
    }
}
