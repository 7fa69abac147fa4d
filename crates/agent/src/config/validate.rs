use anyhow::{bail, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::types::AgentConfig;
use crate::types::RiskStrategy;

/// Validate invariants across the merged config that serde alone cannot enforce.
///
/// Collects every violation before failing so one run reports all of them.
/// Called automatically by [`super::load_config`].
pub fn validate_config(config: &AgentConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    validate_app_config(config, &mut errors);
    validate_risk_config(config, &mut errors);
    validate_strategies(config, &mut errors);
    validate_yield_config(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        let msg = format!(
            "Configuration validation failed ({} error{}):\n  - {}",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" },
            errors.join("\n  - ")
        );
        bail!("{msg}");
    }
}

// ---------------------------------------------------------------------------
// App config
// ---------------------------------------------------------------------------

fn validate_app_config(config: &AgentConfig, errors: &mut Vec<String>) {
    if config.app.logging.log_dir.trim().is_empty() {
        errors.push("app.logging: log_dir is empty".into());
    }
    if config.app.alert_history_capacity == 0 {
        errors.push("app: alert_history_capacity must be > 0".into());
    }
}

// ---------------------------------------------------------------------------
// Risk thresholds
// ---------------------------------------------------------------------------

fn validate_risk_config(config: &AgentConfig, errors: &mut Vec<String>) {
    let risk = &config.risk;

    // The emergency threshold must sit above liquidation.
    if risk.critical_health_factor <= dec!(1) {
        errors.push(format!(
            "risk: critical_health_factor ({}) must be > 1.0",
            risk.critical_health_factor
        ));
    }

    // ...and never above any strategy's reduce-leverage threshold.
    for strategy in RiskStrategy::ALL {
        let params = config.strategies.get(strategy);
        if risk.critical_health_factor > params.min_hf {
            errors.push(format!(
                "risk: critical_health_factor ({}) must be <= strategies.{strategy}.min_hf ({})",
                risk.critical_health_factor, params.min_hf
            ));
        }
    }

    if risk.correlation_threshold <= Decimal::ZERO || risk.correlation_threshold > dec!(1) {
        errors.push(format!(
            "risk: correlation_threshold ({}) must be in (0, 1]",
            risk.correlation_threshold
        ));
    }

    if risk.max_debt_utilization <= Decimal::ZERO || risk.max_debt_utilization > dec!(1) {
        errors.push(format!(
            "risk: max_debt_utilization ({}) must be in (0, 1]",
            risk.max_debt_utilization
        ));
    }

    if risk.max_gas_price_gwei <= Decimal::ZERO {
        errors.push(format!(
            "risk: max_gas_price_gwei ({}) must be > 0",
            risk.max_gas_price_gwei
        ));
    }
}

// ---------------------------------------------------------------------------
// Strategy table
// ---------------------------------------------------------------------------

fn validate_strategies(config: &AgentConfig, errors: &mut Vec<String>) {
    for strategy in RiskStrategy::ALL {
        let p = config.strategies.get(strategy);

        if p.min_hf >= p.target_hf {
            errors.push(format!(
                "strategies.{strategy}: min_hf ({}) must be < target_hf ({})",
                p.min_hf, p.target_hf
            ));
        }
        if p.min_hf <= dec!(1) {
            errors.push(format!(
                "strategies.{strategy}: min_hf ({}) must be > 1.0",
                p.min_hf
            ));
        }
        if p.rebalance_threshold <= Decimal::ZERO || p.rebalance_threshold >= dec!(1) {
            errors.push(format!(
                "strategies.{strategy}: rebalance_threshold ({}) must be in (0, 1)",
                p.rebalance_threshold
            ));
        }
    }

    // Loop allowance grows with aggressiveness.
    for pair in RiskStrategy::ALL.windows(2) {
        let (lower, higher) = (pair[0], pair[1]);
        let (lo, hi) = (config.strategies.get(lower), config.strategies.get(higher));
        if hi.max_loops <= lo.max_loops {
            errors.push(format!(
                "strategies: {higher}.max_loops ({}) must be > {lower}.max_loops ({})",
                hi.max_loops, lo.max_loops
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Yield model
// ---------------------------------------------------------------------------

fn validate_yield_config(config: &AgentConfig, errors: &mut Vec<String>) {
    let y = &config.yield_model;
    for (name, value) in [
        ("staking_apy", y.staking_apy),
        ("supply_apy", y.supply_apy),
        ("borrow_apy", y.borrow_apy),
    ] {
        if value < Decimal::ZERO {
            errors.push(format!("yield_model: {name} ({value}) must be >= 0"));
        }
        if value > dec!(1) {
            errors.push(format!(
                "yield_model: {name} ({value}) looks like a percentage; expected a fraction <= 1"
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&AgentConfig::default()).is_ok());
    }

    #[test]
    fn test_min_hf_above_target_rejected() {
        let mut config = AgentConfig::default();
        config.strategies.balanced.min_hf = dec!(1.8);
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("strategies.balanced: min_hf"), "got: {err}");
    }

    #[test]
    fn test_max_loops_must_strictly_increase() {
        let mut config = AgentConfig::default();
        config.strategies.moderate.max_loops = 1;
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("moderate.max_loops"), "got: {err}");
    }

    #[test]
    fn test_critical_hf_at_liquidation_rejected() {
        let mut config = AgentConfig::default();
        config.risk.critical_health_factor = dec!(1.0);
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("must be > 1.0"), "got: {err}");
    }

    #[test]
    fn test_correlation_threshold_range() {
        let mut config = AgentConfig::default();
        config.risk.correlation_threshold = dec!(1.2);
        assert!(validate_config(&config).is_err());
        config.risk.correlation_threshold = dec!(1.0);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_percentage_apy_rejected() {
        let mut config = AgentConfig::default();
        config.yield_model.staking_apy = dec!(8);
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("staking_apy"), "got: {err}");
    }

    #[test]
    fn test_all_errors_reported_together() {
        let mut config = AgentConfig::default();
        config.risk.max_gas_price_gwei = Decimal::ZERO;
        config.app.alert_history_capacity = 0;
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("2 errors"), "got: {err}");
    }
}
