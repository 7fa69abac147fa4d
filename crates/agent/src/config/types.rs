use rust_decimal::Decimal;
use serde::Deserialize;

use crate::constants::*;
use crate::types::{RiskStrategy, StrategyParams};

// ---------------------------------------------------------------------------
// Top-level aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentConfig {
    pub app: AppConfig,
    pub risk: RiskConfig,
    pub strategies: StrategyTable,
    pub yield_model: YieldConfig,
}

impl AgentConfig {
    /// Parameters of the configured strategy.
    pub fn strategy_params(&self) -> &StrategyParams {
        self.strategies.get(self.risk.risk_strategy)
    }
}

// ---------------------------------------------------------------------------
// app.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    #[serde(default = "default_alert_capacity")]
    pub alert_history_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            alert_history_capacity: DEFAULT_ALERT_HISTORY_CAPACITY,
        }
    }
}

fn default_alert_capacity() -> usize {
    DEFAULT_ALERT_HISTORY_CAPACITY
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// risk.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Emergency-unwind threshold.
    #[serde(with = "rust_decimal::serde::str")]
    pub critical_health_factor: Decimal,
    /// Staked/underlying correlation below this raises a warning.
    #[serde(with = "rust_decimal::serde::str")]
    pub correlation_threshold: Decimal,
    /// Fraction (0–1) of available borrows that may be in use.
    #[serde(with = "rust_decimal::serde::str")]
    pub max_debt_utilization: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub max_gas_price_gwei: Decimal,
    pub risk_strategy: RiskStrategy,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            critical_health_factor: DEFAULT_CRITICAL_HEALTH_FACTOR,
            correlation_threshold: DEFAULT_CORRELATION_THRESHOLD,
            max_debt_utilization: DEFAULT_MAX_DEBT_UTILIZATION,
            max_gas_price_gwei: DEFAULT_MAX_GAS_PRICE_GWEI,
            risk_strategy: RiskStrategy::Conservative,
        }
    }
}

// ---------------------------------------------------------------------------
// strategies.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyTable {
    pub conservative: StrategyParams,
    pub balanced: StrategyParams,
    pub moderate: StrategyParams,
    pub aggressive: StrategyParams,
}

impl StrategyTable {
    pub fn get(&self, strategy: RiskStrategy) -> &StrategyParams {
        match strategy {
            RiskStrategy::Conservative => &self.conservative,
            RiskStrategy::Balanced => &self.balanced,
            RiskStrategy::Moderate => &self.moderate,
            RiskStrategy::Aggressive => &self.aggressive,
        }
    }
}

impl Default for StrategyTable {
    fn default() -> Self {
        let params = |max_loops, (target_hf, min_hf, rebalance_threshold)| StrategyParams {
            max_loops,
            target_hf,
            min_hf,
            rebalance_threshold,
        };
        Self {
            conservative: params(0, CONSERVATIVE_HF_BAND),
            balanced: params(1, BALANCED_HF_BAND),
            moderate: params(2, MODERATE_HF_BAND),
            aggressive: params(3, AGGRESSIVE_HF_BAND),
        }
    }
}

// ---------------------------------------------------------------------------
// yield.json
// ---------------------------------------------------------------------------

/// Annualized rates feeding the net-APY estimator.
#[derive(Debug, Clone, Deserialize)]
pub struct YieldConfig {
    #[serde(with = "rust_decimal::serde::str")]
    pub staking_apy: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub supply_apy: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub borrow_apy: Decimal,
}

impl Default for YieldConfig {
    fn default() -> Self {
        Self {
            staking_apy: DEFAULT_STAKING_APY,
            supply_apy: DEFAULT_SUPPLY_APY,
            borrow_apy: DEFAULT_BORROW_APY,
        }
    }
}
