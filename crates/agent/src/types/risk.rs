use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Severity of a position's risk.
///
/// Variants are declared least to most severe so the derived `Ord` is the
/// escalation order. Within one assessment the level only moves upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Warning,
    Danger,
    Critical,
}

impl RiskLevel {
    /// Raise the level to at least `floor`. Never lowers it.
    pub fn escalate_to(self, floor: RiskLevel) -> RiskLevel {
        self.max(floor)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recommended rebalancing action.
///
/// Not ordered: precedence between actions is decided by each check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceAction {
    None,
    Monitor,
    AddLoop,
    ReduceLoop,
    EmergencyUnwind,
}

impl RebalanceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Monitor => "monitor",
            Self::AddLoop => "add_loop",
            Self::ReduceLoop => "reduce_loop",
            Self::EmergencyUnwind => "emergency_unwind",
        }
    }

    /// Actions that submit a loop-changing transaction and can wait for cheaper gas.
    pub fn is_deferrable(&self) -> bool {
        matches!(self, Self::AddLoop | Self::ReduceLoop)
    }
}

impl fmt::Display for RebalanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single risk assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub recommended_action: RebalanceAction,
    #[serde(with = "rust_decimal::serde::str")]
    pub health_factor: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub distance_to_liquidation: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub correlation: Decimal,
    /// |1 - staked/underlying| price ratio.
    #[serde(with = "rust_decimal::serde::str")]
    pub price_decoupling_risk: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub net_apy: Decimal,
    pub gas_acceptable: bool,
    pub is_profitable: bool,
    /// Human-readable reasons in evaluation order.
    pub reasons: Vec<String>,
    pub metrics: BTreeMap<String, Decimal>,
}

impl RiskAssessment {
    /// Fail-safe verdict for unusable upstream data: maximally risky, monitor only.
    pub fn critical_failure(reason: impl Into<String>) -> Self {
        Self {
            risk_level: RiskLevel::Critical,
            recommended_action: RebalanceAction::Monitor,
            health_factor: Decimal::ZERO,
            distance_to_liquidation: Decimal::ZERO,
            correlation: Decimal::ZERO,
            price_decoupling_risk: Decimal::ZERO,
            net_apy: Decimal::ZERO,
            gas_acceptable: false,
            is_profitable: false,
            reasons: vec![reason.into()],
            metrics: BTreeMap::new(),
        }
    }

    /// Look up a named metric.
    pub fn metric(&self, name: &str) -> Option<Decimal> {
        self.metrics.get(name).copied()
    }
}
