use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Leverage posture, least to most aggressive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskStrategy {
    /// Plain staking, no loops.
    Conservative,
    Balanced,
    Moderate,
    Aggressive,
}

impl RiskStrategy {
    pub const ALL: [RiskStrategy; 4] = [
        Self::Conservative,
        Self::Balanced,
        Self::Moderate,
        Self::Aggressive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Balanced => "balanced",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for RiskStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conservative" => Ok(Self::Conservative),
            "balanced" => Ok(Self::Balanced),
            "moderate" => Ok(Self::Moderate),
            "aggressive" => Ok(Self::Aggressive),
            other => Err(format!("unknown risk strategy: {other}")),
        }
    }
}

/// Per-strategy loop limit and health factor band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    pub max_loops: u32,
    /// Health factor the position should sit at or above.
    #[serde(with = "rust_decimal::serde::str")]
    pub target_hf: Decimal,
    /// Below this, reduce leverage.
    #[serde(with = "rust_decimal::serde::str")]
    pub min_hf: Decimal,
    /// Relative health factor drift that warrants a rebalance.
    #[serde(with = "rust_decimal::serde::str")]
    pub rebalance_threshold: Decimal,
}
