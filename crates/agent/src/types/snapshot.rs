use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::numeric::{lenient_decimal, lenient_u32};
use crate::errors::AgentError;

// ---------------------------------------------------------------------------
// Position report
// ---------------------------------------------------------------------------

/// Position query result as printed by the contract-execution tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionReport {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub position: Option<PositionSummary>,
    /// Lending-market account data.
    #[serde(default, rename = "unleash", alias = "lending")]
    pub lending: Option<LendingSummary>,
    #[serde(default)]
    pub risk: Option<RiskSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSummary {
    pub has_position: bool,
    #[serde(deserialize_with = "lenient_decimal")]
    pub health_factor: Decimal,
    #[serde(deserialize_with = "lenient_u32")]
    pub loops: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LendingSummary {
    #[serde(deserialize_with = "lenient_decimal")]
    pub total_collateral: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub total_debt: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub available_borrows: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummary {
    /// Debt utilization in percent (0–100).
    #[serde(deserialize_with = "lenient_decimal")]
    pub utilization_rate: Decimal,
    /// Normalized buffer to liquidation: 0 = liquidatable.
    #[serde(deserialize_with = "lenient_decimal")]
    pub distance_to_liquidation: Decimal,
}

/// Validated, flattened view of a successful position report.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSnapshot {
    pub has_position: bool,
    pub health_factor: Decimal,
    pub loops: u32,
    pub total_collateral: Decimal,
    pub total_debt: Decimal,
    pub available_borrows: Decimal,
    pub utilization_rate: Decimal,
    pub distance_to_liquidation: Decimal,
}

impl PositionReport {
    /// Flatten into a snapshot. `None` when the report is unsuccessful or a
    /// required section is absent.
    pub fn snapshot(&self) -> Option<PositionSnapshot> {
        if !self.success {
            return None;
        }
        let position = self.position.as_ref()?;
        let lending = self.lending.as_ref()?;
        let risk = self.risk.as_ref()?;
        Some(PositionSnapshot {
            has_position: position.has_position,
            health_factor: position.health_factor,
            loops: position.loops,
            total_collateral: lending.total_collateral,
            total_debt: lending.total_debt,
            available_borrows: lending.available_borrows,
            utilization_rate: risk.utilization_rate,
            distance_to_liquidation: risk.distance_to_liquidation,
        })
    }

    /// A report describing a successful query of `snapshot`.
    pub fn from_snapshot(snapshot: &PositionSnapshot) -> Self {
        Self {
            success: true,
            error: None,
            position: Some(PositionSummary {
                has_position: snapshot.has_position,
                health_factor: snapshot.health_factor,
                loops: snapshot.loops,
            }),
            lending: Some(LendingSummary {
                total_collateral: snapshot.total_collateral,
                total_debt: snapshot.total_debt,
                available_borrows: snapshot.available_borrows,
            }),
            risk: Some(RiskSummary {
                utilization_rate: snapshot.utilization_rate,
                distance_to_liquidation: snapshot.distance_to_liquidation,
            }),
        }
    }

    /// A failed query.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Market report (prices + correlation)
// ---------------------------------------------------------------------------

/// Staked-token / underlying price pair and their correlation estimate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketReport {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub prices: Option<PricePair>,
    #[serde(default)]
    pub correlation: Option<CorrelationEstimate>,
    #[serde(default)]
    pub risk: Option<MarketRiskLabel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePair {
    /// Liquid-staking derivative price.
    #[serde(rename = "stIP", alias = "staked", deserialize_with = "lenient_decimal")]
    pub staked: Decimal,
    /// Underlying (wrapped native) price.
    #[serde(rename = "wip", alias = "underlying", deserialize_with = "lenient_decimal")]
    pub underlying: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationEstimate {
    #[serde(deserialize_with = "lenient_decimal")]
    pub estimate: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRiskLabel {
    pub overall_risk_level: String,
}

impl MarketReport {
    /// Price pair, only when the report succeeded.
    pub fn prices(&self) -> Option<&PricePair> {
        self.success.then_some(self.prices.as_ref()).flatten()
    }

    /// Correlation estimate, only when the report succeeded.
    pub fn correlation(&self) -> Option<Decimal> {
        self.success
            .then_some(self.correlation.as_ref())
            .flatten()
            .map(|c| c.estimate)
    }

    pub fn risk_label(&self) -> Option<&str> {
        self.risk.as_ref().map(|r| r.overall_risk_level.as_str())
    }
}

// ---------------------------------------------------------------------------
// Gas report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasReport {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub gas_price: Option<GasPrice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasPrice {
    #[serde(deserialize_with = "lenient_decimal")]
    pub gwei: Decimal,
}

impl GasReport {
    /// Gas price in gwei, only when the report succeeded.
    pub fn gwei(&self) -> Option<Decimal> {
        self.success
            .then_some(self.gas_price.as_ref())
            .flatten()
            .map(|g| g.gwei)
    }
}

// ---------------------------------------------------------------------------
// Assessment request
// ---------------------------------------------------------------------------

/// One assessment input: a position report plus optional market and gas context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub position: PositionReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<MarketReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<GasReport>,
}

impl AssessmentRequest {
    /// Parse a request document. A bare position report (no `position` key)
    /// is accepted as a request without market or gas context.
    pub fn from_json(raw: &str) -> Result<Self, AgentError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let Some(object) = value.as_object() else {
            return Err(AgentError::InvalidSnapshot {
                reason: "expected a JSON object".into(),
            });
        };
        if object.contains_key("position") {
            Ok(serde_json::from_value(value)?)
        } else {
            Ok(Self {
                position: serde_json::from_value(value)?,
                market: None,
                gas: None,
            })
        }
    }
}
