use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Receipt reported by the contract-execution tool after a rebalance call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    /// Health factor after the transaction settled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_factor: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_loops: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What the rebalancer did with an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceKind {
    None,
    Monitor,
    Delayed,
    AddLoop,
    ReduceLoop,
    EmergencyUnwind,
}

/// Loggable result of acting on one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceOutcome {
    pub kind: RebalanceKind,
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_health_factor: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_health_factor: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RebalanceOutcome {
    pub fn new(kind: RebalanceKind, success: bool, message: impl Into<String>) -> Self {
        Self {
            kind,
            success,
            message: message.into(),
            reasons: Vec::new(),
            tx_hash: None,
            gas_used: None,
            new_health_factor: None,
            previous_health_factor: None,
            error: None,
        }
    }

    pub fn failed(kind: RebalanceKind, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(kind, false, message)
        }
    }
}
