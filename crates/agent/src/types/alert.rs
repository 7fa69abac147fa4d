use serde::{Deserialize, Serialize};

use super::rebalance::RebalanceOutcome;
use super::risk::{RebalanceAction, RiskLevel};

/// One acted-upon assessment, kept for later summarization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Unix seconds.
    pub timestamp: i64,
    pub user: String,
    pub risk_level: RiskLevel,
    pub action: RebalanceAction,
    pub reasons: Vec<String>,
    pub result: RebalanceOutcome,
}
