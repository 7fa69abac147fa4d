pub mod alert;
pub mod numeric;
pub mod rebalance;
pub mod risk;
pub mod snapshot;
pub mod strategy;

pub use alert::AlertRecord;
pub use rebalance::{RebalanceKind, RebalanceOutcome, TxOutcome};
pub use risk::{RebalanceAction, RiskAssessment, RiskLevel};
pub use snapshot::{
    AssessmentRequest, GasReport, MarketReport, PositionReport, PositionSnapshot, PricePair,
};
pub use strategy::{RiskStrategy, StrategyParams};
