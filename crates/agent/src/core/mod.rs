pub mod alert_history;
pub mod rebalancer;
pub mod risk_assessor;
pub mod yield_model;

pub use alert_history::AlertHistory;
pub use rebalancer::{PositionExecutor, Rebalancer};
pub use risk_assessor::RiskAssessor;
pub use yield_model::YieldModel;
