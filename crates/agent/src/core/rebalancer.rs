//! Turns a [`RiskAssessment`] into at most one executor call.
//!
//! The rebalancer only de-risks. Adding loops is reported back for operator
//! confirmation, and deferrable actions are held while gas is too expensive.
//! Transaction construction lives behind [`PositionExecutor`].

use std::future::Future;

use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::errors::AgentError;
use crate::types::{RebalanceAction, RebalanceKind, RebalanceOutcome, RiskAssessment, TxOutcome};

/// Seam to whatever submits transactions for the position.
pub trait PositionExecutor: Send + Sync {
    /// Unwind `count` loops of the user's position.
    fn remove_loops(
        &self,
        user: &str,
        count: u32,
    ) -> impl Future<Output = Result<TxOutcome, AgentError>> + Send;

    /// Repay all debt and withdraw all collateral.
    fn emergency_unwind(&self, user: &str)
        -> impl Future<Output = Result<TxOutcome, AgentError>> + Send;
}

pub struct Rebalancer<E> {
    executor: E,
}

impl<E: PositionExecutor> Rebalancer<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Act on one assessment. Never fails; problems are reported in the outcome.
    pub async fn execute(&self, user: &str, assessment: &RiskAssessment) -> RebalanceOutcome {
        let action = assessment.recommended_action;

        match action {
            RebalanceAction::None => {
                RebalanceOutcome::new(RebalanceKind::None, true, "Position is healthy")
            }
            RebalanceAction::Monitor => RebalanceOutcome {
                reasons: assessment.reasons.clone(),
                ..RebalanceOutcome::new(RebalanceKind::Monitor, true, "Monitoring position")
            },
            _ if !assessment.gas_acceptable && action != RebalanceAction::EmergencyUnwind => {
                warn!(user, %action, "rebalance delayed: gas above limit");
                RebalanceOutcome {
                    reasons: assessment.reasons.clone(),
                    ..RebalanceOutcome::new(
                        RebalanceKind::Delayed,
                        false,
                        "Rebalance delayed due to high gas prices",
                    )
                }
            }
            RebalanceAction::AddLoop => {
                info!(user, "add-loop recommendation left for operator");
                RebalanceOutcome::new(
                    RebalanceKind::AddLoop,
                    false,
                    "Adding loops requires manual confirmation",
                )
            }
            RebalanceAction::ReduceLoop => self.reduce_loop(user, assessment).await,
            RebalanceAction::EmergencyUnwind => self.unwind(user, assessment).await,
        }
    }

    async fn reduce_loop(&self, user: &str, assessment: &RiskAssessment) -> RebalanceOutcome {
        let loops = assessment.metric("loops").unwrap_or(Decimal::ZERO);
        if loops <= Decimal::ZERO {
            return RebalanceOutcome::failed(
                RebalanceKind::ReduceLoop,
                "No loops to reduce",
                "position has no open loops",
            );
        }

        info!(user, %loops, health_factor = %assessment.health_factor, "reducing one loop");
        match self.executor.remove_loops(user, 1).await {
            Ok(tx) if tx.success => {
                let remaining = tx.remaining_loops.unwrap_or(0);
                info!(user, tx_hash = ?tx.tx_hash, remaining, "loop reduced");
                RebalanceOutcome {
                    tx_hash: tx.tx_hash,
                    gas_used: tx.gas_used,
                    new_health_factor: tx.health_factor,
                    ..RebalanceOutcome::new(
                        RebalanceKind::ReduceLoop,
                        true,
                        format!("Reduced 1 loop, {remaining} remaining"),
                    )
                }
            }
            Ok(tx) => {
                let err = tx.error.unwrap_or_else(|| "transaction reverted".into());
                warn!(user, error = %err, "loop reduction failed");
                RebalanceOutcome {
                    tx_hash: tx.tx_hash,
                    ..RebalanceOutcome::failed(
                        RebalanceKind::ReduceLoop,
                        format!("Loop reduction failed - {err}"),
                        err,
                    )
                }
            }
            Err(e) => {
                warn!(user, error = %e, "loop reduction failed");
                RebalanceOutcome::failed(
                    RebalanceKind::ReduceLoop,
                    format!("Loop reduction failed - {e}"),
                    e.to_string(),
                )
            }
        }
    }

    async fn unwind(&self, user: &str, assessment: &RiskAssessment) -> RebalanceOutcome {
        let previous_hf = assessment.health_factor;
        warn!(user, health_factor = %previous_hf, "executing emergency unwind");

        let err = match self.executor.emergency_unwind(user).await {
            Ok(tx) if tx.success => {
                info!(user, tx_hash = ?tx.tx_hash, "position fully unwound");
                return RebalanceOutcome {
                    tx_hash: tx.tx_hash,
                    gas_used: tx.gas_used,
                    new_health_factor: tx.health_factor,
                    previous_health_factor: Some(previous_hf),
                    ..RebalanceOutcome::new(
                        RebalanceKind::EmergencyUnwind,
                        true,
                        "Position fully unwound",
                    )
                };
            }
            Ok(tx) => tx.error.unwrap_or_else(|| "transaction reverted".into()),
            Err(e) => e.to_string(),
        };

        error!(user, error = %err, "emergency unwind failed");
        RebalanceOutcome {
            previous_health_factor: Some(previous_hf),
            ..RebalanceOutcome::failed(
                RebalanceKind::EmergencyUnwind,
                format!("CRITICAL: Unwind failed - {err}"),
                err,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskLevel;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Remove(String, u32),
        Unwind(String),
    }

    struct MockExecutor {
        calls: Mutex<Vec<Call>>,
        response: Result<TxOutcome, String>,
    }

    impl MockExecutor {
        fn ok(tx: TxOutcome) -> Self {
            Self { calls: Mutex::new(Vec::new()), response: Ok(tx) }
        }

        fn err(msg: &str) -> Self {
            Self { calls: Mutex::new(Vec::new()), response: Err(msg.to_string()) }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn respond(&self) -> Result<TxOutcome, AgentError> {
            self.response
                .clone()
                .map_err(|reason| AgentError::Execution { reason })
        }
    }

    impl PositionExecutor for MockExecutor {
        async fn remove_loops(&self, user: &str, count: u32) -> Result<TxOutcome, AgentError> {
            self.calls.lock().unwrap().push(Call::Remove(user.to_string(), count));
            self.respond()
        }

        async fn emergency_unwind(&self, user: &str) -> Result<TxOutcome, AgentError> {
            self.calls.lock().unwrap().push(Call::Unwind(user.to_string()));
            self.respond()
        }
    }

    fn receipt() -> TxOutcome {
        TxOutcome {
            success: true,
            tx_hash: Some("0xabc".into()),
            gas_used: Some(210_000),
            health_factor: Some(dec!(1.85)),
            remaining_loops: Some(1),
            error: None,
        }
    }

    fn assessment(action: RebalanceAction, loops: u32, gas_ok: bool) -> RiskAssessment {
        RiskAssessment {
            risk_level: RiskLevel::Danger,
            recommended_action: action,
            health_factor: dec!(1.42),
            distance_to_liquidation: dec!(0.25),
            correlation: dec!(0.95),
            price_decoupling_risk: Decimal::ZERO,
            net_apy: dec!(0.12),
            gas_acceptable: gas_ok,
            is_profitable: true,
            reasons: vec!["DANGER: Health factor 1.420 below minimum 1.5".into()],
            metrics: BTreeMap::from([("loops".to_string(), Decimal::from(loops))]),
        }
    }

    const USER: &str = "0x1111111111111111111111111111111111111111";

    #[tokio::test]
    async fn test_none_is_healthy_noop() {
        let r = Rebalancer::new(MockExecutor::ok(receipt()));
        let out = r.execute(USER, &assessment(RebalanceAction::None, 2, true)).await;
        assert_eq!(out.kind, RebalanceKind::None);
        assert!(out.success);
        assert_eq!(out.message, "Position is healthy");
        assert!(r.executor().calls().is_empty());
    }

    #[tokio::test]
    async fn test_monitor_echoes_reasons() {
        let r = Rebalancer::new(MockExecutor::ok(receipt()));
        let a = assessment(RebalanceAction::Monitor, 2, false);
        let out = r.execute(USER, &a).await;
        assert_eq!(out.kind, RebalanceKind::Monitor);
        assert!(out.success);
        assert_eq!(out.reasons, a.reasons);
        assert!(r.executor().calls().is_empty());
    }

    #[tokio::test]
    async fn test_reduce_loop_success() {
        let r = Rebalancer::new(MockExecutor::ok(receipt()));
        let out = r.execute(USER, &assessment(RebalanceAction::ReduceLoop, 2, true)).await;
        assert!(out.success);
        assert_eq!(out.kind, RebalanceKind::ReduceLoop);
        assert_eq!(out.message, "Reduced 1 loop, 1 remaining");
        assert_eq!(out.tx_hash.as_deref(), Some("0xabc"));
        assert_eq!(out.gas_used, Some(210_000));
        assert_eq!(out.new_health_factor, Some(dec!(1.85)));
        assert_eq!(r.executor().calls(), vec![Call::Remove(USER.into(), 1)]);
    }

    #[tokio::test]
    async fn test_reduce_loop_with_no_loops_is_guarded() {
        let r = Rebalancer::new(MockExecutor::ok(receipt()));
        let out = r.execute(USER, &assessment(RebalanceAction::ReduceLoop, 0, true)).await;
        assert!(!out.success);
        assert_eq!(out.message, "No loops to reduce");
        assert!(r.executor().calls().is_empty());
    }

    #[tokio::test]
    async fn test_reduce_loop_delayed_by_gas() {
        let r = Rebalancer::new(MockExecutor::ok(receipt()));
        let out = r.execute(USER, &assessment(RebalanceAction::ReduceLoop, 2, false)).await;
        assert_eq!(out.kind, RebalanceKind::Delayed);
        assert!(!out.success);
        assert_eq!(out.message, "Rebalance delayed due to high gas prices");
        assert!(r.executor().calls().is_empty());
    }

    #[tokio::test]
    async fn test_reduce_loop_executor_error() {
        let r = Rebalancer::new(MockExecutor::err("nonce too low"));
        let out = r.execute(USER, &assessment(RebalanceAction::ReduceLoop, 2, true)).await;
        assert!(!out.success);
        assert!(out.error.as_deref().is_some_and(|e| e.contains("nonce too low")));
    }

    #[tokio::test]
    async fn test_reverted_reduce_reports_error() {
        let reverted = TxOutcome {
            success: false,
            error: Some("execution reverted".into()),
            ..TxOutcome::default()
        };
        let r = Rebalancer::new(MockExecutor::ok(reverted));
        let out = r.execute(USER, &assessment(RebalanceAction::ReduceLoop, 1, true)).await;
        assert!(!out.success);
        assert_eq!(out.error.as_deref(), Some("execution reverted"));
    }

    #[tokio::test]
    async fn test_unwind_ignores_gas() {
        let r = Rebalancer::new(MockExecutor::ok(receipt()));
        let out = r
            .execute(USER, &assessment(RebalanceAction::EmergencyUnwind, 3, false))
            .await;
        assert!(out.success);
        assert_eq!(out.kind, RebalanceKind::EmergencyUnwind);
        assert_eq!(out.message, "Position fully unwound");
        assert_eq!(out.previous_health_factor, Some(dec!(1.42)));
        assert_eq!(r.executor().calls(), vec![Call::Unwind(USER.into())]);
    }

    #[tokio::test]
    async fn test_unwind_failure_is_critical() {
        let r = Rebalancer::new(MockExecutor::err("rpc timeout"));
        let out = r
            .execute(USER, &assessment(RebalanceAction::EmergencyUnwind, 3, true))
            .await;
        assert!(!out.success);
        assert!(out.message.starts_with("CRITICAL: Unwind failed"));
        assert!(out.message.contains("rpc timeout"));
    }

    #[tokio::test]
    async fn test_add_loop_needs_confirmation() {
        let r = Rebalancer::new(MockExecutor::ok(receipt()));
        let out = r.execute(USER, &assessment(RebalanceAction::AddLoop, 1, true)).await;
        assert_eq!(out.kind, RebalanceKind::AddLoop);
        assert!(!out.success);
        assert_eq!(out.message, "Adding loops requires manual confirmation");
        assert!(r.executor().calls().is_empty());
    }
}
