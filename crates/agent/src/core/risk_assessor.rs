//! Risk assessor: maps position, market and gas snapshots to a risk level
//! and a single recommended action.
//!
//! The active-position path is a fixed-order cascade of seven checks folded
//! over a [`Cascade`] accumulator:
//!
//! 1. health factor band
//! 2. staked/underlying price decoupling
//! 3. staked/underlying correlation
//! 4. debt utilization
//! 5. distance to liquidation
//! 6. loop profitability
//! 7. gas price gate
//!
//! Each check may raise the level (never lower it), may upgrade the action
//! under its own precedence rule, and appends a reason whenever it fires.
//! Unusable position data yields [`RiskAssessment::critical_failure`]; the
//! assessor never returns an error.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::config::{AgentConfig, RiskConfig};
use crate::constants::*;
use crate::types::numeric::{fmt_pct, percent_to_fraction};
use crate::types::{
    GasReport, MarketReport, PositionReport, PositionSnapshot, PricePair, RebalanceAction,
    RiskAssessment, RiskLevel, StrategyParams,
};

use super::yield_model::YieldModel;

// ---------------------------------------------------------------------------
// Cascade plumbing
// ---------------------------------------------------------------------------

/// Inputs shared by every check in one assessment.
struct CheckContext<'a> {
    position: &'a PositionSnapshot,
    prices: Option<&'a PricePair>,
    correlation: Option<Decimal>,
    gas_gwei: Option<Decimal>,
    risk: &'a RiskConfig,
    params: &'a StrategyParams,
    yield_model: &'a YieldModel,
}

/// Accumulator threaded through the checks.
#[derive(Debug, Clone)]
struct Cascade {
    level: RiskLevel,
    action: RebalanceAction,
    reasons: Vec<String>,
    correlation: Decimal,
    price_decoupling: Decimal,
    utilization: Decimal,
    current_net_apy: Decimal,
    next_loop_apy: Decimal,
    gas_acceptable: bool,
    /// Level after each check, in evaluation order.
    trail: Vec<(&'static str, RiskLevel)>,
}

impl Cascade {
    fn new() -> Self {
        Self {
            level: RiskLevel::Safe,
            action: RebalanceAction::None,
            reasons: Vec::new(),
            correlation: DEFAULT_CORRELATION,
            price_decoupling: Decimal::ZERO,
            utilization: Decimal::ZERO,
            current_net_apy: Decimal::ZERO,
            next_loop_apy: Decimal::ZERO,
            gas_acceptable: true,
            trail: Vec::with_capacity(CHECKS.len()),
        }
    }

    fn escalate(&mut self, floor: RiskLevel) {
        self.level = self.level.escalate_to(floor);
    }

    fn upgrade_from_passive(&mut self, to: RebalanceAction) {
        if matches!(self.action, RebalanceAction::None | RebalanceAction::Monitor) {
            self.action = to;
        }
    }
}

type Check = fn(&CheckContext<'_>, Cascade) -> Cascade;

/// Evaluation order is part of the contract: later checks see and may
/// override the actions chosen by earlier ones.
const CHECKS: [(&str, Check); 7] = [
    ("health_factor", check_health_factor),
    ("price_decoupling", check_price_decoupling),
    ("correlation", check_correlation),
    ("utilization", check_utilization),
    ("liquidation_distance", check_liquidation_distance),
    ("profitability", check_profitability),
    ("gas_price", check_gas_price),
];

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

fn check_health_factor(ctx: &CheckContext<'_>, mut c: Cascade) -> Cascade {
    let hf = ctx.position.health_factor;
    let critical = ctx.risk.critical_health_factor;
    let StrategyParams { min_hf, target_hf, .. } = ctx.params;

    if hf < critical {
        c.level = RiskLevel::Critical;
        c.action = RebalanceAction::EmergencyUnwind;
        c.reasons
            .push(format!("CRITICAL: Health factor {hf:.3} below {critical}"));
    } else if hf < *min_hf {
        c.level = RiskLevel::Danger;
        c.action = RebalanceAction::ReduceLoop;
        c.reasons
            .push(format!("DANGER: Health factor {hf:.3} below minimum {min_hf}"));
    } else if hf < *target_hf {
        c.escalate(RiskLevel::Warning);
        c.action = RebalanceAction::Monitor;
        c.reasons
            .push(format!("WARNING: Health factor {hf:.3} below target {target_hf}"));
    } else {
        c.reasons.push(format!("Health factor {hf:.3} is healthy"));
    }
    c
}

fn check_price_decoupling(ctx: &CheckContext<'_>, mut c: Cascade) -> Cascade {
    let Some(prices) = ctx.prices else {
        return c;
    };

    let ratio = peg_ratio(prices.staked, prices.underlying);
    let deviation = Decimal::ONE.saturating_sub(ratio).abs();
    c.price_decoupling = deviation;

    if deviation > PEG_DEVIATION_DANGER {
        c.escalate(RiskLevel::Danger);
        c.upgrade_from_passive(RebalanceAction::ReduceLoop);
        c.reasons.push(format!(
            "DANGER: Price decoupling {} (staked/underlying ratio: {ratio:.4})",
            fmt_pct(deviation, 2)
        ));
    } else if deviation > PEG_DEVIATION_WARNING {
        c.escalate(RiskLevel::Warning);
        c.reasons
            .push(format!("WARNING: Price deviation {}", fmt_pct(deviation, 2)));
    }

    if deviation > PEG_DEVIATION_WARNING {
        if ratio < Decimal::ONE {
            c.reasons.push(format!(
                "Staked token trading below underlying by {} - collateral losing value",
                fmt_pct(Decimal::ONE.saturating_sub(ratio), 1)
            ));
        } else {
            c.reasons.push(format!(
                "Staked token trading above underlying by {} - monitoring for reversal",
                fmt_pct(ratio.saturating_sub(Decimal::ONE), 1)
            ));
        }
    }
    c
}

fn check_correlation(ctx: &CheckContext<'_>, mut c: Cascade) -> Cascade {
    let Some(correlation) = ctx.correlation else {
        return c;
    };
    c.correlation = correlation;

    if correlation < CORRELATION_DANGER {
        c.escalate(RiskLevel::Danger);
        c.upgrade_from_passive(RebalanceAction::ReduceLoop);
        c.reasons.push(format!(
            "DANGER: Low correlation {correlation:.3} - assets moving independently"
        ));
    } else if correlation < ctx.risk.correlation_threshold {
        c.escalate(RiskLevel::Warning);
        c.reasons.push(format!(
            "WARNING: Correlation {correlation:.3} below threshold {}",
            ctx.risk.correlation_threshold
        ));
    }
    c
}

fn check_utilization(ctx: &CheckContext<'_>, mut c: Cascade) -> Cascade {
    let utilization = percent_to_fraction(ctx.position.utilization_rate);
    c.utilization = utilization;

    if utilization > ctx.risk.max_debt_utilization {
        c.escalate(RiskLevel::Warning);
        c.reasons
            .push(format!("High debt utilization: {}", fmt_pct(utilization, 1)));
    }
    c
}

fn check_liquidation_distance(ctx: &CheckContext<'_>, mut c: Cascade) -> Cascade {
    let distance = ctx.position.distance_to_liquidation;

    if distance < LIQUIDATION_DISTANCE_CRITICAL {
        c.level = RiskLevel::Critical;
        c.action = RebalanceAction::EmergencyUnwind;
        c.reasons
            .push(format!("CRITICAL: Only {} from liquidation", fmt_pct(distance, 2)));
    } else if distance < LIQUIDATION_DISTANCE_DANGER {
        // Only a SAFE position is pulled up to DANGER; a WARNING stays as is.
        if c.level == RiskLevel::Safe {
            c.level = RiskLevel::Danger;
        }
        if c.action == RebalanceAction::None {
            c.action = RebalanceAction::ReduceLoop;
        }
        c.reasons
            .push(format!("DANGER: {} from liquidation", fmt_pct(distance, 2)));
    }
    c
}

fn check_profitability(ctx: &CheckContext<'_>, mut c: Cascade) -> Cascade {
    let loops = ctx.position.loops;
    let current = ctx.yield_model.net_apy(loops);
    let next = ctx.yield_model.net_apy(loops.saturating_add(1));
    c.current_net_apy = current;
    c.next_loop_apy = next;

    let comfortable_hf = ctx.params.target_hf.saturating_add(ADD_LOOP_HF_MARGIN);
    if c.level == RiskLevel::Safe
        && loops < ctx.params.max_loops
        && next > current
        && next > MIN_ADD_LOOP_APY
        && ctx.position.health_factor > comfortable_hf
    {
        c.action = RebalanceAction::AddLoop;
        c.reasons.push(format!(
            "Profitable to add loop: {} net APY (current: {})",
            fmt_pct(next, 2),
            fmt_pct(current, 2)
        ));
    }

    if current <= Decimal::ZERO {
        c.escalate(RiskLevel::Warning);
        c.reasons
            .push(format!("Position unprofitable: {} net APY", fmt_pct(current, 2)));
    }
    c
}

fn check_gas_price(ctx: &CheckContext<'_>, mut c: Cascade) -> Cascade {
    let Some(gwei) = ctx.gas_gwei else {
        return c;
    };
    c.gas_acceptable = gwei < ctx.risk.max_gas_price_gwei;

    if !c.gas_acceptable {
        c.reasons.push(format!("Gas too high: {gwei:.1} Gwei"));
        // Emergency unwinds go through at any gas price.
        if c.action.is_deferrable() {
            c.reasons.push("Delaying rebalance due to high gas".into());
            c.action = RebalanceAction::Monitor;
        }
    }
    c
}

/// staked / underlying, or 1.0 (no deviation) when the underlying price is
/// unusable. A quotient too large to represent saturates.
fn peg_ratio(staked: Decimal, underlying: Decimal) -> Decimal {
    if underlying <= Decimal::ZERO {
        return Decimal::ONE;
    }
    staked.checked_div(underlying).unwrap_or(if staked.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

// ---------------------------------------------------------------------------
// RiskAssessor
// ---------------------------------------------------------------------------

/// Stateless risk assessor. Cheap to clone and safe to share across threads.
#[derive(Debug, Clone)]
pub struct RiskAssessor {
    risk: RiskConfig,
    params: StrategyParams,
    yield_model: YieldModel,
}

impl RiskAssessor {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            risk: config.risk.clone(),
            params: config.strategy_params().clone(),
            yield_model: YieldModel::from_config(&config.yield_model),
        }
    }

    pub fn yield_model(&self) -> &YieldModel {
        &self.yield_model
    }

    pub fn strategy_params(&self) -> &StrategyParams {
        &self.params
    }

    /// Assess a position report with optional market and gas context.
    pub fn assess(
        &self,
        position: &PositionReport,
        market: Option<&MarketReport>,
        gas: Option<&GasReport>,
    ) -> RiskAssessment {
        match position.snapshot() {
            Some(snapshot) => self.assess_snapshot(&snapshot, market, gas),
            None => {
                error!(
                    upstream_error = position.error.as_deref().unwrap_or("missing fields"),
                    "invalid position data"
                );
                RiskAssessment::critical_failure("Invalid position data")
            }
        }
    }

    /// Assess an already-validated snapshot.
    pub fn assess_snapshot(
        &self,
        position: &PositionSnapshot,
        market: Option<&MarketReport>,
        gas: Option<&GasReport>,
    ) -> RiskAssessment {
        if !position.has_position {
            return self.assess_no_position();
        }

        if let Some(label) = market.and_then(MarketReport::risk_label) {
            debug!(market_risk = label, "upstream market risk label");
        }

        let ctx = CheckContext {
            position,
            prices: market.and_then(MarketReport::prices),
            correlation: market.and_then(MarketReport::correlation),
            gas_gwei: gas.and_then(GasReport::gwei),
            risk: &self.risk,
            params: &self.params,
            yield_model: &self.yield_model,
        };

        let cascade = run_cascade(&ctx);
        let assessment = self.compile(position, cascade);
        log_assessment(&assessment);
        assessment
    }

    fn assess_no_position(&self) -> RiskAssessment {
        let net_apy = self.yield_model.net_apy(0);
        let is_profitable = net_apy > Decimal::ZERO;
        let (action, reason) = if is_profitable {
            (RebalanceAction::AddLoop, "Profitable to enter position")
        } else {
            (RebalanceAction::None, "No active position")
        };
        debug!(%net_apy, %action, "no active position");

        RiskAssessment {
            risk_level: RiskLevel::Safe,
            recommended_action: action,
            health_factor: Decimal::ZERO,
            distance_to_liquidation: NO_POSITION_DISTANCE,
            correlation: Decimal::ONE,
            price_decoupling_risk: Decimal::ZERO,
            net_apy,
            gas_acceptable: true,
            is_profitable,
            reasons: vec![reason.to_string()],
            metrics: BTreeMap::from([("net_apy".to_string(), net_apy)]),
        }
    }

    fn compile(&self, position: &PositionSnapshot, c: Cascade) -> RiskAssessment {
        let metrics: BTreeMap<String, Decimal> = [
            ("health_factor", position.health_factor),
            ("target_hf", self.params.target_hf),
            ("min_hf", self.params.min_hf),
            ("loops", Decimal::from(position.loops)),
            ("max_loops", Decimal::from(self.params.max_loops)),
            ("utilization", c.utilization),
            ("distance_to_liquidation", position.distance_to_liquidation),
            ("correlation", c.correlation),
            ("price_decoupling_risk", c.price_decoupling),
            ("current_net_apy", c.current_net_apy),
            ("next_loop_apy", c.next_loop_apy),
            ("total_collateral", position.total_collateral),
            ("total_debt", position.total_debt),
            ("available_borrows", position.available_borrows),
            ("staking_apy", self.yield_model.staking_apy),
            ("supply_apy", self.yield_model.supply_apy),
            ("borrow_apy", self.yield_model.borrow_apy),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        RiskAssessment {
            risk_level: c.level,
            recommended_action: c.action,
            health_factor: position.health_factor,
            distance_to_liquidation: position.distance_to_liquidation,
            correlation: c.correlation,
            price_decoupling_risk: c.price_decoupling,
            net_apy: c.current_net_apy,
            gas_acceptable: c.gas_acceptable,
            is_profitable: c.current_net_apy > Decimal::ZERO,
            reasons: c.reasons,
            metrics,
        }
    }
}

fn run_cascade(ctx: &CheckContext<'_>) -> Cascade {
    CHECKS.iter().fold(Cascade::new(), |acc, (name, check)| {
        let before = acc.reasons.len();
        let mut next = check(ctx, acc);
        if next.reasons.len() > before {
            debug!(check = name, level = %next.level, action = %next.action, "check fired");
        }
        next.trail.push((name, next.level));
        next
    })
}

fn log_assessment(a: &RiskAssessment) {
    let reasons = a.reasons.join("; ");
    match a.risk_level {
        RiskLevel::Critical => error!(
            level = %a.risk_level,
            action = %a.recommended_action,
            health_factor = %a.health_factor,
            %reasons,
            "risk assessment"
        ),
        RiskLevel::Danger | RiskLevel::Warning => warn!(
            level = %a.risk_level,
            action = %a.recommended_action,
            health_factor = %a.health_factor,
            %reasons,
            "risk assessment"
        ),
        RiskLevel::Safe => info!(
            level = %a.risk_level,
            action = %a.recommended_action,
            health_factor = %a.health_factor,
            "risk assessment"
        ),
    }
}
