//! Net-APY estimator for looped staking.
//!
//! Each loop borrows `LOOP_LTV` of the current staked balance and restakes it,
//! so exposure compounds: 1.0 → 1.44 → 2.0736 → ... The position earns staking
//! and supply yield on the whole exposure and pays borrow interest on the
//! accumulated debt.

use rust_decimal::Decimal;

use crate::config::YieldConfig;
use crate::constants::LOOP_LTV;

/// Leverage and debt ratio after `loops` iterations, per unit of capital.
///
/// Saturates at `Decimal::MAX`; iteration stops once leverage saturates or a
/// loop no longer borrows anything.
pub fn leverage_after(loops: u32, ltv: Decimal) -> (Decimal, Decimal) {
    let mut leverage = Decimal::ONE;
    let mut debt_ratio = Decimal::ZERO;
    for _ in 0..loops {
        let borrowed = leverage.saturating_mul(ltv);
        if borrowed.is_zero() {
            break;
        }
        leverage = leverage.saturating_add(borrowed);
        debt_ratio = debt_ratio.saturating_add(borrowed);
        if leverage == Decimal::MAX {
            break;
        }
    }
    (leverage, debt_ratio)
}

#[derive(Debug, Clone, PartialEq)]
pub struct YieldModel {
    pub staking_apy: Decimal,
    pub supply_apy: Decimal,
    pub borrow_apy: Decimal,
    pub ltv: Decimal,
}

impl YieldModel {
    pub fn from_config(config: &YieldConfig) -> Self {
        Self {
            staking_apy: config.staking_apy,
            supply_apy: config.supply_apy,
            borrow_apy: config.borrow_apy,
            ltv: LOOP_LTV,
        }
    }

    /// Annualized net yield of a position with `loops` open loops.
    ///
    /// With no loops the capital is only staked, so only the staking APY
    /// applies (no supply yield either).
    pub fn net_apy(&self, loops: u32) -> Decimal {
        if loops == 0 {
            return self.staking_apy;
        }
        let (leverage, debt_ratio) = leverage_after(loops, self.ltv);
        let gross = self.staking_apy.saturating_add(self.supply_apy).saturating_mul(leverage);
        gross.saturating_sub(self.borrow_apy.saturating_mul(debt_ratio))
    }
}

impl Default for YieldModel {
    fn default() -> Self {
        Self::from_config(&YieldConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_loops_is_staking_apy() {
        let model = YieldModel::default();
        assert_eq!(model.net_apy(0), dec!(0.08));
    }

    #[test]
    fn test_one_loop() {
        // leverage 1.44, debt 0.44 → 0.10 * 1.44 - 0.05 * 0.44 = 0.122
        let model = YieldModel::default();
        assert_eq!(model.net_apy(1), dec!(0.122));
    }

    #[test]
    fn test_leverage_compounds() {
        assert_eq!(leverage_after(0, LOOP_LTV), (dec!(1), dec!(0)));
        assert_eq!(leverage_after(1, LOOP_LTV), (dec!(1.44), dec!(0.44)));
        // 1.44 * 0.44 = 0.6336
        assert_eq!(leverage_after(2, LOOP_LTV), (dec!(2.0736), dec!(1.0736)));
    }

    #[test]
    fn test_two_loops() {
        // 0.10 * 2.0736 - 0.05 * 1.0736 = 0.20736 - 0.05368 = 0.15368
        let model = YieldModel::default();
        assert_eq!(model.net_apy(2), dec!(0.15368));
    }

    #[test]
    fn test_borrow_cost_above_yield_loses_money() {
        let model = YieldModel {
            staking_apy: dec!(0.02),
            supply_apy: dec!(0.0),
            borrow_apy: dec!(0.12),
            ltv: LOOP_LTV,
        };
        // 0.02 * 1.44 - 0.12 * 0.44 = 0.0288 - 0.0528
        assert_eq!(model.net_apy(1), dec!(-0.024));
        assert!(model.net_apy(2) < model.net_apy(1));
    }

    #[test]
    fn test_leverage_saturates_instead_of_overflowing() {
        let (leverage, debt) = leverage_after(200, LOOP_LTV);
        assert_eq!(leverage, Decimal::MAX);
        assert!(debt > Decimal::ZERO);
        assert_eq!(leverage_after(u32::MAX, LOOP_LTV).0, Decimal::MAX);
    }

    #[test]
    fn test_net_apy_finite_for_huge_loop_counts() {
        let model = YieldModel::default();
        for loops in [200, 1_000, u32::MAX] {
            let apy = model.net_apy(loops);
            assert!(apy > Decimal::ZERO, "loops {loops}: {apy}");
            assert!(apy < Decimal::MAX);
        }
    }

    #[test]
    fn test_zero_ltv_stops_immediately() {
        assert_eq!(leverage_after(u32::MAX, Decimal::ZERO), (dec!(1), dec!(0)));
    }

    proptest! {
        #[test]
        fn net_apy_increases_with_loops_when_carry_positive(
            staking_bps in 0u32..2000,
            supply_bps in 0u32..500,
            borrow_bps in 0u32..2000,
            loops in 0u32..6,
        ) {
            let staking = Decimal::from(staking_bps) / dec!(10000);
            let supply = Decimal::from(supply_bps) / dec!(10000);
            let borrow = Decimal::from(borrow_bps) / dec!(10000);
            prop_assume!(staking + supply > borrow);
            let model = YieldModel { staking_apy: staking, supply_apy: supply, borrow_apy: borrow, ltv: LOOP_LTV };
            prop_assert!(model.net_apy(loops + 1) > model.net_apy(loops));
        }
    }
}
