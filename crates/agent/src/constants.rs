use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Yield model
// ---------------------------------------------------------------------------

/// Loan-to-value borrowed against the freshly staked balance on every loop.
pub const LOOP_LTV: Decimal = dec!(0.44);

pub const DEFAULT_STAKING_APY: Decimal = dec!(0.08);
pub const DEFAULT_SUPPLY_APY: Decimal = dec!(0.02);
pub const DEFAULT_BORROW_APY: Decimal = dec!(0.05);

/// Minimum net APY for another loop to be worth its gas.
pub const MIN_ADD_LOOP_APY: Decimal = dec!(0.01);

/// Health factor headroom above target required before adding a loop.
pub const ADD_LOOP_HF_MARGIN: Decimal = dec!(0.3);

// ---------------------------------------------------------------------------
// Cascade thresholds
// ---------------------------------------------------------------------------

/// Peg deviation above which the position is in danger.
pub const PEG_DEVIATION_DANGER: Decimal = dec!(0.05);
/// Peg deviation above which the position warrants a warning.
pub const PEG_DEVIATION_WARNING: Decimal = dec!(0.02);

/// Correlation below which the pair is treated as decoupled.
pub const CORRELATION_DANGER: Decimal = dec!(0.85);
/// Correlation assumed when no market report is available.
pub const DEFAULT_CORRELATION: Decimal = dec!(0.95);

pub const LIQUIDATION_DISTANCE_CRITICAL: Decimal = dec!(0.1);
pub const LIQUIDATION_DISTANCE_DANGER: Decimal = dec!(0.3);

/// Distance reported when there is no position to liquidate.
pub const NO_POSITION_DISTANCE: Decimal = dec!(999.0);

// ---------------------------------------------------------------------------
// Default configuration values
// ---------------------------------------------------------------------------

pub const DEFAULT_CRITICAL_HEALTH_FACTOR: Decimal = dec!(1.3);
pub const DEFAULT_CORRELATION_THRESHOLD: Decimal = dec!(0.85);
pub const DEFAULT_MAX_DEBT_UTILIZATION: Decimal = dec!(0.75);
pub const DEFAULT_MAX_GAS_PRICE_GWEI: Decimal = dec!(100);
pub const DEFAULT_ALERT_HISTORY_CAPACITY: usize = 100;

/// (target_hf, min_hf, rebalance_threshold) per strategy.
pub const CONSERVATIVE_HF_BAND: (Decimal, Decimal, Decimal) = (dec!(1.9), dec!(1.7), dec!(0.10));
pub const BALANCED_HF_BAND: (Decimal, Decimal, Decimal) = (dec!(1.7), dec!(1.5), dec!(0.15));
pub const MODERATE_HF_BAND: (Decimal, Decimal, Decimal) = (dec!(1.6), dec!(1.4), dec!(0.20));
pub const AGGRESSIVE_HF_BAND: (Decimal, Decimal, Decimal) = (dec!(1.5), dec!(1.3), dec!(0.25));
