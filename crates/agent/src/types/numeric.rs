//! Decimal helpers for values coming off the contract-execution tool.
//!
//! The tool prints numbers either as JSON numbers or as decimal strings, and
//! prints a health factor of `type(uint256).max / 1e18` when a user has no
//! debt. That value does not fit in a `Decimal`, so parsing saturates.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::de::{self, Deserializer, Visitor};

/// Parse a decimal string, saturating to `Decimal::MAX` / `Decimal::MIN` when
/// the value is numeric but out of range. Returns `None` for non-numeric input.
pub fn parse_decimal_saturating(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = Decimal::from_str(s) {
        return Some(d);
    }
    if let Ok(d) = Decimal::from_scientific(s) {
        return Some(d);
    }
    let as_float: f64 = s.parse().ok()?;
    if as_float.is_nan() {
        return None;
    }
    Decimal::from_f64(as_float).or(Some(if as_float.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    }))
}

/// `serde(deserialize_with = ...)` adapter accepting numbers or strings.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientDecimalVisitor)
}

struct LenientDecimalVisitor;

impl<'de> Visitor<'de> for LenientDecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        if v.is_nan() {
            return Err(E::custom("NaN is not a valid decimal"));
        }
        Ok(Decimal::from_f64(v).unwrap_or(if v.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        parse_decimal_saturating(v).ok_or_else(|| E::custom(format!("invalid decimal: {v:?}")))
    }
}

/// `serde(deserialize_with = ...)` adapter for counters printed as numbers or strings.
pub fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientU32Visitor)
}

struct LenientU32Visitor;

impl<'de> Visitor<'de> for LenientU32Visitor {
    type Value = u32;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or integer string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u32, E> {
        u32::try_from(v).map_err(|_| E::custom(format!("{v} out of range for u32")))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u32, E> {
        u32::try_from(v).map_err(|_| E::custom(format!("{v} out of range for u32")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u32, E> {
        v.trim()
            .parse()
            .map_err(|_| E::custom(format!("invalid integer: {v:?}")))
    }
}

/// Convert a percentage (e.g. `75.5`) to a fraction (`0.755`).
pub fn percent_to_fraction(pct: Decimal) -> Decimal {
    pct / dec!(100)
}

/// Render a fraction as a percentage with `places` decimals (`0.1234` → `12.34%`).
/// Fractions too large to scale render as `>MAX%` / `<MIN%` of `Decimal`.
pub fn fmt_pct(fraction: Decimal, places: usize) -> String {
    match fraction.checked_mul(dec!(100)) {
        Some(pct) => format!("{:.*}%", places, pct.round_dp(places as u32)),
        None if fraction.is_sign_negative() => format!("<{}%", Decimal::MIN),
        None => format!(">{}%", Decimal::MAX),
    }
}
