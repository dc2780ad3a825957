//! Rounding helpers shared by the calculators.
//!
//! Payroll procedure truncates at almost every stage: taxable income and
//! tariff results are cut to whole euros, intermediate tariff factors to six
//! decimal places, monthly amounts to whole cents. Social insurance
//! contributions are the exception and round half-up to the cent.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to two decimal places, values at exactly 0.005 away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use dienstwagen_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(444.075)), dec!(444.08));
/// assert_eq!(round_half_up(dec!(379.6125)), dec!(379.61));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Drops everything after `dp` decimal places, towards zero.
pub fn truncate_dp(
    value: Decimal,
    dp: u32,
) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::ToZero)
}

/// Cuts to whole euros.
///
/// ```
/// use rust_decimal_macros::dec;
/// use dienstwagen_core::calculations::common::truncate_euros;
///
/// assert_eq!(truncate_euros(dec!(14415.99)), dec!(14415));
/// ```
pub fn truncate_euros(value: Decimal) -> Decimal {
    truncate_dp(value, 0)
}

/// Cuts to whole cents.
pub fn truncate_cents(value: Decimal) -> Decimal {
    truncate_dp(value, 2)
}

/// Returns the larger of two values.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn round_half_up_rounds_midpoint_up() {
        assert_eq!(round_half_up(dec!(62.075)), dec!(62.08));
    }

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        assert_eq!(round_half_up(dec!(62.0749)), dec!(62.07));
    }

    #[test]
    fn round_half_up_handles_negative_values() {
        assert_eq!(round_half_up(dec!(-1.005)), dec!(-1.01));
    }

    #[test]
    fn truncate_cents_never_rounds_up() {
        assert_eq!(truncate_cents(dec!(1201.259)), dec!(1201.25));
        assert_eq!(truncate_cents(dec!(0.009)), dec!(0.00));
    }

    #[test]
    fn truncate_euros_cuts_towards_zero() {
        assert_eq!(truncate_euros(dec!(99.99)), dec!(99));
        assert_eq!(truncate_euros(dec!(-99.99)), dec!(-99));
    }

    #[test]
    fn truncate_dp_keeps_requested_places() {
        assert_eq!(truncate_dp(dec!(0.12345678), 6), dec!(0.123456));
        assert_eq!(truncate_dp(dec!(4.2557), 6), dec!(4.2557));
    }

    #[test]
    fn max_returns_larger_value() {
        assert_eq!(max(dec!(100.00), dec!(200.00)), dec!(200.00));
        assert_eq!(max(dec!(200.00), dec!(100.00)), dec!(200.00));
        assert_eq!(max(dec!(-1), dec!(0)), dec!(0));
    }
}
