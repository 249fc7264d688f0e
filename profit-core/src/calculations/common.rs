//! Sanitizing arithmetic shared by the waterfall and the state setters.
//!
//! Nothing in here can fail. Non-finite input becomes zero, finite input
//! beyond the decimal range saturates at [`Decimal::MAX`] or [`Decimal::MIN`],
//! and arithmetic saturates instead of panicking.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

/// Converts user-supplied floating point input into a [`Decimal`].
///
/// NaN and infinities map to zero. Finite magnitudes beyond the decimal range
/// saturate at the nearest bound.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use profit_core::calculations::common::sanitize;
///
/// assert_eq!(sanitize(0.5), dec!(0.5));
/// assert_eq!(sanitize(f64::NAN), dec!(0));
/// assert_eq!(sanitize(f64::INFINITY), dec!(0));
/// assert_eq!(sanitize(1e30), rust_decimal::Decimal::MAX);
/// ```
pub fn sanitize(value: f64) -> Decimal {
    if !value.is_finite() {
        return Decimal::ZERO;
    }
    match Decimal::from_f64(value) {
        Some(decimal) => decimal,
        None if value > 0.0 => Decimal::MAX,
        None => Decimal::MIN,
    }
}

/// Returns the maximum of two decimal values.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use profit_core::calculations::common::max;
///
/// assert_eq!(max(dec!(100.00), dec!(200.00)), dec!(200.00));
/// assert_eq!(max(dec!(-100.00), dec!(-200.00)), dec!(-100.00));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Floors a value at zero.
pub fn non_negative(value: Decimal) -> Decimal {
    max(value, Decimal::ZERO)
}

/// Clamps a fraction into `[0, 1]`.
pub fn clamp_fraction(value: Decimal) -> Decimal {
    value.clamp(Decimal::ZERO, Decimal::ONE)
}

/// `a + b`, saturating at the decimal bounds.
pub fn add(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    a.saturating_add(b)
}

/// `a - b`, saturating at the decimal bounds.
pub fn sub(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    a.saturating_sub(b)
}

/// `a * b`, saturating at the decimal bounds.
pub fn mul(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    a.saturating_mul(b)
}

/// `numerator / denominator`, or zero when the denominator is zero or the
/// quotient does not fit.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use profit_core::calculations::common::ratio;
///
/// assert_eq!(ratio(dec!(2000), dec!(8000)), dec!(0.25));
/// assert_eq!(ratio(dec!(2000), dec!(0)), dec!(0));
/// ```
pub fn ratio(
    numerator: Decimal,
    denominator: Decimal,
) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// Rounds a currency amount to whole units, half away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use profit_core::calculations::common::round_whole;
///
/// assert_eq!(round_whole(dec!(11799.5)), dec!(11800));
/// assert_eq!(round_whole(dec!(-0.5)), dec!(-1));
/// ```
pub fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}
