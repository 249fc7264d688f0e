use profit_core::calculations::common::round_whole;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Error returned when user input cannot be read as a number.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid number '{input}'")]
pub struct ParseNumberError {
    input: String,
}

/// Digit group separator used in currency output (no-break space).
const GROUP_SEPARATOR: char = '\u{a0}';

/// Normalizes number input: trims, drops a trailing `%` and group
/// separators, and turns a decimal comma into a point.
fn normalize_number_input(s: &str) -> String {
    s.trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}'))
        .map(|c| if c == ',' { '.' } else { c })
        .collect()
}

/// Parses a number typed by a user.
///
/// Accepts a decimal comma (`"12,5"`) and a trailing `%`. Empty input is 0.
/// Non-finite values are rejected.
pub fn try_parse_number(s: &str) -> Result<f64, ParseNumberError> {
    let normalized = normalize_number_input(s);
    if normalized.is_empty() {
        return Ok(0.0);
    }
    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseNumberError {
            input: s.to_string(),
        })
}

/// Like [`try_parse_number`], but invalid input degrades to 0 with a warning.
pub fn parse_number(s: &str) -> f64 {
    try_parse_number(s).unwrap_or_else(|e| {
        tracing::warn!(input = %s, "{e}, using 0");
        0.0
    })
}

/// Formats an amount as whole hryvnias with grouped thousands, e.g.
/// `"120 000 ₴"`.
pub fn format_uah(value: Decimal) -> String {
    let rounded = round_whole(value);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}{GROUP_SEPARATOR}₴")
}

/// Formats a fraction as a percentage: one decimal from 10% up, two below.
pub fn format_pct(value01: Decimal) -> String {
    let percent = value01 * Decimal::ONE_HUNDRED;
    let decimals = if percent.abs() >= Decimal::TEN { 1 } else { 2 };
    let rounded = percent.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}%", decimals as usize, rounded)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parse_number_accepts_decimal_comma() {
        assert_eq!(parse_number("12,5"), 12.5);
        assert_eq!(parse_number("12.5"), 12.5);
    }

    #[test]
    fn parse_number_strips_percent_and_grouping() {
        assert_eq!(parse_number("7%"), 7.0);
        assert_eq!(parse_number(" 120 000 "), 120000.0);
        assert_eq!(parse_number("120\u{a0}000"), 120000.0);
    }

    #[test]
    fn parse_number_degrades_invalid_to_zero() {
        assert_eq!(parse_number("abc"), 0.0);
        assert_eq!(parse_number("inf"), 0.0);
        assert_eq!(parse_number("NaN"), 0.0);
        assert_eq!(parse_number(""), 0.0);
    }

    #[test]
    fn try_parse_number_reports_input() {
        let err = try_parse_number("12x").unwrap_err();
        assert_eq!(err.to_string(), "invalid number '12x'");
    }

    #[test]
    fn format_uah_groups_thousands() {
        assert_eq!(format_uah(dec!(120000)), "120\u{a0}000\u{a0}₴");
        assert_eq!(format_uah(dec!(1234567.49)), "1\u{a0}234\u{a0}567\u{a0}₴");
        assert_eq!(format_uah(dec!(999)), "999\u{a0}₴");
    }

    #[test]
    fn format_uah_rounds_and_keeps_sign() {
        assert_eq!(format_uah(dec!(-4000)), "-4\u{a0}000\u{a0}₴");
        assert_eq!(format_uah(dec!(0.5)), "1\u{a0}₴");
        assert_eq!(format_uah(dec!(-0.4)), "0\u{a0}₴");
        assert_eq!(format_uah(dec!(11799.5)), "11\u{a0}800\u{a0}₴");
    }

    #[test]
    fn format_pct_switches_precision_at_ten_percent() {
        assert_eq!(format_pct(dec!(0.2383)), "23.8%");
        assert_eq!(format_pct(dec!(0.07)), "7.00%");
        assert_eq!(format_pct(dec!(0.10)), "10.0%");
        assert_eq!(format_pct(dec!(-0.5)), "-50.0%");
        assert_eq!(format_pct(dec!(0)), "0.00%");
    }
}
