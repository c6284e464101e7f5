//! Field validation shared by manual entry and CSV import

use thiserror::Error;

use crate::constants::{COMMISSION_MAX_DECIMAL_PLACES, COMMISSION_MAX_VALUE};
use crate::format;

/// Reasons a commission value is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommissionError {
    #[error("Commission must be a valid number")]
    NotANumber,

    #[error("Commission cannot be negative")]
    Negative,

    #[error("Commission can have at most {} decimal places", COMMISSION_MAX_DECIMAL_PLACES)]
    TooManyDecimals,

    #[error("Commission value is too large (maximum: {})", COMMISSION_MAX_VALUE)]
    TooLarge,
}

/// Reasons an amount is rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AmountError {
    #[error("Amount must be a valid number (got '{0}')")]
    NotANumber(String),

    #[error("Amount cannot be negative")]
    Negative,
}

/// Validate a commission entry.
///
/// Blank input is valid and means zero. Otherwise the value must be a plain
/// decimal number (optional sign, digits, optional fraction, optional exponent),
/// non-negative, with at most two fractional digits and no larger than
/// 999,999,999.99. Checks run in that order, so `"-1.234"` reports the sign.
pub fn validate_commission(input: &str) -> Result<f64, CommissionError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }

    if !is_plain_number(trimmed) {
        return Err(CommissionError::NotANumber);
    }
    let value: f64 = trimmed.parse().map_err(|_| CommissionError::NotANumber)?;

    if value < 0.0 {
        return Err(CommissionError::Negative);
    }

    if fraction_digits(trimmed) > COMMISSION_MAX_DECIMAL_PLACES {
        return Err(CommissionError::TooManyDecimals);
    }

    if value > COMMISSION_MAX_VALUE {
        return Err(CommissionError::TooLarge);
    }

    Ok(value)
}

/// Parse an amount entry. Currency symbol, grouping commas and spaces are ignored.
pub fn parse_amount(input: &str) -> Result<f64, AmountError> {
    let value: f64 = format::strip_currency(input)
        .parse()
        .map_err(|_| AmountError::NotANumber(input.trim().to_string()))?;

    if !value.is_finite() {
        return Err(AmountError::NotANumber(input.trim().to_string()));
    }
    if value < 0.0 {
        return Err(AmountError::Negative);
    }
    Ok(value)
}

/// Matches `-?\d*\.?\d+([eE][+-]?\d+)?`
fn is_plain_number(s: &str) -> bool {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let (mantissa, exponent) = split_exponent(unsigned);

    if let Some(exp) = exponent {
        let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        if !is_digits(digits) {
            return false;
        }
    }

    match mantissa.split_once('.') {
        Some((int, frac)) => (int.is_empty() || is_digits(int)) && is_digits(frac),
        None => is_digits(mantissa),
    }
}

/// Fractional digits of the value once the exponent is applied ("1.5e-1" -> 2)
fn fraction_digits(s: &str) -> usize {
    let (mantissa, exponent) = split_exponent(s);
    let written = mantissa.split_once('.').map(|(_, frac)| frac.len()).unwrap_or(0);

    // Exponents too long for i64 saturate; the value check rejects the large ones
    let shift = match exponent {
        Some(exp) => exp
            .parse::<i64>()
            .unwrap_or(if exp.starts_with('-') { i64::MIN } else { i64::MAX }),
        None => 0,
    };

    i64::try_from(written)
        .unwrap_or(i64::MAX)
        .saturating_sub(shift)
        .max(0) as usize
}

fn split_exponent(s: &str) -> (&str, Option<&str>) {
    match s.find(['e', 'E']) {
        Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
        None => (s, None),
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
