//! Parsing of raw user-entered amounts.
//!
//! The caller owns any re-prompting; these functions only accept or reject.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    NotANumber,
    Negative,
    NotAWholeNumber,
}

/// A raw input value that could not be accepted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field} {reason}")]
pub struct ValidationError {
    pub field: String,
    pub value: String,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: ValidationReason,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            reason,
        }
    }
}

impl std::fmt::Display for ValidationReason {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(match self {
            Self::NotANumber => "must be a valid number",
            Self::Negative => "cannot be negative",
            Self::NotAWholeNumber => "must be a whole number",
        })
    }
}

/// Trims whitespace and drops thousands separators.
fn normalize(raw: &str) -> String {
    raw.trim().replace(',', "")
}

/// Parses a non-negative monetary amount such as `"1,234.56"`.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::input::parse_amount;
///
/// assert_eq!(parse_amount("medical", " 1,250.50 ").unwrap(), dec!(1250.50));
/// assert!(parse_amount("medical", "-1").is_err());
/// assert!(parse_amount("medical", "lots").is_err());
/// ```
pub fn parse_amount(
    field: &str,
    raw: &str,
) -> Result<Decimal, ValidationError> {
    let normalized = normalize(raw);
    let value = normalized
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&normalized))
        .map_err(|_| ValidationError::new(field, raw, ValidationReason::NotANumber))?;

    if value.is_zero() {
        return Ok(Decimal::ZERO);
    }
    if value.is_sign_negative() {
        return Err(ValidationError::new(field, raw, ValidationReason::Negative));
    }

    Ok(value)
}

/// Parses a non-negative whole count, such as a number of children.
pub fn parse_units(
    field: &str,
    raw: &str,
) -> Result<u32, ValidationError> {
    let value = parse_amount(field, raw)?;

    if !value.fract().is_zero() {
        return Err(ValidationError::new(
            field,
            raw,
            ValidationReason::NotAWholeNumber,
        ));
    }

    value
        .to_u32()
        .ok_or_else(|| ValidationError::new(field, raw, ValidationReason::NotAWholeNumber))
}

/// Rejects an already-parsed negative amount.
pub fn ensure_non_negative(
    field: &str,
    value: Decimal,
) -> Result<Decimal, ValidationError> {
    if value < Decimal::ZERO {
        Err(ValidationError::new(
            field,
            value.to_string(),
            ValidationReason::Negative,
        ))
    } else {
        Ok(value)
    }
}
