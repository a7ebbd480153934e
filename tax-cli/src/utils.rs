use thiserror::Error;

use tax_core::calculations::{ReliefClaim, ReliefError};

/// Error returned when a `--relief` argument is not `category=value`.
#[derive(Debug, Error)]
pub enum ReliefArgError {
    #[error("expected CATEGORY=VALUE, got '{0}'")]
    MissingValue(String),

    #[error(transparent)]
    Relief(#[from] ReliefError),
}

/// Parses a relief argument such as `medical=1,200` or `child_under_18=2`.
///
/// Only the category key is checked here; the value is validated when the
/// claims are aggregated.
pub fn parse_relief_arg(s: &str) -> Result<ReliefClaim, ReliefArgError> {
    let (category, value) = s
        .split_once('=')
        .ok_or_else(|| ReliefArgError::MissingValue(s.to_string()))?;
    if value.trim().is_empty() {
        return Err(ReliefArgError::MissingValue(s.to_string()));
    }
    Ok(ReliefClaim::from_parts(category.trim(), value.trim())?)
}
