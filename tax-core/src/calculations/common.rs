//! Shared arithmetic for relief and tax calculations.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary value to two decimal places, half-up.
///
/// Values at exactly 0.005 go away from zero, the usual convention for
/// currency.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(1260.004)), dec!(1260.00));
/// assert_eq!(round_half_up(dec!(1260.005)), dec!(1260.01));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Floors a value at zero.
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Clamps a claimed amount into `[0, cap]`.
///
/// Returns the clamped amount and whether the cap cut the claim down.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::clamp_to_cap;
///
/// assert_eq!(clamp_to_cap(dec!(12000), dec!(10000)), (dec!(10000), true));
/// assert_eq!(clamp_to_cap(dec!(-5), dec!(10000)), (dec!(0), false));
/// ```
pub fn clamp_to_cap(
    value: Decimal,
    cap: Decimal,
) -> (Decimal, bool) {
    let floored = non_negative(value);
    if floored > cap {
        (cap, true)
    } else {
        (floored, false)
    }
}
