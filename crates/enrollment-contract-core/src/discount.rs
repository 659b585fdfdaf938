use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{round_money, Money, Percent};

const HUNDRED: Decimal = dec!(100);

/// Apply a percentage discount to a USD base, rounded for submission.
///
/// Out-of-range percentages are clamped into `[0, 100]`. This is only a last
/// line of defence: the contract validator rejects such values before any
/// payload is built. Whether a reason accompanies the discount is likewise
/// checked by the validator, not here.
pub fn apply_discount(base_usd: Money, percent: Percent) -> Money {
    let pct = percent.clamp(Decimal::ZERO, HUNDRED);
    round_money(base_usd * (Decimal::ONE - pct / HUNDRED))
}

/// True when `percent` is an acceptable discount: 0, or within `(0, 100]`.
pub fn is_valid_percentage(percent: Percent) -> bool {
    percent >= Decimal::ZERO && percent <= HUNDRED
}
