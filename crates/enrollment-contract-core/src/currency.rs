use rust_decimal::Decimal;

use crate::error::ContractError;
use crate::types::{Currency, Money, Rate};
use crate::ContractResult;

fn require_rate(rate: Option<Rate>, field: &str) -> ContractResult<Rate> {
    match rate {
        Some(r) if r > Decimal::ZERO => Ok(r),
        _ => Err(ContractError::InvalidRate {
            field: field.into(),
        }),
    }
}

/// Convert an amount entered in `currency` to its USD equivalent.
///
/// USD amounts pass through untouched and ignore `rate`. SYP amounts are
/// divided by the rate at full precision; callers round with
/// [`round_money`](crate::types::round_money) when the figure is submitted.
pub fn to_usd(amount: Money, currency: Currency, rate: Option<Rate>) -> ContractResult<Money> {
    to_usd_for(amount, currency, rate, "exchange_rate")
}

/// Same as [`to_usd`], reporting a bad rate against `rate_field`.
pub fn to_usd_for(
    amount: Money,
    currency: Currency,
    rate: Option<Rate>,
    rate_field: &str,
) -> ContractResult<Money> {
    match currency {
        Currency::USD => Ok(amount),
        Currency::SYP => {
            let rate = require_rate(rate, rate_field)?;
            Ok(amount / rate)
        }
    }
}

/// Convert a USD amount into `currency`. Inverse of [`to_usd`].
pub fn from_usd(usd: Money, currency: Currency, rate: Option<Rate>) -> ContractResult<Money> {
    match currency {
        Currency::USD => Ok(usd),
        Currency::SYP => {
            let rate = require_rate(rate, "exchange_rate")?;
            Ok(usd * rate)
        }
    }
}
