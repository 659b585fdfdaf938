use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::contract::draft::ContractDraft;
use crate::currency;
use crate::discount::apply_discount;
use crate::types::*;
use crate::ContractResult;

/// Totals derived from a draft. Never stored apart from the draft that
/// produced them; call [`derive_amounts`] again after every edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedAmounts {
    /// USD equivalent of the entered total, before discount
    pub total_amount_usd: Money,
    /// Payable amount after discount
    pub final_amount_usd: Money,
    /// `final_amount_usd` in SYP at the enrollment rate; zero for USD contracts
    pub final_amount_syp: Money,
}

/// Compute the derived totals of a draft, rounded for submission.
///
/// A missing total is treated as zero so partially filled drafts can still be
/// summarised. A SYP contract without a positive rate fails with
/// [`InvalidRate`](crate::ContractError::InvalidRate).
pub fn derive_amounts(draft: &ContractDraft) -> ContractResult<DerivedAmounts> {
    let entered = draft.total_amount_input.unwrap_or_default();
    let total_usd = round_money(currency::to_usd_for(
        entered,
        draft.currency,
        draft.exchange_rate_at_enrollment,
        "exchange_rate_at_enrollment",
    )?);
    let final_usd = apply_discount(total_usd, draft.discount());
    let final_syp = match draft.enrollment_rate() {
        Some(rate) => round_money(final_usd * rate),
        None => Decimal::ZERO,
    };

    Ok(DerivedAmounts {
        total_amount_usd: total_usd,
        final_amount_usd: final_usd,
        final_amount_syp: final_syp,
    })
}
