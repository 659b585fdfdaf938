use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::due_date::add_months;
use crate::types::*;
use crate::ContractResult;

/// One user-editable installment of a manual schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualSlot {
    pub installment_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_amount_usd: Option<Money>,
}

/// Request to rebuild slots, as read from JSON by the CLI and bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildSlotsInput {
    #[serde(default)]
    pub existing: Vec<ManualSlot>,
    pub installments_count: u32,
    pub installments_start_date: NaiveDate,
}

/// Request to fill the empty slots of a manual schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillEvenInput {
    pub slots: Vec<ManualSlot>,
    pub final_amount_usd: Money,
}

/// Materialise exactly `new_count` slots numbered `1..=new_count`.
///
/// Slots whose number already exists in `existing` keep their due date and
/// amount verbatim. New numbers get `start_date + (number - 1)` months and no
/// amount. Anything numbered above `new_count` is dropped.
pub fn rebuild_slots(
    existing: &[ManualSlot],
    new_count: u32,
    start_date: NaiveDate,
) -> ContractResult<Vec<ManualSlot>> {
    let by_number: BTreeMap<u32, &ManualSlot> = existing
        .iter()
        .map(|slot| (slot.installment_number, slot))
        .collect();

    (1..=new_count)
        .map(|number| -> ContractResult<ManualSlot> {
            let slot = match by_number.get(&number) {
                Some(kept) => ManualSlot {
                    installment_number: number,
                    due_date: kept.due_date,
                    planned_amount_usd: kept.planned_amount_usd,
                },
                None => ManualSlot {
                    installment_number: number,
                    due_date: Some(add_months(start_date, number - 1)?),
                    planned_amount_usd: None,
                },
            };
            Ok(slot)
        })
        .collect()
}

/// Sum of the amounts entered so far. Unset amounts count as zero.
pub fn allocated_total(slots: &[ManualSlot]) -> Money {
    slots
        .iter()
        .filter_map(|slot| slot.planned_amount_usd)
        .sum()
}

/// Split whatever is left of `final_amount_usd` across the slots that have no
/// amount yet. Amounts already entered are not touched.
///
/// Shares are truncated to cents and the last unset slot takes the residue,
/// so the filled schedule reconciles exactly. Nothing changes when every slot
/// already has an amount or nothing is left to allocate. When the remainder is
/// less than one cent per open slot, only the last open slot is filled and the
/// others stay unset rather than receiving 0.00.
pub fn fill_even_amounts(slots: &[ManualSlot], final_amount_usd: Money) -> Vec<ManualSlot> {
    let mut filled = slots.to_vec();
    let remaining = round_money(final_amount_usd) - allocated_total(slots);
    let open: Vec<usize> = filled
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.planned_amount_usd.is_none())
        .map(|(idx, _)| idx)
        .collect();

    if open.is_empty() || remaining <= Decimal::ZERO {
        return filled;
    }

    let share = (remaining / Decimal::from(open.len()))
        .round_dp_with_strategy(MONEY_DP, RoundingStrategy::ToZero);
    if share.is_zero() {
        if let Some(&last) = open.last() {
            filled[last].planned_amount_usd = Some(remaining);
        }
        return filled;
    }
    let mut distributed = Decimal::ZERO;

    for (pos, idx) in open.iter().enumerate() {
        let amount = if pos == open.len() - 1 {
            remaining - distributed
        } else {
            share
        };
        distributed += amount;
        filled[*idx].planned_amount_usd = Some(amount);
    }

    filled
}
