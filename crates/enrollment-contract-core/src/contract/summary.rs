use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::contract::derived::{derive_amounts, DerivedAmounts};
use crate::contract::draft::ContractDraft;
use crate::contract::validation::{validate_contract, ValidationReport};
use crate::discount::is_valid_percentage;
use crate::schedule::manual::allocated_total;
use crate::schedule::Schedule;
use crate::types::*;
use crate::ContractResult;

/// A draft plus whatever schedule is currently attached to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryInput {
    pub draft: ContractDraft,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
}

/// Read-only picture of where a contract stands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractSummary {
    /// `None` while the amounts cannot be derived (e.g. SYP without a rate)
    pub derived: Option<DerivedAmounts>,
    pub installment_count: usize,
    pub scheduled_total_usd: Money,
    /// Final amount not yet covered by installments; negative when over
    pub remaining_usd: Money,
    pub validation: ValidationReport,
}

/// Summarise a draft: derived totals, schedule coverage and the verdict of
/// the full validator.
pub fn summarize_contract(
    input: &SummaryInput,
) -> ContractResult<ComputationOutput<ContractSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let draft = &input.draft;

    let derived = match derive_amounts(draft) {
        Ok(d) => Some(d),
        Err(e) => {
            warnings.push(format!("Amounts not derived: {e}"));
            None
        }
    };

    if let Some(pct) = draft.discount_percentage {
        if !is_valid_percentage(pct) {
            warnings.push(format!(
                "Discount {pct}% is outside 0..=100; derived amounts use the clamped value"
            ));
        }
    }

    let scheduled_total_usd = match (&input.schedule, draft.mode) {
        (Some(Schedule::Manual(slots)), ScheduleMode::Manual) => allocated_total(slots),
        (Some(Schedule::Projected(p)), ScheduleMode::Automatic) => p.total_usd(),
        (Some(_), mode) => {
            warnings.push(format!(
                "Attached schedule does not belong to {mode:?} mode and is ignored"
            ));
            Decimal::ZERO
        }
        (None, _) => Decimal::ZERO,
    };
    let installment_count = input.schedule.as_ref().map_or(0, Schedule::len);

    let final_usd = derived.map_or(Decimal::ZERO, |d| d.final_amount_usd);
    let validation = ValidationReport::from(&validate_contract(draft, input.schedule.as_ref()));

    let output = ContractSummary {
        derived,
        installment_count,
        scheduled_total_usd,
        remaining_usd: round_money(final_usd - scheduled_total_usd),
        validation,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Enrollment contract summary",
        &serde_json::json!({
            "currency": draft.currency,
            "mode": draft.mode,
            "discount_percentage": draft.discount().to_string(),
            "rounding": "2dp, half away from zero",
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::manual::{rebuild_slots, ManualSlot};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn draft() -> ContractDraft {
        ContractDraft {
            total_amount_input: Some(dec!(1000)),
            discount_percentage: Some(dec!(10)),
            discount_reason: Some("Staff child".into()),
            agreed_at: NaiveDate::from_ymd_opt(2024, 3, 1),
            installments_start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            mode: ScheduleMode::Manual,
            installments_count: Some(3),
            ..Default::default()
        }
    }

    #[test]
    fn test_partial_schedule_reports_remaining() {
        let mut slots = rebuild_slots(&[], 3, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).unwrap();
        slots[0].planned_amount_usd = Some(dec!(300));
        let input = SummaryInput {
            draft: draft(),
            schedule: Some(Schedule::Manual(slots)),
        };
        let out = summarize_contract(&input).unwrap();
        let s = &out.result;
        assert_eq!(s.installment_count, 3);
        assert_eq!(s.scheduled_total_usd, dec!(300));
        assert_eq!(s.remaining_usd, dec!(600));
        assert!(!s.validation.valid);
        assert_eq!(s.validation.field.as_deref(), Some("installments"));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_over_allocation_is_negative_remaining() {
        let slots: Vec<ManualSlot> = (1..=3)
            .map(|n| ManualSlot {
                installment_number: n,
                due_date: NaiveDate::from_ymd_opt(2024, 2 + n, 1),
                planned_amount_usd: Some(dec!(310)),
            })
            .collect();
        let out = summarize_contract(&SummaryInput {
            draft: draft(),
            schedule: Some(Schedule::Manual(slots)),
        })
        .unwrap();
        assert_eq!(out.result.remaining_usd, dec!(-30));
    }

    #[test]
    fn test_syp_without_rate_warns() {
        let mut d = draft();
        d.currency = Currency::SYP;
        let out = summarize_contract(&SummaryInput {
            draft: d,
            schedule: None,
        })
        .unwrap();
        assert!(out.result.derived.is_none());
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(
            out.result.validation.field.as_deref(),
            Some("exchange_rate_at_enrollment")
        );
    }

    #[test]
    fn test_out_of_range_discount_warns() {
        let mut d = draft();
        d.discount_percentage = Some(dec!(140));
        let out = summarize_contract(&SummaryInput {
            draft: d,
            schedule: None,
        })
        .unwrap();
        assert_eq!(out.result.derived.unwrap().final_amount_usd, Decimal::ZERO);
        assert!(out.warnings[0].contains("clamped"));
        assert_eq!(
            out.result.validation.field.as_deref(),
            Some("discount_percentage")
        );
    }
}
