use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::contract::derived::{derive_amounts, DerivedAmounts};
use crate::contract::draft::{ContractDraft, FirstPaymentDraft};
use crate::discount::is_valid_percentage;
use crate::schedule::manual::{allocated_total, ManualSlot};
use crate::schedule::{Installment, Schedule};
use crate::types::*;

/// Which side of the final amount a manual schedule lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discrepancy {
    Over,
    Under,
}

impl std::fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Discrepancy::Over => f.write_str("over"),
            Discrepancy::Under => f.write_str("under"),
        }
    }
}

/// First rule a contract breaks. Every variant belongs to one field of the
/// draft, see [`ValidationIssue::field`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("Agreement date is required")]
    MissingAgreedAt,

    #[error("Installments start date is required")]
    MissingStartDate,

    #[error("Installments start date {start} is before the agreement date {agreed_at}")]
    StartBeforeAgreement { start: NaiveDate, agreed_at: NaiveDate },

    #[error("Total amount must be greater than zero")]
    NonPositiveTotal,

    #[error("Exchange rate at enrollment must be greater than zero")]
    InvalidEnrollmentRate,

    #[error("Discount percentage {0} must be greater than 0 and at most 100")]
    DiscountOutOfRange(Percent),

    #[error("A discount reason is required when a discount is applied")]
    MissingDiscountReason,

    #[error("First payment branch is required")]
    MissingPaymentBranch,

    #[error("First payment receipt number is required")]
    MissingReceiptNumber,

    #[error("First payment date is required")]
    MissingPaidDate,

    #[error("First payment amount must be greater than zero")]
    NonPositivePayment { field: &'static str },

    #[error("First payment exchange rate must be greater than zero")]
    InvalidPaymentRate,

    #[error("Installments count must be at least 1")]
    MissingInstallmentsCount,

    #[error("Expected {expected} installments, found {actual}")]
    SlotCountMismatch { expected: u32, actual: usize },

    #[error("Installment numbering must run from 1 to {count}: position {position} holds number {found}")]
    NumberingGap { position: u32, found: u32, count: u32 },

    #[error("Installment {number} has no due date")]
    MissingDueDate { number: u32 },

    #[error("Installment {number} amount must be greater than zero")]
    NonPositiveInstallment { number: u32 },

    #[error("Installment {number} is due {due_date}, before the agreement date {agreed_at}")]
    DueBeforeAgreement {
        number: u32,
        due_date: NaiveDate,
        agreed_at: NaiveDate,
    },

    #[error("First installment is due {due_date}, before the installments start date {start}")]
    FirstDueBeforeStart { due_date: NaiveDate, start: NaiveDate },

    #[error("Installment {number} is due {due_date}, earlier than the previous installment ({previous})")]
    DueDateOutOfOrder {
        number: u32,
        due_date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("Installments total {actual:.2} is {direction} by {difference:.2} (final amount {expected:.2})")]
    ScheduleSumMismatch {
        expected: Money,
        actual: Money,
        difference: Money,
        direction: Discrepancy,
    },

    #[error("Preview the installment schedule before committing")]
    ScheduleNotPreviewed,

    #[error("The projected installment schedule is empty")]
    EmptySchedule,
}

impl ValidationIssue {
    /// Key of the draft field the message should be shown next to.
    pub fn field(&self) -> &'static str {
        use ValidationIssue::*;
        match self {
            MissingAgreedAt => "agreed_at",
            MissingStartDate | StartBeforeAgreement { .. } => "installments_start_date",
            NonPositiveTotal => "total_amount_input",
            InvalidEnrollmentRate => "exchange_rate_at_enrollment",
            DiscountOutOfRange(_) => "discount_percentage",
            MissingDiscountReason => "discount_reason",
            MissingPaymentBranch => "first_payment.institute_branch_id",
            MissingReceiptNumber => "first_payment.receipt_number",
            MissingPaidDate => "first_payment.paid_date",
            NonPositivePayment { field } => *field,
            InvalidPaymentRate => "first_payment.exchange_rate_at_payment",
            MissingInstallmentsCount => "installments_count",
            SlotCountMismatch { .. }
            | NumberingGap { .. }
            | MissingDueDate { .. }
            | NonPositiveInstallment { .. }
            | DueBeforeAgreement { .. }
            | FirstDueBeforeStart { .. }
            | DueDateOutOfOrder { .. }
            | ScheduleSumMismatch { .. }
            | ScheduleNotPreviewed
            | EmptySchedule => "installments",
        }
    }
}

/// Serializable verdict for reports and bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> From<&Result<T, ValidationIssue>> for ValidationReport {
    fn from(result: &Result<T, ValidationIssue>) -> Self {
        match result {
            Ok(_) => ValidationReport {
                valid: true,
                field: None,
                message: None,
            },
            Err(issue) => ValidationReport {
                valid: false,
                field: Some(issue.field().to_string()),
                message: Some(issue.to_string()),
            },
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

fn is_positive(value: Option<Decimal>) -> bool {
    value.is_some_and(|v| v > Decimal::ZERO)
}

/// Rules 1–4: dates, amounts, discount and first payment. This is the gate
/// for requesting a preview. Returns the derived totals on success.
pub fn validate_terms(draft: &ContractDraft) -> Result<DerivedAmounts, ValidationIssue> {
    // Rule 1: dates
    let agreed_at = draft.agreed_at.ok_or(ValidationIssue::MissingAgreedAt)?;
    let start = draft
        .installments_start_date
        .ok_or(ValidationIssue::MissingStartDate)?;
    if start < agreed_at {
        return Err(ValidationIssue::StartBeforeAgreement { start, agreed_at });
    }

    // Rule 2: contract amount and rate
    if !is_positive(draft.total_amount_input) {
        return Err(ValidationIssue::NonPositiveTotal);
    }
    if draft.currency == Currency::SYP && !is_positive(draft.exchange_rate_at_enrollment) {
        return Err(ValidationIssue::InvalidEnrollmentRate);
    }

    // Rule 3: discount
    if let Some(pct) = draft.discount_percentage.filter(|p| !p.is_zero()) {
        if !is_valid_percentage(pct) {
            return Err(ValidationIssue::DiscountOutOfRange(pct));
        }
        if is_blank(&draft.discount_reason) {
            return Err(ValidationIssue::MissingDiscountReason);
        }
    }

    // Rule 4: first payment
    if let Some(payment) = &draft.first_payment {
        validate_first_payment(payment)?;
    }

    derive_amounts(draft).map_err(|_| ValidationIssue::InvalidEnrollmentRate)
}

fn validate_first_payment(payment: &FirstPaymentDraft) -> Result<(), ValidationIssue> {
    if payment.institute_branch_id.is_none() {
        return Err(ValidationIssue::MissingPaymentBranch);
    }
    if is_blank(&payment.receipt_number) {
        return Err(ValidationIssue::MissingReceiptNumber);
    }
    if payment.paid_date.is_none() {
        return Err(ValidationIssue::MissingPaidDate);
    }
    if !is_positive(payment.entered_amount()) {
        return Err(ValidationIssue::NonPositivePayment {
            field: payment.amount_field(),
        });
    }
    if payment.currency == Currency::SYP && !is_positive(payment.exchange_rate_at_payment) {
        return Err(ValidationIssue::InvalidPaymentRate);
    }
    Ok(())
}

/// Full gate before commit: rules 1–6.
///
/// In manual mode the schedule must be [`Schedule::Manual`]; any other
/// schedule counts as zero slots. In automatic mode it must be a non-empty
/// [`Schedule::Projected`].
pub fn validate_contract(
    draft: &ContractDraft,
    schedule: Option<&Schedule>,
) -> Result<DerivedAmounts, ValidationIssue> {
    let derived = validate_terms(draft)?;

    match draft.mode {
        ScheduleMode::Manual => {
            let slots: &[ManualSlot] = match schedule {
                Some(Schedule::Manual(slots)) => slots,
                _ => &[],
            };
            validate_manual_slots(draft, slots, &derived)?;
        }
        ScheduleMode::Automatic => match schedule {
            Some(Schedule::Projected(projected)) => {
                validate_projected_installments(draft, &projected.installments)?
            }
            _ => return Err(ValidationIssue::ScheduleNotPreviewed),
        },
    }

    Ok(derived)
}

/// Rule 5 against an already validated set of terms.
fn validate_manual_slots(
    draft: &ContractDraft,
    slots: &[ManualSlot],
    derived: &DerivedAmounts,
) -> Result<(), ValidationIssue> {
    let count = draft
        .installments_count
        .filter(|c| *c > 0)
        .ok_or(ValidationIssue::MissingInstallmentsCount)?;
    if slots.len() != count as usize {
        return Err(ValidationIssue::SlotCountMismatch {
            expected: count,
            actual: slots.len(),
        });
    }

    for (position, slot) in (1..=count).zip(slots) {
        if slot.installment_number != position {
            return Err(ValidationIssue::NumberingGap {
                position,
                found: slot.installment_number,
                count,
            });
        }
    }

    // Rule 1 passed, so both dates are present.
    let agreed_at = draft.agreed_at.unwrap_or(NaiveDate::MIN);
    let start = draft.installments_start_date.unwrap_or(agreed_at);
    let mut previous: Option<NaiveDate> = None;

    for slot in slots {
        let number = slot.installment_number;
        let due_date = slot
            .due_date
            .ok_or(ValidationIssue::MissingDueDate { number })?;
        if !is_positive(slot.planned_amount_usd) {
            return Err(ValidationIssue::NonPositiveInstallment { number });
        }
        if due_date < agreed_at {
            return Err(ValidationIssue::DueBeforeAgreement {
                number,
                due_date,
                agreed_at,
            });
        }
        if number == 1 && due_date < start {
            return Err(ValidationIssue::FirstDueBeforeStart { due_date, start });
        }
        if let Some(previous) = previous.filter(|p| due_date < *p) {
            return Err(ValidationIssue::DueDateOutOfOrder {
                number,
                due_date,
                previous,
            });
        }
        previous = Some(due_date);
    }

    reconcile(slots, derived.final_amount_usd)
}

/// Rule 6 plus the numbering rules both modes share. Amounts belong to the
/// projection service and are not recomputed here.
pub fn validate_projected_installments(
    draft: &ContractDraft,
    installments: &[Installment],
) -> Result<(), ValidationIssue> {
    if installments.is_empty() {
        return Err(ValidationIssue::EmptySchedule);
    }

    let mut ordered: Vec<&Installment> = installments.iter().collect();
    ordered.sort_by_key(|i| i.installment_number);
    let count = u32::try_from(ordered.len()).unwrap_or(u32::MAX);
    for (position, installment) in (1..=count).zip(&ordered) {
        if installment.installment_number != position {
            return Err(ValidationIssue::NumberingGap {
                position,
                found: installment.installment_number,
                count,
            });
        }
    }

    if let (Some(first), Some(start)) = (ordered.first(), draft.installments_start_date) {
        if first.due_date < start {
            return Err(ValidationIssue::FirstDueBeforeStart {
                due_date: first.due_date,
                start,
            });
        }
    }
    Ok(())
}

/// Check that the slot amounts add up to `final_amount_usd`, to the cent.
pub fn reconcile(slots: &[ManualSlot], final_amount_usd: Money) -> Result<(), ValidationIssue> {
    let expected = round_money(final_amount_usd);
    let actual = round_money(allocated_total(slots));
    if actual == expected {
        return Ok(());
    }

    let direction = if actual > expected {
        Discrepancy::Over
    } else {
        Discrepancy::Under
    };
    Err(ValidationIssue::ScheduleSumMismatch {
        expected,
        actual,
        difference: (actual - expected).abs(),
        direction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::projected::{PreviewResponse, ProjectedSchedule};
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn usd_draft() -> ContractDraft {
        ContractDraft {
            currency: Currency::USD,
            total_amount_input: Some(dec!(1000)),
            discount_percentage: Some(dec!(10)),
            discount_reason: Some("Sibling discount".into()),
            agreed_at: Some(d(2024, 2, 20)),
            installments_start_date: Some(d(2024, 3, 1)),
            mode: ScheduleMode::Manual,
            installments_count: Some(2),
            ..Default::default()
        }
    }

    fn slot(number: u32, due: NaiveDate, amount: Money) -> ManualSlot {
        ManualSlot {
            installment_number: number,
            due_date: Some(due),
            planned_amount_usd: Some(amount),
        }
    }

    fn balanced() -> Schedule {
        Schedule::Manual(vec![
            slot(1, d(2024, 3, 1), dec!(450.00)),
            slot(2, d(2024, 4, 1), dec!(450.00)),
        ])
    }

    #[test]
    fn test_balanced_manual_schedule_passes() {
        let derived = validate_contract(&usd_draft(), Some(&balanced())).unwrap();
        assert_eq!(derived.final_amount_usd, dec!(900.00));
    }

    #[test]
    fn test_over_by_fifty() {
        let schedule = Schedule::Manual(vec![
            slot(1, d(2024, 3, 1), dec!(500)),
            slot(2, d(2024, 4, 1), dec!(450)),
        ]);
        let issue = validate_contract(&usd_draft(), Some(&schedule)).unwrap_err();
        assert!(issue.to_string().contains("over by 50.00"), "{issue}");
        assert_eq!(issue.field(), "installments");
    }

    #[test]
    fn test_under_by_one_cent() {
        let schedule = Schedule::Manual(vec![
            slot(1, d(2024, 3, 1), dec!(449.99)),
            slot(2, d(2024, 4, 1), dec!(450.00)),
        ]);
        match validate_contract(&usd_draft(), Some(&schedule)) {
            Err(ValidationIssue::ScheduleSumMismatch {
                difference,
                direction,
                ..
            }) => {
                assert_eq!(direction, Discrepancy::Under);
                assert_eq!(difference, dec!(0.01));
            }
            other => panic!("expected a sum mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_agreed_at_wins_over_everything() {
        let mut draft = usd_draft();
        draft.agreed_at = None;
        draft.total_amount_input = None;
        assert_eq!(
            validate_contract(&draft, None),
            Err(ValidationIssue::MissingAgreedAt)
        );
    }

    #[test]
    fn test_start_before_agreement() {
        let mut draft = usd_draft();
        draft.installments_start_date = Some(d(2024, 2, 1));
        let issue = validate_terms(&draft).unwrap_err();
        assert!(matches!(issue, ValidationIssue::StartBeforeAgreement { .. }));
        assert_eq!(issue.field(), "installments_start_date");
    }

    #[test]
    fn test_syp_requires_rate() {
        let mut draft = usd_draft();
        draft.currency = Currency::SYP;
        draft.exchange_rate_at_enrollment = None;
        assert_eq!(
            validate_terms(&draft),
            Err(ValidationIssue::InvalidEnrollmentRate)
        );
        draft.exchange_rate_at_enrollment = Some(Decimal::ZERO);
        assert_eq!(
            validate_terms(&draft),
            Err(ValidationIssue::InvalidEnrollmentRate)
        );
    }

    #[test]
    fn test_discount_needs_reason() {
        let mut draft = usd_draft();
        draft.discount_reason = Some("   ".into());
        assert_eq!(
            validate_terms(&draft),
            Err(ValidationIssue::MissingDiscountReason)
        );
    }

    #[test]
    fn test_discount_out_of_range_is_rejected_not_clamped() {
        let mut draft = usd_draft();
        draft.discount_percentage = Some(dec!(120));
        assert_eq!(
            validate_terms(&draft),
            Err(ValidationIssue::DiscountOutOfRange(dec!(120)))
        );
        draft.discount_percentage = Some(dec!(-5));
        assert!(matches!(
            validate_terms(&draft),
            Err(ValidationIssue::DiscountOutOfRange(_))
        ));
    }

    #[test]
    fn test_zero_discount_needs_no_reason() {
        let mut draft = usd_draft();
        draft.discount_percentage = Some(Decimal::ZERO);
        draft.discount_reason = None;
        assert!(validate_terms(&draft).is_ok());
    }

    #[test]
    fn test_first_payment_rules_in_order() {
        let mut draft = usd_draft();
        draft.first_payment = Some(FirstPaymentDraft::default());
        assert_eq!(
            validate_terms(&draft),
            Err(ValidationIssue::MissingPaymentBranch)
        );

        let payment = draft.first_payment.as_mut().unwrap();
        payment.institute_branch_id = Some(3);
        payment.receipt_number = Some("R-1001".into());
        payment.paid_date = Some(d(2024, 2, 20));
        assert_eq!(
            validate_terms(&draft),
            Err(ValidationIssue::NonPositivePayment {
                field: "first_payment.amount_usd"
            })
        );

        let payment = draft.first_payment.as_mut().unwrap();
        payment.currency = Currency::SYP;
        payment.amount_syp = Some(dec!(650_000));
        assert_eq!(
            validate_terms(&draft),
            Err(ValidationIssue::InvalidPaymentRate)
        );

        draft.first_payment.as_mut().unwrap().exchange_rate_at_payment = Some(dec!(13_000));
        assert!(validate_terms(&draft).is_ok());
    }

    #[test]
    fn test_manual_requires_count() {
        let mut draft = usd_draft();
        draft.installments_count = Some(0);
        assert_eq!(
            validate_contract(&draft, Some(&balanced())),
            Err(ValidationIssue::MissingInstallmentsCount)
        );
    }

    #[test]
    fn test_manual_slot_count_mismatch() {
        let mut draft = usd_draft();
        draft.installments_count = Some(3);
        assert_eq!(
            validate_contract(&draft, Some(&balanced())),
            Err(ValidationIssue::SlotCountMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_manual_numbering_gap() {
        let schedule = Schedule::Manual(vec![
            slot(1, d(2024, 3, 1), dec!(450)),
            slot(3, d(2024, 4, 1), dec!(450)),
        ]);
        assert!(matches!(
            validate_contract(&usd_draft(), Some(&schedule)),
            Err(ValidationIssue::NumberingGap {
                position: 2,
                found: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_manual_missing_amount() {
        let schedule = Schedule::Manual(vec![
            slot(1, d(2024, 3, 1), dec!(900)),
            ManualSlot {
                installment_number: 2,
                due_date: Some(d(2024, 4, 1)),
                planned_amount_usd: None,
            },
        ]);
        assert_eq!(
            validate_contract(&usd_draft(), Some(&schedule)),
            Err(ValidationIssue::NonPositiveInstallment { number: 2 })
        );
    }

    #[test]
    fn test_manual_due_dates_must_not_decrease() {
        let schedule = Schedule::Manual(vec![
            slot(1, d(2024, 4, 1), dec!(450)),
            slot(2, d(2024, 3, 15), dec!(450)),
        ]);
        assert!(matches!(
            validate_contract(&usd_draft(), Some(&schedule)),
            Err(ValidationIssue::DueDateOutOfOrder { number: 2, .. })
        ));
    }

    #[test]
    fn test_first_slot_not_before_start() {
        let schedule = Schedule::Manual(vec![
            slot(1, d(2024, 2, 25), dec!(450)),
            slot(2, d(2024, 4, 1), dec!(450)),
        ]);
        assert!(matches!(
            validate_contract(&usd_draft(), Some(&schedule)),
            Err(ValidationIssue::FirstDueBeforeStart { .. })
        ));
    }

    #[test]
    fn test_manual_mode_ignores_projected_schedule() {
        let projected = Schedule::Projected(ProjectedSchedule {
            basis: crate::payload::preview::tests::sample_request(),
            installments: vec![],
        });
        assert!(matches!(
            validate_contract(&usd_draft(), Some(&projected)),
            Err(ValidationIssue::SlotCountMismatch { actual: 0, .. })
        ));
    }

    #[test]
    fn test_automatic_requires_preview() {
        let mut draft = usd_draft();
        draft.mode = ScheduleMode::Automatic;
        assert_eq!(
            validate_contract(&draft, None),
            Err(ValidationIssue::ScheduleNotPreviewed)
        );
        assert_eq!(
            validate_contract(&draft, Some(&balanced())),
            Err(ValidationIssue::ScheduleNotPreviewed)
        );
    }

    #[test]
    fn test_automatic_empty_schedule_fails() {
        let mut draft = usd_draft();
        draft.mode = ScheduleMode::Automatic;
        let empty = Schedule::Projected(ProjectedSchedule::new(
            crate::payload::preview::tests::sample_request(),
            PreviewResponse::default(),
        ));
        assert_eq!(
            validate_contract(&draft, Some(&empty)),
            Err(ValidationIssue::EmptySchedule)
        );
    }

    #[test]
    fn test_report_carries_field_and_message() {
        let mut draft = usd_draft();
        draft.discount_reason = None;
        let report = ValidationReport::from(&validate_terms(&draft));
        assert!(!report.valid);
        assert_eq!(report.field.as_deref(), Some("discount_reason"));
    }

    fn projected(numbers_and_dates: &[(u32, NaiveDate)]) -> Schedule {
        let installments = numbers_and_dates
            .iter()
            .map(|(number, due_date)| Installment {
                installment_number: *number,
                due_date: *due_date,
                planned_amount_usd: dec!(300),
                exchange_rate_at_due_date: Decimal::ZERO,
                planned_amount_syp: Decimal::ZERO,
            })
            .collect();
        Schedule::Projected(ProjectedSchedule::new(
            crate::payload::preview::tests::sample_request(),
            PreviewResponse { installments },
        ))
    }

    #[test]
    fn test_projected_numbering_must_be_contiguous() {
        let mut draft = usd_draft();
        draft.mode = ScheduleMode::Automatic;

        let duplicated = projected(&[(1, d(2024, 3, 1)), (1, d(2024, 4, 1)), (5, d(2024, 5, 1))]);
        assert_eq!(
            validate_contract(&draft, Some(&duplicated)),
            Err(ValidationIssue::NumberingGap {
                position: 2,
                found: 1,
                count: 3
            })
        );

        let out_of_order = projected(&[(2, d(2024, 4, 1)), (1, d(2024, 3, 1))]);
        assert!(validate_contract(&draft, Some(&out_of_order)).is_ok());
    }

    #[test]
    fn test_projected_first_due_not_before_start() {
        let mut draft = usd_draft();
        draft.mode = ScheduleMode::Automatic;
        let early = projected(&[(1, d(2023, 1, 1)), (2, d(2024, 4, 1))]);
        assert_eq!(
            validate_contract(&draft, Some(&early)),
            Err(ValidationIssue::FirstDueBeforeStart {
                due_date: d(2023, 1, 1),
                start: d(2024, 3, 1)
            })
        );
    }
}
