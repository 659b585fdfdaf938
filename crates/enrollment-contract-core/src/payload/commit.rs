use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::contract::draft::{ContractDraft, ContractParties, FirstPaymentDraft};
use crate::contract::validation::{
    validate_contract, validate_projected_installments, ValidationIssue,
};
use crate::error::ContractError;
use crate::payload::preview::build_preview_request;
use crate::payload::{build_terms, ContractTerms};
use crate::schedule::manual::ManualSlot;
use crate::schedule::projected::ProjectedSchedule;
use crate::schedule::{Installment, Schedule};
use crate::types::*;
use crate::ContractResult;

/// Field-keyed error map returned by the service when it rejects a commit.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// First payment as sent on commit. The USD amount is always present, even
/// when the payment was entered in SYP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstPaymentPayload {
    pub currency: Currency,
    pub amount_usd: Money,
    pub amount_syp: Money,
    pub exchange_rate_at_payment: Rate,
    pub receipt_number: String,
    pub paid_date: NaiveDate,
    pub institute_branch_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub student_id: EntityId,
}

/// Atomic request that persists the contract, its installments and the
/// optional first payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRequest {
    #[serde(flatten)]
    pub terms: ContractTerms,
    pub installments: Vec<Installment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment: Option<FirstPaymentPayload>,
}

/// What the service answers on a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub contract_id: EntityId,
}

/// Whether a projected schedule can be submitted as-is: it must be numbered
/// `1..=n`, start no earlier than the draft's start date and have been
/// projected from exactly the terms the draft has now.
pub fn projection_is_current(
    parties: &ContractParties,
    draft: &ContractDraft,
    projected: &ProjectedSchedule,
) -> bool {
    validate_projected_installments(draft, &projected.installments).is_ok()
        && build_preview_request(parties, draft)
            .map(|current| projected.matches(&current))
            .unwrap_or(false)
}

/// Build the commit request, re-validating the draft and schedule first.
pub fn build_commit_request(
    parties: &ContractParties,
    draft: &ContractDraft,
    schedule: Option<&Schedule>,
) -> ContractResult<CommitRequest> {
    let derived = validate_contract(draft, schedule)?;

    let installments = match schedule {
        Some(Schedule::Manual(slots)) if draft.mode == ScheduleMode::Manual => {
            normalize_manual(slots, draft.enrollment_rate())?
        }
        Some(Schedule::Projected(projected)) if draft.mode == ScheduleMode::Automatic => {
            if !projection_is_current(parties, draft, projected) {
                return Err(ContractError::StaleProjection);
            }
            projected.normalized()
        }
        // validate_contract only passes with the schedule that matches the mode
        _ => return Err(ValidationIssue::ScheduleNotPreviewed.into()),
    };

    let count = u32::try_from(installments.len()).map_err(|_| ContractError::InvalidInput {
        field: "installments".into(),
        reason: "Too many installments".into(),
    })?;
    let terms = build_terms(parties, draft, &derived, Some(count))?;

    let first_payment = draft
        .first_payment
        .as_ref()
        .map(|payment| first_payment_payload(parties, payment))
        .transpose()?;

    Ok(CommitRequest {
        terms,
        installments,
        first_payment,
    })
}

/// Turn validated manual slots into fully populated installments.
fn normalize_manual(slots: &[ManualSlot], rate: Option<Rate>) -> ContractResult<Vec<Installment>> {
    slots
        .iter()
        .map(|slot| -> ContractResult<Installment> {
            let number = slot.installment_number;
            let due_date = slot
                .due_date
                .ok_or(ValidationIssue::MissingDueDate { number })?;
            let amount = round_money(
                slot.planned_amount_usd
                    .ok_or(ValidationIssue::NonPositiveInstallment { number })?,
            );
            let (rate, amount_syp) = match rate {
                Some(r) => (r, round_money(amount * r)),
                None => (Decimal::ZERO, Decimal::ZERO),
            };
            Ok(Installment {
                installment_number: number,
                due_date,
                planned_amount_usd: amount,
                exchange_rate_at_due_date: rate,
                planned_amount_syp: amount_syp,
            })
        })
        .collect()
}

fn first_payment_payload(
    parties: &ContractParties,
    payment: &FirstPaymentDraft,
) -> ContractResult<FirstPaymentPayload> {
    let amount_usd = round_money(payment.amount_in_usd()?);
    let (amount_syp, rate) = match payment.currency {
        Currency::USD => (Decimal::ZERO, Decimal::ZERO),
        Currency::SYP => (
            round_money(payment.amount_syp.unwrap_or_default()),
            payment.exchange_rate_at_payment.unwrap_or_default(),
        ),
    };

    Ok(FirstPaymentPayload {
        currency: payment.currency,
        amount_usd,
        amount_syp,
        exchange_rate_at_payment: rate,
        receipt_number: payment
            .receipt_number
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        paid_date: payment.paid_date.ok_or(ValidationIssue::MissingPaidDate)?,
        institute_branch_id: payment
            .institute_branch_id
            .ok_or(ValidationIssue::MissingPaymentBranch)?,
        description: payment
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from),
        student_id: parties.student_id,
    })
}

/// The first field and message of a rejection, surfaced verbatim.
pub fn first_field_error(errors: &FieldErrors) -> Option<(String, String)> {
    errors.iter().find_map(|(field, messages)| {
        messages
            .first()
            .map(|message| (field.clone(), message.clone()))
    })
}
