//! Wire payloads sent to the enrollment contract service.
//!
//! Both builders re-run the validator against the draft they are given, so a
//! payload can never be assembled from terms that were only valid earlier.

pub mod commit;
pub mod preview;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::contract::derived::DerivedAmounts;
use crate::contract::draft::{ContractDraft, ContractParties};
use crate::contract::validation::ValidationIssue;
use crate::schedule::Schedule;
use crate::types::*;

/// Everything a payload builder needs, in one JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadInput {
    pub parties: ContractParties,
    pub draft: ContractDraft,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
}

/// Fields shared by the preview and commit requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractTerms {
    pub student_id: EntityId,
    pub institute_branch_id: EntityId,
    pub currency: Currency,
    pub total_amount_usd: Money,
    pub discount_percentage: Percent,
    /// Never sent when there is no discount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_reason: Option<String>,
    pub final_amount_usd: Money,
    /// Zero for USD contracts
    pub final_amount_syp: Money,
    /// Zero for USD contracts
    pub exchange_rate_at_enrollment: Rate,
    pub agreed_at: NaiveDate,
    pub mode: ScheduleMode,
    pub installments_start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installments_count: Option<u32>,
}

/// Assemble the shared fields from a draft whose terms already validated.
fn build_terms(
    parties: &ContractParties,
    draft: &ContractDraft,
    derived: &DerivedAmounts,
    installments_count: Option<u32>,
) -> Result<ContractTerms, ValidationIssue> {
    let discount = draft.discount();
    let discount_reason = if discount.is_zero() {
        None
    } else {
        draft
            .discount_reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from)
    };

    Ok(ContractTerms {
        student_id: parties.student_id,
        institute_branch_id: parties.institute_branch_id,
        currency: draft.currency,
        total_amount_usd: derived.total_amount_usd,
        discount_percentage: discount,
        discount_reason,
        final_amount_usd: derived.final_amount_usd,
        final_amount_syp: derived.final_amount_syp,
        exchange_rate_at_enrollment: draft.enrollment_rate().unwrap_or_default(),
        agreed_at: draft.agreed_at.ok_or(ValidationIssue::MissingAgreedAt)?,
        mode: draft.mode,
        installments_start_date: draft
            .installments_start_date
            .ok_or(ValidationIssue::MissingStartDate)?,
        installments_count,
    })
}
