use crate::contract::draft::{ContractDraft, ContractParties};
use crate::contract::validation::validate_terms;
use crate::error::ContractError;
use crate::payload::{build_terms, ContractTerms};
use crate::types::ScheduleMode;
use crate::ContractResult;

/// The preview request carries exactly the shared contract terms.
pub type PreviewRequest = ContractTerms;

/// Build the request for an automatic schedule projection.
///
/// Only valid in automatic mode, and only once the terms pass rules 1–4.
pub fn build_preview_request(
    parties: &ContractParties,
    draft: &ContractDraft,
) -> ContractResult<PreviewRequest> {
    if draft.mode != ScheduleMode::Automatic {
        return Err(ContractError::InvalidInput {
            field: "mode".into(),
            reason: "Schedules are only previewed in automatic mode".into(),
        });
    }

    let derived = validate_terms(draft)?;
    Ok(build_terms(
        parties,
        draft,
        &derived,
        draft.installments_count,
    )?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::contract::validation::ValidationIssue;
    use crate::types::Currency;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    pub(crate) fn sample_parties() -> ContractParties {
        ContractParties {
            student_id: 42,
            institute_branch_id: 7,
        }
    }

    pub(crate) fn sample_draft() -> ContractDraft {
        ContractDraft {
            currency: Currency::SYP,
            total_amount_input: Some(dec!(13_000_000)),
            exchange_rate_at_enrollment: Some(dec!(13_000)),
            discount_percentage: Some(dec!(10)),
            discount_reason: Some("  Early registration ".into()),
            agreed_at: Some(NaiveDate::from_ymd_opt(2024, 2, 20).unwrap()),
            installments_start_date: Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            mode: ScheduleMode::Automatic,
            installments_count: Some(4),
            first_payment: None,
        }
    }

    pub(crate) fn sample_request() -> PreviewRequest {
        build_preview_request(&sample_parties(), &sample_draft()).unwrap()
    }

    #[test]
    fn test_preview_request_fields() {
        let req = sample_request();
        assert_eq!(req.student_id, 42);
        assert_eq!(req.institute_branch_id, 7);
        assert_eq!(req.total_amount_usd, dec!(1000));
        assert_eq!(req.final_amount_usd, dec!(900));
        assert_eq!(req.final_amount_syp, dec!(11_700_000));
        assert_eq!(req.exchange_rate_at_enrollment, dec!(13_000));
        assert_eq!(req.discount_reason.as_deref(), Some("Early registration"));
        assert_eq!(req.installments_count, Some(4));
    }

    #[test]
    fn test_preview_refused_in_manual_mode() {
        let mut draft = sample_draft();
        draft.mode = ScheduleMode::Manual;
        assert!(matches!(
            build_preview_request(&sample_parties(), &draft),
            Err(ContractError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_preview_gated_by_terms() {
        let mut draft = sample_draft();
        draft.exchange_rate_at_enrollment = None;
        match build_preview_request(&sample_parties(), &draft) {
            Err(ContractError::Validation(issue)) => {
                assert_eq!(issue, ValidationIssue::InvalidEnrollmentRate)
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_usd_preview_zeroes_syp_fields() {
        let mut draft = sample_draft();
        draft.currency = Currency::USD;
        draft.total_amount_input = Some(dec!(1000));
        let req = build_preview_request(&sample_parties(), &draft).unwrap();
        assert_eq!(req.final_amount_syp, Decimal::ZERO);
        assert_eq!(req.exchange_rate_at_enrollment, Decimal::ZERO);
    }

    #[test]
    fn test_preview_wire_shape() {
        let json = serde_json::to_value(sample_request()).unwrap();
        assert_eq!(json["mode"], "automatic");
        assert_eq!(json["currency"], "SYP");
        assert_eq!(json["agreed_at"], "2024-02-20");
        assert_eq!(json["installments_start_date"], "2024-03-01");
    }

    #[test]
    fn test_payload_input_from_json() {
        let input: crate::payload::PayloadInput = serde_json::from_str(
            r#"{
                "parties": {"student_id": 42, "institute_branch_id": 7},
                "draft": {"total_amount_input": "1000", "agreed_at": "2024-02-20",
                          "installments_start_date": "2024-03-01", "installments_count": 2},
                "schedule": {"manual": [{"installment_number": 1, "due_date": "2024-03-01"}]}
            }"#,
        )
        .unwrap();
        assert_eq!(input.parties, sample_parties());
        assert_eq!(input.draft.mode, ScheduleMode::Automatic);
        assert_eq!(input.schedule.map(|s| s.len()), Some(1));
        let req = build_preview_request(&input.parties, &input.draft).unwrap();
        assert_eq!(req.final_amount_usd, dec!(1000));
    }
}
