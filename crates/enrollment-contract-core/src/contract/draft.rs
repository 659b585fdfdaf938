use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::currency;
use crate::types::*;
use crate::ContractResult;

/// Identifiers supplied by the enrollment wizard's other steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractParties {
    pub student_id: EntityId,
    pub institute_branch_id: EntityId,
}

/// Financial terms of an enrollment contract as the user is authoring them.
///
/// Every user-entered field is optional: whether a value has been set at all
/// is part of what the validator checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractDraft {
    pub currency: Currency,
    /// In USD or SYP depending on `currency`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount_input: Option<Money>,
    /// SYP per USD; only meaningful for SYP contracts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_rate_at_enrollment: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreed_at: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installments_start_date: Option<NaiveDate>,
    pub mode: ScheduleMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installments_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_payment: Option<FirstPaymentDraft>,
}

impl ContractDraft {
    /// Discount percentage with the "absent means zero" default applied.
    pub fn discount(&self) -> Percent {
        self.discount_percentage.unwrap_or_default()
    }

    /// Exchange rate that applies to the contract, `None` for USD contracts.
    pub fn enrollment_rate(&self) -> Option<Rate> {
        match self.currency {
            Currency::USD => None,
            Currency::SYP => self.exchange_rate_at_enrollment,
        }
    }
}

/// Optional payment recorded together with the contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirstPaymentDraft {
    pub currency: Currency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_usd: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_syp: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_rate_at_payment: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institute_branch_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FirstPaymentDraft {
    /// The figure the user typed, in the payment's own currency.
    pub fn entered_amount(&self) -> Option<Money> {
        match self.currency {
            Currency::USD => self.amount_usd,
            Currency::SYP => self.amount_syp,
        }
    }

    /// Field key of the amount the user is expected to fill in.
    pub fn amount_field(&self) -> &'static str {
        match self.currency {
            Currency::USD => "first_payment.amount_usd",
            Currency::SYP => "first_payment.amount_syp",
        }
    }

    /// USD value of the payment at full precision.
    pub fn amount_in_usd(&self) -> ContractResult<Money> {
        let amount = self.entered_amount().unwrap_or_default();
        currency::to_usd_for(
            amount,
            self.currency,
            self.exchange_rate_at_payment,
            "first_payment.exchange_rate_at_payment",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_draft_deserialises_from_partial_json() {
        let draft: ContractDraft = serde_json::from_str(
            r#"{"currency":"SYP","total_amount_input":"13000000","mode":"manual"}"#,
        )
        .unwrap();
        assert_eq!(draft.currency, Currency::SYP);
        assert_eq!(draft.total_amount_input, Some(dec!(13000000)));
        assert_eq!(draft.mode, ScheduleMode::Manual);
        assert_eq!(draft.discount(), dec!(0));
        assert!(draft.first_payment.is_none());
    }

    #[test]
    fn test_enrollment_rate_ignored_for_usd() {
        let draft = ContractDraft {
            exchange_rate_at_enrollment: Some(dec!(13000)),
            ..Default::default()
        };
        assert_eq!(draft.enrollment_rate(), None);
    }

    #[test]
    fn test_first_payment_in_syp_converts() {
        let payment = FirstPaymentDraft {
            currency: Currency::SYP,
            amount_syp: Some(dec!(1_300_000)),
            exchange_rate_at_payment: Some(dec!(13_000)),
            ..Default::default()
        };
        assert_eq!(payment.amount_in_usd().unwrap(), dec!(100));
        assert_eq!(payment.amount_field(), "first_payment.amount_syp");
    }
}
