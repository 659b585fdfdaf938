use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::payload::preview::PreviewRequest;
use crate::schedule::Installment;
use crate::types::Money;

/// Body returned by the preview endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewResponse {
    #[serde(default)]
    pub installments: Vec<Installment>,
}

/// Installments returned by a preview, together with the exact request that
/// produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedSchedule {
    pub basis: PreviewRequest,
    pub installments: Vec<Installment>,
}

impl ProjectedSchedule {
    pub fn new(basis: PreviewRequest, response: PreviewResponse) -> Self {
        Self {
            basis,
            installments: response.installments,
        }
    }

    /// Whether this schedule was projected from exactly `current` terms.
    pub fn matches(&self, current: &PreviewRequest) -> bool {
        &self.basis == current
    }

    pub fn total_usd(&self) -> Money {
        self.installments
            .iter()
            .map(|i| i.planned_amount_usd)
            .sum::<Decimal>()
    }

    /// Installments ordered by number, as they are submitted.
    pub fn normalized(&self) -> Vec<Installment> {
        let mut installments = self.installments.clone();
        installments.sort_by_key(|i| i.installment_number);
        installments
    }
}
