pub mod manual;
pub mod projected;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};
use manual::ManualSlot;
use projected::ProjectedSchedule;

/// A fully populated installment, as projected by the contract service and
/// as sent on commit in either mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub planned_amount_usd: Money,
    /// Zero (or absent on the wire) for USD contracts
    #[serde(default)]
    pub exchange_rate_at_due_date: Rate,
    #[serde(default)]
    pub planned_amount_syp: Money,
}

/// Installment schedule attached to a draft, tagged by how it was authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    Manual(Vec<ManualSlot>),
    Projected(ProjectedSchedule),
}

impl Schedule {
    pub fn len(&self) -> usize {
        match self {
            Schedule::Manual(slots) => slots.len(),
            Schedule::Projected(projected) => projected.installments.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
