use chrono::NaiveDate;
use clap::Args;
use serde_json::{json, Value};

use enrollment_contract_core::due_date::add_months;
use enrollment_contract_core::schedule::manual::{
    fill_even_amounts, rebuild_slots, FillEvenInput, RebuildSlotsInput,
};

use crate::input;

/// Arguments for due-date arithmetic
#[derive(Args)]
pub struct AddMonthsArgs {
    /// Starting date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    /// Calendar months to add
    #[arg(long)]
    pub months: u32,
}

pub fn run_add_months(args: AddMonthsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let due = add_months(args.date, args.months)?;
    Ok(json!({
        "date": args.date.to_string(),
        "months": args.months,
        "due_date": due.to_string(),
    }))
}

/// Arguments for rebuilding manual slots
#[derive(Args)]
pub struct RebuildSlotsArgs {
    /// Path to JSON input with existing slots (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Number of installments
    #[arg(long)]
    pub count: Option<u32>,

    /// First due date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

pub fn run_rebuild_slots(args: RebuildSlotsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: RebuildSlotsInput = match input::read_input(args.input.as_deref())? {
        Some(request) => request,
        None => RebuildSlotsInput {
            existing: Vec::new(),
            installments_count: args
                .count
                .ok_or("--count is required (or provide --input)")?,
            installments_start_date: args
                .start_date
                .ok_or("--start-date is required (or provide --input)")?,
        },
    };

    let slots = rebuild_slots(
        &request.existing,
        request.installments_count,
        request.installments_start_date,
    )?;
    Ok(serde_json::to_value(slots)?)
}

/// Arguments for filling empty slots evenly
#[derive(Args)]
pub struct FillEvenArgs {
    /// Path to JSON input `{ "slots": [...], "final_amount_usd": "..." }`
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_fill_even(args: FillEvenArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: FillEvenInput = input::read_input(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for fill-even")?;
    let slots = fill_even_amounts(&request.slots, request.final_amount_usd);
    Ok(serde_json::to_value(slots)?)
}
