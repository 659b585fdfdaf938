use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use enrollment_contract_core::contract::derived::derive_amounts;
use enrollment_contract_core::contract::draft::ContractDraft;
use enrollment_contract_core::contract::summary::{self, SummaryInput};
use enrollment_contract_core::contract::validation::{self, ValidationReport};
use enrollment_contract_core::payload::{commit, preview, PayloadInput};
use enrollment_contract_core::schedule::manual::{self, FillEvenInput, RebuildSlotsInput};
use enrollment_contract_core::{currency, due_date, Currency, Rate};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse<'a, T: Deserialize<'a>>(input_json: &'a str) -> NapiResult<T> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ConversionInput {
    amount: rust_decimal::Decimal,
    #[serde(default)]
    currency: Currency,
    #[serde(default)]
    exchange_rate: Option<Rate>,
}

#[napi]
pub fn to_usd(input_json: String) -> NapiResult<String> {
    let input: ConversionInput = parse(&input_json)?;
    let usd = currency::to_usd(input.amount, input.currency, input.exchange_rate)
        .map_err(to_napi_error)?;
    serde_json::to_string(&usd).map_err(to_napi_error)
}

#[napi]
pub fn derive_contract_amounts(draft_json: String) -> NapiResult<String> {
    let draft: ContractDraft = parse(&draft_json)?;
    let derived = derive_amounts(&draft).map_err(to_napi_error)?;
    serde_json::to_string(&derived).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Returns `{ valid, field?, message? }`; a failed rule is not a JS exception.
#[napi]
pub fn validate_contract(input_json: String) -> NapiResult<String> {
    let input: SummaryInput = parse(&input_json)?;
    let verdict = validation::validate_contract(&input.draft, input.schedule.as_ref());
    serde_json::to_string(&ValidationReport::from(&verdict)).map_err(to_napi_error)
}

#[napi]
pub fn summarize_contract(input_json: String) -> NapiResult<String> {
    let input: SummaryInput = parse(&input_json)?;
    let output = summary::summarize_contract(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[napi]
pub fn add_months(date: String, months: u32) -> NapiResult<String> {
    let date: chrono::NaiveDate = date.parse().map_err(to_napi_error)?;
    let due = due_date::add_months(date, months).map_err(to_napi_error)?;
    Ok(due.to_string())
}

#[napi]
pub fn rebuild_slots(input_json: String) -> NapiResult<String> {
    let input: RebuildSlotsInput = parse(&input_json)?;
    let slots = manual::rebuild_slots(
        &input.existing,
        input.installments_count,
        input.installments_start_date,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&slots).map_err(to_napi_error)
}

#[napi]
pub fn fill_even_amounts(input_json: String) -> NapiResult<String> {
    let input: FillEvenInput = parse(&input_json)?;
    let slots = manual::fill_even_amounts(&input.slots, input.final_amount_usd);
    serde_json::to_string(&slots).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Service payloads
// ---------------------------------------------------------------------------

#[napi]
pub fn build_preview_request(input_json: String) -> NapiResult<String> {
    let input: PayloadInput = parse(&input_json)?;
    let request =
        preview::build_preview_request(&input.parties, &input.draft).map_err(to_napi_error)?;
    serde_json::to_string(&request).map_err(to_napi_error)
}

#[napi]
pub fn build_commit_request(input_json: String) -> NapiResult<String> {
    let input: PayloadInput = parse(&input_json)?;
    let request =
        commit::build_commit_request(&input.parties, &input.draft, input.schedule.as_ref())
            .map_err(to_napi_error)?;
    serde_json::to_string(&request).map_err(to_napi_error)
}
