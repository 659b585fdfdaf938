use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use enrollment_contract_core::contract::derived::derive_amounts;
use enrollment_contract_core::contract::draft::ContractDraft;
use enrollment_contract_core::contract::summary::{summarize_contract, SummaryInput};
use enrollment_contract_core::contract::validation::{validate_contract, ValidationReport};

use super::CurrencyArg;
use crate::input;

/// Arguments for deriving contract amounts
#[derive(Args)]
pub struct DeriveArgs {
    /// Path to a JSON contract draft (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Currency the total is entered in
    #[arg(long, value_enum, default_value = "usd")]
    pub currency: CurrencyArg,

    /// Contract total in the entry currency
    #[arg(long)]
    pub total: Option<Decimal>,

    /// SYP per USD at enrollment
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Discount percentage (0-100)
    #[arg(long)]
    pub discount: Option<Decimal>,
}

pub fn run_derive(args: DeriveArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let draft: ContractDraft = match input::read_input(args.input.as_deref())? {
        Some(draft) => draft,
        None => ContractDraft {
            currency: args.currency.into(),
            total_amount_input: Some(
                args.total
                    .ok_or("--total is required (or provide --input)")?,
            ),
            exchange_rate_at_enrollment: args.rate,
            discount_percentage: args.discount,
            ..Default::default()
        },
    };

    let derived = derive_amounts(&draft)?;
    Ok(serde_json::to_value(derived)?)
}

/// Arguments for commands that look at a draft together with its schedule
#[derive(Args)]
pub struct ContractArgs {
    /// Path to a JSON document `{ "draft": {...}, "schedule": {...} }`
    #[arg(long)]
    pub input: Option<String>,
}

fn read_contract(args: &ContractArgs) -> Result<SummaryInput, Box<dyn std::error::Error>> {
    input::read_input(args.input.as_deref())?
        .ok_or_else(|| "--input <file.json> or stdin required".into())
}

pub fn run_validate(args: ContractArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let contract = read_contract(&args)?;
    let verdict = validate_contract(&contract.draft, contract.schedule.as_ref());

    let mut value = serde_json::to_value(ValidationReport::from(&verdict))?;
    if let (Ok(derived), Value::Object(map)) = (verdict, &mut value) {
        map.insert("derived".into(), serde_json::to_value(derived)?);
    }
    Ok(value)
}

pub fn run_summary(args: ContractArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let contract = read_contract(&args)?;
    let output = summarize_contract(&contract)?;
    Ok(serde_json::to_value(output)?)
}
