use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use enrollment_contract_core::currency::{from_usd, to_usd};
use enrollment_contract_core::{round_money, Currency};

use super::CurrencyArg;

/// Arguments for a USD conversion in either direction
#[derive(Args)]
pub struct ConvertArgs {
    /// Amount to convert
    #[arg(long, allow_hyphen_values = true)]
    pub amount: Decimal,

    /// Currency on the non-USD side of the conversion
    #[arg(long, value_enum, default_value = "usd")]
    pub currency: CurrencyArg,

    /// Units of the currency per one USD (required for SYP)
    #[arg(long)]
    pub rate: Option<Decimal>,
}

pub fn run_to_usd(args: ConvertArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let currency = Currency::from(args.currency);
    let usd = to_usd(args.amount, currency, args.rate)?;
    Ok(json!({
        "currency": currency.to_string(),
        "amount": args.amount.to_string(),
        "exchange_rate": args.rate.map(|r| r.to_string()),
        "amount_usd": round_money(usd).to_string(),
        "amount_usd_unrounded": usd.to_string(),
    }))
}

pub fn run_from_usd(args: ConvertArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let currency = Currency::from(args.currency);
    let converted = from_usd(args.amount, currency, args.rate)?;
    Ok(json!({
        "currency": currency.to_string(),
        "amount_usd": args.amount.to_string(),
        "exchange_rate": args.rate.map(|r| r.to_string()),
        "amount": round_money(converted).to_string(),
    }))
}
