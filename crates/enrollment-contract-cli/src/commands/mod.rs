pub mod contract;
pub mod currency;
pub mod payload;
pub mod schedule;

use clap::ValueEnum;
use enrollment_contract_core::Currency;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CurrencyArg {
    Usd,
    Syp,
}

impl From<CurrencyArg> for Currency {
    fn from(arg: CurrencyArg) -> Self {
        match arg {
            CurrencyArg::Usd => Currency::USD,
            CurrencyArg::Syp => Currency::SYP,
        }
    }
}
