mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::contract::{ContractArgs, DeriveArgs};
use commands::currency::ConvertArgs;
use commands::payload::{CommitPayloadArgs, PreviewPayloadArgs};
use commands::schedule::{AddMonthsArgs, FillEvenArgs, RebuildSlotsArgs};

/// Enrollment contract amounts, validation and installment schedules
#[derive(Parser)]
#[command(
    name = "ecs",
    version,
    about = "Enrollment contract amounts, validation and installment schedules",
    long_about = "Offline tooling for enrollment financial contracts: USD/SYP conversion, \
                  discounts, derived amounts, manual installment slots, full contract \
                  validation and the payloads sent to the enrollment contract service."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an amount into USD
    ToUsd(ConvertArgs),
    /// Convert a USD amount into another currency
    FromUsd(ConvertArgs),
    /// Derive total, final USD and final SYP amounts from contract terms
    Derive(DeriveArgs),
    /// Run every contract rule against a draft and its schedule
    Validate(ContractArgs),
    /// Summarise a draft: derived amounts, schedule coverage, validation
    Summary(ContractArgs),
    /// Add calendar months to a date, clamping to the end of the month
    AddMonths(AddMonthsArgs),
    /// Rebuild manual installment slots for a new count
    RebuildSlots(RebuildSlotsArgs),
    /// Spread the unallocated amount over empty manual slots
    FillEven(FillEvenArgs),
    /// Build the request for an automatic schedule projection
    PreviewPayload(PreviewPayloadArgs),
    /// Build the atomic contract commit request
    CommitPayload(CommitPayloadArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    tracing::debug!(output = ?cli.output, "ecs started");

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::ToUsd(args) => commands::currency::run_to_usd(args),
        Commands::FromUsd(args) => commands::currency::run_from_usd(args),
        Commands::Derive(args) => commands::contract::run_derive(args),
        Commands::Validate(args) => commands::contract::run_validate(args),
        Commands::Summary(args) => commands::contract::run_summary(args),
        Commands::AddMonths(args) => commands::schedule::run_add_months(args),
        Commands::RebuildSlots(args) => commands::schedule::run_rebuild_slots(args),
        Commands::FillEven(args) => commands::schedule::run_fill_even(args),
        Commands::PreviewPayload(args) => commands::payload::run_preview_payload(args),
        Commands::CommitPayload(args) => commands::payload::run_commit_payload(args),
        Commands::Version => {
            println!("ecs {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
