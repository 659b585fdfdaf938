use clap::Args;
use serde_json::Value;

use enrollment_contract_core::payload::commit::build_commit_request;
use enrollment_contract_core::payload::preview::build_preview_request;
use enrollment_contract_core::payload::PayloadInput;

use crate::input;

/// Arguments for building the projection request
#[derive(Args)]
pub struct PreviewPayloadArgs {
    /// Path to JSON input `{ "parties": {...}, "draft": {...} }`
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_preview_payload(args: PreviewPayloadArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: PayloadInput = input::read_input(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for preview-payload")?;
    let preview = build_preview_request(&request.parties, &request.draft)?;
    Ok(serde_json::to_value(preview)?)
}

/// Arguments for building the commit request
#[derive(Args)]
pub struct CommitPayloadArgs {
    /// Path to JSON input `{ "parties": {...}, "draft": {...}, "schedule": {...} }`
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_commit_payload(args: CommitPayloadArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: PayloadInput = input::read_input(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for commit-payload")?;
    let commit = build_commit_request(&request.parties, &request.draft, request.schedule.as_ref())?;
    Ok(serde_json::to_value(commit)?)
}
