use std::collections::BTreeMap;

use thiserror::Error;

use crate::contract::validation::ValidationIssue;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("Invalid exchange rate for {field}: must be greater than zero")]
    InvalidRate { field: String },

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationIssue),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Projected schedule no longer matches the contract terms; request a new preview")]
    StaleProjection,

    #[error("A {operation} request is already in flight for this contract")]
    AlreadyInFlight { operation: String },

    #[error("Cannot {action} while the contract is {state}")]
    InvalidState { action: String, state: String },

    #[error("Installment projection failed: {0}")]
    ProjectionFailed(String),

    #[error("{message}")]
    CommitRejected {
        field: String,
        message: String,
        errors: BTreeMap<String, Vec<String>>,
    },

    #[error("Contract was not submitted: {0}")]
    CommitFailed(String),

    #[error("Commit outcome unknown ({0}); verify the contract with the enrollment service before retrying")]
    CommitOutcomeUnknown(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ContractError {
    fn from(e: serde_json::Error) -> Self {
        ContractError::SerializationError(e.to_string())
    }
}
