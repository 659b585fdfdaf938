use async_trait::async_trait;
use thiserror::Error;

use crate::payload::commit::{CommitReceipt, CommitRequest, FieldErrors};
use crate::payload::preview::PreviewRequest;
use crate::schedule::projected::PreviewResponse;

/// How a call to the enrollment contract service went wrong.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// No answer within the deadline; the request may or may not have landed
    #[error("request timed out")]
    Timeout,

    /// The connection broke after the request was sent
    #[error("connection interrupted: {0}")]
    Interrupted(String),

    /// The request never reached the service
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The service validated the request and refused it
    #[error("request rejected")]
    Rejected(FieldErrors),
}

impl ServiceError {
    /// True when the caller cannot tell whether the request took effect.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ServiceError::Timeout | ServiceError::Interrupted(_))
    }
}

/// Projects automatic installment schedules. Must be free of side effects.
#[async_trait]
pub trait ProjectionService: Send + Sync {
    async fn project(&self, request: &PreviewRequest) -> Result<PreviewResponse, ServiceError>;
}

/// Persists a contract with its installments and first payment atomically.
#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn commit(&self, request: &CommitRequest) -> Result<CommitReceipt, ServiceError>;
}
