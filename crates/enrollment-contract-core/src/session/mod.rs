//! The authoring session: draft, schedule and the two calls to the
//! enrollment contract service.

pub mod config;
pub mod contract_session;
pub mod service;

pub use config::SessionConfig;
pub use contract_session::{ContractSession, SessionState, VerifiedOutcome};
pub use service::{ContractStore, ProjectionService, ServiceError};
