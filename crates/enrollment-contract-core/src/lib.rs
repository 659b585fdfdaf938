pub mod contract;
pub mod currency;
pub mod discount;
pub mod due_date;
pub mod error;
pub mod payload;
pub mod schedule;
pub mod types;

#[cfg(feature = "session")]
pub mod session;

pub use error::ContractError;
pub use types::*;

/// Standard result type for all enrollment-contract operations
pub type ContractResult<T> = Result<T, ContractError>;
