use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ContractError;
use crate::ContractResult;

/// Deadlines applied to calls made to the enrollment contract service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub preview_timeout_ms: u64,
    /// A commit exceeding this deadline has an unknown outcome
    pub commit_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preview_timeout_ms: 10_000,
            commit_timeout_ms: 30_000,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> ContractResult<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        if config.preview_timeout_ms == 0 || config.commit_timeout_ms == 0 {
            return Err(ContractError::InvalidInput {
                field: "timeout".into(),
                reason: "Timeouts must be at least 1 ms".into(),
            });
        }
        Ok(config)
    }

    pub fn preview_timeout(&self) -> Duration {
        Duration::from_millis(self.preview_timeout_ms)
    }

    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }
}
