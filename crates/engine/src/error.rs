//! Engine error types

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to spawn engine at {path}: {reason}")]
    Spawn { path: String, reason: String },

    #[error("Engine handshake failed: {0}")]
    Handshake(String),

    #[error("Engine I/O error: {0}")]
    Io(String),

    #[error("Engine process exited unexpectedly")]
    Exited,

    #[error("Engine did not finish within {0:?}")]
    Timeout(Duration),
}

impl EngineError {
    /// True when the engine never became ready, as opposed to failing mid-search.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, EngineError::Spawn { .. } | EngineError::Handshake(_))
    }
}
