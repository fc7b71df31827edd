use chess_core::ChessError;
use engine::EngineError;
use serde::Serialize;

use crate::clients::lichess::LichessError;

/// Every way a tool call can fail. Tools never panic or propagate past
/// their boundary; the registry turns these into [`ErrorResponse`] payloads.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0}")]
    Validation(String),

    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Configuration(String),

    #[error("Lichess API returned status {status}")]
    RemoteStatus {
        status: u16,
        preview: String,
        hint: Option<&'static str>,
    },

    #[error("Request to Lichess failed: {0}")]
    Transport(String),

    #[error("Unexpected response from Lichess: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    EngineUnavailable,
    EngineError,
    Timeout,
    ConfigurationError,
    RemoteStatus,
    TransportError,
    InvalidResponse,
}

/// Error payload returned in place of a tool's success record
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::Validation(_) => ErrorKind::ValidationError,
            ToolError::EngineUnavailable(_) => ErrorKind::EngineUnavailable,
            ToolError::Engine(_) => ErrorKind::EngineError,
            ToolError::Timeout(_) => ErrorKind::Timeout,
            ToolError::Configuration(_) => ErrorKind::ConfigurationError,
            ToolError::RemoteStatus { .. } => ErrorKind::RemoteStatus,
            ToolError::Transport(_) => ErrorKind::TransportError,
            ToolError::InvalidResponse(_) => ErrorKind::InvalidResponse,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let mut response = ErrorResponse {
            error: self.to_string(),
            kind: self.kind(),
            status_code: None,
            response_preview: None,
            hint: None,
        };
        if let ToolError::RemoteStatus {
            status,
            preview,
            hint,
        } = self
        {
            response.status_code = Some(*status);
            response.response_preview = Some(preview.clone());
            response.hint = *hint;
        }
        response
    }
}

impl From<ChessError> for ToolError {
    fn from(e: ChessError) -> Self {
        ToolError::Validation(e.to_string())
    }
}

impl From<EngineError> for ToolError {
    fn from(e: EngineError) -> Self {
        match e {
            e if e.is_unavailable() => ToolError::EngineUnavailable(e.to_string()),
            EngineError::Timeout(_) => ToolError::Timeout(e.to_string()),
            e => ToolError::Engine(e.to_string()),
        }
    }
}

impl From<LichessError> for ToolError {
    fn from(e: LichessError) -> Self {
        match e {
            LichessError::MissingToken => ToolError::Configuration(
                "LICHESS_TOKEN environment variable not set. Configure a Lichess API token to fetch games."
                    .to_string(),
            ),
            LichessError::Status {
                status,
                preview,
                hint,
            } => ToolError::RemoteStatus {
                status: status.as_u16(),
                preview,
                hint,
            },
            LichessError::Timeout => ToolError::Timeout(e.to_string()),
            LichessError::Request(_) => ToolError::Transport(e.to_string()),
            LichessError::Decode(_) => ToolError::InvalidResponse(e.to_string()),
        }
    }
}
