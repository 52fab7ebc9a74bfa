//! Shared error type across judgewire crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed message.
    BadRequest,
    /// Upstream link unavailable.
    NotConnected,
    /// Scoring collaborator call failed.
    ScoringFailed,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotConnected => "NOT_CONNECTED",
            ClientCode::ScoringFailed => "SCORING_FAILED",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, JudgewireError>;

/// Unified error type used by core and relay.
#[derive(Debug, Error)]
pub enum JudgewireError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("upstream not connected")]
    NotConnected,
    #[error("transport: {0}")]
    Transport(String),
    #[error("scoring request timed out")]
    ScoringTimeout,
    #[error("scoring returned status {0}")]
    ScoringStatus(u16),
    #[error("scoring failed: {0}")]
    ScoringFailed(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl JudgewireError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            JudgewireError::BadRequest(_) => ClientCode::BadRequest,
            JudgewireError::NotConnected | JudgewireError::Transport(_) => {
                ClientCode::NotConnected
            }
            JudgewireError::ScoringTimeout
            | JudgewireError::ScoringStatus(_)
            | JudgewireError::ScoringFailed(_) => ClientCode::ScoringFailed,
            JudgewireError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            JudgewireError::Internal(_) => ClientCode::Internal,
        }
    }
}
