use crate::models::proposal::ProposalStatus;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PlatformError {
    NotFound(String),
    Validation(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
    InvalidTransition {
        from: ProposalStatus,
        to: ProposalStatus,
    },
    Storage(String),
}

pub type PlatformResult<T> = Result<T, PlatformError>;

impl PlatformError {
    pub fn proposal_not_found() -> Self {
        PlatformError::NotFound("Proposal not found".to_string())
    }

    pub fn officer_not_found() -> Self {
        PlatformError::NotFound("Officer not found".to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PlatformError::NotFound(_))
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::NotFound(msg)
            | PlatformError::Validation(msg)
            | PlatformError::Conflict(msg)
            | PlatformError::Unauthorized(msg)
            | PlatformError::Forbidden(msg) => f.write_str(msg),
            PlatformError::InvalidTransition { from, to } => {
                write!(f, "Cannot move proposal from {from} to {to}")
            }
            PlatformError::Storage(msg) => write!(f, "Storage error: {msg}"),
        }
    }
}

impl std::error::Error for PlatformError {}

impl From<rusqlite::Error> for PlatformError {
    fn from(e: rusqlite::Error) -> Self {
        PlatformError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for PlatformError {
    fn from(e: serde_json::Error) -> Self {
        PlatformError::Storage(e.to_string())
    }
}
