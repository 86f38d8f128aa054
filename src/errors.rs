use serde::Serialize;
use thiserror::Error;

use crate::models::SessionId;

/// Caller-recoverable rejections. None of these leave state modified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no session selected")]
    EmptySelection,
    #[error("a preference submission is already in progress for teacher {teacher_id}")]
    SubmissionInProgress { teacher_id: i64 },
    #[error("{selected} sessions selected but at most {cap} preferences can be ranked")]
    PriorityOutOfRange { selected: usize, cap: u32 },
    #[error("session {session_id} is not available for selection")]
    SessionUnavailable { session_id: SessionId },
    #[error("session {session_id} is not part of the visible calendar")]
    UnknownSession { session_id: SessionId },
    #[error("no teacher is signed in")]
    NotSignedIn,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::EmptySelection => "validation.empty_selection",
            ValidationError::SubmissionInProgress { .. } => "validation.submission_in_progress",
            ValidationError::PriorityOutOfRange { .. } => "validation.priority_out_of_range",
            ValidationError::SessionUnavailable { .. } => "validation.session_unavailable",
            ValidationError::UnknownSession { .. } => "validation.unknown_session",
            ValidationError::NotSignedIn => "validation.not_signed_in",
        }
    }
}

/// Failures reported by the session repository or the preference API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("backend failure: {0}")]
    Backend(String),
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl NetworkError {
    pub fn code(&self) -> &'static str {
        match self {
            NetworkError::Transport(_) => "network.transport",
            NetworkError::Backend(_) => "network.backend",
            NetworkError::Rejected(_) => "network.rejected",
        }
    }
}

impl From<anyhow::Error> for NetworkError {
    fn from(err: anyhow::Error) -> Self {
        NetworkError::Backend(format!("{err:#}"))
    }
}

/// A backend-supplied record that cannot be interpreted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("session {session_id}: invalid {field} '{value}', expected HH:MM")]
pub struct FormatError {
    pub session_id: SessionId,
    pub field: &'static str,
    pub value: String,
}

impl FormatError {
    pub fn code(&self) -> &'static str {
        "format.time"
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl PlannerError {
    pub fn code(&self) -> &'static str {
        match self {
            PlannerError::Validation(err) => err.code(),
            PlannerError::Network(err) => err.code(),
            PlannerError::Format(err) => err.code(),
        }
    }
}

pub type PlannerResult<T> = std::result::Result<T, PlannerError>;

/// Serializable form of an error, as shown to clients.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorReport {
    pub code: &'static str,
    pub message: String,
}

impl From<&PlannerError> for ErrorReport {
    fn from(err: &PlannerError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}
