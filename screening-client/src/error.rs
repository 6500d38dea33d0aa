use reqwest::StatusCode;
use shared::models::{InvalidAge, QuestionFormatError};
use thiserror::Error;

use crate::storage::StorageError;

pub type ClientResult<T> = Result<T, ClientError>;

/// Input rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a valid age")]
    InvalidAge(#[from] InvalidAge),
    #[error("No responses found")]
    EmptyResponses,
}

/// Everything that can go wrong in the assessment lifecycle.
///
/// None of these are fatal: each resolves to a dialog, an inline message, or a
/// redirect to an earlier step.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to connect to the server: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response; `message` is the server's `error` or a per-call fallback.
    #[error("{message}")]
    Server { status: StatusCode, message: String },

    #[error("unexpected response from the server: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid question format: {0}")]
    QuestionFormat(#[from] QuestionFormatError),

    #[error("No questions found; missing {}", .missing.join(", "))]
    IncompleteSession { missing: Vec<&'static str> },

    #[error("No assessment result found")]
    NoResult,

    #[error("request cancelled before it completed")]
    Cancelled,

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}

impl ClientError {
    /// Dialog title for the error.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::InvalidAge(_)) => "Invalid Age",
            Self::Validation(ValidationError::EmptyResponses) => "Invalid Responses",
            Self::Storage(_) => "Storage Error",
            Self::Server { .. } => "Request Failed",
            Self::Cancelled => "Cancelled",
            _ => "Error",
        }
    }

    /// Whether the flow must send the user back to age entry.
    #[must_use]
    pub fn requires_age_entry(&self) -> bool {
        matches!(
            self,
            Self::IncompleteSession { .. } | Self::QuestionFormat(_)
        )
    }

    /// HTTP status for server-reported failures.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }
}

impl From<InvalidAge> for ClientError {
    fn from(err: InvalidAge) -> Self {
        Self::Validation(ValidationError::InvalidAge(err))
    }
}
