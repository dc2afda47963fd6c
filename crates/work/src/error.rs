//! Workflow errors.

use bidboard_api::ApiError;
use bidboard_core::{DraftError, ProjectId, TransitionError};
use bidboard_progress::TrackerError;
use bidboard_storage::StorageError;

/// Result alias for workflows.
pub type Result<T> = std::result::Result<T, WorkError>;

/// Why a workflow step did not happen.
#[derive(Debug, thiserror::Error)]
pub enum WorkError {
    /// Backend call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Local store failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A state machine refused the change
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Progress submission failed
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// Bid form is incomplete
    #[error(transparent)]
    Draft(#[from] DraftError),

    /// The viewer may not do this
    #[error("{0}")]
    Forbidden(String),

    /// The same request is already running
    #[error("{0} is already in progress")]
    Busy(String),

    /// Project unknown locally and remotely
    #[error("project {0} not found")]
    NotFound(ProjectId),

    /// No session; nothing was sent
    #[error("Please login first")]
    LoginRequired {
        /// Where to return after logging in
        from: String,
    },
}

impl WorkError {
    /// Notice text: the server's message, else `fallback` for opaque
    /// failures, else the error itself.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            WorkError::Api(e) => e.user_message(fallback),
            WorkError::Tracker(e) => e.user_message(fallback),
            WorkError::Storage(_) => fallback.to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the user must log in before retrying.
    pub fn needs_login(&self) -> bool {
        match self {
            WorkError::LoginRequired { .. } => true,
            WorkError::Api(e) => e.needs_login(),
            WorkError::Tracker(TrackerError::Api(e)) => e.needs_login(),
            _ => false,
        }
    }
}
