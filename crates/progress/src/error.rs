//! Progress tracking errors.

use bidboard_api::ApiError;
use bidboard_core::{ProgressError, ProjectId, ProjectStatus};
use bidboard_storage::StorageError;

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Why a progress update did not go through.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Backend call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Local store failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Picker rule violated
    #[error(transparent)]
    Progress(#[from] ProgressError),

    /// Viewer is not the project's assigned freelancer
    #[error("Only the assigned freelancer can update progress")]
    NotAssigned,

    /// Updates are only taken while work is under way
    #[error("project {project} is {status}, not in progress")]
    NotInProgress {
        /// Project
        project: ProjectId,
        /// Its status
        status: ProjectStatus,
    },
}

impl TrackerError {
    /// Notice text: the server's message for API failures, else the error itself.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            TrackerError::Api(e) => e.user_message(fallback),
            TrackerError::Storage(_) => fallback.to_string(),
            other => other.to_string(),
        }
    }
}
