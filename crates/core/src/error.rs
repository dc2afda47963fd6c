//! Rule violations raised by the domain model.

use crate::bid::{BidAction, BidStatus};
use crate::id::{BidId, ProjectId, VerificationId};
use crate::project::ProjectStatus;
use crate::verification::VerificationStatus;

/// A state machine refused a transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The bid's current status has no edge for the action
    #[error("bid {bid} cannot be {action} while {from}")]
    InvalidBid {
        /// Bid being changed
        bid: BidId,
        /// Status before the attempt
        from: BidStatus,
        /// Attempted action
        action: BidAction,
    },

    /// Another bid already won the project
    #[error("project {project} already has an accepted bid")]
    AlreadyAccepted {
        /// Project holding the accepted bid
        project: ProjectId,
    },

    /// The bid is not part of the project
    #[error("bid {bid} not found on project {project}")]
    BidNotFound {
        /// Project searched
        project: ProjectId,
        /// Missing bid
        bid: BidId,
    },

    /// Project lifecycle edge does not exist
    #[error("project {project} cannot move from {from} to {to}")]
    InvalidProject {
        /// Project being changed
        project: ProjectId,
        /// Current status
        from: ProjectStatus,
        /// Requested status
        to: ProjectStatus,
    },

    /// Completion requested before the work reached 100%
    #[error("project {project} is only {progress}% complete")]
    Incomplete {
        /// Project being completed
        project: ProjectId,
        /// Reported progress
        progress: u8,
    },

    /// Verification was already reviewed
    #[error("verification {verification} is already {status}")]
    AlreadyReviewed {
        /// Verification being reviewed
        verification: VerificationId,
        /// Status it holds
        status: VerificationStatus,
    },
}

/// A progress request the picker would not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressError {
    /// Only multiples of ten between 10 and 100 are offered
    #[error("progress must be one of 10, 20, ..., 100 (got {0})")]
    NotADecile(u8),

    /// The value is at or below the current progress
    #[error("progress {requested}% does not advance beyond {current}%")]
    NotAdvancing {
        /// Project progress before the update
        current: u8,
        /// Requested progress
        requested: u8,
    },

    /// No value was picked
    #[error("Please select a progress value")]
    NothingSelected,
}

/// A bid draft that cannot be submitted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DraftError {
    /// Amount must be positive
    #[error("bid amount must be greater than zero")]
    NonPositiveAmount,

    /// Timeline must be at least one day
    #[error("timeline must be at least one day")]
    EmptyTimeline,

    /// Cover letter is required
    #[error("cover letter is required")]
    EmptyCoverLetter,

    /// Amount is outside the project's budget
    #[error("bid amount {amount} is outside the budget {min}-{max}")]
    OutsideBudget {
        /// Offered amount
        amount: f64,
        /// Project minimum budget
        min: f64,
        /// Project maximum budget
        max: f64,
    },
}
