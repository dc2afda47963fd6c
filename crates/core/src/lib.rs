//! Bidboard core data models.
//!
//! This crate defines the marketplace entities as the backend serves them,
//! the bid and project state machines, and the pure display helpers shared
//! by the dashboards.

#![warn(missing_docs)]

// Core identities
mod id;
mod error;

// Accounts
mod user;
mod verification;
mod admin;

// Projects and bidding
mod project;
mod bid;
mod proposal;
mod progress;
mod event;

// Matching and presentation
mod matching;
mod format;

// Re-exports
pub use id::*;
pub use error::{TransitionError, ProgressError, DraftError};

// Accounts
pub use user::{User, Role, UserSummary, UserRef};
pub use verification::{Verification, VerificationStatus, ReviewDecision, AdminReview};
pub use admin::{Dispute, DisputeStatus, PlatformSettings, AnalyticsReport};

// Projects & Bids
pub use project::{Project, ProjectStatus, ProjectFilter};
pub use bid::{Bid, BidStatus, BidAction, BidActions};
pub use proposal::{BidDraft, BidSubmission, ProposalText};
pub use progress::{
    Attachment, ProgressUpdate, ProgressOption, ProgressRequest, PROGRESS_STEPS,
    progress_options, is_selectable,
};
pub use event::{Event, EventKind, DashboardPrompt};

// Matching & formatting
pub use matching::{
    MatchLevel, MatchInfo, ScoredProject, SuggestedFreelancer, RecommendationBuckets,
    badge_class, rank_suggestions,
};
pub use format::{
    wrap_words, format_project_title, format_project_description, mask_name,
    TITLE_LINE_LIMIT, DESCRIPTION_LINE_LIMIT,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
