//! Progress reporting.
//!
//! The freelancer-side update form, submission against the backend, the
//! local progress log and a completion estimate derived from it.

#![warn(missing_docs)]

pub mod draft;
pub mod error;
pub mod estimator;
pub mod tracker;

pub use draft::ProgressDraft;
pub use error::{Result, TrackerError};
pub use estimator::{CompletionEstimator, TimeEstimation};
pub use tracker::{ProgressSubmitted, ProgressTracker, UPDATE_FAILED};
