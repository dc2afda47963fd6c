//! Marketplace workflows.
//!
//! Bid decisions, escrow and completion, progress reporting, user notices,
//! the project event bus and the dashboard watcher that feeds it.

#![warn(missing_docs)]

pub mod bids;
pub mod bus;
pub mod context;
pub mod error;
pub mod inflight;
pub mod notice;
pub mod projects;
pub mod session;
pub mod watcher;

pub use bids::BidWorkflow;
pub use bus::EventBus;
pub use context::WorkContext;
pub use error::{Result, WorkError};
pub use inflight::{InFlight, InFlightGuard};
pub use notice::{CollectingNotifier, LogNotifier, Notice, NoticeLevel, Notifier};
pub use projects::ProjectWorkflow;
pub use session::{require_role, require_session};
pub use watcher::{ChangeDetector, DashboardWatcher, WatchScope, WatcherHandle};
