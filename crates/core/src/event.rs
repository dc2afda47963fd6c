//! Event model - things that happened to a project.

use crate::id::{BidId, EventId, ProjectId};
use crate::Time;
use serde::{Deserialize, Serialize};

/// Something that happened to a project, delivered to dashboard subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier
    pub id: EventId,

    /// When it was observed
    pub timestamp: Time,

    /// Project concerned
    pub project_id: ProjectId,

    /// What happened
    pub kind: EventKind,
}

impl Event {
    /// Create a new event.
    pub fn new(project_id: ProjectId, kind: EventKind) -> Self {
        Self {
            id: EventId::new(),
            timestamp: chrono::Utc::now(),
            project_id,
            kind,
        }
    }

    /// The dashboard prompt this event should raise, if any.
    pub fn prompt(&self) -> Option<DashboardPrompt> {
        match &self.kind {
            EventKind::BidConfirmed { bid_id } => Some(DashboardPrompt::Payment {
                project_id: self.project_id.clone(),
                bid_id: bid_id.clone(),
            }),
            EventKind::CompletionRequested => Some(DashboardPrompt::CompletionReview {
                project_id: self.project_id.clone(),
            }),
            _ => None,
        }
    }
}

/// Kinds of project events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A freelancer bid on the project
    BidSubmitted { bid_id: BidId },
    /// The client accepted a bid
    BidAccepted { bid_id: BidId },
    /// The client rejected a bid
    BidRejected { bid_id: BidId },
    /// The winning freelancer confirmed availability
    BidConfirmed { bid_id: BidId },
    /// The winning freelancer declined
    BidDeclined { bid_id: BidId },
    /// The client paid into escrow; work starts
    EscrowFunded,
    /// The freelancer reported progress
    ProgressUpdated { previous: u8, current: u8 },
    /// Progress reached 100% and awaits the client's approval
    CompletionRequested,
    /// The client approved the delivery
    ProjectCompleted,
    /// The project was withdrawn
    ProjectCancelled,
}

/// Popups the client dashboard raises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardPrompt {
    /// A bid was confirmed; fund escrow
    Payment {
        /// Project to fund
        project_id: ProjectId,
        /// Confirmed bid
        bid_id: BidId,
    },
    /// Work reported complete; review and approve
    CompletionReview {
        /// Project to review
        project_id: ProjectId,
    },
}
