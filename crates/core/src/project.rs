//! Project model - a client's listing and everything attached to it.

use serde::{Deserialize, Serialize};
use crate::bid::{Bid, BidAction, BidStatus};
use crate::error::TransitionError;
use crate::id::{BidId, ProjectId, UserId};
use crate::progress::Attachment;
use crate::user::UserRef;
use crate::Time;

/// A project posted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier
    #[serde(rename = "_id")]
    pub id: ProjectId,

    /// Project title
    pub title: String,

    /// Short introduction
    #[serde(default)]
    pub introduction: String,

    /// Full requirements
    #[serde(default)]
    pub detailed_requirements: String,

    /// Required skills
    #[serde(default)]
    pub skills: Vec<String>,

    /// Lower budget bound
    #[serde(default)]
    pub budget_min: f64,

    /// Upper budget bound
    #[serde(default)]
    pub budget_max: f64,

    /// Delivery deadline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Time>,

    /// Lifecycle status
    pub status: ProjectStatus,

    /// Category label
    #[serde(default)]
    pub category: String,

    /// Owning client
    #[serde(rename = "clientId")]
    pub client: UserRef,

    /// Freelancer holding the project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_freelancer: Option<UserRef>,

    /// Bids received
    #[serde(default)]
    pub bids: Vec<Bid>,

    /// Reported completion, 0-100
    #[serde(default)]
    pub progress: u8,

    /// Deliverables description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deliverables: Option<String>,

    /// Attached files
    #[serde(default)]
    pub files: Vec<Attachment>,

    /// When created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Time>,
}

impl Project {
    /// The bid currently holding the project, if any.
    pub fn accepted_bid(&self) -> Option<&Bid> {
        self.bids.iter().find(|b| b.status.is_winning())
    }

    /// Whether any bid is accepted or confirmed.
    pub fn has_accepted_bid(&self) -> bool {
        self.accepted_bid().is_some()
    }

    /// Look up a bid.
    pub fn bid(&self, id: &BidId) -> Option<&Bid> {
        self.bids.iter().find(|b| &b.id == id)
    }

    /// Bids still awaiting a decision.
    pub fn pending_bids(&self) -> impl Iterator<Item = &Bid> {
        self.bids.iter().filter(|b| b.status == BidStatus::Pending)
    }

    /// Whether `user` owns the project.
    pub fn is_client(&self, user: &UserId) -> bool {
        self.client.id() == user
    }

    /// Whether `user` is the assigned freelancer.
    pub fn is_assigned_freelancer(&self, user: &UserId) -> bool {
        self.assigned_freelancer.as_ref().is_some_and(|f| f.id() == user)
    }

    /// Open project whose winning bid was confirmed: the client owes escrow.
    pub fn awaiting_escrow(&self) -> bool {
        self.status == ProjectStatus::Open
            && self.bids.iter().any(|b| b.status == BidStatus::Confirmed)
    }

    /// Work reported done; the client owes an approval.
    pub fn awaiting_completion_approval(&self) -> bool {
        self.status == ProjectStatus::InProgress && self.progress >= 100
    }

    /// Apply a bid action locally, mirroring the backend's side effects.
    ///
    /// Accepting requires that no other bid holds the project and rejects
    /// every pending sibling. Declining releases the assignment.
    pub fn apply_bid_action(
        &mut self,
        bid_id: &BidId,
        action: BidAction,
    ) -> Result<BidStatus, TransitionError> {
        if action == BidAction::Accept && self.has_accepted_bid() {
            return Err(TransitionError::AlreadyAccepted {
                project: self.id.clone(),
            });
        }

        let project_id = self.id.clone();
        let bid = self
            .bids
            .iter_mut()
            .find(|b| &b.id == bid_id)
            .ok_or_else(|| TransitionError::BidNotFound {
                project: project_id,
                bid: bid_id.clone(),
            })?;
        let status = bid.apply(action)?;
        let freelancer = bid.freelancer.clone();

        match action {
            BidAction::Accept => {
                for sibling in self.bids.iter_mut().filter(|b| &b.id != bid_id) {
                    if sibling.status == BidStatus::Pending {
                        sibling.status = BidStatus::Rejected;
                    }
                }
                self.assigned_freelancer = Some(freelancer);
            }
            BidAction::Decline => {
                self.assigned_freelancer = None;
            }
            BidAction::Reject | BidAction::Confirm => {}
        }

        Ok(status)
    }

    /// Move the project along its lifecycle.
    pub fn transition_to(&mut self, to: ProjectStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(to) {
            return Err(TransitionError::InvalidProject {
                project: self.id.clone(),
                from: self.status,
                to,
            });
        }
        if to == ProjectStatus::Completed && self.progress < 100 {
            return Err(TransitionError::Incomplete {
                project: self.id.clone(),
                progress: self.progress,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Check the project against a filter.
    pub fn matches(&self, filter: &ProjectFilter) -> bool {
        if let Some(statuses) = &filter.status {
            if !statuses.contains(&self.status) {
                return false;
            }
        }
        if let Some(client) = &filter.client {
            if !self.is_client(client) {
                return false;
            }
        }
        if let Some(freelancer) = &filter.freelancer {
            let assigned = self.is_assigned_freelancer(freelancer);
            let bid_on = self.bids.iter().any(|b| b.freelancer_id() == freelancer);
            if !assigned && !bid_on {
                return false;
            }
        }
        true
    }
}

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    /// Accepting bids
    Open,
    /// Escrow funded, work underway
    InProgress,
    /// Client approved the delivery
    Completed,
    /// Withdrawn
    Cancelled,
}

impl ProjectStatus {
    /// Lifecycle edges.
    pub fn can_transition_to(self, to: ProjectStatus) -> bool {
        matches!(
            (self, to),
            (ProjectStatus::Open, ProjectStatus::InProgress)
                | (ProjectStatus::Open, ProjectStatus::Cancelled)
                | (ProjectStatus::InProgress, ProjectStatus::Completed)
                | (ProjectStatus::InProgress, ProjectStatus::Cancelled)
        )
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Open => "open",
            ProjectStatus::InProgress => "in-progress",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(ProjectStatus::Open),
            "in-progress" | "in_progress" | "inprogress" => Ok(ProjectStatus::InProgress),
            "completed" => Ok(ProjectStatus::Completed),
            "cancelled" | "canceled" => Ok(ProjectStatus::Cancelled),
            other => Err(format!("unknown project status: {other}")),
        }
    }
}

/// Filter for querying projects.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    /// Filter by status
    pub status: Option<Vec<ProjectStatus>>,

    /// Owned by this client
    pub client: Option<UserId>,

    /// Assigned to, or bid on by, this freelancer
    pub freelancer: Option<UserId>,
}
