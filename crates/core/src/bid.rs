//! Bid model and the bid status state machine.
//!
//! The backend reports a bid's state through two overlapping fields,
//! `status` and `confirmationStatus`. They are folded into a single
//! [`BidStatus`] on decode and written back as both fields on encode.
//!
//! ```text
//! pending --accept--> accepted --confirm--> confirmed
//!    |                    |
//!    +--reject--> rejected +--decline--> declined
//! ```

use serde::{Deserialize, Serialize};
use crate::error::TransitionError;
use crate::id::{BidId, UserId};
use crate::project::{Project, ProjectStatus};
use crate::user::UserRef;
use crate::Time;

/// A freelancer's offer against an open project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BidWire", into = "BidWire")]
pub struct Bid {
    /// Unique identifier
    pub id: BidId,

    /// Bidding freelancer
    pub freelancer: UserRef,

    /// Offered amount
    pub amount: f64,

    /// Proposal text (timeline header plus cover letter)
    pub proposal: String,

    /// When the bid was submitted
    pub submitted_at: Option<Time>,

    /// Unified lifecycle status
    pub status: BidStatus,
}

impl Bid {
    /// The bidding freelancer's id.
    pub fn freelancer_id(&self) -> &UserId {
        self.freelancer.id()
    }

    /// Apply an action, failing when the state machine has no such edge.
    pub fn apply(&mut self, action: BidAction) -> Result<BidStatus, TransitionError> {
        let next = self.status.next(action).ok_or_else(|| TransitionError::InvalidBid {
            bid: self.id.clone(),
            from: self.status,
            action,
        })?;
        self.status = next;
        Ok(next)
    }
}

/// Bid lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BidStatus {
    /// Awaiting the client's decision
    Pending,
    /// Chosen by the client, awaiting the freelancer's confirmation
    Accepted,
    /// Turned down by the client (or by accepting a sibling)
    Rejected,
    /// Freelancer confirmed availability; payment flow follows
    Confirmed,
    /// Freelancer declined after acceptance
    Declined,
}

impl BidStatus {
    /// Transition table.
    pub fn next(self, action: BidAction) -> Option<BidStatus> {
        match (self, action) {
            (BidStatus::Pending, BidAction::Accept) => Some(BidStatus::Accepted),
            (BidStatus::Pending, BidAction::Reject) => Some(BidStatus::Rejected),
            (BidStatus::Accepted, BidAction::Confirm) => Some(BidStatus::Confirmed),
            (BidStatus::Accepted, BidAction::Decline) => Some(BidStatus::Declined),
            _ => None,
        }
    }

    /// Terminal states have no outgoing edges.
    pub fn is_terminal(self) -> bool {
        matches!(self, BidStatus::Rejected | BidStatus::Declined | BidStatus::Confirmed)
    }

    /// Whether this bid holds the project (accepted or confirmed).
    pub fn is_winning(self) -> bool {
        matches!(self, BidStatus::Accepted | BidStatus::Confirmed)
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BidStatus::Pending => "pending",
            BidStatus::Accepted => "accepted",
            BidStatus::Rejected => "rejected",
            BidStatus::Confirmed => "confirmed",
            BidStatus::Declined => "declined",
        }
    }
}

impl std::fmt::Display for BidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions that move a bid through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BidAction {
    /// Client accepts
    Accept,
    /// Client rejects
    Reject,
    /// Freelancer confirms availability
    Confirm,
    /// Freelancer declines
    Decline,
}

impl std::fmt::Display for BidAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BidAction::Accept => "accepted",
            BidAction::Reject => "rejected",
            BidAction::Confirm => "confirmed",
            BidAction::Decline => "declined",
        })
    }
}

/// Which bid controls a viewer is offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BidActions {
    /// Accept button
    pub accept: bool,
    /// Reject button
    pub reject: bool,
    /// Confirm availability button
    pub confirm: bool,
    /// Decline button
    pub decline: bool,
}

impl BidActions {
    /// Derive the available actions for `viewer` on `bid` within `project`.
    ///
    /// Accept/Reject belong to the project's client and disappear for every
    /// bid once any bid on the project is accepted or confirmed.
    /// Confirm/Decline belong to the bid's freelancer while it is accepted.
    pub fn for_viewer(project: &Project, bid: &Bid, viewer: &UserId) -> Self {
        let client_can_decide = project.is_client(viewer)
            && project.status == ProjectStatus::Open
            && bid.status == BidStatus::Pending
            && !project.has_accepted_bid();
        let freelancer_can_confirm =
            bid.freelancer_id() == viewer && bid.status == BidStatus::Accepted;

        Self {
            accept: client_can_decide,
            reject: client_can_decide,
            confirm: freelancer_can_confirm,
            decline: freelancer_can_confirm,
        }
    }

    /// Whether any control is shown.
    pub fn any(&self) -> bool {
        self.accept || self.reject || self.confirm || self.decline
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BidWire {
    #[serde(rename = "_id")]
    id: BidId,
    freelancer_id: UserRef,
    amount: f64,
    #[serde(default)]
    proposal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    submitted_at: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<BidStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confirmation_status: Option<BidStatus>,
}

/// Fold `status` and `confirmationStatus` into one value. A rejection wins,
/// then an explicit confirmation decision, then the primary status.
fn fold_status(status: Option<BidStatus>, confirmation: Option<BidStatus>) -> BidStatus {
    match (status, confirmation) {
        (Some(BidStatus::Rejected), _) => BidStatus::Rejected,
        (_, Some(BidStatus::Confirmed)) => BidStatus::Confirmed,
        (_, Some(BidStatus::Declined)) => BidStatus::Declined,
        (Some(status), _) => status,
        (None, _) => BidStatus::Pending,
    }
}

impl From<BidWire> for Bid {
    fn from(wire: BidWire) -> Self {
        Self {
            status: fold_status(wire.status, wire.confirmation_status),
            id: wire.id,
            freelancer: wire.freelancer_id,
            amount: wire.amount,
            proposal: wire.proposal,
            submitted_at: wire.submitted_at,
        }
    }
}

impl From<Bid> for BidWire {
    fn from(bid: Bid) -> Self {
        let confirmation_status = match bid.status {
            BidStatus::Pending | BidStatus::Accepted => Some(BidStatus::Pending),
            BidStatus::Confirmed => Some(BidStatus::Confirmed),
            BidStatus::Declined => Some(BidStatus::Declined),
            BidStatus::Rejected => None,
        };
        Self {
            id: bid.id,
            freelancer_id: bid.freelancer,
            amount: bid.amount,
            proposal: bid.proposal,
            submitted_at: bid.submitted_at,
            status: Some(bid.status),
            confirmation_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(status: BidStatus) -> Bid {
        Bid {
            id: BidId::new("b1"),
            freelancer: UserRef::Id(UserId::new("f1")),
            amount: 950.0,
            proposal: String::new(),
            submitted_at: None,
            status,
        }
    }

    #[test]
    fn test_transition_table() {
        use BidAction::*;
        use BidStatus::*;

        assert_eq!(Pending.next(Accept), Some(Accepted));
        assert_eq!(Pending.next(Reject), Some(Rejected));
        assert_eq!(Accepted.next(Confirm), Some(Confirmed));
        assert_eq!(Accepted.next(Decline), Some(Declined));

        assert_eq!(Pending.next(Confirm), None);
        assert_eq!(Accepted.next(Reject), None);
        for terminal in [Rejected, Declined, Confirmed] {
            assert!(terminal.is_terminal());
            for action in [Accept, Reject, Confirm, Decline] {
                assert_eq!(terminal.next(action), None);
            }
        }
    }

    #[test]
    fn test_apply_rejects_missing_edge() {
        let mut b = bid(BidStatus::Rejected);
        let err = b.apply(BidAction::Accept).unwrap_err();
        assert!(matches!(err, TransitionError::InvalidBid { from: BidStatus::Rejected, .. }));
        assert_eq!(b.status, BidStatus::Rejected);

        let mut b = bid(BidStatus::Pending);
        assert_eq!(b.apply(BidAction::Accept).unwrap(), BidStatus::Accepted);
    }

    #[test]
    fn test_wire_fields_fold_into_one_status() {
        let decoded: Bid = serde_json::from_str(
            r#"{"_id":"b1","freelancerId":"f1","amount":10,"status":"accepted","confirmationStatus":"confirmed"}"#,
        )
        .unwrap();
        assert_eq!(decoded.status, BidStatus::Confirmed);

        let decoded: Bid = serde_json::from_str(
            r#"{"_id":"b1","freelancerId":"f1","amount":10,"status":"accepted","confirmationStatus":"pending"}"#,
        )
        .unwrap();
        assert_eq!(decoded.status, BidStatus::Accepted);

        let decoded: Bid = serde_json::from_str(
            r#"{"_id":"b1","freelancerId":"f1","amount":10,"status":"rejected","confirmationStatus":"declined"}"#,
        )
        .unwrap();
        assert_eq!(decoded.status, BidStatus::Rejected);

        let decoded: Bid =
            serde_json::from_str(r#"{"_id":"b1","freelancerId":{"_id":"f1"},"amount":10}"#).unwrap();
        assert_eq!(decoded.status, BidStatus::Pending);
        assert_eq!(decoded.freelancer_id().as_str(), "f1");
    }

    #[test]
    fn test_accepted_bid_freezes_siblings() {
        use crate::project::tests::{bid as pbid, project};

        let client = UserId::new("c1");
        let mut p = project(vec![
            pbid("b1", "f1", BidStatus::Pending),
            pbid("b2", "f2", BidStatus::Pending),
        ]);
        for b in &p.bids {
            let actions = BidActions::for_viewer(&p, b, &client);
            assert!(actions.accept && actions.reject);
        }

        p.bids[0].status = BidStatus::Accepted;
        for b in &p.bids {
            let actions = BidActions::for_viewer(&p, b, &client);
            assert!(!actions.accept && !actions.reject);
        }

        let winner = BidActions::for_viewer(&p, &p.bids[0], &UserId::new("f1"));
        assert!(winner.confirm && winner.decline);
        let loser = BidActions::for_viewer(&p, &p.bids[1], &UserId::new("f2"));
        assert!(!loser.any());
    }

    #[test]
    fn test_only_client_decides() {
        use crate::project::tests::{bid as pbid, project};

        let p = project(vec![pbid("b1", "f1", BidStatus::Pending)]);
        let stranger = BidActions::for_viewer(&p, &p.bids[0], &UserId::new("someone"));
        assert!(!stranger.any());
        let own = BidActions::for_viewer(&p, &p.bids[0], &UserId::new("f1"));
        assert!(!own.any());
    }

    #[test]
    fn test_encode_writes_both_fields() {
        let json = serde_json::to_value(bid(BidStatus::Declined)).unwrap();
        assert_eq!(json["status"], "declined");
        assert_eq!(json["confirmationStatus"], "declined");
        assert_eq!(json["freelancerId"], "f1");

        let json = serde_json::to_value(bid(BidStatus::Accepted)).unwrap();
        assert_eq!(json["confirmationStatus"], "pending");
    }
}
