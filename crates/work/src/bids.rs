//! Bid workflow.
//!
//! Every step checks the bid rules locally, claims the in-flight key, calls
//! the backend, stores the result, publishes an event and posts a notice.
//! Failures post the server's message (or a fixed fallback) and are
//! returned; nothing is retried.

use std::collections::HashSet;

use bidboard_api::MarketplaceApi;
use bidboard_core::{
    BidAction, BidActions, BidDraft, BidId, EventKind, Project, ProjectId, ProjectStatus, Role,
    User, UserId,
};
use bidboard_storage::Storage;
use tracing::{info, warn};

use crate::context::WorkContext;
use crate::error::{Result, WorkError};
use crate::notice::Notice;

/// Fallback when submitting a bid fails.
pub const SUBMIT_FAILED: &str = "Failed to submit bid";
/// Fallback when accepting a bid fails.
pub const ACCEPT_FAILED: &str = "Failed to accept bid";
/// Fallback when rejecting a bid fails.
pub const REJECT_FAILED: &str = "Failed to reject bid";
/// Fallback when confirming or declining a bid fails.
pub const CONFIRM_FAILED: &str = "Failed to update bid confirmation";

/// Bid submission and decisions.
pub struct BidWorkflow<S: Storage, A: MarketplaceApi> {
    ctx: WorkContext<S, A>,
}

impl<S: Storage, A: MarketplaceApi> BidWorkflow<S, A> {
    /// Create the workflow over a shared context.
    pub fn new(ctx: WorkContext<S, A>) -> Self {
        Self { ctx }
    }

    /// Freelancer bids on an open project.
    pub async fn submit_bid(&self, viewer: &User, project_id: &ProjectId, draft: BidDraft) -> Result<Project> {
        match self.try_submit(viewer, project_id, draft).await {
            Ok(project) => Ok(project),
            Err(e) => self.ctx.fail(e, SUBMIT_FAILED).await,
        }
    }

    async fn try_submit(&self, viewer: &User, project_id: &ProjectId, draft: BidDraft) -> Result<Project> {
        if !viewer.is(Role::Freelancer) {
            return Err(WorkError::Forbidden("Only freelancers can bid on projects".to_string()));
        }
        let project = self
            .ctx
            .checked_project(project_id, |project| Self::check_biddable(project, &viewer.id))
            .await?;

        draft.validate()?;
        if let Some(warning) = draft.budget_warning(&project) {
            self.ctx.notifier.notify(Notice::info(warning.to_string())).await;
        }
        let submission = draft.into_submission()?;

        let _guard = self.ctx.begin(format!("bid:{project_id}"))?;
        let known: HashSet<BidId> = project.bids.iter().map(|b| b.id.clone()).collect();
        let echoed = self.ctx.api.submit_bid(project_id, &submission).await?;
        let updated = self.ctx.apply(project_id, echoed, &format!("bid on {project_id}")).await?;

        let new_bid = updated
            .bids
            .iter()
            .find(|b| !known.contains(&b.id) && b.freelancer_id() == &viewer.id);
        match new_bid {
            Some(bid) => self.ctx.publish(project_id, EventKind::BidSubmitted { bid_id: bid.id.clone() }),
            None => warn!(project_id = %project_id, "submitted bid not found in response"),
        }

        info!(project_id = %project_id, amount = submission.amount, "bid submitted");
        self.ctx.succeed("Bid submitted successfully").await;
        Ok(updated)
    }

    /// Client accepts a pending bid.
    pub async fn accept_bid(&self, viewer: &UserId, project_id: &ProjectId, bid_id: &BidId) -> Result<Project> {
        match self.decide(viewer, project_id, bid_id, BidAction::Accept).await {
            Ok(project) => Ok(project),
            Err(e) => self.ctx.fail(e, ACCEPT_FAILED).await,
        }
    }

    /// Client rejects a pending bid.
    pub async fn reject_bid(&self, viewer: &UserId, project_id: &ProjectId, bid_id: &BidId) -> Result<Project> {
        match self.decide(viewer, project_id, bid_id, BidAction::Reject).await {
            Ok(project) => Ok(project),
            Err(e) => self.ctx.fail(e, REJECT_FAILED).await,
        }
    }

    /// Winning freelancer confirms availability (`true`) or declines.
    pub async fn confirm_bid(
        &self,
        viewer: &UserId,
        project_id: &ProjectId,
        bid_id: &BidId,
        confirmed: bool,
    ) -> Result<Project> {
        let action = if confirmed { BidAction::Confirm } else { BidAction::Decline };
        match self.decide(viewer, project_id, bid_id, action).await {
            Ok(project) => Ok(project),
            Err(e) => self.ctx.fail(e, CONFIRM_FAILED).await,
        }
    }

    async fn decide(
        &self,
        viewer: &UserId,
        project_id: &ProjectId,
        bid_id: &BidId,
        action: BidAction,
    ) -> Result<Project> {
        self.ctx
            .checked_project(project_id, |project| Self::check(project, viewer, bid_id, action))
            .await?;

        let _guard = self.ctx.begin(format!("bid:{bid_id}"))?;
        let api = &self.ctx.api;
        let echoed = match action {
            BidAction::Accept => api.accept_bid(project_id, bid_id).await?,
            BidAction::Reject => api.reject_bid(project_id, bid_id).await?,
            BidAction::Confirm => api.confirm_bid(project_id, bid_id, true).await?,
            BidAction::Decline => api.confirm_bid(project_id, bid_id, false).await?,
        };
        let updated = self
            .ctx
            .apply(project_id, echoed, &format!("bid {bid_id} {action}"))
            .await?;

        let bid_id = bid_id.clone();
        let (kind, message) = match action {
            BidAction::Accept => (EventKind::BidAccepted { bid_id }, "Bid accepted successfully"),
            BidAction::Reject => (EventKind::BidRejected { bid_id }, "Bid rejected"),
            BidAction::Confirm => (
                EventKind::BidConfirmed { bid_id },
                "Availability confirmed. The client will now fund escrow.",
            ),
            BidAction::Decline => (EventKind::BidDeclined { bid_id }, "Bid declined"),
        };
        info!(project_id = %project_id, %action, "bid decision recorded");
        self.ctx.publish(project_id, kind);
        self.ctx.succeed(message).await;
        Ok(updated)
    }

    fn check_biddable(project: &Project, viewer: &UserId) -> Result<()> {
        if project.status != ProjectStatus::Open {
            return Err(WorkError::Forbidden("This project is no longer accepting bids".to_string()));
        }
        if project.bids.iter().any(|b| b.freelancer_id() == viewer) {
            return Err(WorkError::Forbidden("You have already bid on this project".to_string()));
        }
        Ok(())
    }

    /// Refuse actions the viewer would not be offered.
    fn check(project: &Project, viewer: &UserId, bid_id: &BidId, action: BidAction) -> Result<()> {
        let bid = project.bid(bid_id).ok_or_else(|| bidboard_core::TransitionError::BidNotFound {
            project: project.id.clone(),
            bid: bid_id.clone(),
        })?;
        let actions = BidActions::for_viewer(project, bid, viewer);
        let allowed = match action {
            BidAction::Accept => actions.accept,
            BidAction::Reject => actions.reject,
            BidAction::Confirm => actions.confirm,
            BidAction::Decline => actions.decline,
        };
        if allowed {
            return Ok(());
        }

        match action {
            BidAction::Accept | BidAction::Reject if !project.is_client(viewer) => Err(WorkError::Forbidden(
                "Only the project owner can accept or reject bids".to_string(),
            )),
            BidAction::Confirm | BidAction::Decline if bid.freelancer_id() != viewer => Err(
                WorkError::Forbidden("Only the bidding freelancer can respond".to_string()),
            ),
            _ => {
                // Surface the state machine's reason when it has one.
                project.clone().apply_bid_action(bid_id, action)?;
                let reason = if project.status != ProjectStatus::Open {
                    "This project is no longer open"
                } else if project.has_accepted_bid() {
                    "A bid on this project has already been accepted"
                } else {
                    "This bid can no longer be changed"
                };
                Err(WorkError::Forbidden(reason.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::{CollectingNotifier, NoticeLevel};
    use bidboard_api::MockApi;
    use bidboard_core::{BidStatus, TransitionError};
    use bidboard_storage::MemoryStorage;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn project(bids: serde_json::Value) -> Project {
        serde_json::from_value(serde_json::json!({
            "_id": "p1",
            "title": "Survey design",
            "status": "open",
            "clientId": "c1",
            "budgetMin": 400,
            "budgetMax": 1200,
            "bids": bids
        }))
        .unwrap()
    }

    fn user(id: &str, role: &str) -> User {
        serde_json::from_value(serde_json::json!({
            "_id": id, "fullname": "Test User", "email": format!("{id}@x.io"), "role": role
        }))
        .unwrap()
    }

    struct Fixture {
        flow: BidWorkflow<MemoryStorage, MockApi>,
        api: Arc<MockApi>,
        notices: Arc<CollectingNotifier>,
        ctx: WorkContext<MemoryStorage, MockApi>,
    }

    fn fixture(api: MockApi) -> Fixture {
        let api = Arc::new(api);
        let notices = Arc::new(CollectingNotifier::new());
        let ctx = WorkContext::new(
            Arc::new(Mutex::new(MemoryStorage::new())),
            api.clone(),
            notices.clone(),
        );
        Fixture {
            flow: BidWorkflow::new(ctx.clone()),
            api,
            notices,
            ctx,
        }
    }

    fn pending_pair() -> serde_json::Value {
        serde_json::json!([
            {"_id": "b1", "freelancerId": "f1", "amount": 900, "status": "pending"},
            {"_id": "b2", "freelancerId": "f2", "amount": 700, "status": "pending"}
        ])
    }

    #[tokio::test]
    async fn test_accept_freezes_siblings() {
        let fx = fixture(MockApi::new().with_project(project(pending_pair())));
        let mut events = fx.ctx.bus.subscribe();

        let p = fx
            .flow
            .accept_bid(&UserId::new("c1"), &ProjectId::new("p1"), &BidId::new("b1"))
            .await
            .unwrap();

        assert_eq!(p.bid(&BidId::new("b1")).unwrap().status, BidStatus::Accepted);
        assert_eq!(p.bid(&BidId::new("b2")).unwrap().status, BidStatus::Rejected);
        for bid in &p.bids {
            let actions = BidActions::for_viewer(&p, bid, &UserId::new("c1"));
            assert!(!actions.accept && !actions.reject);
        }

        let event = events.recv().await.unwrap();
        assert_eq!(event.kind, EventKind::BidAccepted { bid_id: BidId::new("b1") });
        assert_eq!(fx.notices.last().unwrap(), Notice::success("Bid accepted successfully"));
        assert!(fx.ctx.inflight.is_empty());
    }

    #[tokio::test]
    async fn test_second_accept_refused_locally() {
        let bids = serde_json::json!([
            {"_id": "b1", "freelancerId": "f1", "amount": 900, "status": "accepted"},
            {"_id": "b2", "freelancerId": "f2", "amount": 700, "status": "pending"}
        ]);
        let fx = fixture(MockApi::new().with_project(project(bids)));

        let err = fx
            .flow
            .accept_bid(&UserId::new("c1"), &ProjectId::new("p1"), &BidId::new("b2"))
            .await
            .unwrap_err();

        assert!(matches!(err, WorkError::Transition(TransitionError::AlreadyAccepted { .. })));
        assert_eq!(fx.api.call_count("accept_bid"), 0);
        assert_eq!(fx.notices.last().unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_stale_cache_refetched_before_refusing() {
        let fx = fixture(MockApi::new().with_project(project(pending_pair())));
        let stale = project(serde_json::json!([
            {"_id": "b1", "freelancerId": "f1", "amount": 900, "status": "pending"}
        ]));
        fx.ctx.storage.lock().await.save_project(&stale).await.unwrap();

        let p = fx
            .flow
            .accept_bid(&UserId::new("c1"), &ProjectId::new("p1"), &BidId::new("b2"))
            .await
            .unwrap();

        assert_eq!(p.bid(&BidId::new("b2")).unwrap().status, BidStatus::Accepted);
        assert_eq!(fx.api.call_count("project"), 1);
        assert_eq!(fx.api.call_count("accept_bid"), 1);
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_fetch() {
        let fx = fixture(MockApi::new().with_project(project(pending_pair())));
        fx.ctx
            .storage
            .lock()
            .await
            .save_project(&project(pending_pair()))
            .await
            .unwrap();

        fx.flow
            .reject_bid(&UserId::new("c1"), &ProjectId::new("p1"), &BidId::new("b2"))
            .await
            .unwrap();
        assert_eq!(fx.api.call_count("project"), 0);
    }

    #[tokio::test]
    async fn test_reject_after_accept_names_cause() {
        let bids = serde_json::json!([
            {"_id": "b1", "freelancerId": "f1", "amount": 900, "status": "accepted"},
            {"_id": "b2", "freelancerId": "f2", "amount": 700, "status": "pending"}
        ]);
        let fx = fixture(MockApi::new().with_project(project(bids)));

        let err = fx
            .flow
            .reject_bid(&UserId::new("c1"), &ProjectId::new("p1"), &BidId::new("b2"))
            .await
            .unwrap_err();

        assert!(
            matches!(err, WorkError::Forbidden(ref m) if m == "A bid on this project has already been accepted")
        );
        assert_eq!(fx.api.call_count("reject_bid"), 0);
    }

    #[tokio::test]
    async fn test_only_client_decides() {
        let fx = fixture(MockApi::new().with_project(project(pending_pair())));
        let err = fx
            .flow
            .reject_bid(&UserId::new("f2"), &ProjectId::new("p1"), &BidId::new("b1"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkError::Forbidden(_)));
        assert_eq!(fx.api.call_count("reject_bid"), 0);
    }

    #[tokio::test]
    async fn test_server_failure_uses_server_message() {
        let fx = fixture(MockApi::new().with_project(project(pending_pair())));
        fx.api.fail("reject_bid", "Bid was withdrawn");

        let err = fx
            .flow
            .reject_bid(&UserId::new("c1"), &ProjectId::new("p1"), &BidId::new("b2"))
            .await
            .unwrap_err();

        assert!(matches!(err, WorkError::Api(_)));
        assert_eq!(fx.notices.last().unwrap(), Notice::error("Bid was withdrawn"));
        // Released after failure.
        assert!(!fx.ctx.inflight.is_busy("bid:b2"));
        assert_eq!(fx.api.call_count("reject_bid"), 1);
    }

    #[tokio::test]
    async fn test_confirm_and_decline() {
        let bids = serde_json::json!([
            {"_id": "b1", "freelancerId": "f1", "amount": 900, "status": "accepted"}
        ]);
        let fx = fixture(MockApi::new().with_project(project(bids.clone())));
        let mut events = fx.ctx.bus.subscribe();

        let p = fx
            .flow
            .confirm_bid(&UserId::new("f1"), &ProjectId::new("p1"), &BidId::new("b1"), true)
            .await
            .unwrap();
        assert_eq!(p.bids[0].status, BidStatus::Confirmed);
        assert!(p.awaiting_escrow());
        assert!(events.recv().await.unwrap().prompt().is_some());

        let fx = fixture(MockApi::new().with_project(project(bids)));
        fx.api.set_echo(false);
        let p = fx
            .flow
            .confirm_bid(&UserId::new("f1"), &ProjectId::new("p1"), &BidId::new("b1"), false)
            .await
            .unwrap();
        assert_eq!(p.bids[0].status, BidStatus::Declined);
        assert!(p.assigned_freelancer.is_none());
        // Refetched because nothing was echoed.
        assert_eq!(fx.api.call_count("project"), 2);
    }

    #[tokio::test]
    async fn test_submit_bid() {
        let fx = fixture(
            MockApi::new()
                .with_user(user("f3", "freelancer"))
                .with_project(project(pending_pair())),
        );
        let mut events = fx.ctx.bus.subscribe();
        let viewer = user("f3", "freelancer");

        let p = fx
            .flow
            .submit_bid(&viewer, &ProjectId::new("p1"), BidDraft::new(950.0, 14, "I have run three similar surveys."))
            .await
            .unwrap();

        let mine = p.bids.iter().find(|b| b.freelancer_id() == &viewer.id).unwrap();
        assert!(mine.proposal.starts_with("Timeline: 14 days\n\n"));
        assert!(matches!(events.recv().await.unwrap().kind, EventKind::BidSubmitted { .. }));

        let err = fx
            .flow
            .submit_bid(&viewer, &ProjectId::new("p1"), BidDraft::new(900.0, 10, "Again"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_submit_bid_validation_and_budget_notice() {
        let fx = fixture(
            MockApi::new()
                .with_user(user("f3", "freelancer"))
                .with_project(project(serde_json::json!([]))),
        );
        let viewer = user("f3", "freelancer");

        let err = fx
            .flow
            .submit_bid(&viewer, &ProjectId::new("p1"), BidDraft::new(0.0, 5, "Hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkError::Draft(_)));
        assert_eq!(fx.api.call_count("submit_bid"), 0);

        fx.flow
            .submit_bid(&viewer, &ProjectId::new("p1"), BidDraft::new(2000.0, 5, "Premium offer"))
            .await
            .unwrap();
        let levels: Vec<NoticeLevel> = fx.notices.notices().iter().map(|n| n.level).collect();
        assert!(levels.contains(&NoticeLevel::Info));
        assert_eq!(levels.last(), Some(&NoticeLevel::Success));
    }
}
