//! In-process stand-in for the backend.
//!
//! Applies the same state changes the server does so workflows can be
//! exercised without HTTP. Enabled for tests and by the `mock` feature.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bidboard_core::{
    Bid, BidAction, BidId, BidStatus, BidSubmission, ProgressRequest, ProgressUpdate,
    ProgressUpdateId, Project, ProjectId, ProjectStatus, RecommendationBuckets, ScoredProject,
    SuggestedFreelancer, User, UserId, UserRef, Verification,
};

use crate::api::{LoginOutcome, MarketplaceApi, ProgressOutcome, VerificationRequest};
use crate::error::{ApiError, Result};

#[derive(Default)]
struct MockState {
    user: Option<User>,
    projects: HashMap<ProjectId, Project>,
    progress: HashMap<ProjectId, Vec<ProgressUpdate>>,
    scored: Vec<ScoredProject>,
    suggestions: HashMap<ProjectId, Vec<SuggestedFreelancer>>,
    verification: Option<Verification>,
    failures: HashMap<String, String>,
    echo: bool,
    calls: Vec<String>,
    next_id: u32,
}

/// Mock [`MarketplaceApi`].
pub struct MockApi {
    state: Mutex<MockState>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    /// Empty backend that echoes updated projects.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                echo: true,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Log in as `user`.
    pub fn with_user(self, user: User) -> Self {
        self.state().user = Some(user);
        self
    }

    /// Seed a project.
    pub fn with_project(self, project: Project) -> Self {
        self.put_project(project);
        self
    }

    /// Replace a project server-side.
    pub fn put_project(&self, project: Project) {
        self.state().projects.insert(project.id.clone(), project);
    }

    /// Current server-side copy of a project.
    pub fn server_project(&self, id: &ProjectId) -> Option<Project> {
        self.state().projects.get(id).cloned()
    }

    /// Seed scored projects for recommendations.
    pub fn with_scored(self, scored: Vec<ScoredProject>) -> Self {
        self.state().scored = scored;
        self
    }

    /// Seed suggestions for a project.
    pub fn with_suggestions(self, project: ProjectId, suggestions: Vec<SuggestedFreelancer>) -> Self {
        self.state().suggestions.insert(project, suggestions);
        self
    }

    /// Make `op` (e.g. `"accept_bid"`) fail with `message`.
    pub fn fail(&self, op: &str, message: &str) {
        self.state().failures.insert(op.to_string(), message.to_string());
    }

    /// Stop failing `op`.
    pub fn heal(&self, op: &str) {
        self.state().failures.remove(op);
    }

    /// Whether mutations return the updated project.
    pub fn set_echo(&self, echo: bool) {
        self.state().echo = echo;
    }

    /// Operations called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Number of calls to `op`.
    pub fn call_count(&self, op: &str) -> usize {
        self.state().calls.iter().filter(|c| c.as_str() == op).count()
    }

    fn enter(&self, op: &str) -> Result<std::sync::MutexGuard<'_, MockState>> {
        let mut state = self.state();
        state.calls.push(op.to_string());
        if let Some(message) = state.failures.get(op).cloned() {
            return Err(ApiError::Rejected(message));
        }
        Ok(state)
    }

    fn mutate(
        &self,
        op: &str,
        id: &ProjectId,
        f: impl FnOnce(&mut Project, &mut MockState) -> std::result::Result<(), String>,
    ) -> Result<Option<Project>> {
        let mut state = self.enter(op)?;
        let mut project = state
            .projects
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))?;
        f(&mut project, &mut *state).map_err(|message| ApiError::Status { status: 400, message })?;
        state.projects.insert(id.clone(), project.clone());
        Ok(state.echo.then_some(project))
    }
}

fn not_found(id: &ProjectId) -> ApiError {
    ApiError::Status {
        status: 404,
        message: format!("Project {id} not found"),
    }
}

fn bid_action(project: &mut Project, bid: &BidId, action: BidAction) -> std::result::Result<(), String> {
    project
        .apply_bid_action(bid, action)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

#[async_trait]
impl MarketplaceApi for MockApi {
    async fn login(&self, email: &str, _password: &str) -> Result<LoginOutcome> {
        let state = self.enter("login")?;
        match &state.user {
            Some(user) if user.email == email => Ok(LoginOutcome {
                user: user.clone(),
                token: Some(format!("token-{}", user.id)),
            }),
            _ => Err(ApiError::Status {
                status: 400,
                message: "Invalid credentials".to_string(),
            }),
        }
    }

    async fn logout(&self) -> Result<()> {
        self.enter("logout").map(|_| ())
    }

    async fn current_user(&self) -> Result<User> {
        self.enter("current_user")?.user.clone().ok_or(ApiError::Unauthorized)
    }

    async fn client_projects(&self) -> Result<Vec<Project>> {
        let state = self.enter("client_projects")?;
        let me = state.user.as_ref().map(|u| u.id.clone());
        Ok(state
            .projects
            .values()
            .filter(|p| me.as_ref().is_some_and(|me| p.is_client(me)))
            .cloned()
            .collect())
    }

    async fn freelancer_projects(&self) -> Result<Vec<Project>> {
        let state = self.enter("freelancer_projects")?;
        let me = state.user.as_ref().map(|u| u.id.clone());
        Ok(state
            .projects
            .values()
            .filter(|p| {
                me.as_ref().is_some_and(|me| {
                    p.is_assigned_freelancer(me) || p.bids.iter().any(|b| b.freelancer_id() == me)
                })
            })
            .cloned()
            .collect())
    }

    async fn open_projects(&self) -> Result<Vec<Project>> {
        let state = self.enter("open_projects")?;
        Ok(state
            .projects
            .values()
            .filter(|p| p.status == ProjectStatus::Open)
            .cloned()
            .collect())
    }

    async fn project(&self, id: &ProjectId) -> Result<Project> {
        let state = self.enter("project")?;
        state.projects.get(id).cloned().ok_or_else(|| not_found(id))
    }

    async fn submit_bid(&self, project: &ProjectId, bid: &BidSubmission) -> Result<Option<Project>> {
        let bid = bid.clone();
        self.mutate("submit_bid", project, move |p, state| {
            let freelancer = state
                .user
                .as_ref()
                .map(|u| u.id.clone())
                .ok_or_else(|| "Please login first".to_string())?;
            if p.status != ProjectStatus::Open {
                return Err("Project is not open for bidding".to_string());
            }
            state.next_id += 1;
            p.bids.push(Bid {
                id: BidId::new(format!("bid-{}", state.next_id)),
                freelancer: UserRef::Id(freelancer),
                amount: bid.amount,
                proposal: bid.proposal,
                submitted_at: Some(chrono::Utc::now()),
                status: BidStatus::Pending,
            });
            Ok(())
        })
    }

    async fn accept_bid(&self, project: &ProjectId, bid: &BidId) -> Result<Option<Project>> {
        self.mutate("accept_bid", project, |p, _| bid_action(p, bid, BidAction::Accept))
    }

    async fn reject_bid(&self, project: &ProjectId, bid: &BidId) -> Result<Option<Project>> {
        self.mutate("reject_bid", project, |p, _| bid_action(p, bid, BidAction::Reject))
    }

    async fn confirm_bid(
        &self,
        project: &ProjectId,
        bid: &BidId,
        confirmed: bool,
    ) -> Result<Option<Project>> {
        let action = if confirmed { BidAction::Confirm } else { BidAction::Decline };
        self.mutate("confirm_bid", project, |p, _| bid_action(p, bid, action))
    }

    async fn fund_escrow(&self, project: &ProjectId) -> Result<Option<Project>> {
        self.mutate("fund_escrow", project, |p, _| {
            p.transition_to(ProjectStatus::InProgress).map_err(|e| e.to_string())
        })
    }

    async fn approve_completion(&self, project: &ProjectId) -> Result<Option<Project>> {
        self.mutate("approve_completion", project, |p, _| {
            p.transition_to(ProjectStatus::Completed).map_err(|e| e.to_string())
        })
    }

    async fn update_progress(
        &self,
        project: &ProjectId,
        request: &ProgressRequest,
    ) -> Result<ProgressOutcome> {
        let mut state = self.enter("update_progress")?;
        let mut p = state.projects.get(project).cloned().ok_or_else(|| not_found(project))?;
        let freelancer = p
            .assigned_freelancer
            .as_ref()
            .map(|f| f.id().clone())
            .unwrap_or_else(|| UserId::new("unknown"));

        state.next_id += 1;
        let update = ProgressUpdate {
            id: ProgressUpdateId::new(format!("pu-{}", state.next_id)),
            project_id: project.clone(),
            freelancer_id: freelancer,
            previous_progress: p.progress,
            new_progress: request.progress,
            milestone: request.milestone.clone(),
            note: request.note.clone(),
            attachments: Vec::new(),
            estimated_completion: request.estimated_completion,
            notify_client: request.notify_client,
            client_viewed: false,
            created_at: chrono::Utc::now(),
        };
        p.progress = request.progress;
        state.projects.insert(project.clone(), p.clone());
        state.progress.entry(project.clone()).or_default().push(update.clone());

        Ok(ProgressOutcome {
            update: Some(update),
            project: state.echo.then_some(p),
        })
    }

    async fn progress_history(&self, project: &ProjectId) -> Result<Vec<ProgressUpdate>> {
        let state = self.enter("progress_history")?;
        Ok(state.progress.get(project).cloned().unwrap_or_default())
    }

    async fn recommended_projects(&self) -> Result<RecommendationBuckets> {
        let state = self.enter("recommended_projects")?;
        Ok(RecommendationBuckets::from_scored(state.scored.clone()))
    }

    async fn suggested_freelancers(&self, project: &ProjectId) -> Result<Vec<SuggestedFreelancer>> {
        let state = self.enter("suggested_freelancers")?;
        Ok(bidboard_core::rank_suggestions(
            state.suggestions.get(project).cloned().unwrap_or_default(),
        ))
    }

    async fn submit_verification(&self, request: &VerificationRequest) -> Result<Option<Verification>> {
        let mut state = self.enter("submit_verification")?;
        let user = state.user.as_ref().map(|u| u.id.clone()).ok_or(ApiError::Unauthorized)?;
        state.next_id += 1;
        let verification = Verification {
            id: format!("v-{}", state.next_id).into(),
            user: UserRef::Id(user),
            verification_type: request.verification_type.clone(),
            documents: request.documents.clone(),
            status: bidboard_core::VerificationStatus::Pending,
            submitted_at: Some(chrono::Utc::now()),
            admin_review: None,
        };
        state.verification = Some(verification.clone());
        Ok(Some(verification))
    }

    async fn verification_status(&self) -> Result<Option<Verification>> {
        Ok(self.enter("verification_status")?.verification.clone())
    }
}
