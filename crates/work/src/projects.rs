//! Project workflow: escrow, progress, completion and dashboard lists.

use bidboard_api::MarketplaceApi;
use bidboard_core::{
    EventKind, ProgressRequest, Project, ProjectFilter, ProjectId, ProjectStatus,
    RecommendationBuckets, SuggestedFreelancer, UserId,
};
use bidboard_progress::{ProgressSubmitted, ProgressTracker, UPDATE_FAILED};
use bidboard_storage::Storage;
use tracing::info;

use crate::context::WorkContext;
use crate::error::{Result, WorkError};

/// Fallback when funding escrow fails.
pub const FUND_FAILED: &str = "Failed to fund escrow";
/// Fallback when approving completion fails.
pub const APPROVE_FAILED: &str = "Failed to approve completion";
/// Fallback when loading projects fails.
pub const LOAD_FAILED: &str = "Failed to load projects";

/// Client- and freelancer-side project operations.
pub struct ProjectWorkflow<S: Storage, A: MarketplaceApi> {
    ctx: WorkContext<S, A>,
    tracker: ProgressTracker<S, A>,
}

impl<S: Storage, A: MarketplaceApi> ProjectWorkflow<S, A> {
    /// Create the workflow over a shared context.
    pub fn new(ctx: WorkContext<S, A>) -> Self {
        let tracker = ProgressTracker::new(ctx.storage.clone(), ctx.api.clone());
        Self { ctx, tracker }
    }

    /// Progress tracker sharing this workflow's store.
    pub fn tracker(&self) -> &ProgressTracker<S, A> {
        &self.tracker
    }

    /// Client pays into escrow for a confirmed bid; the project starts.
    pub async fn fund_escrow(&self, viewer: &UserId, project_id: &ProjectId) -> Result<Project> {
        match self.try_fund(viewer, project_id).await {
            Ok(project) => Ok(project),
            Err(e) => self.ctx.fail(e, FUND_FAILED).await,
        }
    }

    async fn try_fund(&self, viewer: &UserId, project_id: &ProjectId) -> Result<Project> {
        self.ctx
            .checked_project(project_id, |project| {
                Self::require_client(project, viewer)?;
                if !project.awaiting_escrow() {
                    return Err(WorkError::Forbidden(
                        "Escrow can only be funded after the freelancer confirms".to_string(),
                    ));
                }
                project.clone().transition_to(ProjectStatus::InProgress)?;
                Ok(())
            })
            .await?;

        let _guard = self.ctx.begin(format!("project:{project_id}"))?;
        let echoed = self.ctx.api.fund_escrow(project_id).await?;
        let updated = self.ctx.apply(project_id, echoed, &format!("escrow {project_id}")).await?;

        info!(project_id = %project_id, "escrow funded");
        self.ctx.publish(project_id, EventKind::EscrowFunded);
        self.ctx.succeed("Escrow funded. The project is now in progress.").await;
        Ok(updated)
    }

    /// Client approves a delivery at 100%.
    pub async fn approve_completion(&self, viewer: &UserId, project_id: &ProjectId) -> Result<Project> {
        match self.try_approve(viewer, project_id).await {
            Ok(project) => Ok(project),
            Err(e) => self.ctx.fail(e, APPROVE_FAILED).await,
        }
    }

    async fn try_approve(&self, viewer: &UserId, project_id: &ProjectId) -> Result<Project> {
        self.ctx
            .checked_project(project_id, |project| {
                Self::require_client(project, viewer)?;
                project.clone().transition_to(ProjectStatus::Completed)?;
                Ok(())
            })
            .await?;

        let _guard = self.ctx.begin(format!("project:{project_id}"))?;
        let echoed = self.ctx.api.approve_completion(project_id).await?;
        let updated = self.ctx.apply(project_id, echoed, &format!("complete {project_id}")).await?;

        info!(project_id = %project_id, "project completed");
        self.ctx.publish(project_id, EventKind::ProjectCompleted);
        self.ctx.succeed("Project marked as completed").await;
        Ok(updated)
    }

    /// Freelancer reports progress; reaching 100% asks the client to approve.
    pub async fn report_progress(
        &self,
        viewer: &UserId,
        project_id: &ProjectId,
        request: ProgressRequest,
    ) -> Result<ProgressSubmitted> {
        let guard = match self.ctx.begin(format!("progress:{project_id}")) {
            Ok(guard) => guard,
            Err(e) => return self.ctx.fail(e, UPDATE_FAILED).await,
        };
        let submitted = match self.tracker.submit(viewer, project_id, request).await {
            Ok(submitted) => submitted,
            Err(e) => return self.ctx.fail(e.into(), UPDATE_FAILED).await,
        };
        drop(guard);

        self.ctx.publish(
            project_id,
            EventKind::ProgressUpdated {
                previous: submitted.previous,
                current: submitted.project.progress,
            },
        );
        if submitted.is_completion() {
            self.ctx.publish(project_id, EventKind::CompletionRequested);
        }
        self.ctx.succeed(submitted.message.clone()).await;
        Ok(submitted)
    }

    /// Reload the client's projects and replace them in the store.
    pub async fn refresh_client_projects(&self, viewer: &UserId) -> Result<Vec<Project>> {
        let filter = ProjectFilter {
            client: Some(viewer.clone()),
            ..Default::default()
        };
        self.refresh(filter, self.ctx.api.client_projects()).await
    }

    /// Reload the freelancer's projects and replace them in the store.
    pub async fn refresh_freelancer_projects(&self, viewer: &UserId) -> Result<Vec<Project>> {
        let filter = ProjectFilter {
            freelancer: Some(viewer.clone()),
            ..Default::default()
        };
        self.refresh(filter, self.ctx.api.freelancer_projects()).await
    }

    /// Reload projects open for bidding.
    pub async fn refresh_open_projects(&self) -> Result<Vec<Project>> {
        let filter = ProjectFilter {
            status: Some(vec![ProjectStatus::Open]),
            ..Default::default()
        };
        self.refresh(filter, self.ctx.api.open_projects()).await
    }

    async fn refresh(
        &self,
        filter: ProjectFilter,
        fetch: impl std::future::Future<Output = bidboard_api::Result<Vec<Project>>>,
    ) -> Result<Vec<Project>> {
        let projects = match fetch.await {
            Ok(projects) => projects,
            Err(e) => return self.ctx.fail(e.into(), LOAD_FAILED).await,
        };
        let mut storage = self.ctx.storage.lock().await;
        storage.apply_snapshot(&filter, &projects).await?;
        storage.commit("refresh projects").await?;
        Ok(projects)
    }

    /// Recommended projects for the logged-in freelancer.
    pub async fn recommended(&self) -> Result<RecommendationBuckets> {
        match self.ctx.api.recommended_projects().await {
            Ok(buckets) => Ok(buckets),
            Err(e) => self.ctx.fail(e.into(), "Failed to load recommendations").await,
        }
    }

    /// Freelancers suggested for one of the client's projects.
    pub async fn suggestions(&self, project_id: &ProjectId) -> Result<Vec<SuggestedFreelancer>> {
        match self.ctx.api.suggested_freelancers(project_id).await {
            Ok(list) => Ok(list),
            Err(e) => self.ctx.fail(e.into(), "Failed to load suggested freelancers").await,
        }
    }

    fn require_client(project: &Project, viewer: &UserId) -> Result<()> {
        if project.is_client(viewer) {
            Ok(())
        } else {
            Err(WorkError::Forbidden("Only the project owner can do this".to_string()))
        }
    }
}
