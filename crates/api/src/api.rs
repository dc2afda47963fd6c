//! Marketplace API trait.
//!
//! Workflows talk to the backend only through [`MarketplaceApi`], so they can
//! be driven by [`RestClient`](crate::RestClient) in production and by a mock
//! in tests.

use async_trait::async_trait;
use bidboard_core::{
    Attachment, BidId, BidSubmission, ProgressRequest, ProgressUpdate, Project, ProjectId,
    RecommendationBuckets, SuggestedFreelancer, User, Verification,
};
use serde::Serialize;

use crate::error::Result;

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    /// Logged-in account
    pub user: User,
    /// Bearer token, when the server returns one in the body
    pub token: Option<String>,
}

/// Result of a progress report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressOutcome {
    /// Created log entry, when echoed
    pub update: Option<ProgressUpdate>,
    /// Updated project, when echoed
    pub project: Option<Project>,
}

/// Payload for submitting a verification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    /// Kind of verification
    pub verification_type: String,
    /// Supporting documents
    pub documents: Vec<Attachment>,
}

/// Operations the dashboards perform against the backend.
///
/// Mutations return the updated project when the server echoes one; callers
/// refetch otherwise.
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    /// Authenticate with email and password.
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome>;

    /// End the server session.
    async fn logout(&self) -> Result<()>;

    /// The logged-in account.
    async fn current_user(&self) -> Result<User>;

    /// Projects posted by the logged-in client.
    async fn client_projects(&self) -> Result<Vec<Project>>;

    /// Projects the logged-in freelancer bid on or is assigned to.
    async fn freelancer_projects(&self) -> Result<Vec<Project>>;

    /// Projects open for bidding.
    async fn open_projects(&self) -> Result<Vec<Project>>;

    /// One project with its bids.
    async fn project(&self, id: &ProjectId) -> Result<Project>;

    /// Place a bid.
    async fn submit_bid(&self, project: &ProjectId, bid: &BidSubmission) -> Result<Option<Project>>;

    /// Client accepts a bid.
    async fn accept_bid(&self, project: &ProjectId, bid: &BidId) -> Result<Option<Project>>;

    /// Client rejects a bid.
    async fn reject_bid(&self, project: &ProjectId, bid: &BidId) -> Result<Option<Project>>;

    /// Freelancer confirms (`true`) or declines (`false`) an accepted bid.
    async fn confirm_bid(
        &self,
        project: &ProjectId,
        bid: &BidId,
        confirmed: bool,
    ) -> Result<Option<Project>>;

    /// Client funds escrow for a confirmed bid.
    async fn fund_escrow(&self, project: &ProjectId) -> Result<Option<Project>>;

    /// Client approves a project at 100%.
    async fn approve_completion(&self, project: &ProjectId) -> Result<Option<Project>>;

    /// Freelancer reports progress.
    async fn update_progress(
        &self,
        project: &ProjectId,
        request: &ProgressRequest,
    ) -> Result<ProgressOutcome>;

    /// Progress log of a project, oldest first.
    async fn progress_history(&self, project: &ProjectId) -> Result<Vec<ProgressUpdate>>;

    /// Open projects scored for the logged-in freelancer.
    async fn recommended_projects(&self) -> Result<RecommendationBuckets>;

    /// Freelancers suggested for a project.
    async fn suggested_freelancers(&self, project: &ProjectId) -> Result<Vec<SuggestedFreelancer>>;

    /// Submit a verification for admin review.
    async fn submit_verification(&self, request: &VerificationRequest) -> Result<Option<Verification>>;

    /// The logged-in user's latest verification.
    async fn verification_status(&self) -> Result<Option<Verification>>;
}
