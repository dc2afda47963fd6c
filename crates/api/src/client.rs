//! REST client for the marketplace backend.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bidboard_core::{
    BidId, BidSubmission, ProgressRequest, ProgressUpdate, Project, ProjectId,
    RecommendationBuckets, SuggestedFreelancer, User, Verification,
};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::api::{LoginOutcome, MarketplaceApi, ProgressOutcome, VerificationRequest};
use crate::config::ApiConfig;
use crate::envelope::{
    decode_response, Ack, LoginBody, ProgressBody, ProgressHistoryBody, ProjectBody,
    ProjectsBody, RecommendationsBody, SuggestionsBody, UserBody, VerificationBody,
};
use crate::error::{ApiError, Result};

/// Marketplace REST client.
///
/// Keeps the server's session cookie and, when login returned one, a bearer
/// token. Cloning shares both.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl RestClient {
    /// Create a client from configuration.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Base URL requests are made against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replace the bearer token, e.g. one restored from a saved session.
    pub fn set_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.token.write() {
            *slot = token;
        }
    }

    /// Current bearer token.
    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        endpoint(&self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.text().await?;
        debug!(%url, status = status.as_u16(), "response");

        let decoded = decode_response(status.as_u16(), &body);
        if let Err(e) = &decoded {
            warn!(%url, error = %e, "request failed");
        }
        decoded
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.request(Method::GET, path)).await
    }

    pub(crate) async fn get_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T> {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    pub(crate) async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(self.request(Method::PATCH, path).json(body)).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.request(Method::DELETE, path)).await
    }
}

/// Join a base URL and a path with exactly one slash.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[async_trait]
impl MarketplaceApi for RestClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let body: LoginBody = self
            .post("/user/login", &json!({ "email": email, "password": password }))
            .await?;
        if body.token.is_some() {
            self.set_token(body.token.clone());
        }
        Ok(LoginOutcome {
            user: body.user,
            token: body.token,
        })
    }

    async fn logout(&self) -> Result<()> {
        let result = self.post::<Ack, _>("/user/logout", &json!({})).await;
        self.set_token(None);
        result.map(|_| ())
    }

    async fn current_user(&self) -> Result<User> {
        let body: UserBody = self.get("/user/me").await?;
        Ok(body.user)
    }

    async fn client_projects(&self) -> Result<Vec<Project>> {
        let body: ProjectsBody = self.get("/project/client/projects").await?;
        Ok(body.projects)
    }

    async fn freelancer_projects(&self) -> Result<Vec<Project>> {
        let body: ProjectsBody = self.get("/project/freelancer/projects").await?;
        Ok(body.projects)
    }

    async fn open_projects(&self) -> Result<Vec<Project>> {
        let body: ProjectsBody = self.get("/project/open").await?;
        Ok(body.projects)
    }

    async fn project(&self, id: &ProjectId) -> Result<Project> {
        let body: ProjectBody = self.get(&format!("/project/{id}")).await?;
        body.project
            .ok_or_else(|| ApiError::Rejected(format!("Project {id} not found")))
    }

    async fn submit_bid(&self, project: &ProjectId, bid: &BidSubmission) -> Result<Option<Project>> {
        let body: ProjectBody = self.post(&format!("/project/{project}/bid"), bid).await?;
        Ok(body.project)
    }

    async fn accept_bid(&self, project: &ProjectId, bid: &BidId) -> Result<Option<Project>> {
        let body: ProjectBody = self
            .put(&format!("/project/{project}/bids/{bid}/accept"), &json!({}))
            .await?;
        Ok(body.project)
    }

    async fn reject_bid(&self, project: &ProjectId, bid: &BidId) -> Result<Option<Project>> {
        let body: ProjectBody = self
            .put(&format!("/project/{project}/bids/{bid}/reject"), &json!({}))
            .await?;
        Ok(body.project)
    }

    async fn confirm_bid(
        &self,
        project: &ProjectId,
        bid: &BidId,
        confirmed: bool,
    ) -> Result<Option<Project>> {
        let body: ProjectBody = self
            .post(
                &format!("/project/{project}/bids/{bid}/confirm"),
                &json!({ "confirmed": confirmed }),
            )
            .await?;
        Ok(body.project)
    }

    async fn fund_escrow(&self, project: &ProjectId) -> Result<Option<Project>> {
        let body: ProjectBody = self.post(&format!("/project/{project}/payment"), &json!({})).await?;
        Ok(body.project)
    }

    async fn approve_completion(&self, project: &ProjectId) -> Result<Option<Project>> {
        let body: ProjectBody = self.put(&format!("/project/{project}/complete"), &json!({})).await?;
        Ok(body.project)
    }

    async fn update_progress(
        &self,
        project: &ProjectId,
        request: &ProgressRequest,
    ) -> Result<ProgressOutcome> {
        let body: ProgressBody = self.post(&format!("/project/{project}/progress"), request).await?;
        Ok(ProgressOutcome {
            update: body.progress_update,
            project: body.project,
        })
    }

    async fn progress_history(&self, project: &ProjectId) -> Result<Vec<ProgressUpdate>> {
        let body: ProgressHistoryBody = self.get(&format!("/project/{project}/progress")).await?;
        Ok(body.updates)
    }

    async fn recommended_projects(&self) -> Result<RecommendationBuckets> {
        let body: RecommendationsBody = self.get("/matching/recommended-projects").await?;
        Ok(body.into_buckets())
    }

    async fn suggested_freelancers(&self, project: &ProjectId) -> Result<Vec<SuggestedFreelancer>> {
        let body: SuggestionsBody = self
            .get(&format!("/matching/suggested-freelancers/{project}"))
            .await?;
        Ok(bidboard_core::rank_suggestions(body.freelancers))
    }

    async fn submit_verification(&self, request: &VerificationRequest) -> Result<Option<Verification>> {
        let body: VerificationBody = self.post("/verification/submit", request).await?;
        Ok(body.verification)
    }

    async fn verification_status(&self) -> Result<Option<Verification>> {
        let body: VerificationBody = self.get("/verification/status").await?;
        Ok(body.verification)
    }
}
