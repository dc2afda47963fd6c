//! Progress tracking service.

use std::sync::Arc;

use bidboard_api::MarketplaceApi;
use bidboard_core::{ProgressRequest, ProgressUpdate, Project, ProjectId, ProjectStatus, UserId};
use bidboard_storage::Storage;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::draft::ProgressDraft;
use crate::error::{Result, TrackerError};
use crate::estimator::{CompletionEstimator, TimeEstimation};

/// Fallback notice when the server gives no reason.
pub const UPDATE_FAILED: &str = "Failed to update progress";

/// Outcome of a successful progress submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSubmitted {
    /// Project after the update
    pub project: Project,

    /// Log entry, when the server returned one
    pub update: Option<ProgressUpdate>,

    /// Progress before the update
    pub previous: u8,

    /// Confirmation for the freelancer
    pub message: String,
}

impl ProgressSubmitted {
    /// The update reported the work as finished.
    pub fn is_completion(&self) -> bool {
        self.project.progress >= 100
    }
}

/// Submits progress updates and keeps the local log in step.
pub struct ProgressTracker<S: Storage, A: MarketplaceApi> {
    storage: Arc<Mutex<S>>,
    api: Arc<A>,
    estimator: CompletionEstimator,
}

impl<S: Storage, A: MarketplaceApi> ProgressTracker<S, A> {
    /// Create a tracker over a shared store and API.
    pub fn new(storage: Arc<Mutex<S>>, api: Arc<A>) -> Self {
        Self {
            storage,
            api,
            estimator: CompletionEstimator,
        }
    }

    /// Project that passes `check`. A cached copy that fails is fetched
    /// again before the request is refused.
    async fn checked_project<F>(&self, id: &ProjectId, check: F) -> Result<Project>
    where
        F: Fn(&Project) -> Result<()>,
    {
        let cached = self.storage.lock().await.load_project(id).await?;
        if let Some(project) = cached {
            match check(&project) {
                Ok(()) => return Ok(project),
                Err(e) => debug!(project_id = %id, reason = %e, "cached project refused, refetching"),
            }
        }
        let project = self.api.project(id).await?;
        self.storage.lock().await.save_project(&project).await?;
        check(&project)?;
        Ok(project)
    }

    fn check(viewer: &UserId, project: &Project) -> Result<()> {
        if !project.is_assigned_freelancer(viewer) {
            return Err(TrackerError::NotAssigned);
        }
        if project.status != ProjectStatus::InProgress {
            return Err(TrackerError::NotInProgress {
                project: project.id.clone(),
                status: project.status,
            });
        }
        Ok(())
    }

    /// Open the update form. Always a fresh draft.
    pub async fn open_draft(&self, viewer: &UserId, project_id: &ProjectId) -> Result<ProgressDraft> {
        let project = self
            .checked_project(project_id, |project| Self::check(viewer, project))
            .await?;
        Ok(ProgressDraft::open(project.progress))
    }

    /// Report progress on a project.
    ///
    /// The request is checked before anything is sent, against the cached
    /// project or, when that refuses it, a fresh copy. On success the returned
    /// log entry is appended locally and the cached project advanced.
    pub async fn submit(
        &self,
        viewer: &UserId,
        project_id: &ProjectId,
        request: ProgressRequest,
    ) -> Result<ProgressSubmitted> {
        let mut project = self
            .checked_project(project_id, |project| {
                Self::check(viewer, project)?;
                request.validate(project.progress)?;
                Ok(())
            })
            .await?;

        let previous = project.progress;
        let outcome = self.api.update_progress(project_id, &request).await?;

        match outcome.project {
            Some(updated) => project = updated,
            None => project.progress = request.progress,
        }

        let mut storage = self.storage.lock().await;
        if let Some(update) = &outcome.update {
            storage.save_progress_update(update).await?;
        }
        storage.save_project(&project).await?;
        storage
            .commit(&format!("progress {project_id} {previous}->{}", request.progress))
            .await?;
        drop(storage);

        info!(
            project_id = %project_id,
            previous,
            current = request.progress,
            notify_client = request.notify_client,
            "progress updated"
        );

        Ok(ProgressSubmitted {
            project,
            update: outcome.update,
            previous,
            message: request.success_message(),
        })
    }

    /// Progress log, oldest first. Refreshes the local log from the server.
    pub async fn history(&self, project_id: &ProjectId) -> Result<Vec<ProgressUpdate>> {
        let updates = self.api.progress_history(project_id).await?;
        debug!(project_id = %project_id, count = updates.len(), "progress history");

        let mut storage = self.storage.lock().await;
        for update in &updates {
            storage.save_progress_update(update).await?;
        }
        Ok(storage.list_progress_updates(project_id).await?)
    }

    /// Completion estimate from the local log.
    pub async fn estimate(&self, project_id: &ProjectId) -> Result<Option<TimeEstimation>> {
        let updates = self.storage.lock().await.list_progress_updates(project_id).await?;
        Ok(self.estimator.estimate(&updates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bidboard_api::MockApi;
    use bidboard_core::ProgressError;
    use bidboard_storage::MemoryStorage;

    fn project(status: &str, progress: u8) -> Project {
        serde_json::from_value(serde_json::json!({
            "_id": "p1",
            "title": "Literature review",
            "status": status,
            "clientId": "c1",
            "assignedFreelancer": "f1",
            "progress": progress,
            "bids": [{"_id": "b1", "freelancerId": "f1", "amount": 800,
                      "status": "accepted", "confirmationStatus": "confirmed"}]
        }))
        .unwrap()
    }

    fn tracker(api: MockApi) -> (ProgressTracker<MemoryStorage, MockApi>, Arc<Mutex<MemoryStorage>>, Arc<MockApi>) {
        let storage = Arc::new(Mutex::new(MemoryStorage::new()));
        let api = Arc::new(api);
        (ProgressTracker::new(storage.clone(), api.clone()), storage, api)
    }

    #[tokio::test]
    async fn test_incremental_update() {
        let (tracker, storage, api) = tracker(MockApi::new().with_project(project("in-progress", 20)));
        let id = ProjectId::new("p1");

        let mut request = ProgressRequest::new(50);
        request.milestone = Some("Sources collected".to_string());
        let done = tracker.submit(&UserId::new("f1"), &id, request).await.unwrap();

        assert_eq!(done.previous, 20);
        assert_eq!(done.project.progress, 50);
        assert!(!done.is_completion());
        assert_eq!(done.message, "Progress updated to 50%. The client has been notified.");

        let storage = storage.lock().await;
        assert_eq!(storage.load_project(&id).await.unwrap().unwrap().progress, 50);
        let log = storage.list_progress_updates(&id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].milestone.as_deref(), Some("Sources collected"));
        assert_eq!(api.call_count("update_progress"), 1);
    }

    #[tokio::test]
    async fn test_completion_without_echo() {
        let (tracker, storage, api) = tracker(MockApi::new().with_project(project("in-progress", 90)));
        api.set_echo(false);

        let done = tracker
            .submit(&UserId::new("f1"), &ProjectId::new("p1"), ProgressRequest::new(100))
            .await
            .unwrap();

        assert!(done.is_completion());
        assert_eq!(
            done.message,
            "Project marked as complete! The client will review and approve the delivery."
        );
        let cached = storage.lock().await.load_project(&ProjectId::new("p1")).await.unwrap().unwrap();
        assert!(cached.awaiting_completion_approval());
    }

    #[tokio::test]
    async fn test_refused_before_request() {
        let (tracker, _storage, api) = tracker(MockApi::new().with_project(project("in-progress", 40)));
        let id = ProjectId::new("p1");

        let err = tracker.submit(&UserId::new("f2"), &id, ProgressRequest::new(50)).await.unwrap_err();
        assert!(matches!(err, TrackerError::NotAssigned));

        let err = tracker.submit(&UserId::new("f1"), &id, ProgressRequest::new(30)).await.unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Progress(ProgressError::NotAdvancing { current: 40, requested: 30 })
        ));

        assert_eq!(api.call_count("update_progress"), 0);
    }

    #[tokio::test]
    async fn test_stale_open_cache_refetched() {
        let (tracker, storage, api) = tracker(MockApi::new().with_project(project("in-progress", 0)));
        storage.lock().await.save_project(&project("open", 0)).await.unwrap();
        let viewer = UserId::new("f1");
        let id = ProjectId::new("p1");

        let done = tracker.submit(&viewer, &id, ProgressRequest::new(20)).await.unwrap();
        assert_eq!(done.project.status, ProjectStatus::InProgress);
        assert_eq!(done.project.progress, 20);
        assert_eq!(api.call_count("project"), 1);
        assert_eq!(api.call_count("update_progress"), 1);

        // The refreshed copy is trusted from here on.
        tracker.open_draft(&viewer, &id).await.unwrap();
        assert_eq!(api.call_count("project"), 1);
    }

    #[tokio::test]
    async fn test_open_project_refused() {
        let (tracker, _storage, _api) = tracker(MockApi::new().with_project(project("open", 0)));
        let err = tracker
            .open_draft(&UserId::new("f1"), &ProjectId::new("p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::NotInProgress { status: ProjectStatus::Open, .. }));
    }

    #[tokio::test]
    async fn test_server_failure_keeps_cache() {
        let (tracker, storage, api) = tracker(MockApi::new().with_project(project("in-progress", 10)));
        api.fail("update_progress", "Project is locked");

        let err = tracker
            .submit(&UserId::new("f1"), &ProjectId::new("p1"), ProgressRequest::new(20))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(UPDATE_FAILED), "Project is locked");

        let cached = storage.lock().await.load_project(&ProjectId::new("p1")).await.unwrap().unwrap();
        assert_eq!(cached.progress, 10);
    }

    #[tokio::test]
    async fn test_history_and_draft() {
        let (tracker, _storage, _api) = tracker(MockApi::new().with_project(project("in-progress", 0)));
        let viewer = UserId::new("f1");
        let id = ProjectId::new("p1");

        for value in [10, 30] {
            let mut draft = tracker.open_draft(&viewer, &id).await.unwrap();
            draft.select(value).unwrap();
            tracker.submit(&viewer, &id, draft.into_request().unwrap()).await.unwrap();
        }

        let history = tracker.history(&id).await.unwrap();
        let values: Vec<u8> = history.iter().map(|u| u.new_progress).collect();
        assert_eq!(values, vec![10, 30]);

        let draft = tracker.open_draft(&viewer, &id).await.unwrap();
        assert_eq!(draft.current(), 30);
        assert_eq!(draft.selected(), None);
    }
}
