//! Shared handles for workflows.

use std::sync::Arc;

use bidboard_api::MarketplaceApi;
use bidboard_core::{Event, EventKind, Project, ProjectId};
use bidboard_storage::Storage;
use tokio::sync::Mutex;
use tracing::debug;

use crate::bus::EventBus;
use crate::error::{Result, WorkError};
use crate::inflight::{InFlight, InFlightGuard};
use crate::notice::{Notice, Notifier};

/// Store, API, bus, notifier and in-flight set, shared by every workflow.
pub struct WorkContext<S: Storage, A: MarketplaceApi> {
    /// Entity cache
    pub storage: Arc<Mutex<S>>,
    /// Backend
    pub api: Arc<A>,
    /// Event bus
    pub bus: EventBus,
    /// Notice sink
    pub notifier: Arc<dyn Notifier>,
    /// Running requests
    pub inflight: InFlight,
}

impl<S: Storage, A: MarketplaceApi> Clone for WorkContext<S, A> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            api: self.api.clone(),
            bus: self.bus.clone(),
            notifier: self.notifier.clone(),
            inflight: self.inflight.clone(),
        }
    }
}

impl<S: Storage, A: MarketplaceApi> WorkContext<S, A> {
    /// Create a context with a fresh bus and in-flight set.
    pub fn new(storage: Arc<Mutex<S>>, api: Arc<A>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            storage,
            api,
            bus: EventBus::default(),
            notifier,
            inflight: InFlight::new(),
        }
    }

    /// Use an existing bus.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    /// Claim `key` or fail with [`WorkError::Busy`].
    pub fn begin(&self, key: String) -> Result<InFlightGuard> {
        self.inflight.try_begin(key.clone()).ok_or(WorkError::Busy(key))
    }

    /// Project that passes `check`.
    ///
    /// The cached copy is used when it passes. A miss, or a cached copy that
    /// fails, is fetched again and checked once more; only the server's copy
    /// can refuse the request.
    pub async fn checked_project<F>(&self, id: &ProjectId, check: F) -> Result<Project>
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
        let project = self.refresh_project(id).await?;
        check(&project)?;
        Ok(project)
    }

    /// Fetch a project and replace the cached copy.
    pub async fn refresh_project(&self, id: &ProjectId) -> Result<Project> {
        let project = self.api.project(id).await?;
        self.storage.lock().await.save_project(&project).await?;
        Ok(project)
    }

    /// Store a mutation result. When the server did not echo the project,
    /// the cached entry is dropped and fetched again.
    pub async fn apply(&self, id: &ProjectId, echoed: Option<Project>, message: &str) -> Result<Project> {
        let project = match echoed {
            Some(project) => {
                self.storage.lock().await.save_project(&project).await?;
                project
            }
            None => {
                debug!(project_id = %id, "no project in response, refetching");
                self.storage.lock().await.delete_project(id).await?;
                self.refresh_project(id).await?
            }
        };
        self.storage.lock().await.commit(message).await?;
        Ok(project)
    }

    /// Publish a project event.
    pub fn publish(&self, project: &ProjectId, kind: EventKind) {
        self.bus.publish(Event::new(project.clone(), kind));
    }

    /// Success notice.
    pub async fn succeed(&self, message: impl Into<String>) {
        self.notifier.notify(Notice::success(message)).await;
    }

    /// Failure notice for `err`, then hand the error back.
    pub async fn fail<T>(&self, err: WorkError, fallback: &str) -> Result<T> {
        self.notifier.notify(Notice::error(err.user_message(fallback))).await;
        Err(err)
    }
}
