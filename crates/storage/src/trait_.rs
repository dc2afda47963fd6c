//! Storage trait abstraction.

use std::collections::HashSet;

use async_trait::async_trait;
use bidboard_core::{
    ProgressUpdate, Project, ProjectFilter, ProjectId, User, UserId, Verification,
    VerificationId,
};
use crate::session::Session;

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Local entity store keyed by id.
///
/// Workflows apply mutation results here instead of re-fetching whole
/// collections; `save_*` is an upsert and `delete_*` invalidates an entry.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Project operations ===

    /// Save a project (create or replace).
    async fn save_project(&mut self, project: &Project) -> Result<()>;

    /// Load a project by ID.
    async fn load_project(&self, id: &ProjectId) -> Result<Option<Project>>;

    /// List projects matching the filter.
    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>>;

    /// Drop a project from the store.
    async fn delete_project(&mut self, id: &ProjectId) -> Result<()>;

    /// Replace the slice of the store selected by `filter` with `projects`:
    /// entries missing from the snapshot are dropped, the rest upserted.
    async fn apply_snapshot(&mut self, filter: &ProjectFilter, projects: &[Project]) -> Result<()> {
        let keep: HashSet<&ProjectId> = projects.iter().map(|p| &p.id).collect();
        for stale in self.list_projects(filter).await? {
            if !keep.contains(&stale.id) {
                self.delete_project(&stale.id).await?;
            }
        }
        for project in projects {
            self.save_project(project).await?;
        }
        Ok(())
    }

    // === Progress operations ===

    /// Append a progress update.
    async fn save_progress_update(&mut self, update: &ProgressUpdate) -> Result<()>;

    /// List a project's progress updates, oldest first.
    async fn list_progress_updates(&self, project_id: &ProjectId) -> Result<Vec<ProgressUpdate>>;

    // === Verification operations ===

    /// Save a verification.
    async fn save_verification(&mut self, verification: &Verification) -> Result<()>;

    /// Load a verification by ID.
    async fn load_verification(&self, id: &VerificationId) -> Result<Option<Verification>>;

    /// List all verifications.
    async fn list_verifications(&self) -> Result<Vec<Verification>>;

    // === User operations ===

    /// Save a user.
    async fn save_user(&mut self, user: &User) -> Result<()>;

    /// Load a user by ID.
    async fn load_user(&self, id: &UserId) -> Result<Option<User>>;

    // === Session ===

    /// Persist the session token.
    async fn save_session(&mut self, session: &Session) -> Result<()>;

    /// Load the session token, if any.
    async fn load_session(&self) -> Result<Option<Session>>;

    /// Forget the session.
    async fn clear_session(&mut self) -> Result<()>;

    // === Transaction support ===

    /// Commit pending changes with a message.
    async fn commit(&mut self, message: &str) -> Result<()>;

    /// Rollback pending changes.
    async fn rollback(&mut self) -> Result<()>;
}
