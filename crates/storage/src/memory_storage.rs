//! In-memory storage implementation.
//!
//! Holds entities in maps keyed by id. Used as the workflow cache and in
//! tests; nothing survives the process.

use std::collections::HashMap;

use bidboard_core::{
    ProgressUpdate, Project, ProjectFilter, ProjectId, User, UserId, Verification,
    VerificationId,
};
use super::{Result, Session, Storage};

/// Map-backed storage.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    projects: HashMap<ProjectId, Project>,
    progress: HashMap<ProjectId, Vec<ProgressUpdate>>,
    verifications: HashMap<VerificationId, Verification>,
    users: HashMap<UserId, User>,
    session: Option<Session>,
    pending: bool,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether changes were made since the last commit.
    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// Number of cached projects.
    pub fn project_count(&self) -> usize {
        self.projects.len()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn save_project(&mut self, project: &Project) -> Result<()> {
        self.projects.insert(project.id.clone(), project.clone());
        self.pending = true;
        Ok(())
    }

    async fn load_project(&self, id: &ProjectId) -> Result<Option<Project>> {
        Ok(self.projects.get(id).cloned())
    }

    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .projects
            .values()
            .filter(|p| p.matches(filter))
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(projects)
    }

    async fn delete_project(&mut self, id: &ProjectId) -> Result<()> {
        self.projects.remove(id);
        self.pending = true;
        Ok(())
    }

    async fn save_progress_update(&mut self, update: &ProgressUpdate) -> Result<()> {
        let log = self.progress.entry(update.project_id.clone()).or_default();
        match log.iter_mut().find(|u| u.id == update.id) {
            Some(existing) => *existing = update.clone(),
            None => log.push(update.clone()),
        }
        log.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        self.pending = true;
        Ok(())
    }

    async fn list_progress_updates(&self, project_id: &ProjectId) -> Result<Vec<ProgressUpdate>> {
        Ok(self.progress.get(project_id).cloned().unwrap_or_default())
    }

    async fn save_verification(&mut self, verification: &Verification) -> Result<()> {
        self.verifications
            .insert(verification.id.clone(), verification.clone());
        self.pending = true;
        Ok(())
    }

    async fn load_verification(&self, id: &VerificationId) -> Result<Option<Verification>> {
        Ok(self.verifications.get(id).cloned())
    }

    async fn list_verifications(&self) -> Result<Vec<Verification>> {
        let mut all: Vec<_> = self.verifications.values().cloned().collect();
        all.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(all)
    }

    async fn save_user(&mut self, user: &User) -> Result<()> {
        self.users.insert(user.id.clone(), user.clone());
        self.pending = true;
        Ok(())
    }

    async fn load_user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.users.get(id).cloned())
    }

    async fn save_session(&mut self, session: &Session) -> Result<()> {
        self.session = Some(session.clone());
        Ok(())
    }

    async fn load_session(&self) -> Result<Option<Session>> {
        Ok(self.session.clone())
    }

    async fn clear_session(&mut self) -> Result<()> {
        self.session = None;
        Ok(())
    }

    async fn commit(&mut self, _message: &str) -> Result<()> {
        self.pending = false;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.pending = false;
        Ok(())
    }
}
