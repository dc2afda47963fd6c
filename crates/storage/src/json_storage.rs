//! JSON file storage implementation.
//!
//! Stores data as JSON files under the data directory (`.bidboard` by
//! default) and keeps small per-object meta markers (version + updated_at).
//! The session token lives in `session.json` at the root.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use bidboard_core::{
    ProgressUpdate, Project, ProjectFilter, ProjectId, User, UserId, Verification,
    VerificationId,
};
use super::{Result, Session, Storage};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
    pending: Arc<Mutex<bool>>,
}

impl JsonStorage {
    /// Create storage, creating the subdirectories for data and meta markers.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        // Ensure primary directories
        fs::create_dir_all(root.join("projects")).await?;
        fs::create_dir_all(root.join("progress")).await?;
        fs::create_dir_all(root.join("verifications")).await?;
        fs::create_dir_all(root.join("users")).await?;

        // Directories for meta/versioning (only meta markers are stored)
        fs::create_dir_all(root.join("meta").join("projects")).await?;
        fs::create_dir_all(root.join("meta").join("verifications")).await?;
        fs::create_dir_all(root.join("meta").join("users")).await?;

        Ok(Self {
            root,
            pending: Arc::new(Mutex::new(false)),
        })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project_path(&self, id: &ProjectId) -> PathBuf {
        self.root.join("projects").join(format!("{}.json", file_stem(id.as_str())))
    }
    fn progress_dir(&self, project_id: &ProjectId) -> PathBuf {
        self.root.join("progress").join(file_stem(project_id.as_str()))
    }
    fn verification_path(&self, id: &VerificationId) -> PathBuf {
        self.root.join("verifications").join(format!("{}.json", file_stem(id.as_str())))
    }
    fn user_path(&self, id: &UserId) -> PathBuf {
        self.root.join("users").join(format!("{}.json", file_stem(id.as_str())))
    }
    fn session_path(&self) -> PathBuf {
        self.root.join("session.json")
    }

    fn meta_path(&self, kind: &str, id: &str) -> PathBuf {
        self.root.join("meta").join(kind).join(format!("{}.meta.json", file_stem(id)))
    }

    async fn set_pending(&self) {
        *self.pending.lock().await = true;
    }

    /// Whether changes were made since the last commit.
    pub async fn is_pending(&self) -> bool {
        *self.pending.lock().await
    }

    /// Read and increment per-object version, return new version.
    async fn bump_version(&self, kind: &str, id: &str) -> Result<u64> {
        let path = self.meta_path(kind, id);
        let mut version = 0u64;
        if let Ok(s) = fs::read_to_string(&path).await {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&s) {
                if let Some(v) = json.get("version").and_then(|v| v.as_u64()) {
                    version = v;
                }
            }
        }
        version += 1;
        let meta = serde_json::json!({"version": version, "updated_at": chrono::Utc::now()});
        fs::write(&path, serde_json::to_string_pretty(&meta)?.as_bytes()).await?;
        Ok(version)
    }

    /// Current version of an object, 0 if never written.
    pub async fn version(&self, kind: &str, id: &str) -> u64 {
        read_json::<serde_json::Value>(&self.meta_path(kind, id))
            .await
            .ok()
            .flatten()
            .and_then(|json| json.get("version").and_then(|v| v.as_u64()))
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_project(&mut self, project: &Project) -> Result<()> {
        write_json(&self.project_path(&project.id), project).await?;
        let ver = self.bump_version("projects", project.id.as_str()).await?;
        debug!(project_id = %project.id, version = ver, "saved project");

        self.set_pending().await;
        Ok(())
    }

    async fn load_project(&self, id: &ProjectId) -> Result<Option<Project>> {
        read_json(&self.project_path(id)).await
    }

    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>> {
        let all = list_dir(&self.root.join("projects")).await?;
        let mut projects: Vec<Project> = all
            .into_iter()
            .filter(|p: &Project| p.matches(filter))
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(projects)
    }

    async fn delete_project(&mut self, id: &ProjectId) -> Result<()> {
        remove_if_exists(&self.project_path(id)).await?;
        self.set_pending().await;
        Ok(())
    }

    async fn save_progress_update(&mut self, update: &ProgressUpdate) -> Result<()> {
        let dir = self.progress_dir(&update.project_id);
        fs::create_dir_all(&dir).await?;
        write_json(&dir.join(format!("{}.json", file_stem(update.id.as_str()))), update).await?;

        self.set_pending().await;
        Ok(())
    }

    async fn list_progress_updates(&self, project_id: &ProjectId) -> Result<Vec<ProgressUpdate>> {
        let dir = self.progress_dir(project_id);
        if !fs::try_exists(&dir).await? {
            return Ok(Vec::new());
        }
        let mut updates = list_dir(&dir).await?;
        updates.sort_by(|a: &ProgressUpdate, b| a.created_at.cmp(&b.created_at));
        Ok(updates)
    }

    async fn save_verification(&mut self, verification: &Verification) -> Result<()> {
        write_json(&self.verification_path(&verification.id), verification).await?;
        self.bump_version("verifications", verification.id.as_str()).await?;

        self.set_pending().await;
        Ok(())
    }

    async fn load_verification(&self, id: &VerificationId) -> Result<Option<Verification>> {
        read_json(&self.verification_path(id)).await
    }

    async fn list_verifications(&self) -> Result<Vec<Verification>> {
        let mut all = list_dir(&self.root.join("verifications")).await?;
        all.sort_by(|a: &Verification, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(all)
    }

    async fn save_user(&mut self, user: &User) -> Result<()> {
        write_json(&self.user_path(&user.id), user).await?;
        self.bump_version("users", user.id.as_str()).await?;

        self.set_pending().await;
        Ok(())
    }

    async fn load_user(&self, id: &UserId) -> Result<Option<User>> {
        read_json(&self.user_path(id)).await
    }

    async fn save_session(&mut self, session: &Session) -> Result<()> {
        write_json(&self.session_path(), session).await
    }

    async fn load_session(&self) -> Result<Option<Session>> {
        read_json(&self.session_path()).await
    }

    async fn clear_session(&mut self) -> Result<()> {
        remove_if_exists(&self.session_path()).await
    }

    async fn commit(&mut self, message: &str) -> Result<()> {
        debug!(commit_message = message, "commit");
        *self.pending.lock().await = false;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        *self.pending.lock().await = false;
        Ok(())
    }
}

/// Backend ids are opaque; keep them from escaping the data directory.
fn file_stem(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json.as_bytes()).await?;
    Ok(())
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Read a cached entry. A file that no longer decodes is dropped and
/// reported as missing so the caller fetches it again.
async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let json = match fs::read_to_string(path).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    match serde_json::from_str(&json) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "discarding unreadable cache entry");
            remove_if_exists(path).await?;
            Ok(None)
        }
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        if let Some(item) = read_json(&entry.path()).await? {
            items.push(item);
        }
    }
    Ok(items)
}
