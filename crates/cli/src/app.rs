//! Wiring shared by every command: store, client, session, notices.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bidboard_api::{ApiConfig, ApiError, MarketplaceApi, RestClient};
use bidboard_core::{Role, User};
use bidboard_storage::{JsonStorage, Session, Storage};
use bidboard_work::{require_role, require_session, CollectingNotifier, WorkContext, WorkError};
use tokio::sync::Mutex;
use tracing::debug;

/// Everything a command needs.
pub struct App {
    pub config: ApiConfig,
    pub api: Arc<RestClient>,
    pub storage: Arc<Mutex<JsonStorage>>,
    pub notices: Arc<CollectingNotifier>,
}

impl App {
    /// Open the data directory and restore the saved token.
    pub async fn open(config: ApiConfig, notices: Arc<CollectingNotifier>) -> Result<Self> {
        let storage = JsonStorage::new(&config.data_dir)
            .await
            .with_context(|| format!("Failed to open data directory {}", config.data_dir.display()))?;
        let api = RestClient::new(&config).context("Failed to build HTTP client")?;

        if let Some(session) = storage.load_session().await? {
            if !session.token.is_empty() {
                api.set_token(Some(session.token));
            }
        }
        debug!(base_url = %config.base_url, data_dir = %config.data_dir.display(), "client ready");

        Ok(Self {
            config,
            api: Arc::new(api),
            storage: Arc::new(Mutex::new(storage)),
            notices,
        })
    }

    /// Workflow context over this app's store and client.
    pub fn context(&self) -> WorkContext<JsonStorage, RestClient> {
        WorkContext::new(self.storage.clone(), self.api.clone(), self.notices.clone())
    }

    /// Logged-in user; fetched once and remembered when the session lacks it.
    pub async fn user(&self, from: &str) -> Result<User> {
        let session = {
            let storage = self.storage.lock().await;
            require_session(&*storage, from, chrono::Utc::now()).await?
        };
        if let Some(user) = session.user {
            return Ok(user);
        }

        let user = self
            .api
            .current_user()
            .await
            .map_err(|e| failure(e, "Failed to load profile"))?;
        let mut storage = self.storage.lock().await;
        storage
            .save_session(&Session {
                user: Some(user.clone()),
                ..session
            })
            .await?;
        storage.commit("remember user").await?;
        Ok(user)
    }

    /// Logged-in user holding `role`.
    pub async fn user_with_role(&self, from: &str, role: Role) -> Result<User> {
        let storage = self.storage.lock().await;
        Ok(require_role(&*storage, from, role, chrono::Utc::now()).await?)
    }

    /// Drop the saved session.
    pub async fn forget_session(&self) -> Result<()> {
        self.api.set_token(None);
        let mut storage = self.storage.lock().await;
        storage.clear_session().await?;
        storage.commit("logout").await?;
        Ok(())
    }
}

/// Reduce an API error to one message. Login failures keep their type so the
/// caller can clear the session.
pub fn failure(err: ApiError, fallback: &str) -> anyhow::Error {
    if err.needs_login() {
        anyhow::Error::new(err)
    } else {
        anyhow!(err.user_message(fallback))
    }
}

/// [`failure`] for errors raised outside the notifying workflows.
pub fn work_failure(err: WorkError, fallback: &str) -> anyhow::Error {
    if err.needs_login() {
        anyhow::Error::new(err)
    } else {
        anyhow!(err.user_message(fallback))
    }
}
