//! Session gate for authenticated pages.

use bidboard_core::{Role, Time, User};
use bidboard_storage::{Session, Storage};
use tracing::debug;

use crate::error::{Result, WorkError};

/// Live session for `from`, or [`WorkError::LoginRequired`] before any
/// request is made. Expired sessions count as missing.
pub async fn require_session<S: Storage>(storage: &S, from: &str, now: Time) -> Result<Session> {
    match storage.load_session().await? {
        Some(session) if !session.is_expired(now) => Ok(session),
        Some(_) => {
            debug!(from, "session expired");
            Err(WorkError::LoginRequired { from: from.to_string() })
        }
        None => Err(WorkError::LoginRequired { from: from.to_string() }),
    }
}

/// Logged-in user holding `role`.
pub async fn require_role<S: Storage>(storage: &S, from: &str, role: Role, now: Time) -> Result<User> {
    let session = require_session(storage, from, now).await?;
    match session.user {
        Some(user) if user.is(role) => Ok(user),
        Some(user) => Err(WorkError::Forbidden(format!(
            "This page is only available to {role} accounts (signed in as {})",
            user.role
        ))),
        None => Err(WorkError::LoginRequired { from: from.to_string() }),
    }
}
