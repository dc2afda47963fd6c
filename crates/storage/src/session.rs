//! Session token kept between runs.

use bidboard_core::{Time, User};
use serde::{Deserialize, Serialize};

/// Bearer token returned at login, with its expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token
    pub token: String,

    /// When the token stops being valid
    pub expires_at: Time,

    /// Logged-in user, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl Session {
    /// Default lifetime of a login.
    pub const DEFAULT_TTL_HOURS: i64 = 24;

    /// Create a session valid for [`Self::DEFAULT_TTL_HOURS`].
    pub fn new(token: impl Into<String>, user: Option<User>) -> Self {
        Self {
            token: token.into(),
            expires_at: chrono::Utc::now() + chrono::Duration::hours(Self::DEFAULT_TTL_HOURS),
            user,
        }
    }

    /// Whether the token has expired at `now`.
    pub fn is_expired(&self, now: Time) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry() {
        let session = Session::new("tok", None);
        let now = chrono::Utc::now();
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + chrono::Duration::hours(25)));
    }
}
