//! API error type.

/// Error type for API calls.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced by the REST client.
///
/// The backend has no error-code taxonomy: a non-2xx status or an envelope
/// with `success: false`, plus a free-text `message`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Network or protocol failure
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Server message, possibly empty
        message: String,
    },

    /// 2xx response with `success: false`
    #[error("{0}")]
    Rejected(String),

    /// Body did not match the expected shape
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    /// HTTP 401
    #[error("Session expired, please login again")]
    Unauthorized,

    /// No session; the request was never sent
    #[error("Please login first")]
    LoginRequired,
}

impl ApiError {
    /// The server's own message, if it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } | ApiError::Rejected(message) => {
                Some(message.as_str()).filter(|m| !m.trim().is_empty())
            }
            _ => None,
        }
    }

    /// Text for the failure notice: the server's message, or `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Unauthorized | ApiError::LoginRequired => self.to_string(),
            _ => self.server_message().unwrap_or(fallback).to_string(),
        }
    }

    /// Whether the user has to log in again.
    pub fn needs_login(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::LoginRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = ApiError::Status {
            status: 400,
            message: "Bid already accepted".to_string(),
        };
        assert_eq!(err.user_message("Failed to accept bid"), "Bid already accepted");

        let err = ApiError::Rejected("  ".to_string());
        assert_eq!(err.user_message("Failed to accept bid"), "Failed to accept bid");

        let err = ApiError::Decode(serde_json::from_str::<u8>("x").unwrap_err());
        assert_eq!(err.user_message("Failed to load"), "Failed to load");
    }

    #[test]
    fn test_login_errors() {
        assert!(ApiError::LoginRequired.needs_login());
        assert_eq!(ApiError::LoginRequired.user_message("ignored"), "Please login first");
        assert!(!ApiError::Rejected("no".into()).needs_login());
    }
}
