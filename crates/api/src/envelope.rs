//! Response envelopes.
//!
//! Every endpoint answers `{ success, message?, ...data }`. The payload
//! fields sit next to `success`, so each body type below is flattened into
//! [`Envelope`].

use bidboard_core::{
    AnalyticsReport, Dispute, PlatformSettings, ProgressUpdate, Project, RecommendationBuckets,
    ScoredProject, SuggestedFreelancer, User, Verification,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ApiError, Result};

/// The common response wrapper.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
pub struct Envelope<T> {
    /// Whether the server accepted the request
    #[serde(default = "accepted")]
    pub success: bool,

    /// Human-readable outcome
    #[serde(default)]
    pub message: Option<String>,

    /// Payload fields
    #[serde(flatten)]
    pub data: T,
}

fn accepted() -> bool {
    true
}

impl<T> Envelope<T> {
    /// Unwrap the payload, turning `success: false` into [`ApiError::Rejected`].
    pub fn into_result(self) -> Result<T> {
        if self.success {
            Ok(self.data)
        } else {
            Err(ApiError::Rejected(self.message.unwrap_or_default()))
        }
    }
}

/// Decode a raw response by status code and body.
pub fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T> {
    if status == 401 {
        return Err(ApiError::Unauthorized);
    }
    if !(200..300).contains(&status) {
        return Err(ApiError::Status {
            status,
            message: error_message(body),
        });
    }
    let body = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str::<Envelope<T>>(body)?.into_result()
}

/// Pull `message` (or `error`) out of an error body; plain text passes through.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => json
            .get("message")
            .or_else(|| json.get("error"))
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Payload with no fields of interest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {}

/// `{ user, token? }`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginBody {
    /// Logged-in account
    pub user: User,
    /// Bearer token; absent when the server only sets a cookie
    #[serde(default)]
    pub token: Option<String>,
}

/// `{ user }`
#[derive(Debug, Clone, Deserialize)]
pub struct UserBody {
    /// The account
    pub user: User,
}

/// `{ user? }`, returned by account mutations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdateBody {
    /// Updated account, when echoed
    #[serde(default)]
    pub user: Option<User>,
}

/// `{ users }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersBody {
    /// Accounts
    #[serde(default)]
    pub users: Vec<User>,
}

/// `{ projects }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectsBody {
    /// Projects
    #[serde(default)]
    pub projects: Vec<Project>,
}

/// `{ project? }`, returned by mutations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectBody {
    /// Updated project, when the server echoes it
    #[serde(default)]
    pub project: Option<Project>,
}

/// `{ progressUpdate?, project? }`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressBody {
    /// Created log entry
    #[serde(default)]
    pub progress_update: Option<ProgressUpdate>,
    /// Updated project
    #[serde(default)]
    pub project: Option<Project>,
}

/// `{ updates }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressHistoryBody {
    /// Log entries, oldest first
    #[serde(default, alias = "progressUpdates")]
    pub updates: Vec<ProgressUpdate>,
}

/// Recommended projects, either pre-split or as one scored list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationsBody {
    /// Pre-split recommended bucket
    #[serde(default)]
    pub recommended: Option<Vec<ScoredProject>>,
    /// Pre-split remainder
    #[serde(default)]
    pub others: Option<Vec<ScoredProject>>,
    /// Unsplit list
    #[serde(default)]
    pub projects: Vec<ScoredProject>,
}

impl RecommendationsBody {
    /// Buckets as sent, or computed from the flat list.
    pub fn into_buckets(self) -> RecommendationBuckets {
        match (self.recommended, self.others) {
            (None, None) => RecommendationBuckets::from_scored(self.projects),
            (recommended, others) => RecommendationBuckets {
                recommended: recommended.unwrap_or_default(),
                others: others.unwrap_or_default(),
            },
        }
    }
}

/// `{ freelancers }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionsBody {
    /// Suggested freelancers
    #[serde(default, alias = "suggestions")]
    pub freelancers: Vec<SuggestedFreelancer>,
}

/// `{ verification? }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationBody {
    /// The verification
    #[serde(default)]
    pub verification: Option<Verification>,
}

/// `{ verifications }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationsBody {
    /// Verifications
    #[serde(default)]
    pub verifications: Vec<Verification>,
}

/// `{ disputes }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisputesBody {
    /// Disputes
    #[serde(default)]
    pub disputes: Vec<Dispute>,
}

/// `{ dispute? }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisputeBody {
    /// The dispute
    #[serde(default)]
    pub dispute: Option<Dispute>,
}

/// `{ settings }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsBody {
    /// Platform settings
    #[serde(default)]
    pub settings: PlatformSettings,
}

/// `{ analytics }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsBody {
    /// Report
    #[serde(default, alias = "report")]
    pub analytics: AnalyticsReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bidboard_core::{BidStatus, MatchLevel};

    #[test]
    fn test_rejected_envelope() {
        let err = decode_response::<ProjectBody>(
            200,
            r#"{"success": false, "message": "Bidding is closed"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Bidding is closed"));
    }

    #[test]
    fn test_status_errors() {
        let err = decode_response::<Ack>(400, r#"{"success": false, "message": "Invalid amount"}"#)
            .unwrap_err();
        assert_eq!(err.user_message("Failed"), "Invalid amount");

        let err = decode_response::<Ack>(502, "Bad Gateway").unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 502, ref message } if message == "Bad Gateway"));

        assert!(matches!(
            decode_response::<Ack>(401, "").unwrap_err(),
            ApiError::Unauthorized
        ));
    }

    #[test]
    fn test_empty_success_body() {
        let body: ProjectBody = decode_response(204, "").unwrap();
        assert!(body.project.is_none());
    }

    #[test]
    fn test_projects_with_folded_bid_status() {
        let body: ProjectsBody = decode_response(
            200,
            r#"{
                "success": true,
                "projects": [{
                    "_id": "p1",
                    "title": "Logo",
                    "status": "in-progress",
                    "clientId": {"_id": "c1", "fullname": "Cara Client"},
                    "bids": [
                        {"_id": "b1", "freelancerId": "f1", "amount": 300,
                         "status": "accepted", "confirmationStatus": "confirmed"},
                        {"_id": "b2", "freelancerId": "f2", "amount": 280, "status": "rejected"}
                    ]
                }]
            }"#,
        )
        .unwrap();

        let project = &body.projects[0];
        assert_eq!(project.bids[0].status, BidStatus::Confirmed);
        assert_eq!(project.bids[1].status, BidStatus::Rejected);
        assert_eq!(project.client.name(), Some("Cara Client"));
    }

    #[test]
    fn test_recommendations_are_bucketed_when_flat() {
        let body: RecommendationsBody = decode_response(
            200,
            r#"{
                "success": true,
                "projects": [
                    {"_id": "p1", "title": "A", "status": "open", "clientId": "c1",
                     "matchScore": 91, "matchLevel": {"level": "excellent"}},
                    {"_id": "p2", "title": "B", "status": "open", "clientId": "c1",
                     "matchScore": 40, "matchLevel": {"level": "fair"}},
                    {"_id": "p3", "title": "C", "status": "open", "clientId": "c1",
                     "matchScore": 35, "isRecommended": true}
                ]
            }"#,
        )
        .unwrap();

        let buckets = body.into_buckets();
        let ids: Vec<&str> = buckets.recommended.iter().map(|p| p.project.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3"]);
        assert_eq!(buckets.others.len(), 1);
        assert_eq!(
            buckets.others[0].match_level.as_ref().map(|m| &m.level),
            Some(&MatchLevel::Fair)
        );
    }
}
