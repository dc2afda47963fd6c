//! Identity/credential verification requests.

use serde::{Deserialize, Serialize};
use crate::error::TransitionError;
use crate::id::{UserId, VerificationId};
use crate::progress::Attachment;
use crate::user::UserRef;
use crate::Time;

/// A verification submitted by a user for admin review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    /// Unique identifier
    #[serde(rename = "_id")]
    pub id: VerificationId,

    /// Submitting user
    #[serde(rename = "userId")]
    pub user: UserRef,

    /// Kind of verification (e.g. "identity", "academic")
    pub verification_type: String,

    /// Supporting documents
    #[serde(default)]
    pub documents: Vec<Attachment>,

    /// Review status
    pub status: VerificationStatus,

    /// When submitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<Time>,

    /// Admin decision details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_review: Option<AdminReview>,
}

impl Verification {
    /// Record an admin decision. Only pending verifications can be reviewed.
    pub fn review(
        &mut self,
        decision: ReviewDecision,
        reviewer: UserId,
        notes: Option<String>,
        at: Time,
    ) -> Result<(), TransitionError> {
        if self.status != VerificationStatus::Pending {
            return Err(TransitionError::AlreadyReviewed {
                verification: self.id.clone(),
                status: self.status,
            });
        }
        self.status = decision.status();
        self.admin_review = Some(AdminReview {
            reviewed_by: Some(reviewer),
            notes,
            reviewed_at: Some(at),
        });
        Ok(())
    }
}

/// Verification review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Awaiting review
    Pending,
    /// Accepted by an admin
    Approved,
    /// Refused by an admin
    Rejected,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        })
    }
}

/// Admin decision on a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    /// Approve
    Approve,
    /// Reject
    Reject,
}

impl ReviewDecision {
    /// Resulting status.
    pub fn status(self) -> VerificationStatus {
        match self {
            ReviewDecision::Approve => VerificationStatus::Approved,
            ReviewDecision::Reject => VerificationStatus::Rejected,
        }
    }
}

/// Admin review details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminReview {
    /// Reviewing admin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<UserId>,

    /// Reviewer notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// When reviewed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<Time>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Verification {
        serde_json::from_str(
            r#"{"_id":"v1","userId":"u1","verificationType":"identity","documents":["https://d/1.png"],"status":"pending"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_review_once() {
        let mut v = pending();
        v.review(ReviewDecision::Approve, UserId::new("admin"), None, chrono::Utc::now())
            .unwrap();
        assert_eq!(v.status, VerificationStatus::Approved);
        assert!(v.admin_review.is_some());

        let err = v
            .review(ReviewDecision::Reject, UserId::new("admin"), None, chrono::Utc::now())
            .unwrap_err();
        assert!(matches!(err, TransitionError::AlreadyReviewed { status: VerificationStatus::Approved, .. }));
    }
}
