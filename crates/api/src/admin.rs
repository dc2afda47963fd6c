//! Admin surface of the REST client.
//!
//! These endpoints only make sense for an admin session and are kept off
//! [`MarketplaceApi`](crate::MarketplaceApi).

use bidboard_core::{
    AnalyticsReport, Dispute, DisputeId, PlatformSettings, Project, ProjectId, ReviewDecision,
    User, UserId, Verification, VerificationId, VerificationStatus,
};
use serde_json::json;
use tracing::info;

use crate::client::RestClient;
use crate::envelope::{
    Ack, AnalyticsBody, DisputeBody, DisputesBody, ProjectsBody, SettingsBody, UserUpdateBody,
    UsersBody, VerificationBody, VerificationsBody,
};
use crate::error::Result;

impl RestClient {
    /// All accounts.
    pub async fn admin_users(&self) -> Result<Vec<User>> {
        let body: UsersBody = self.get("/admin/users").await?;
        Ok(body.users)
    }

    /// Mark an account verified or unverified.
    pub async fn admin_set_user_verified(&self, user: &UserId, verified: bool) -> Result<Option<User>> {
        let body: UserUpdateBody = self
            .patch(&format!("/admin/users/{user}/verify"), &json!({ "verified": verified }))
            .await?;
        info!(user_id = %user, verified, "user verification flag set");
        Ok(body.user)
    }

    /// Delete an account.
    pub async fn admin_delete_user(&self, user: &UserId) -> Result<()> {
        let _: Ack = self.delete(&format!("/admin/users/{user}")).await?;
        info!(user_id = %user, "user deleted");
        Ok(())
    }

    /// All projects.
    pub async fn admin_projects(&self) -> Result<Vec<Project>> {
        let body: ProjectsBody = self.get("/admin/projects").await?;
        Ok(body.projects)
    }

    /// Delete a project.
    pub async fn admin_delete_project(&self, project: &ProjectId) -> Result<()> {
        let _: Ack = self.delete(&format!("/admin/projects/{project}")).await?;
        info!(project_id = %project, "project deleted");
        Ok(())
    }

    /// Verifications, optionally only those with `status`.
    pub async fn admin_verifications(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<Vec<Verification>> {
        let body: VerificationsBody = match status {
            Some(status) => {
                self.get_query("/admin/verifications", &[("status", status.to_string())])
                    .await?
            }
            None => self.get("/admin/verifications").await?,
        };
        Ok(body.verifications)
    }

    /// Approve or reject a verification.
    pub async fn admin_review_verification(
        &self,
        id: &VerificationId,
        decision: ReviewDecision,
        notes: Option<&str>,
    ) -> Result<Option<Verification>> {
        let body: VerificationBody = self
            .patch(
                &format!("/admin/verifications/{id}"),
                &json!({ "status": decision.status(), "notes": notes }),
            )
            .await?;
        info!(verification_id = %id, status = %decision.status(), "verification reviewed");
        Ok(body.verification)
    }

    /// All disputes.
    pub async fn admin_disputes(&self) -> Result<Vec<Dispute>> {
        let body: DisputesBody = self.get("/admin/disputes").await?;
        Ok(body.disputes)
    }

    /// Resolve a dispute with a written resolution.
    pub async fn admin_resolve_dispute(&self, id: &DisputeId, resolution: &str) -> Result<Option<Dispute>> {
        let body: DisputeBody = self
            .put(
                &format!("/admin/disputes/{id}/resolve"),
                &json!({ "resolution": resolution }),
            )
            .await?;
        info!(dispute_id = %id, "dispute resolved");
        Ok(body.dispute)
    }

    /// Platform settings.
    pub async fn settings(&self) -> Result<PlatformSettings> {
        let body: SettingsBody = self.get("/settings").await?;
        Ok(body.settings)
    }

    /// Replace platform settings; returns what the server stored.
    pub async fn update_settings(&self, settings: &PlatformSettings) -> Result<PlatformSettings> {
        let body: SettingsBody = self.put("/settings", settings).await?;
        Ok(body.settings)
    }

    /// Platform analytics.
    pub async fn analytics(&self) -> Result<AnalyticsReport> {
        let body: AnalyticsBody = self.get("/reports/analytics").await?;
        Ok(body.analytics)
    }
}

#[cfg(test)]
mod tests {
    use crate::envelope::{decode_response, AnalyticsBody, SettingsBody, VerificationsBody};
    use bidboard_core::VerificationStatus;

    #[test]
    fn test_admin_bodies_decode() {
        let body: VerificationsBody = decode_response(
            200,
            r#"{"success": true, "verifications": [
                {"_id": "v1", "userId": {"_id": "u1", "fullname": "Ada"},
                 "verificationType": "identity", "status": "pending",
                 "documents": ["https://files/id.png"]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(body.verifications[0].status, VerificationStatus::Pending);
        assert_eq!(body.verifications[0].documents[0].url(), "https://files/id.png");

        let body: AnalyticsBody = decode_response(
            200,
            r#"{"success": true, "analytics": {"totalUsers": 42, "totalRevenue": 1200.5, "topSkill": "rust"}}"#,
        )
        .unwrap();
        assert_eq!(body.analytics.total_users, 42);
        assert!(body.analytics.extra.contains_key("topSkill"));

        let body: SettingsBody = decode_response(200, r#"{"success": true}"#).unwrap();
        assert!(!body.settings.maintenance_mode);
    }
}
