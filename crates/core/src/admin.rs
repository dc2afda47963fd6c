//! Admin-facing models: disputes, platform settings and analytics.

use serde::{Deserialize, Serialize};
use crate::id::{DisputeId, ProjectId};
use crate::user::UserRef;
use crate::Time;

/// A dispute raised on a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispute {
    /// Unique identifier
    #[serde(rename = "_id")]
    pub id: DisputeId,

    /// Disputed project
    pub project_id: ProjectId,

    /// Who raised it
    pub raised_by: UserRef,

    /// Stated reason
    #[serde(default)]
    pub reason: String,

    /// Dispute status
    pub status: DisputeStatus,

    /// Admin resolution text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,

    /// When raised
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Time>,
}

/// Dispute status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisputeStatus {
    Open,
    Resolved,
    Closed,
}

impl std::fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DisputeStatus::Open => "open",
            DisputeStatus::Resolved => "resolved",
            DisputeStatus::Closed => "closed",
        })
    }
}

/// Platform-wide settings. Keys this client does not know are preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSettings {
    /// Commission taken on each project, in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_fee_percent: Option<f64>,

    /// Smallest bid accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_bid_amount: Option<f64>,

    /// Whether the platform is in maintenance mode
    #[serde(default)]
    pub maintenance_mode: bool,

    /// Everything else
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Aggregate platform figures from `/reports/analytics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_projects: u64,
    #[serde(default)]
    pub active_projects: u64,
    #[serde(default)]
    pub completed_projects: u64,
    #[serde(default)]
    pub total_revenue: f64,

    /// Everything else
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_keep_unknown_keys() {
        let settings: PlatformSettings = serde_json::from_str(
            r#"{"platformFeePercent": 10, "supportEmail": "help@bidboard.io"}"#,
        )
        .unwrap();
        assert_eq!(settings.platform_fee_percent, Some(10.0));
        assert!(!settings.maintenance_mode);

        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["supportEmail"], "help@bidboard.io");
    }
}
