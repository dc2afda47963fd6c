//! Progress updates - the append-only log of a freelancer's reported completion.

use serde::{Deserialize, Serialize};
use crate::error::ProgressError;
use crate::id::{ProgressUpdateId, ProjectId, UserId};
use crate::Time;

/// Values offered by the progress picker.
pub const PROGRESS_STEPS: [u8; 10] = [10, 20, 30, 40, 50, 60, 70, 80, 90, 100];

/// A file reference: a bare URL or a named upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attachment {
    /// Bare URL
    Url(String),
    /// Uploaded file
    File {
        /// Download URL
        url: String,
        /// Original file name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl Attachment {
    /// Download URL.
    pub fn url(&self) -> &str {
        match self {
            Attachment::Url(url) => url,
            Attachment::File { url, .. } => url,
        }
    }
}

/// One entry in a project's progress log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    /// Unique identifier
    #[serde(rename = "_id")]
    pub id: ProgressUpdateId,

    /// Project reported on
    pub project_id: ProjectId,

    /// Reporting freelancer
    pub freelancer_id: UserId,

    /// Progress before this update
    #[serde(default)]
    pub previous_progress: u8,

    /// Progress after this update
    pub new_progress: u8,

    /// Milestone label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,

    /// Free-form note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Supporting files
    #[serde(default)]
    pub attachments: Vec<Attachment>,

    /// Freelancer's completion estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<Time>,

    /// Whether the client was notified
    #[serde(default)]
    pub notify_client: bool,

    /// Whether the client has seen it
    #[serde(default)]
    pub client_viewed: bool,

    /// When recorded
    pub created_at: Time,
}

impl ProgressUpdate {
    /// Whether this update reported the work as finished.
    pub fn is_completion(&self) -> bool {
        self.new_progress >= 100
    }
}

/// One value in the progress picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressOption {
    /// Percentage
    pub value: u8,
    /// Greyed out in the picker
    pub disabled: bool,
}

/// Whether the picker allows `value` given the project's current progress.
///
/// Values at or below the current progress are disabled, except 100 which
/// stays selectable from any lower value.
pub fn is_selectable(current: u8, value: u8) -> bool {
    !(value <= current && value != 100)
}

/// Picker options for a project at `current` percent.
pub fn progress_options(current: u8) -> Vec<ProgressOption> {
    PROGRESS_STEPS
        .iter()
        .map(|&value| ProgressOption {
            value,
            disabled: !is_selectable(current, value),
        })
        .collect()
}

/// Payload for reporting progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    /// New percentage
    pub progress: u8,

    /// Milestone label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,

    /// Free-form note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Completion estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<Time>,

    /// Notify the client
    pub notify_client: bool,
}

impl ProgressRequest {
    /// Create a request notifying the client.
    pub fn new(progress: u8) -> Self {
        Self {
            progress,
            milestone: None,
            note: None,
            estimated_completion: None,
            notify_client: true,
        }
    }

    /// Validate against the project's current progress.
    pub fn validate(&self, current: u8) -> Result<(), ProgressError> {
        if !PROGRESS_STEPS.contains(&self.progress) {
            return Err(ProgressError::NotADecile(self.progress));
        }
        if !is_selectable(current, self.progress) {
            return Err(ProgressError::NotAdvancing {
                current,
                requested: self.progress,
            });
        }
        Ok(())
    }

    /// Reporting 100% marks the work as done.
    pub fn is_completion(&self) -> bool {
        self.progress == 100
    }

    /// Confirmation shown after a successful update.
    pub fn success_message(&self) -> String {
        if self.is_completion() {
            "Project marked as complete! The client will review and approve the delivery."
                .to_string()
        } else if self.notify_client {
            format!("Progress updated to {}%. The client has been notified.", self.progress)
        } else {
            format!("Progress updated to {}%.", self.progress)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_disable_non_advancing_values() {
        for current in [0u8, 10, 35, 60, 90, 100] {
            for option in progress_options(current) {
                let expected = option.value <= current && option.value != 100;
                assert_eq!(option.disabled, expected, "current={current} v={}", option.value);
            }
        }
    }

    #[test]
    fn test_hundred_always_selectable() {
        let options = progress_options(90);
        let hundred = options.iter().find(|o| o.value == 100).unwrap();
        assert!(!hundred.disabled);
        assert_eq!(options.iter().filter(|o| !o.disabled).count(), 1);
    }

    #[test]
    fn test_request_validation() {
        assert_eq!(ProgressRequest::new(35).validate(0), Err(ProgressError::NotADecile(35)));
        assert_eq!(ProgressRequest::new(0).validate(0), Err(ProgressError::NotADecile(0)));
        assert_eq!(
            ProgressRequest::new(40).validate(40),
            Err(ProgressError::NotAdvancing { current: 40, requested: 40 })
        );
        assert!(ProgressRequest::new(50).validate(40).is_ok());
        assert!(ProgressRequest::new(100).validate(30).is_ok());
    }

    #[test]
    fn test_messages_distinguish_completion() {
        assert!(ProgressRequest::new(100).success_message().contains("complete"));
        assert_eq!(
            ProgressRequest::new(30).success_message(),
            "Progress updated to 30%. The client has been notified."
        );
        let mut quiet = ProgressRequest::new(30);
        quiet.notify_client = false;
        assert_eq!(quiet.success_message(), "Progress updated to 30%.");
    }

    #[test]
    fn test_request_wire_format() {
        let json = serde_json::to_value(ProgressRequest::new(20)).unwrap();
        assert_eq!(json, serde_json::json!({"progress": 20, "notifyClient": true}));
    }
}
