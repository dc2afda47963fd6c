//! Progress update form state.

use bidboard_core::{progress_options, ProgressError, ProgressOption, ProgressRequest, Time};

/// What the freelancer is filling in before submitting an update.
///
/// A draft lives only as long as the form is open; every [`ProgressDraft::open`]
/// starts from scratch and nothing is written to storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressDraft {
    current: u8,
    progress: Option<u8>,
    /// Milestone label
    pub milestone: String,
    /// Free-form note
    pub note: String,
    /// Completion estimate
    pub estimated_completion: Option<Time>,
    /// Notify the client (on by default)
    pub notify_client: bool,
}

impl ProgressDraft {
    /// Open a fresh draft for a project at `current` percent.
    pub fn open(current: u8) -> Self {
        Self {
            current,
            progress: None,
            milestone: String::new(),
            note: String::new(),
            estimated_completion: None,
            notify_client: true,
        }
    }

    /// Project progress the draft was opened against.
    pub fn current(&self) -> u8 {
        self.current
    }

    /// Selected value, if any.
    pub fn selected(&self) -> Option<u8> {
        self.progress
    }

    /// Picker options with disabled flags.
    pub fn options(&self) -> Vec<ProgressOption> {
        progress_options(self.current)
    }

    /// Pick a value; disabled values are refused and leave the selection as is.
    pub fn select(&mut self, value: u8) -> Result<(), ProgressError> {
        ProgressRequest::new(value).validate(self.current)?;
        self.progress = Some(value);
        Ok(())
    }

    /// Build the request. Blank milestone and note are omitted.
    pub fn into_request(self) -> Result<ProgressRequest, ProgressError> {
        let progress = self.progress.ok_or(ProgressError::NothingSelected)?;
        let request = ProgressRequest {
            progress,
            milestone: non_blank(self.milestone),
            note: non_blank(self.note),
            estimated_completion: self.estimated_completion,
            notify_client: self.notify_client,
        };
        request.validate(self.current)?;
        Ok(request)
    }
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reopen_discards_previous_input() {
        let mut draft = ProgressDraft::open(30);
        draft.select(50).unwrap();
        draft.note = "halfway".to_string();
        drop(draft);

        let draft = ProgressDraft::open(30);
        assert_eq!(draft.selected(), None);
        assert!(draft.note.is_empty());
        assert!(draft.notify_client);
    }

    #[test]
    fn test_select_respects_picker() {
        let mut draft = ProgressDraft::open(40);
        assert_eq!(
            draft.select(40),
            Err(ProgressError::NotAdvancing { current: 40, requested: 40 })
        );
        assert_eq!(draft.select(45), Err(ProgressError::NotADecile(45)));
        assert_eq!(draft.selected(), None);

        draft.select(100).unwrap();
        assert_eq!(draft.selected(), Some(100));
        let disabled: Vec<u8> = draft
            .options()
            .into_iter()
            .filter(|o| o.disabled)
            .map(|o| o.value)
            .collect();
        assert_eq!(disabled, vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_into_request() {
        assert_eq!(
            ProgressDraft::open(0).into_request(),
            Err(ProgressError::NothingSelected)
        );

        let mut draft = ProgressDraft::open(20);
        draft.select(60).unwrap();
        draft.milestone = "  Draft chapters  ".to_string();
        draft.note = "   ".to_string();
        draft.notify_client = false;

        let request = draft.into_request().unwrap();
        assert_eq!(request.progress, 60);
        assert_eq!(request.milestone.as_deref(), Some("Draft chapters"));
        assert_eq!(request.note, None);
        assert_eq!(request.success_message(), "Progress updated to 60%.");
    }
}
