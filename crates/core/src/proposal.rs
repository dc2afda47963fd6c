//! Bid drafts and the proposal text format.
//!
//! A submitted proposal carries the delivery timeline as a header line:
//!
//! ```text
//! Timeline: 14 days
//!
//! <cover letter>
//! ```

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::error::DraftError;
use crate::project::Project;

/// What a freelancer fills in before bidding.
#[derive(Debug, Clone, PartialEq)]
pub struct BidDraft {
    /// Offered amount
    pub amount: f64,
    /// Delivery time in days
    pub timeline_days: u32,
    /// Cover letter
    pub cover_letter: String,
}

impl BidDraft {
    /// Create a draft.
    pub fn new(amount: f64, timeline_days: u32, cover_letter: impl Into<String>) -> Self {
        Self {
            amount,
            timeline_days,
            cover_letter: cover_letter.into(),
        }
    }

    /// Check the required fields.
    pub fn validate(&self) -> Result<(), DraftError> {
        if !(self.amount > 0.0) {
            return Err(DraftError::NonPositiveAmount);
        }
        if self.timeline_days == 0 {
            return Err(DraftError::EmptyTimeline);
        }
        if self.cover_letter.trim().is_empty() {
            return Err(DraftError::EmptyCoverLetter);
        }
        Ok(())
    }

    /// Advisory check against the project budget. Out-of-budget bids are
    /// still submittable.
    pub fn budget_warning(&self, project: &Project) -> Option<DraftError> {
        let (min, max) = (project.budget_min, project.budget_max);
        if max <= 0.0 {
            return None;
        }
        if self.amount < min || self.amount > max {
            return Some(DraftError::OutsideBudget {
                amount: self.amount,
                min,
                max,
            });
        }
        None
    }

    /// Build the submission payload.
    pub fn into_submission(self) -> Result<BidSubmission, DraftError> {
        self.validate()?;
        Ok(BidSubmission {
            amount: self.amount,
            proposal: format!(
                "Timeline: {} days\n\n{}",
                self.timeline_days, self.cover_letter
            ),
        })
    }
}

/// Body of a bid submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidSubmission {
    /// Offered amount
    pub amount: f64,
    /// Timeline header plus cover letter
    pub proposal: String,
}

/// A stored proposal split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalText<'a> {
    /// Timeline from the header, if present
    pub timeline_days: Option<u32>,
    /// Text after the header
    pub cover_letter: &'a str,
}

fn timeline_header() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"^Timeline:\s*(\d+)\s*days?\r?\n\r?\n").expect("static regex")
    })
}

impl<'a> ProposalText<'a> {
    /// Split a proposal. Proposals without a header are all cover letter.
    pub fn parse(proposal: &'a str) -> Self {
        match timeline_header().captures(proposal) {
            Some(caps) => {
                let header_len = caps.get(0).map_or(0, |m| m.end());
                Self {
                    timeline_days: caps.get(1).and_then(|m| m.as_str().parse().ok()),
                    cover_letter: &proposal[header_len..],
                }
            }
            None => Self {
                timeline_days: None,
                cover_letter: proposal,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::tests::project;

    #[test]
    fn test_submission_prefixes_timeline() {
        let submission = BidDraft::new(950.0, 14, "I have run dozens of RCT analyses.")
            .into_submission()
            .unwrap();

        assert_eq!(submission.amount, 950.0);
        assert!(submission.proposal.starts_with("Timeline: 14 days\n\n"));
        assert_eq!(
            submission.proposal,
            "Timeline: 14 days\n\nI have run dozens of RCT analyses."
        );
    }

    #[test]
    fn test_validation() {
        assert_eq!(BidDraft::new(0.0, 3, "x").validate(), Err(DraftError::NonPositiveAmount));
        assert_eq!(BidDraft::new(f64::NAN, 3, "x").validate(), Err(DraftError::NonPositiveAmount));
        assert_eq!(BidDraft::new(10.0, 0, "x").validate(), Err(DraftError::EmptyTimeline));
        assert_eq!(BidDraft::new(10.0, 3, "  ").validate(), Err(DraftError::EmptyCoverLetter));
    }

    #[test]
    fn test_budget_warning() {
        let p = project(vec![]);
        assert!(BidDraft::new(500.0, 3, "x").budget_warning(&p).is_none());
        assert!(matches!(
            BidDraft::new(5000.0, 3, "x").budget_warning(&p),
            Some(DraftError::OutsideBudget { .. })
        ));
    }

    #[test]
    fn test_parse_round_trips_header() {
        let text = "Timeline: 14 days\n\nCover letter\n\nwith paragraphs";
        let parsed = ProposalText::parse(text);
        assert_eq!(parsed.timeline_days, Some(14));
        assert_eq!(parsed.cover_letter, "Cover letter\n\nwith paragraphs");

        let plain = ProposalText::parse("No header here");
        assert_eq!(plain.timeline_days, None);
        assert_eq!(plain.cover_letter, "No header here");
    }
}
