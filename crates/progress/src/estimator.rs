//! Completion time estimation.

use bidboard_core::{ProgressUpdate, Time};
use chrono::Duration;

/// Extrapolated completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeEstimation {
    /// Expected completion time
    pub completion: Time,

    /// Observed rate in percentage points per day
    pub points_per_day: f64,
}

/// Completion time estimator.
///
/// Assumes the freelancer keeps the pace observed between the first and the
/// latest update.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompletionEstimator;

impl CompletionEstimator {
    /// Estimate from a progress log (any order).
    ///
    /// Returns `None` when the log is empty or shows no measurable pace.
    pub fn estimate(&self, updates: &[ProgressUpdate]) -> Option<TimeEstimation> {
        let first = updates.iter().min_by_key(|u| u.created_at)?;
        let last = updates.iter().max_by_key(|u| u.created_at)?;

        if last.new_progress >= 100 {
            return Some(TimeEstimation {
                completion: last.created_at,
                points_per_day: self.rate(first, last).unwrap_or(0.0),
            });
        }

        let rate = self.rate(first, last)?;
        let remaining = f64::from(100 - last.new_progress);
        let seconds = (remaining / rate * 86_400.0).round() as i64;

        Some(TimeEstimation {
            completion: last.created_at + Duration::seconds(seconds),
            points_per_day: rate,
        })
    }

    /// Points per day between two updates.
    fn rate(&self, first: &ProgressUpdate, last: &ProgressUpdate) -> Option<f64> {
        let gained = f64::from(last.new_progress.saturating_sub(first.previous_progress));
        let elapsed = (last.created_at - first.created_at).num_seconds() as f64 / 86_400.0;
        (gained > 0.0 && elapsed > 0.0).then(|| gained / elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bidboard_core::{ProgressUpdateId, ProjectId, UserId};
    use chrono::TimeZone;

    fn update(previous: u8, new: u8, day: u32) -> ProgressUpdate {
        ProgressUpdate {
            id: ProgressUpdateId::new(format!("u{new}")),
            project_id: ProjectId::new("p1"),
            freelancer_id: UserId::new("f1"),
            previous_progress: previous,
            new_progress: new,
            milestone: None,
            note: None,
            attachments: vec![],
            estimated_completion: None,
            notify_client: true,
            client_viewed: false,
            created_at: chrono::Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_linear_extrapolation() {
        // 0 -> 20 on day 1, 20 -> 40 on day 5: 40 points over 4 days.
        let log = vec![update(20, 40, 5), update(0, 20, 1)];
        let estimate = CompletionEstimator.estimate(&log).unwrap();

        assert!((estimate.points_per_day - 10.0).abs() < 1e-9);
        assert_eq!(
            estimate.completion,
            chrono::Utc.with_ymd_and_hms(2026, 3, 11, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_no_pace() {
        assert!(CompletionEstimator.estimate(&[]).is_none());
        // A single update has no elapsed time.
        assert!(CompletionEstimator.estimate(&[update(0, 30, 2)]).is_none());
    }

    #[test]
    fn test_completed_log() {
        let log = vec![update(0, 50, 1), update(50, 100, 3)];
        let estimate = CompletionEstimator.estimate(&log).unwrap();
        assert_eq!(estimate.completion, log[1].created_at);
    }
}
