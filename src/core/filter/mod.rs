//! # Filter Module
//!
//! The threshold decision applied to every scored frame, and the
//! good-frame side effect it triggers.
//!
//! Sequential and pipelined runs both go through [`FrameFilter::filter`],
//! so they apply exactly the same rule.

mod action;

pub use action::{move_file, FrameMover, GoodFrameAction};

use crate::core::frame::{FrameLayout, WorkItem};
use crate::core::scorer::ScoreResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a frame made the cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Pass,
    Fail,
}

/// Human-readable record of one frame's verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub identifier: String,
    pub verdict: Verdict,
    pub score: f64,
    pub predicted_label: String,
}

impl OutcomeRecord {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

impl fmt::Display for OutcomeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.verdict {
            Verdict::Pass => write!(
                f,
                "{} PASSED with a score of {:.6} (thought it was {}).",
                self.identifier, self.score, self.predicted_label
            ),
            Verdict::Fail => write!(
                f,
                "{} failed with a score of {:.6}",
                self.identifier, self.score
            ),
        }
    }
}

/// Result of filtering one frame
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub record: OutcomeRecord,
    /// Set when the frame passed but its good-frame action failed
    pub action_error: Option<String>,
}

/// Applies the run's threshold to scored frames
#[derive(Debug, Clone)]
pub struct FrameFilter {
    threshold: f64,
    layout: FrameLayout,
}

impl FrameFilter {
    pub fn new(threshold: f64, layout: FrameLayout) -> Self {
        Self { threshold, layout }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// A frame passes only when its score is strictly above the threshold.
    pub fn verdict(&self, top_score: f64) -> Verdict {
        if top_score > self.threshold {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    /// Decide a frame's verdict, marking it good when it passes.
    ///
    /// A failing action is reported in the outcome but does not change the
    /// verdict.
    pub fn filter(&self, result: &ScoreResult, action: &dyn GoodFrameAction) -> FilterOutcome {
        let verdict = self.verdict(result.top_score);
        let mut action_error = None;

        if verdict == Verdict::Pass {
            let item = WorkItem::new(result.identifier.clone(), &self.layout);
            if let Err(error) = action.mark_good(&item) {
                tracing::warn!(frame = %result.identifier, %error, "failed to mark frame as good");
                action_error = Some(format!("{}: {}", result.identifier, error));
            }
        }

        FilterOutcome {
            record: OutcomeRecord {
                identifier: result.identifier.clone(),
                verdict,
                score: result.top_score,
                predicted_label: result.predicted_label.clone(),
            },
            action_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionError;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingAction {
        marked: Mutex<Vec<WorkItem>>,
    }

    impl GoodFrameAction for RecordingAction {
        fn mark_good(&self, item: &WorkItem) -> Result<(), ActionError> {
            self.marked.lock().unwrap().push(item.clone());
            Ok(())
        }
    }

    struct BrokenAction;

    impl GoodFrameAction for BrokenAction {
        fn mark_good(&self, item: &WorkItem) -> Result<(), ActionError> {
            Err(ActionError::FrameNotFound {
                path: item.source_path(),
            })
        }
    }

    fn filter_at(threshold: f64) -> FrameFilter {
        FrameFilter::new(threshold, FrameLayout::new("/tmp/all", "/tmp/good"))
    }

    #[test]
    fn score_equal_to_threshold_fails() {
        let action = RecordingAction::default();
        let outcome = filter_at(0.5).filter(&ScoreResult::new("b", 0.5, "cat"), &action);

        assert_eq!(outcome.record.verdict, Verdict::Fail);
        assert!(action.marked.lock().unwrap().is_empty());
    }

    #[test]
    fn passing_frame_is_marked_once_with_its_locations() {
        let action = RecordingAction::default();
        let outcome = filter_at(0.5).filter(&ScoreResult::new("a", 0.9, "cat"), &action);

        assert!(outcome.record.passed());
        let marked = action.marked.lock().unwrap();
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].identifier, "a");
        assert_eq!(marked[0].source_location, PathBuf::from("/tmp/all"));
        assert_eq!(marked[0].destination_location, PathBuf::from("/tmp/good"));
    }

    #[test]
    fn outcome_records_read_like_log_lines() {
        let action = RecordingAction::default();
        let filter = filter_at(0.5);

        let pass = filter.filter(&ScoreResult::new("a", 0.9, "tabby"), &action);
        let fail = filter.filter(&ScoreResult::new("c", 0.2, "tabby"), &action);

        assert_eq!(
            pass.record.to_string(),
            "a PASSED with a score of 0.900000 (thought it was tabby)."
        );
        assert_eq!(fail.record.to_string(), "c failed with a score of 0.200000");
    }

    #[test]
    fn failed_action_keeps_pass_verdict() {
        let outcome = filter_at(0.1).filter(&ScoreResult::new("a", 0.9, "cat"), &BrokenAction);

        assert!(outcome.record.passed());
        assert!(outcome.action_error.unwrap().contains("a"));
    }

    #[test]
    fn zero_threshold_still_fails_zero_scores() {
        let action = RecordingAction::default();
        let outcome = filter_at(0.0).filter(&ScoreResult::new("x", 0.0, ""), &action);
        assert_eq!(outcome.record.verdict, Verdict::Fail);
    }
}
