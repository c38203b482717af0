//! # Scorer Module
//!
//! Sends frames to a classifier and reduces its ranked answer to a single
//! score.
//!
//! ## Failure policy
//! A frame that cannot be scored (unreadable file, transport error, bad
//! response) becomes a zero-score result instead of an error.

mod http;

pub use http::{parse_labels, HttpScorer, ScoreResponse};

use crate::core::frame::WorkItem;
use crate::error::ScoreError;
use serde::{Deserialize, Serialize};
use std::fs;

/// One ranked entry from the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub probability: f64,
}

/// The score a single frame received
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Frame file name
    pub identifier: String,
    /// Probability of the top-ranked label, in `0..=1`
    pub top_score: f64,
    /// Name of the top-ranked label
    pub predicted_label: String,
    /// Why the frame was scored as zero, if it could not be scored
    pub failure: Option<String>,
}

impl ScoreResult {
    pub fn new(identifier: impl Into<String>, top_score: f64, predicted_label: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            top_score,
            predicted_label: predicted_label.into(),
            failure: None,
        }
    }

    /// Zero-confidence result for a frame whose scoring failed
    pub fn degraded(identifier: impl Into<String>, error: &ScoreError) -> Self {
        Self {
            identifier: identifier.into(),
            top_score: 0.0,
            predicted_label: String::new(),
            failure: Some(error.to_string()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }
}

/// A classifier that ranks labels for an image
///
/// Implementations are shared by every worker thread, so they must be
/// `Send + Sync`. Return labels highest probability first; only the first
/// entry is used.
pub trait FrameScorer: Send + Sync {
    fn score(&self, file_name: &str, image: Vec<u8>) -> Result<Vec<LabelScore>, ScoreError>;
}

/// Score one work item, degrading to zero on any failure.
pub fn score_frame(item: &WorkItem, scorer: &dyn FrameScorer) -> ScoreResult {
    match try_score_frame(item, scorer) {
        Ok(result) => result,
        Err(error) => {
            tracing::warn!(frame = %item.identifier, %error, "scoring failed, treating as score 0");
            ScoreResult::degraded(item.identifier.clone(), &error)
        }
    }
}

fn try_score_frame(item: &WorkItem, scorer: &dyn FrameScorer) -> Result<ScoreResult, ScoreError> {
    let path = item.source_path();
    let image = fs::read(&path).map_err(|source| ScoreError::ReadFrame { path, source })?;

    let labels = scorer.score(&item.identifier, image)?;
    let top = labels.into_iter().next().ok_or(ScoreError::EmptyLabels)?;

    if !(0.0..=1.0).contains(&top.probability) {
        return Err(ScoreError::ProbabilityOutOfRange {
            value: top.probability,
        });
    }

    Ok(ScoreResult::new(
        item.identifier.clone(),
        top.probability,
        top.label,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame::FrameLayout;
    use tempfile::TempDir;

    struct FixedScorer(Vec<LabelScore>);

    impl FrameScorer for FixedScorer {
        fn score(&self, _file_name: &str, _image: Vec<u8>) -> Result<Vec<LabelScore>, ScoreError> {
            Ok(self.0.clone())
        }
    }

    struct DownScorer;

    impl FrameScorer for DownScorer {
        fn score(&self, _file_name: &str, _image: Vec<u8>) -> Result<Vec<LabelScore>, ScoreError> {
            Err(ScoreError::UnexpectedStatus {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    fn label(name: &str, probability: f64) -> LabelScore {
        LabelScore {
            label: name.to_string(),
            probability,
        }
    }

    fn frame_in(dir: &TempDir, name: &str) -> WorkItem {
        std::fs::write(dir.path().join(name), b"jpeg bytes").unwrap();
        WorkItem::new(name, &FrameLayout::new(dir.path(), dir.path().join("good")))
    }

    #[test]
    fn top_label_becomes_the_score() {
        let dir = TempDir::new().unwrap();
        let item = frame_in(&dir, "000000001.jpg");
        let scorer = FixedScorer(vec![label("tabby", 0.81), label("tiger cat", 0.12)]);

        let result = score_frame(&item, &scorer);

        assert_eq!(result.identifier, "000000001.jpg");
        assert_eq!(result.top_score, 0.81);
        assert_eq!(result.predicted_label, "tabby");
        assert!(!result.is_degraded());
    }

    #[test]
    fn service_error_degrades_to_zero() {
        let dir = TempDir::new().unwrap();
        let item = frame_in(&dir, "000000002.jpg");

        let result = score_frame(&item, &DownScorer);

        assert_eq!(result.top_score, 0.0);
        assert!(result.failure.unwrap().contains("503"));
    }

    #[test]
    fn empty_label_list_degrades_to_zero() {
        let dir = TempDir::new().unwrap();
        let item = frame_in(&dir, "000000003.jpg");

        let result = score_frame(&item, &FixedScorer(Vec::new()));

        assert_eq!(result.top_score, 0.0);
        assert!(result.is_degraded());
    }

    #[test]
    fn out_of_range_probability_degrades_to_zero() {
        let dir = TempDir::new().unwrap();
        let item = frame_in(&dir, "000000004.jpg");

        let too_high = score_frame(&item, &FixedScorer(vec![label("dog", 1.7)]));
        let not_a_number = score_frame(&item, &FixedScorer(vec![label("dog", f64::NAN)]));

        assert!(too_high.is_degraded());
        assert!(not_a_number.is_degraded());
        assert_eq!(not_a_number.top_score, 0.0);
    }

    #[test]
    fn missing_frame_file_degrades_to_zero() {
        let dir = TempDir::new().unwrap();
        let item = WorkItem::new("missing.jpg", &FrameLayout::new(dir.path(), dir.path()));

        let result = score_frame(&item, &FixedScorer(vec![label("dog", 0.9)]));

        assert!(result.is_degraded());
        assert!(result.failure.unwrap().contains("missing.jpg"));
    }
}
