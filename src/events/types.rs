//! Event type definitions for progress and outcome reporting.

use crate::core::filter::OutcomeRecord;
use crate::core::pipeline::RunMode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// All events emitted while processing a movie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Scoring run lifecycle
    Pipeline(PipelineEvent),
    /// Per-frame scoring events
    Score(ScoreEvent),
    /// Media tool phases driven by the CLI
    Media(MediaEvent),
}

/// Scoring run lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// A run has started
    Started {
        run_id: Uuid,
        total_frames: usize,
        workers: usize,
        mode: RunMode,
    },
    /// The run processed every frame
    Completed { summary: PipelineSummary },
    /// The run stopped early because cancellation was requested
    Cancelled,
}

/// Per-frame events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScoreEvent {
    /// A frame received its verdict
    Outcome(OutcomeRecord),
    /// A frame could not be scored and was treated as score 0
    Degraded { identifier: String, reason: String },
}

/// Media processing events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MediaEvent {
    /// Moving to a new phase
    PhaseChanged { phase: MediaPhase },
}

/// Phases of a full movie run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaPhase {
    StrippingSound,
    SplittingFrames,
    Scoring,
    AssemblingVideo,
}

/// Summary of a scoring run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Identifier of the run
    pub run_id: Uuid,
    /// Frames that received a verdict
    pub total_frames: usize,
    /// Frames above the threshold
    pub passed: usize,
    /// Frames that could not be scored
    pub degraded: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for MediaPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaPhase::StrippingSound => write!(f, "Stripping sound"),
            MediaPhase::SplittingFrames => write!(f, "Splitting frames"),
            MediaPhase::Scoring => write!(f, "Scoring"),
            MediaPhase::AssemblingVideo => write!(f, "Assembling video"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::Verdict;

    #[test]
    fn events_are_serializable() {
        let event = Event::Score(ScoreEvent::Outcome(OutcomeRecord {
            identifier: "000000007.jpg".to_string(),
            verdict: Verdict::Pass,
            score: 0.9,
            predicted_label: "tabby".to_string(),
        }));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Score(ScoreEvent::Outcome(record)) => {
                assert_eq!(record.identifier, "000000007.jpg");
                assert_eq!(record.verdict, Verdict::Pass);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn phase_display_is_human_readable() {
        assert_eq!(MediaPhase::AssemblingVideo.to_string(), "Assembling video");
    }
}
