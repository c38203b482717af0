//! # Core Module
//!
//! The UI-agnostic frame scoring engine.
//!
//! ## Modules
//! - `frame` - Work items and the frame directory snapshot
//! - `scorer` - Classifier capability and its HTTP client
//! - `filter` - Threshold decision and the good-frame side effect
//! - `pipeline` - Concurrent fan-out / fan-in scoring run
//! - `media` - ffmpeg driver for frames and sound
//! - `workspace` - Scoped temporary directories

pub mod filter;
pub mod frame;
pub mod media;
pub mod pipeline;
pub mod scorer;
pub mod workspace;

// Re-export commonly used types
pub use filter::{OutcomeRecord, Verdict};
pub use frame::{FrameLayout, WorkItem};
pub use pipeline::{CancellationToken, Pipeline, PipelineResult};
pub use scorer::{FrameScorer, LabelScore, ScoreResult};
