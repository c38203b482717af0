//! # Error Module
//!
//! Error types for frame-sieve.
//!
//! ## Design Principles
//! - **Never panic** on frames or service responses - return errors instead
//! - **Include context** - paths, frame names, status codes
//! - **Degrade, don't abort** - scoring errors become zero-score results upstream

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum FrameSieveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Scoring error: {0}")]
    Score(#[from] ScoreError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
}

/// Fatal precondition violations, checked before any work starts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid worker count: {value} (must be at least 1)")]
    InvalidWorkerCount { value: usize },

    #[error("Invalid threshold: {value} (must be between 0 and 1)")]
    InvalidThreshold { value: f64 },

    #[error("Invalid frame rate: {value} Hz (must be 1-10)")]
    InvalidHertz { value: u32 },

    #[error("No scorer configured for the pipeline")]
    MissingScorer,

    #[error("No good-frame action configured for the pipeline")]
    MissingAction,
}

/// Errors from a single scoring call
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Failed to read frame {path}: {source}")]
    ReadFrame {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scoring request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Scoring service returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Malformed scoring response: {0}")]
    MalformedResponse(String),

    #[error("Scoring response contained no labels")]
    EmptyLabels,

    #[error("Label probability {value} is outside 0-1")]
    ProbabilityOutOfRange { value: f64 },
}

/// Errors from the external media tool (ffmpeg / ffprobe)
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Failed to launch {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    #[error("Could not determine the duration of {path}")]
    DurationUnavailable { path: PathBuf },

    #[error("Frame name {name} does not carry a frame number")]
    FrameNumber { name: String },

    #[error("No frames to assemble in {path}")]
    NoGoodFrames { path: PathBuf },

    #[error("Failed to read frame directory {path}: {reason}")]
    ReadDirectory { path: PathBuf, reason: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the good-frame side effect
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Frame not found: {path}")]
    FrameNotFound { path: PathBuf },

    #[error("Failed to move {from} to {to}: {source}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to cut sound frame: {0}")]
    SoundFrame(#[from] MediaError),
}

/// Errors from running the concurrent pipeline itself
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to spawn {stage} thread: {source}")]
    Spawn {
        stage: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Pipeline stage {stage} panicked")]
    StagePanicked { stage: String },
}

/// Errors provisioning temporary directories
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Failed to create temporary directory {prefix}: {source}")]
    CreateFailed {
        prefix: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, FrameSieveError>;
