//! # Media Module
//!
//! Everything that touches the movie file itself: splitting it into frames,
//! pulling out the sound track, cutting per-frame sound slices and putting
//! the kept frames back together.
//!
//! All of it is delegated to `ffmpeg` / `ffprobe`, which must be on `PATH`.

mod ffmpeg;
mod timing;

pub use ffmpeg::FfmpegFramer;
pub use timing::{clip_length, estimated_frame_count, format_timestamp, sound_position};

use crate::error::MediaError;
use std::path::PathBuf;

/// Name of the full sound track inside the sound directory
pub const SOUND_TRACK: &str = "output-audio.aac";

/// Directories a movie is unpacked into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDirs {
    /// Every extracted frame
    pub frames: PathBuf,
    /// Frames that passed the threshold
    pub good_frames: PathBuf,
    /// The extracted sound track
    pub sound: PathBuf,
    /// Sound slices for passing frames
    pub good_sound: PathBuf,
}

/// Frame and sound manipulation for one movie
pub trait Framer {
    /// Extract the sound track so slices can be cut from it later
    fn strip_sound(&self) -> Result<(), MediaError>;

    /// Split the movie into numbered frames
    fn make_frames(&self) -> Result<(), MediaError>;

    /// Cut the sound slice that plays under the given frame
    fn create_sound_frame(&self, identifier: &str) -> Result<(), MediaError>;

    /// Assemble the good frames and sound slices into a new movie,
    /// returning its path
    fn make_video(&self) -> Result<PathBuf, MediaError>;

    /// Movie duration in seconds
    fn duration(&self) -> f64;

    /// Number of frames the split is expected to produce
    fn frame_count(&self) -> u64;
}
