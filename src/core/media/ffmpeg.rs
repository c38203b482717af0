//! ffmpeg-backed [`Framer`].

use super::timing::{clip_length, estimated_frame_count, format_timestamp, sound_position};
use super::{Framer, MediaDirs, SOUND_TRACK};
use crate::core::frame::{frame_number, frame_stem, list_frames};
use crate::error::MediaError;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use walkdir::WalkDir;

const FFMPEG: &str = "ffmpeg";
const FFPROBE: &str = "ffprobe";

/// Soundless movie assembled from the good frames
const STAGING_MOVIE: &str = "in_progress.avi";
/// Concat list of sound slices
const SOUND_LIST: &str = "output.txt";
/// Concatenated sound slices
const GOOD_SOUND_TRACK: &str = "output.aac";

/// Drives ffmpeg for a single movie
#[derive(Debug, Clone)]
pub struct FfmpegFramer {
    movie: PathBuf,
    dirs: MediaDirs,
    hertz: u32,
    duration: f64,
    frame_count: u64,
}

impl FfmpegFramer {
    /// Probe the movie and prepare a framer for it.
    pub fn new(movie: impl Into<PathBuf>, dirs: MediaDirs, hertz: u32) -> Result<Self, MediaError> {
        let movie = movie.into();
        let duration = probe_duration(&movie)?;
        Ok(Self::with_duration(movie, dirs, hertz, duration))
    }

    /// Build a framer for a movie whose duration is already known.
    pub fn with_duration(movie: PathBuf, dirs: MediaDirs, hertz: u32, duration: f64) -> Self {
        Self {
            movie,
            dirs,
            hertz,
            duration,
            frame_count: estimated_frame_count(hertz, duration),
        }
    }

    pub fn dirs(&self) -> &MediaDirs {
        &self.dirs
    }

    /// ffmpeg arguments that cut the sound slice for `identifier`
    fn sound_frame_args(&self, identifier: &str) -> Result<Vec<String>, MediaError> {
        let n = frame_number(identifier)?;
        let position = sound_position(self.duration, self.frame_count, n);
        let slice = self
            .dirs
            .good_sound
            .join(format!("{}.aac", frame_stem(identifier)));

        Ok(vec![
            "-y".to_string(),
            "-i".to_string(),
            path_arg(&self.dirs.sound.join(SOUND_TRACK)),
            "-ss".to_string(),
            format_timestamp(position),
            "-t".to_string(),
            format_timestamp(clip_length(self.hertz)),
            "-c".to_string(),
            "copy".to_string(),
            path_arg(&slice),
        ])
    }

    /// Path of the assembled movie, next to the source
    fn output_movie_path(&self) -> PathBuf {
        let stem = self
            .movie
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "movie".to_string());
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let name = format!("new_{stem}{nanos}.mov");

        match self.movie.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Sound slices cut so far, in frame order
    fn sound_slices(&self) -> Result<Vec<String>, MediaError> {
        let dir = &self.dirs.good_sound;
        let mut slices = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| MediaError::ReadDirectory {
                path: dir.clone(),
                reason: e.to_string(),
            })?;
            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_file() && name.ends_with(".aac") && name != GOOD_SOUND_TRACK {
                slices.push(name.into_owned());
            }
        }

        Ok(slices)
    }

    /// Write the concat list naming `slices`.
    fn write_sound_list(&self, slices: &[String]) -> Result<PathBuf, MediaError> {
        let lines: String = slices.iter().map(|name| format!("file '{name}'\n")).collect();

        let list = self.dirs.good_sound.join(SOUND_LIST);
        fs::write(&list, lines).map_err(|source| MediaError::Io {
            path: list.clone(),
            source,
        })?;
        Ok(list)
    }
}

impl Framer for FfmpegFramer {
    fn strip_sound(&self) -> Result<(), MediaError> {
        run_tool(
            FFMPEG,
            &[
                "-y".to_string(),
                "-i".to_string(),
                path_arg(&self.movie),
                "-vn".to_string(),
                "-acodec".to_string(),
                "copy".to_string(),
                path_arg(&self.dirs.sound.join(SOUND_TRACK)),
            ],
        )
        .map(|_| ())
    }

    fn make_frames(&self) -> Result<(), MediaError> {
        run_tool(
            FFMPEG,
            &[
                "-i".to_string(),
                path_arg(&self.movie),
                "-r".to_string(),
                format!("{}/1", self.hertz),
                path_arg(&self.dirs.frames.join("%09d.jpg")),
            ],
        )
        .map(|_| ())
    }

    fn create_sound_frame(&self, identifier: &str) -> Result<(), MediaError> {
        if !self.dirs.sound.join(SOUND_TRACK).is_file() {
            tracing::debug!(frame = identifier, "movie has no sound track, no slice cut");
            return Ok(());
        }
        let args = self.sound_frame_args(identifier)?;
        run_tool(FFMPEG, &args).map(|_| ())
    }

    fn make_video(&self) -> Result<PathBuf, MediaError> {
        if list_frames(&self.dirs.good_frames)?.is_empty() {
            return Err(MediaError::NoGoodFrames {
                path: self.dirs.good_frames.clone(),
            });
        }

        let output = self.output_movie_path();
        let staging = self.dirs.good_frames.join(STAGING_MOVIE);
        tracing::info!(output = %output.display(), "assembling movie");

        run_tool(
            FFMPEG,
            &[
                "-y".to_string(),
                "-framerate".to_string(),
                self.hertz.to_string(),
                "-pattern_type".to_string(),
                "glob".to_string(),
                "-i".to_string(),
                path_arg(&self.dirs.good_frames.join("*.jpg")),
                "-vcodec".to_string(),
                "mjpeg".to_string(),
                path_arg(&staging),
            ],
        )?;

        let slices = self.sound_slices()?;
        if slices.is_empty() {
            tracing::warn!("no sound slices, assembling a silent movie");
            run_tool(
                FFMPEG,
                &[
                    "-y".to_string(),
                    "-i".to_string(),
                    path_arg(&staging),
                    "-codec".to_string(),
                    "copy".to_string(),
                    path_arg(&output),
                ],
            )?;
            return Ok(output);
        }

        let list = self.write_sound_list(&slices)?;
        let good_track = self.dirs.good_sound.join(GOOD_SOUND_TRACK);
        run_tool(
            FFMPEG,
            &[
                "-y".to_string(),
                "-f".to_string(),
                "concat".to_string(),
                "-safe".to_string(),
                "0".to_string(),
                "-i".to_string(),
                path_arg(&list),
                "-c".to_string(),
                "copy".to_string(),
                path_arg(&good_track),
            ],
        )?;

        run_tool(
            FFMPEG,
            &[
                "-i".to_string(),
                path_arg(&staging),
                "-i".to_string(),
                path_arg(&good_track),
                "-codec".to_string(),
                "copy".to_string(),
                "-shortest".to_string(),
                path_arg(&output),
            ],
        )?;

        Ok(output)
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Ask ffprobe for the movie's duration in seconds.
fn probe_duration(movie: &Path) -> Result<f64, MediaError> {
    let stdout = run_tool(
        FFPROBE,
        &["-i".to_string(), path_arg(movie), "-show_format".to_string()],
    )?;

    parse_duration(&stdout).ok_or_else(|| MediaError::DurationUnavailable {
        path: movie.to_path_buf(),
    })
}

/// Extract `duration=<secs>` from `ffprobe -show_format` output
fn parse_duration(probe_output: &str) -> Option<f64> {
    static DURATION: OnceLock<Regex> = OnceLock::new();
    let pattern = DURATION.get_or_init(|| {
        Regex::new(r"(?m)^duration=([0-9]+(?:\.[0-9]+)?)\s*$").expect("duration pattern is valid")
    });

    pattern
        .captures(probe_output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Run a media tool to completion, returning its stdout.
fn run_tool(tool: &'static str, args: &[String]) -> Result<String, MediaError> {
    tracing::debug!(tool, ?args, "running media tool");

    let output = Command::new(tool)
        .args(args)
        .output()
        .map_err(|source| MediaError::Spawn { tool, source })?;

    if !output.status.success() {
        return Err(MediaError::ToolFailed {
            tool,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
