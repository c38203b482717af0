//! # Workspace Module
//!
//! Temporary directories a movie is unpacked into. They are removed when
//! the [`Workspace`] is dropped, whichever way the run ends.

use crate::core::frame::FrameLayout;
use crate::core::media::MediaDirs;
use crate::error::WorkspaceError;
use tempfile::TempDir;

/// Scoped set of frame and sound directories
pub struct Workspace {
    frames: TempDir,
    good_frames: TempDir,
    sound: TempDir,
    good_sound: TempDir,
}

impl Workspace {
    /// Create the four directories under the system temp dir.
    pub fn create() -> Result<Self, WorkspaceError> {
        let workspace = Self {
            frames: temp_dir("allFrames")?,
            good_frames: temp_dir("goodFrames")?,
            sound: temp_dir("allSoundFrames")?,
            good_sound: temp_dir("goodSoundFrames")?,
        };

        tracing::info!(path = %workspace.frames.path().display(), "all frames stored at");
        tracing::info!(path = %workspace.good_frames.path().display(), "passing frames stored at");
        tracing::info!(path = %workspace.sound.path().display(), "sound track stored at");
        tracing::info!(path = %workspace.good_sound.path().display(), "passing sound frames stored at");

        Ok(workspace)
    }

    pub fn dirs(&self) -> MediaDirs {
        MediaDirs {
            frames: self.frames.path().to_path_buf(),
            good_frames: self.good_frames.path().to_path_buf(),
            sound: self.sound.path().to_path_buf(),
            good_sound: self.good_sound.path().to_path_buf(),
        }
    }

    pub fn layout(&self) -> FrameLayout {
        FrameLayout::new(self.frames.path(), self.good_frames.path())
    }
}

fn temp_dir(prefix: &'static str) -> Result<TempDir, WorkspaceError> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .map_err(|source| WorkspaceError::CreateFailed { prefix, source })
}
