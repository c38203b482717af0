//! Good-frame side effects.

use crate::core::frame::WorkItem;
use crate::core::media::Framer;
use crate::error::ActionError;
use std::fs;
use std::io;
use std::path::Path;

/// What happens to a frame that passed the threshold
///
/// Always invoked from the run's consumer thread, never concurrently.
pub trait GoodFrameAction {
    fn mark_good(&self, item: &WorkItem) -> Result<(), ActionError>;
}

/// Moves a passing frame into the good-frames directory and cuts the sound
/// slice that plays under it.
pub struct FrameMover<'a> {
    framer: &'a dyn Framer,
}

impl<'a> FrameMover<'a> {
    pub fn new(framer: &'a dyn Framer) -> Self {
        Self { framer }
    }
}

impl GoodFrameAction for FrameMover<'_> {
    fn mark_good(&self, item: &WorkItem) -> Result<(), ActionError> {
        move_file(&item.source_path(), &item.destination_path())?;
        self.framer.create_sound_frame(&item.identifier)?;
        Ok(())
    }
}

/// Move a file, falling back to copy + delete across filesystems.
pub fn move_file(from: &Path, to: &Path) -> Result<(), ActionError> {
    if !from.exists() {
        return Err(ActionError::FrameNotFound {
            path: from.to_path_buf(),
        });
    }

    let moved = fs::rename(from, to).or_else(|_| {
        let source_size = fs::metadata(from)?.len();
        fs::copy(from, to)?;

        // Only delete the source once the copy is known to be complete
        let dest_size = fs::metadata(to)?.len();
        if dest_size != source_size {
            let _ = fs::remove_file(to);
            return Err(io::Error::other(format!(
                "copy verification failed: source {source_size} bytes, dest {dest_size} bytes"
            )));
        }

        fs::remove_file(from)
    });

    moved.map_err(|source| ActionError::MoveFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}
