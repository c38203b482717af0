//! # Frame Module
//!
//! Work items and the frame directory snapshot they are built from.
//!
//! ffmpeg writes frames as `%09d.jpg`, so a file name both identifies a
//! frame and carries its position in the movie.

use crate::error::MediaError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One frame to be scored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Frame file name (unique within a run)
    pub identifier: String,
    /// Directory holding every extracted frame
    pub source_location: PathBuf,
    /// Directory passing frames are moved to
    pub destination_location: PathBuf,
}

impl WorkItem {
    pub fn new(identifier: impl Into<String>, layout: &FrameLayout) -> Self {
        Self {
            identifier: identifier.into(),
            source_location: layout.frames_dir.clone(),
            destination_location: layout.good_frames_dir.clone(),
        }
    }

    /// Full path of the frame before it is moved
    pub fn source_path(&self) -> PathBuf {
        self.source_location.join(&self.identifier)
    }

    /// Full path of the frame once it has been marked good
    pub fn destination_path(&self) -> PathBuf {
        self.destination_location.join(&self.identifier)
    }
}

/// Where frames live for the duration of a run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameLayout {
    pub frames_dir: PathBuf,
    pub good_frames_dir: PathBuf,
}

impl FrameLayout {
    pub fn new(frames_dir: impl Into<PathBuf>, good_frames_dir: impl Into<PathBuf>) -> Self {
        Self {
            frames_dir: frames_dir.into(),
            good_frames_dir: good_frames_dir.into(),
        }
    }
}

/// Snapshot the frame files in `dir`, sorted by name.
///
/// Only regular `.jpg` files directly inside `dir` are listed. The listing
/// is taken once; frames written afterwards are not picked up.
pub fn list_frames(dir: &Path) -> Result<Vec<String>, MediaError> {
    if !dir.is_dir() {
        return Err(MediaError::ReadDirectory {
            path: dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let mut names = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| MediaError::ReadDirectory {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let is_frame = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("jpg"))
            .unwrap_or(false);

        if is_frame {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    Ok(names)
}

/// Frame number encoded in a frame file name (`000000042.jpg` -> 42).
///
/// Leading zeros are trimmed; an empty or all-zero stem is frame 0.
pub fn frame_number(identifier: &str) -> Result<u64, MediaError> {
    let digits = frame_stem(identifier).trim_start_matches('0');

    if digits.is_empty() {
        return Ok(0);
    }

    digits.parse().map_err(|_| MediaError::FrameNumber {
        name: identifier.to_string(),
    })
}

/// File name without its extension
pub fn frame_stem(identifier: &str) -> &str {
    identifier.split('.').next().unwrap_or(identifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn work_item_paths_join_identifier() {
        let layout = FrameLayout::new("/tmp/all", "/tmp/good");
        let item = WorkItem::new("000000001.jpg", &layout);

        assert_eq!(item.source_path(), PathBuf::from("/tmp/all/000000001.jpg"));
        assert_eq!(
            item.destination_path(),
            PathBuf::from("/tmp/good/000000001.jpg")
        );
    }

    #[test]
    fn list_frames_is_sorted_and_skips_other_files() {
        let dir = TempDir::new().unwrap();
        for name in ["000000003.jpg", "000000001.jpg", "notes.txt", "000000002.JPG"] {
            fs::write(dir.path().join(name), b"frame").unwrap();
        }
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let frames = list_frames(dir.path()).unwrap();

        assert_eq!(
            frames,
            vec!["000000001.jpg", "000000002.JPG", "000000003.jpg"]
        );
    }

    #[test]
    fn list_frames_rejects_missing_directory() {
        let result = list_frames(Path::new("/nonexistent/frames"));
        assert!(matches!(result, Err(MediaError::ReadDirectory { .. })));
    }

    #[test]
    fn frame_number_trims_leading_zeros() {
        assert_eq!(frame_number("000000042.jpg").unwrap(), 42);
        assert_eq!(frame_number("000000100.jpg").unwrap(), 100);
        assert_eq!(frame_number("000000000.jpg").unwrap(), 0);
    }

    #[test]
    fn frame_number_of_empty_stem_is_zero() {
        assert_eq!(frame_number(".jpg").unwrap(), 0);
        assert_eq!(frame_number("").unwrap(), 0);
    }

    #[test]
    fn frame_number_rejects_non_numeric_names() {
        assert!(frame_number("poster.jpg").is_err());
        assert!(frame_number("12a.jpg").is_err());
    }

    #[test]
    fn frame_stem_drops_extension() {
        assert_eq!(frame_stem("000000042.jpg"), "000000042");
        assert_eq!(frame_stem("noext"), "noext");
    }
}
