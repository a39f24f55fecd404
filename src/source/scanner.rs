//! Directory scanning for video files.

use multiscreen_common::paths::is_video_file;
use multiscreen_common::{Error, Result};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// List the videos directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into and non-video files are ignored.
/// Ordering compares raw file names, so it does not depend on the locale.
/// `dir` must be absolute for the returned paths to be absolute.
pub fn scan_directory(dir: &Path) -> Result<Vec<String>> {
    let mut videos = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(Error::Io(e.into())),
            Err(e) => {
                warn!("Skipping unreadable entry in {:?}: {}", dir, e);
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || !is_video_file(path) {
            continue;
        }

        match path.to_str() {
            Some(path) => videos.push(path.to_string()),
            None => warn!("Skipping non-UTF-8 path {:?}", path),
        }
    }

    debug!("Found {} videos in {:?}", videos.len(), dir);
    Ok(videos)
}
