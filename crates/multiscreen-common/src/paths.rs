//! Path utilities for detecting file types by extension.
//!
//! Extension matching is case-insensitive. These tables decide what the
//! source classifier and directory scanner accept.

use std::path::Path;

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "wmv", "flv", "m4v", "webm"];

/// Line-oriented playlist extensions.
const LINE_LIST_EXTENSIONS: &[&str] = &["m3u", "m3u8"];

/// XML tracklist playlist extensions.
const XML_TRACKLIST_EXTENSIONS: &[&str] = &["xspf"];

fn extension_in(path: &Path, table: &[&str]) -> bool {
    lowercase_extension(path)
        .map(|ext| table.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// The path's extension, lowercased.
pub fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use multiscreen_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("clip.MKV")));
/// assert!(is_video_file(Path::new("/path/to/video.mp4")));
/// assert!(!is_video_file(Path::new("readme.txt")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    extension_in(path, VIDEO_EXTENSIONS)
}

/// Check if a path has an `.m3u`/`.m3u8` extension.
pub fn is_line_list(path: &Path) -> bool {
    extension_in(path, LINE_LIST_EXTENSIONS)
}

/// Check if a path has an `.xspf` extension.
pub fn is_xml_tracklist(path: &Path) -> bool {
    extension_in(path, XML_TRACKLIST_EXTENSIONS)
}

/// Get the list of video file extensions.
#[must_use]
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}
