//! Source classification.
//!
//! Decides what kind of input an assignment names before anything is read:
//!
//! - **Video**: an existing file with a supported video extension
//! - **Playlist**: `.m3u`/`.m3u8` (line list) or `.xspf` (XML tracklist)
//! - **Directory**: a folder whose videos are played in name order
//! - **Stream**: a remote URL, played as-is
//!
//! Anything else is invalid, reported as [`Error::NotFound`] or
//! [`Error::UnsupportedExtension`].

use super::location;
use multiscreen_common::paths::{is_line_list, is_video_file, is_xml_tracklist, lowercase_extension};
use multiscreen_common::{Error, Result};
use std::path::Path;

/// Playlist document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistKind {
    /// `#`-commented, one entry per line.
    LineList,
    /// XSPF `<trackList>` document.
    XmlTracklist,
}

/// Result of source classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Video,
    Playlist(PlaylistKind),
    Directory,
    Stream,
}

/// Classifier for assignment sources.
pub struct SourceClassifier;

impl SourceClassifier {
    /// Create a new source classifier.
    pub fn new() -> Self {
        Self
    }

    /// Classify a source string, checking the filesystem where needed.
    ///
    /// An existing path always wins over a URL reading of the same string.
    pub fn classify(&self, source: &str) -> Result<SourceKind> {
        let path = Path::new(source);
        if !path.exists() && location::is_remote(source) {
            return Ok(SourceKind::Stream);
        }

        self.classify_path(path)
    }

    /// Classify a filesystem path.
    pub fn classify_path(&self, path: &Path) -> Result<SourceKind> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::not_found(path));
            }
            Err(e) => return Err(Error::Io(e)),
        };

        if metadata.is_dir() {
            return Ok(SourceKind::Directory);
        }

        Self::classify_extension(path).ok_or_else(|| Error::UnsupportedExtension {
            path: path.to_path_buf(),
            extension: lowercase_extension(path).unwrap_or_default(),
        })
    }

    /// Classify by extension alone, without touching the filesystem.
    pub fn classify_extension(path: &Path) -> Option<SourceKind> {
        if is_line_list(path) {
            Some(SourceKind::Playlist(PlaylistKind::LineList))
        } else if is_xml_tracklist(path) {
            Some(SourceKind::Playlist(PlaylistKind::XmlTracklist))
        } else if is_video_file(path) {
            Some(SourceKind::Video)
        } else {
            None
        }
    }
}

impl Default for SourceClassifier {
    fn default() -> Self {
        Self::new()
    }
}
