//! Source resolution.
//!
//! Turns an assignment's source (video file, directory, playlist document,
//! or stream URL) into the ordered list of locations a session plays.

pub mod classifier;
pub mod location;
pub mod m3u;
pub mod scanner;
pub mod xspf;

use multiscreen_common::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use classifier::{PlaylistKind, SourceClassifier, SourceKind};

/// Ordered, fully resolved playable locations for one assignment.
///
/// Every entry is an absolute path or a remote URL. An empty playlist is a
/// valid value here; sessions refuse to start with one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedPlaylist {
    locations: Vec<String>,
}

impl ResolvedPlaylist {
    pub fn new(locations: Vec<String>) -> Self {
        Self { locations }
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.locations.iter()
    }
}

/// Resolves sources by dispatching on their classification.
pub struct SourceResolver {
    classifier: SourceClassifier,
}

impl SourceResolver {
    /// Create a new resolver.
    pub fn new() -> Self {
        Self {
            classifier: SourceClassifier::new(),
        }
    }

    /// Resolve a source into its playable locations.
    ///
    /// Invalid sources fail with [`Error::NotFound`] or
    /// [`Error::UnsupportedExtension`]; unreadable playlists with
    /// [`Error::ParseFailure`].
    pub fn resolve(&self, source: &str) -> Result<ResolvedPlaylist> {
        let kind = self.classifier.classify(source)?;
        debug!("Classified {} as {:?}", source, kind);

        let locations = match kind {
            SourceKind::Stream => vec![source.to_string()],
            SourceKind::Video => {
                let path = absolute(Path::new(source))?;
                vec![path_to_location(&path)?]
            }
            SourceKind::Playlist(PlaylistKind::LineList) => {
                m3u::parse_line_list(&absolute(Path::new(source))?)?
            }
            SourceKind::Playlist(PlaylistKind::XmlTracklist) => {
                xspf::parse_xml_tracklist(&absolute(Path::new(source))?)?
            }
            SourceKind::Directory => scanner::scan_directory(&absolute(Path::new(source))?)?,
        };

        info!("Resolved {} to {} location(s)", source, locations.len());
        Ok(ResolvedPlaylist::new(locations))
    }
}

impl Default for SourceResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(Error::Io)
}

fn path_to_location(path: &Path) -> Result<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| Error::invalid_input(format!("path is not valid UTF-8: {:?}", path)))
}
