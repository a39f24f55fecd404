//! Common error types used throughout multiscreen.
//!
//! Every failure an assignment can hit on its way to playback maps onto one
//! variant here. Only [`Error::MonitorEnumeration`] is process-global; the
//! rest are reported and the affected assignment is skipped.

use std::path::PathBuf;

/// Common error type for multiscreen.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source path does not exist.
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The source exists but its extension is neither a video nor a playlist.
    #[error("unsupported extension {extension:?}: {}", path.display())]
    UnsupportedExtension { path: PathBuf, extension: String },

    /// A playlist document could not be read or parsed.
    #[error("failed to parse playlist {}: {message}", path.display())]
    ParseFailure { path: PathBuf, message: String },

    /// The source resolved to nothing playable.
    #[error("nothing to play in {source_name}")]
    EmptyPlaylist { source_name: String },

    /// The requested screen index does not name a connected monitor.
    #[error("screen {screen} out of range: {count} monitor(s) available")]
    ScreenOutOfRange { screen: u32, count: usize },

    /// Another assignment already claimed this screen.
    #[error("screen {screen} is already assigned to {holder}")]
    ScreenAlreadyAssigned { screen: u32, holder: String },

    /// Monitors could not be enumerated, or none were found.
    #[error("monitor enumeration failed: {0}")]
    MonitorEnumeration(String),

    /// Embedded rendering is not available on this platform.
    #[error("platform unsupported: {0}")]
    PlatformUnsupported(String),

    /// The engine refused to start playback.
    #[error("playback failed to start: {0}")]
    PlaybackStart(String),

    /// The window system failed to create or destroy a window.
    #[error("window error: {0}")]
    Window(String),

    /// The playback engine failed an operation.
    #[error("engine error: {0}")]
    Engine(String),

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a ParseFailure error.
    pub fn parse_failure(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ParseFailure {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an EmptyPlaylist error.
    pub fn empty_playlist(source_name: impl Into<String>) -> Self {
        Self::EmptyPlaylist {
            source_name: source_name.into(),
        }
    }

    /// Create a Window error.
    pub fn window(msg: impl Into<String>) -> Self {
        Self::Window(msg.into())
    }

    /// Create an Engine error.
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error ends the whole run rather than a single assignment.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MonitorEnumeration(_))
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
