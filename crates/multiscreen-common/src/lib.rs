//! Multiscreen-Common: Shared types, errors, and path utilities.
//!
//! - **Core Types**: assignments, monitor geometry, playback modes, session states
//! - **Path Utilities**: video and playlist detection by extension
//! - **Error Handling**: the failure taxonomy and result alias
//!
//! # Examples
//!
//! ```
//! use multiscreen_common::{Assignment, PlaybackMode, Error, Result};
//! use multiscreen_common::paths::is_video_file;
//! use std::path::Path;
//!
//! let assignment: Assignment = "1=/videos/intro.mp4".parse().unwrap();
//! assert_eq!(assignment.effective_mode(PlaybackMode::Loop), PlaybackMode::Loop);
//!
//! assert!(is_video_file(Path::new("intro.mp4")));
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("/videos/missing.mp4"))
//! }
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
