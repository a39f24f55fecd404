//! Core data model shared by the resolver, sessions, and orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A source bound to a 1-based screen index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// File path, directory, playlist document, or stream URL.
    pub source: String,
    /// 1-based monitor index.
    pub screen: u32,
    /// Overrides the global playback mode for this assignment only.
    #[serde(default)]
    pub mode: Option<PlaybackMode>,
}

impl Assignment {
    pub fn new(source: impl Into<String>, screen: u32) -> Self {
        Self {
            source: source.into(),
            screen,
            mode: None,
        }
    }

    pub fn with_mode(mut self, mode: PlaybackMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// The mode this assignment plays with, falling back to `global`.
    pub fn effective_mode(&self, global: PlaybackMode) -> PlaybackMode {
        self.mode.unwrap_or(global)
    }
}

impl std::str::FromStr for Assignment {
    type Err = String;

    /// Parse the `SCREEN=SOURCE` form used on the command line.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (screen, source) = s
            .split_once('=')
            .ok_or_else(|| format!("expected SCREEN=SOURCE, got {:?}", s))?;
        let screen: u32 = screen
            .trim()
            .parse()
            .map_err(|_| format!("invalid screen index: {:?}", screen))?;
        let source = source.trim();
        if source.is_empty() {
            return Err("source cannot be empty".to_string());
        }
        Ok(Self::new(source, screen))
    }
}

/// Pixel rectangle of one monitor in virtual-desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitorGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl MonitorGeometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl fmt::Display for MonitorGeometry {
    /// X11-style geometry string, e.g. `1920x1080+1920+0`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}{:+}{:+}", self.width, self.height, self.x, self.y)
    }
}

/// How a session walks its resolved sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Play the sequence once, in order.
    #[default]
    Default,
    /// Repeat the whole sequence forever.
    Loop,
    /// Play the sequence in random order.
    Shuffle,
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Loop => write!(f, "loop"),
            Self::Shuffle => write!(f, "shuffle"),
        }
    }
}

impl std::str::FromStr for PlaybackMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" | "once" => Ok(Self::Default),
            "loop" | "repeat" => Ok(Self::Loop),
            "shuffle" | "random" => Ok(Self::Shuffle),
            _ => Err(format!("Unknown playback mode: {}", s)),
        }
    }
}

/// Lifecycle of a playback session. There is no way back from `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Constructing,
    Playing,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constructing => write!(f, "constructing"),
            Self::Playing => write!(f, "playing"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}
