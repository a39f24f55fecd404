use multiscreen_common::{Assignment, MonitorGeometry, PlaybackMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub player: PlayerConfig,

    /// Static monitor layout. When empty, monitors are detected.
    #[serde(default)]
    pub monitors: Vec<MonitorGeometry>,

    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    /// Mode applied to every assignment without its own `mode`
    #[serde(default)]
    pub mode: PlaybackMode,

    /// Delay between starting playback and requesting fullscreen (default: 100)
    #[serde(default = "default_fullscreen_delay")]
    pub fullscreen_delay_ms: u64,

    /// Abort the whole run when an assignment names a missing screen,
    /// instead of skipping that assignment
    #[serde(default)]
    pub abort_on_invalid_screen: bool,
}

fn default_fullscreen_delay() -> u64 {
    100
}

impl PlaybackConfig {
    pub fn fullscreen_delay(&self) -> Duration {
        Duration::from_millis(self.fullscreen_delay_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            mode: PlaybackMode::default(),
            fullscreen_delay_ms: default_fullscreen_delay(),
            abort_on_invalid_screen: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    /// mpv executable; searched in PATH when unset
    #[serde(default)]
    pub mpv_path: Option<PathBuf>,

    /// Extra arguments passed to every mpv instance
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Timeout for a single IPC command (default: 2000)
    #[serde(default = "default_ipc_timeout")]
    pub ipc_timeout_ms: u64,

    /// Time allowed for a player window to appear (default: 5000)
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_ms: u64,
}

fn default_ipc_timeout() -> u64 {
    2000
}

fn default_startup_timeout() -> u64 {
    5000
}

impl PlayerConfig {
    pub fn ipc_timeout(&self) -> Duration {
        Duration::from_millis(self.ipc_timeout_ms)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            mpv_path: None,
            extra_args: Vec::new(),
            ipc_timeout_ms: default_ipc_timeout(),
            startup_timeout_ms: default_startup_timeout(),
        }
    }
}
