//! Capability interfaces for the window system and the playback engine.
//!
//! A session first creates a window on its monitor, then binds an engine to
//! the window's native handle. Backends implement these traits:
//!
//! - [`mpv`]: one external mpv player per monitor, driven over JSON IPC
//! - [`dry_run`]: records every call without touching the display

pub mod dry_run;
pub mod mpv;

use async_trait::async_trait;
use multiscreen_common::{MonitorGeometry, PlaybackMode, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Native drawable a playback engine attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeHandle {
    /// Toolkit window id (X11 XID, Win32 HWND).
    Window(u64),
    /// IPC endpoint of a player-owned window.
    IpcSocket(PathBuf),
}

/// Creates borderless, always-on-top windows covering a monitor.
#[async_trait]
pub trait WindowSystem: Send + Sync {
    /// Create a window positioned and sized exactly to `geometry`.
    async fn create_window(&self, geometry: &MonitorGeometry) -> Result<Box<dyn Window>>;
}

/// A window owned by exactly one session.
#[async_trait]
pub trait Window: Send + Sync {
    fn native_handle(&self) -> &NativeHandle;

    fn geometry(&self) -> MonitorGeometry;

    /// Close the window and release its resources.
    async fn destroy(&mut self) -> Result<()>;
}

/// Creates playback engines bound to native handles.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    /// Whether engines can render into a window they do not own.
    fn supports_embedding(&self) -> bool;

    async fn bind(&self, handle: &NativeHandle) -> Result<Box<dyn PlaybackEngine>>;
}

/// A media player instance rendering into one window.
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    async fn load(&mut self, locations: &[String], mode: PlaybackMode) -> Result<()>;

    async fn play(&mut self) -> Result<()>;

    async fn request_fullscreen(&mut self) -> Result<()>;

    async fn stop(&mut self) -> Result<()>;

    /// Release the engine instance. No other call is valid afterwards.
    async fn release(&mut self) -> Result<()>;
}

/// The pair of collaborators sessions are built from.
#[derive(Clone)]
pub struct Platform {
    pub windows: Arc<dyn WindowSystem>,
    pub engines: Arc<dyn EngineFactory>,
}

impl Platform {
    pub fn new(windows: Arc<dyn WindowSystem>, engines: Arc<dyn EngineFactory>) -> Self {
        Self { windows, engines }
    }
}
