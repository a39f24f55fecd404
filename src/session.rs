//! Playback session: one assignment playing on one monitor.
//!
//! A session moves `Constructing -> Playing -> Stopped` and never leaves
//! `Stopped`. Construction is two-phase: the window exists and the engine is
//! bound to its native handle before anything is loaded, and no play call can
//! be issued until construction has returned a session.

use crate::platform::{PlaybackEngine, Platform, Window};
use crate::source::ResolvedPlaylist;
use multiscreen_common::{Assignment, Error, MonitorGeometry, PlaybackMode, Result, SessionState};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-run settings applied to every session.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Mode for assignments that do not carry their own.
    pub mode: PlaybackMode,
    /// Pause between starting playback and requesting fullscreen.
    pub fullscreen_delay: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mode: PlaybackMode::default(),
            fullscreen_delay: Duration::from_millis(100),
        }
    }
}

/// A teardown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopStep {
    StopEngine,
    ReleaseEngine,
    DestroyWindow,
}

impl fmt::Display for StopStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopStep::StopEngine => write!(f, "stop engine"),
            StopStep::ReleaseEngine => write!(f, "release engine"),
            StopStep::DestroyWindow => write!(f, "destroy window"),
        }
    }
}

#[derive(Debug)]
pub struct StopFailure {
    pub step: StopStep,
    pub error: Error,
}

/// Outcome of a teardown. Every step is attempted regardless of earlier
/// failures.
#[derive(Debug, Default)]
pub struct StopReport {
    pub failures: Vec<StopFailure>,
}

impl StopReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, step: StopStep, result: Result<()>) {
        if let Err(error) = result {
            self.failures.push(StopFailure { step, error });
        }
    }
}

pub struct PlaybackSession {
    assignment: Assignment,
    geometry: MonitorGeometry,
    playlist: ResolvedPlaylist,
    mode: PlaybackMode,
    fullscreen_delay: Duration,
    window: Option<Box<dyn Window>>,
    engine: Option<Box<dyn PlaybackEngine>>,
    state: SessionState,
}

impl PlaybackSession {
    /// Build a session ready to start.
    ///
    /// Fails with [`Error::EmptyPlaylist`] or [`Error::PlatformUnsupported`]
    /// before any window exists. Later failures release whatever was already
    /// allocated before returning.
    pub async fn construct(
        assignment: Assignment,
        geometry: MonitorGeometry,
        playlist: ResolvedPlaylist,
        platform: &Platform,
        options: &SessionOptions,
    ) -> Result<Self> {
        if playlist.is_empty() {
            return Err(Error::empty_playlist(assignment.source.clone()));
        }
        if !platform.engines.supports_embedding() {
            return Err(Error::PlatformUnsupported(
                "engine cannot render into an external window".to_string(),
            ));
        }

        let mode = assignment.effective_mode(options.mode);
        let mut window = platform.windows.create_window(&geometry).await?;

        let bound = platform.engines.bind(window.native_handle()).await;
        let mut engine = match bound {
            Ok(engine) => engine,
            Err(e) => {
                discard_window(window.as_mut()).await;
                return Err(e);
            }
        };

        if let Err(e) = engine.load(playlist.locations(), mode).await {
            if let Err(release) = engine.release().await {
                warn!("Failed to release engine after load failure: {}", release);
            }
            discard_window(window.as_mut()).await;
            return Err(e);
        }

        debug!(
            screen = assignment.screen,
            source = %assignment.source,
            "Session constructed at {} with {} location(s), mode {}",
            geometry,
            playlist.len(),
            mode
        );

        Ok(Self {
            assignment,
            geometry,
            playlist,
            mode,
            fullscreen_delay: options.fullscreen_delay,
            window: Some(window),
            engine: Some(engine),
            state: SessionState::Constructing,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn geometry(&self) -> MonitorGeometry {
        self.geometry
    }

    pub fn playlist(&self) -> &ResolvedPlaylist {
        &self.playlist
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// Begin playback, then request fullscreen after the configured delay.
    ///
    /// A fullscreen failure is logged and playback continues windowed.
    pub async fn start(&mut self) -> Result<()> {
        match self.state {
            SessionState::Playing => return Ok(()),
            SessionState::Stopped => {
                return Err(Error::PlaybackStart("session already stopped".to_string()))
            }
            SessionState::Constructing => {}
        }

        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| Error::PlaybackStart("no engine bound".to_string()))?;
        engine
            .play()
            .await
            .map_err(|e| Error::PlaybackStart(e.to_string()))?;

        self.state = SessionState::Playing;
        info!(
            screen = self.assignment.screen,
            source = %self.assignment.source,
            "Playing on {}",
            self.geometry
        );

        tokio::time::sleep(self.fullscreen_delay).await;

        if let Err(e) = engine.request_fullscreen().await {
            warn!(
                screen = self.assignment.screen,
                "Fullscreen request failed, continuing windowed: {}", e
            );
        }
        Ok(())
    }

    /// Tear the session down. Calling this on a stopped session does nothing.
    pub async fn stop(&mut self) -> StopReport {
        let mut report = StopReport::default();
        if self.state == SessionState::Stopped {
            return report;
        }
        self.state = SessionState::Stopped;

        if let Some(mut engine) = self.engine.take() {
            report.record(StopStep::StopEngine, engine.stop().await);
            report.record(StopStep::ReleaseEngine, engine.release().await);
        }
        if let Some(mut window) = self.window.take() {
            report.record(StopStep::DestroyWindow, window.destroy().await);
        }

        for failure in &report.failures {
            warn!(
                screen = self.assignment.screen,
                "Failed to {} during teardown: {}", failure.step, failure.error
            );
        }
        info!(screen = self.assignment.screen, "Session stopped");
        report
    }
}

async fn discard_window(window: &mut dyn Window) {
    if let Err(e) = window.destroy().await {
        warn!("Failed to destroy window after construction failure: {}", e);
    }
}
