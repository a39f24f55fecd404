//! Backend that records window and engine calls instead of performing them.
//!
//! Used by `play --dry-run` and by tests. Faults can be injected per monitor
//! to exercise partial-failure paths.

use super::{EngineFactory, NativeHandle, PlaybackEngine, Platform, Window, WindowSystem};
use async_trait::async_trait;
use multiscreen_common::{Error, MonitorGeometry, PlaybackMode, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DryRunEvent {
    WindowCreated { window: u64, geometry: MonitorGeometry },
    EngineBound { window: u64 },
    Loaded { window: u64, locations: Vec<String>, mode: PlaybackMode },
    Played { window: u64 },
    Fullscreen { window: u64 },
    EngineStopped { window: u64 },
    EngineReleased { window: u64 },
    WindowDestroyed { window: u64 },
}

#[derive(Debug, Default)]
struct Faults {
    no_embedding: bool,
    window_on: HashSet<MonitorGeometry>,
    load_on: HashSet<MonitorGeometry>,
    play_on: HashSet<MonitorGeometry>,
    fullscreen: bool,
    engine_stop: bool,
}

#[derive(Default)]
struct Inner {
    events: Mutex<Vec<DryRunEvent>>,
    next_window: AtomicU64,
    geometries: Mutex<HashMap<u64, MonitorGeometry>>,
    live_windows: Mutex<HashSet<u64>>,
    live_engines: Mutex<HashSet<u64>>,
    faults: Mutex<Faults>,
}

impl Inner {
    fn record(&self, event: DryRunEvent) {
        tracing::info!("[DRY RUN] {:?}", event);
        self.events.lock().push(event);
    }

    fn geometry_of(&self, window: u64) -> Option<MonitorGeometry> {
        self.geometries.lock().get(&window).copied()
    }
}

/// Recording window system and engine factory.
#[derive(Clone, Default)]
pub struct DryRunBackend {
    inner: Arc<Inner>,
}

impl DryRunBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report that embedded rendering is unavailable.
    pub fn without_embedding(self) -> Self {
        self.inner.faults.lock().no_embedding = true;
        self
    }

    /// Fail window creation on `geometry`.
    pub fn failing_window_on(self, geometry: MonitorGeometry) -> Self {
        self.inner.faults.lock().window_on.insert(geometry);
        self
    }

    /// Fail loading the playlist on `geometry`.
    pub fn failing_load_on(self, geometry: MonitorGeometry) -> Self {
        self.inner.faults.lock().load_on.insert(geometry);
        self
    }

    /// Fail `play` on `geometry`.
    pub fn failing_play_on(self, geometry: MonitorGeometry) -> Self {
        self.inner.faults.lock().play_on.insert(geometry);
        self
    }

    /// Fail every fullscreen request.
    pub fn failing_fullscreen(self) -> Self {
        self.inner.faults.lock().fullscreen = true;
        self
    }

    /// Fail every engine `stop`.
    pub fn failing_engine_stop(self) -> Self {
        self.inner.faults.lock().engine_stop = true;
        self
    }

    /// Bundle this backend as both collaborators.
    pub fn platform(&self) -> Platform {
        Platform::new(Arc::new(self.clone()), Arc::new(self.clone()))
    }

    pub fn events(&self) -> Vec<DryRunEvent> {
        self.inner.events.lock().clone()
    }

    /// Windows created and not yet destroyed.
    pub fn live_windows(&self) -> usize {
        self.inner.live_windows.lock().len()
    }

    /// Engines bound and not yet released.
    pub fn live_engines(&self) -> usize {
        self.inner.live_engines.lock().len()
    }

    /// Number of recorded events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&DryRunEvent) -> bool) -> usize {
        self.inner.events.lock().iter().filter(|e| predicate(e)).count()
    }
}

#[async_trait]
impl WindowSystem for DryRunBackend {
    async fn create_window(&self, geometry: &MonitorGeometry) -> Result<Box<dyn Window>> {
        if self.inner.faults.lock().window_on.contains(geometry) {
            return Err(Error::window(format!("injected failure creating window at {geometry}")));
        }

        let id = self.inner.next_window.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.geometries.lock().insert(id, *geometry);
        self.inner.live_windows.lock().insert(id);
        self.inner.record(DryRunEvent::WindowCreated {
            window: id,
            geometry: *geometry,
        });

        Ok(Box::new(DryRunWindow {
            inner: self.inner.clone(),
            id,
            handle: NativeHandle::Window(id),
            geometry: *geometry,
            destroyed: false,
        }))
    }
}

#[async_trait]
impl EngineFactory for DryRunBackend {
    fn supports_embedding(&self) -> bool {
        !self.inner.faults.lock().no_embedding
    }

    async fn bind(&self, handle: &NativeHandle) -> Result<Box<dyn PlaybackEngine>> {
        let window = match handle {
            NativeHandle::Window(id) if self.inner.live_windows.lock().contains(id) => *id,
            other => return Err(Error::engine(format!("no live window for handle {:?}", other))),
        };

        self.inner.live_engines.lock().insert(window);
        self.inner.record(DryRunEvent::EngineBound { window });
        Ok(Box::new(DryRunEngine {
            inner: self.inner.clone(),
            window,
            released: false,
        }))
    }
}

struct DryRunWindow {
    inner: Arc<Inner>,
    id: u64,
    handle: NativeHandle,
    geometry: MonitorGeometry,
    destroyed: bool,
}

#[async_trait]
impl Window for DryRunWindow {
    fn native_handle(&self) -> &NativeHandle {
        &self.handle
    }

    fn geometry(&self) -> MonitorGeometry {
        self.geometry
    }

    async fn destroy(&mut self) -> Result<()> {
        if self.destroyed {
            return Err(Error::window(format!("window {} already destroyed", self.id)));
        }
        self.destroyed = true;
        self.inner.live_windows.lock().remove(&self.id);
        self.inner.record(DryRunEvent::WindowDestroyed { window: self.id });
        Ok(())
    }
}

struct DryRunEngine {
    inner: Arc<Inner>,
    window: u64,
    released: bool,
}

impl DryRunEngine {
    fn ensure_live(&self) -> Result<()> {
        if self.released {
            return Err(Error::engine("engine already released"));
        }
        Ok(())
    }

    fn faulted(&self, pick: impl Fn(&Faults, MonitorGeometry) -> bool) -> bool {
        match self.inner.geometry_of(self.window) {
            Some(geometry) => pick(&self.inner.faults.lock(), geometry),
            None => false,
        }
    }
}

#[async_trait]
impl PlaybackEngine for DryRunEngine {
    async fn load(&mut self, locations: &[String], mode: PlaybackMode) -> Result<()> {
        self.ensure_live()?;
        if self.faulted(|f, g| f.load_on.contains(&g)) {
            return Err(Error::engine("injected load failure"));
        }
        self.inner.record(DryRunEvent::Loaded {
            window: self.window,
            locations: locations.to_vec(),
            mode,
        });
        Ok(())
    }

    async fn play(&mut self) -> Result<()> {
        self.ensure_live()?;
        if self.faulted(|f, g| f.play_on.contains(&g)) {
            return Err(Error::engine("injected play failure"));
        }
        self.inner.record(DryRunEvent::Played { window: self.window });
        Ok(())
    }

    async fn request_fullscreen(&mut self) -> Result<()> {
        self.ensure_live()?;
        if self.inner.faults.lock().fullscreen {
            return Err(Error::engine("injected fullscreen failure"));
        }
        self.inner.record(DryRunEvent::Fullscreen { window: self.window });
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.ensure_live()?;
        if self.inner.faults.lock().engine_stop {
            return Err(Error::engine("injected stop failure"));
        }
        self.inner.record(DryRunEvent::EngineStopped { window: self.window });
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.released = true;
        self.inner.live_engines.lock().remove(&self.window);
        self.inner.record(DryRunEvent::EngineReleased { window: self.window });
        Ok(())
    }
}
