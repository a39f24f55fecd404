//! mpv backend.
//!
//! Each window is an idle mpv process started borderless and on top at the
//! monitor's rectangle, with a JSON IPC socket as its native handle. Engines
//! bind by connecting to that socket. Escape inside any player window exits
//! that player with [`ESCAPE_EXIT_CODE`], which fires the global stop.

#[cfg(unix)]
mod ipc;

use super::{EngineFactory, NativeHandle, PlaybackEngine, Platform, Window, WindowSystem};
use crate::config::PlayerConfig;
use async_trait::async_trait;
use multiscreen_common::{Error, MonitorGeometry, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Exit status mpv reports when the user presses Escape.
pub const ESCAPE_EXIT_CODE: i32 = 4;

const INPUT_CONF: &str = "ESC quit 4\n";

const SOCKET_POLL_INTERVAL: Duration = Duration::from_millis(50);

struct Shared {
    binary: PathBuf,
    extra_args: Vec<String>,
    runtime_dir: TempDir,
    input_conf: PathBuf,
    ipc_timeout: Duration,
    startup_timeout: Duration,
    stop: CancellationToken,
    next_window: AtomicUsize,
}

/// Window system and engine factory backed by mpv processes.
#[derive(Clone)]
pub struct MpvBackend {
    shared: Arc<Shared>,
}

impl MpvBackend {
    /// Locate mpv and prepare the runtime directory for IPC sockets.
    ///
    /// `stop` is cancelled when the user presses Escape in a player window.
    pub fn new(config: &PlayerConfig, stop: CancellationToken) -> Result<Self> {
        let binary = match &config.mpv_path {
            Some(path) => path.clone(),
            None => which::which("mpv").map_err(|_| {
                Error::PlatformUnsupported("mpv not found in PATH; set player.mpv_path".into())
            })?,
        };

        let runtime_dir = tempfile::Builder::new().prefix("multiscreen-").tempdir()?;
        let input_conf = runtime_dir.path().join("input.conf");
        std::fs::write(&input_conf, INPUT_CONF)?;

        info!("Using mpv at {:?}", binary);
        Ok(Self {
            shared: Arc::new(Shared {
                binary,
                extra_args: config.extra_args.clone(),
                runtime_dir,
                input_conf,
                ipc_timeout: config.ipc_timeout(),
                startup_timeout: config.startup_timeout(),
                stop,
                next_window: AtomicUsize::new(0),
            }),
        })
    }

    /// Bundle this backend as both collaborators.
    pub fn platform(&self) -> Platform {
        Platform::new(Arc::new(self.clone()), Arc::new(self.clone()))
    }
}

/// Arguments for an idle, borderless, on-top mpv window covering `geometry`.
pub fn window_args(
    geometry: &MonitorGeometry,
    socket: &Path,
    input_conf: &Path,
    extra_args: &[String],
) -> Vec<String> {
    let mut args = vec![
        "--idle=yes".to_string(),
        "--force-window=yes".to_string(),
        "--no-border".to_string(),
        "--ontop".to_string(),
        "--no-terminal".to_string(),
        "--keep-open=no".to_string(),
        format!("--geometry={}", geometry),
        format!("--input-ipc-server={}", socket.display()),
        format!("--input-conf={}", input_conf.display()),
    ];
    args.extend(extra_args.iter().cloned());
    args
}

#[async_trait]
impl WindowSystem for MpvBackend {
    async fn create_window(&self, geometry: &MonitorGeometry) -> Result<Box<dyn Window>> {
        let shared = &self.shared;
        let n = shared.next_window.fetch_add(1, Ordering::SeqCst) + 1;
        let socket = shared.runtime_dir.path().join(format!("mpv-{}.sock", n));

        let mut child = Command::new(&shared.binary)
            .args(window_args(
                geometry,
                &socket,
                &shared.input_conf,
                &shared.extra_args,
            ))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::window(format!("failed to spawn mpv: {e}")))?;

        wait_for_socket(&mut child, &socket, shared.startup_timeout).await?;
        debug!("mpv window {} ready at {} ({:?})", n, geometry, socket);

        let (kill_tx, kill_rx) = oneshot::channel();
        let watcher = tokio::spawn(watch_player(
            child,
            kill_rx,
            *geometry,
            shared.stop.clone(),
        ));

        Ok(Box::new(MpvWindow {
            handle: NativeHandle::IpcSocket(socket),
            geometry: *geometry,
            kill: Some(kill_tx),
            watcher: Some(watcher),
            timeout: shared.ipc_timeout,
        }))
    }
}

#[async_trait]
impl EngineFactory for MpvBackend {
    fn supports_embedding(&self) -> bool {
        cfg!(unix)
    }

    async fn bind(&self, handle: &NativeHandle) -> Result<Box<dyn PlaybackEngine>> {
        match handle {
            #[cfg(unix)]
            NativeHandle::IpcSocket(socket) => {
                let engine = ipc::MpvEngine::connect(socket, self.shared.ipc_timeout).await?;
                Ok(Box::new(engine))
            }
            other => Err(Error::PlatformUnsupported(format!(
                "mpv cannot attach to {:?} on this platform",
                other
            ))),
        }
    }
}

/// Wait until the player has opened its window and IPC socket.
async fn wait_for_socket(child: &mut Child, socket: &Path, timeout: Duration) -> Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if socket.exists() {
            return Ok(());
        }
        if let Some(status) = child.try_wait()? {
            return Err(Error::window(format!(
                "mpv exited before opening its window: {status}"
            )));
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(Error::window(format!(
                "mpv did not open {:?} within {:?}",
                socket, timeout
            )));
        }
        tokio::time::sleep(SOCKET_POLL_INTERVAL).await;
    }
}

/// Own the player process until it exits or the window is destroyed.
async fn watch_player(
    mut child: Child,
    kill: oneshot::Receiver<()>,
    geometry: MonitorGeometry,
    stop: CancellationToken,
) {
    let exited = tokio::select! {
        status = child.wait() => Some(status),
        _ = kill => None,
    };

    match exited {
        None => {
            if let Err(e) = child.kill().await {
                warn!("Failed to kill mpv at {}: {}", geometry, e);
            }
        }
        Some(Ok(status)) if status.code() == Some(ESCAPE_EXIT_CODE) => {
            info!("Escape pressed on {}, stopping all sessions", geometry);
            stop.cancel();
        }
        Some(Ok(status)) => warn!("mpv at {} exited on its own: {}", geometry, status),
        Some(Err(e)) => warn!("Lost track of mpv at {}: {}", geometry, e),
    }
}

struct MpvWindow {
    handle: NativeHandle,
    geometry: MonitorGeometry,
    kill: Option<oneshot::Sender<()>>,
    watcher: Option<JoinHandle<()>>,
    timeout: Duration,
}

#[async_trait]
impl Window for MpvWindow {
    fn native_handle(&self) -> &NativeHandle {
        &self.handle
    }

    fn geometry(&self) -> MonitorGeometry {
        self.geometry
    }

    async fn destroy(&mut self) -> Result<()> {
        let Some(kill) = self.kill.take() else {
            return Ok(());
        };
        // The player may already be gone (Escape), in which case nobody listens
        let _ = kill.send(());

        if let Some(watcher) = self.watcher.take() {
            match tokio::time::timeout(self.timeout, watcher).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(Error::window(format!("player watcher failed: {e}"))),
                Err(_) => return Err(Error::window("timed out waiting for mpv to exit")),
            }
        }

        if let NativeHandle::IpcSocket(socket) = &self.handle {
            match std::fs::remove_file(socket) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(())
    }
}
