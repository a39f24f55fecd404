//! Session orchestrator.
//!
//! Runs a batch of assignments: validates screens, resolves and constructs
//! sessions one at a time, starts them concurrently, then waits for the
//! global stop trigger and tears every session down exactly once.

use crate::monitor::MonitorRegistry;
use crate::platform::Platform;
use crate::session::{PlaybackSession, SessionOptions};
use crate::source::SourceResolver;
use multiscreen_common::{Assignment, Error, MonitorGeometry, Result, SessionState};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::{Id, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Process exit codes.
pub mod exit_codes {
    /// Normal termination through the stop trigger.
    pub const SUCCESS: i32 = 0;
    /// Generic failure, including a run aborted on an invalid screen.
    pub const FAILURE: i32 = 1;
    /// Monitors could not be enumerated.
    pub const MONITOR_ENUMERATION: i32 = 2;
    /// No assignment reached `Playing`.
    pub const NOTHING_PLAYING: i32 = 3;
}

#[derive(Debug, Clone, Default)]
pub struct OrchestratorOptions {
    pub session: SessionOptions,
    /// Abort the run instead of skipping an assignment with a missing screen.
    pub abort_on_invalid_screen: bool,
    /// Stop as soon as every session has started instead of waiting for the
    /// stop trigger. Used by dry runs.
    pub stop_when_started: bool,
}

/// An assignment that was skipped, and why.
#[derive(Debug)]
pub struct AssignmentFailure {
    pub assignment: Assignment,
    pub error: Error,
}

impl fmt::Display for AssignmentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "screen {} ({}): {}",
            self.assignment.screen, self.assignment.source, self.error
        )
    }
}

/// Final state of one constructed session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub assignment: Assignment,
    pub geometry: MonitorGeometry,
    pub state: SessionState,
}

#[derive(Debug)]
pub struct RunReport {
    /// Sessions that reached `Playing`.
    pub started: usize,
    pub sessions: Vec<SessionSummary>,
    pub failures: Vec<AssignmentFailure>,
    /// Teardown steps that failed across all sessions.
    pub teardown_failures: usize,
    pub exit_code: i32,
}

impl RunReport {
    fn aborted(failures: Vec<AssignmentFailure>) -> Self {
        Self {
            started: 0,
            sessions: Vec::new(),
            failures,
            teardown_failures: 0,
            exit_code: exit_codes::FAILURE,
        }
    }
}

type SharedSession = Arc<Mutex<PlaybackSession>>;

/// Skipped assignments keyed by input position, so the report lists them in
/// assignment order whichever phase rejected them.
#[derive(Default)]
struct Failures(Vec<(usize, AssignmentFailure)>);

impl Failures {
    fn skip(&mut self, position: usize, assignment: Assignment, error: Error) {
        warn!(
            screen = assignment.screen,
            source = %assignment.source,
            "Skipping assignment: {}", error
        );
        self.0.push((position, AssignmentFailure { assignment, error }));
    }

    fn into_ordered(mut self) -> Vec<AssignmentFailure> {
        self.0.sort_by_key(|(position, _)| *position);
        self.0.into_iter().map(|(_, failure)| failure).collect()
    }
}

/// Constructed sessions with the input position of their assignment.
#[derive(Default)]
struct Built {
    sessions: Vec<SharedSession>,
    positions: Vec<usize>,
}

/// Bookkeeping shared by the start and teardown phases.
#[derive(Default)]
struct Progress {
    failures: Failures,
    playing: usize,
    teardown_failures: usize,
}

pub struct Orchestrator {
    registry: MonitorRegistry,
    platform: Platform,
    resolver: SourceResolver,
    options: OrchestratorOptions,
}

impl Orchestrator {
    pub fn new(registry: MonitorRegistry, platform: Platform, options: OrchestratorOptions) -> Self {
        Self {
            registry,
            platform,
            resolver: SourceResolver::new(),
            options,
        }
    }

    pub fn registry(&self) -> &MonitorRegistry {
        &self.registry
    }

    /// Run `assignments` until `stop` fires, or until no session is left
    /// playing.
    pub async fn run(&self, assignments: &[Assignment], stop: CancellationToken) -> RunReport {
        let mut progress = Progress::default();

        let planned = match self.plan(assignments, &mut progress.failures) {
            Ok(planned) => planned,
            Err(()) => return RunReport::aborted(progress.failures.into_ordered()),
        };

        let mut built = Built::default();
        for (position, assignment, geometry) in planned {
            if stop.is_cancelled() {
                break;
            }
            match self.build(&assignment, geometry).await {
                Ok(session) => {
                    built.sessions.push(Arc::new(Mutex::new(session)));
                    built.positions.push(position);
                }
                Err(e) => progress.failures.skip(position, assignment, e),
            }
        }

        if stop.is_cancelled() {
            info!("Stop requested during construction; nothing will be started");
            return finish(&built, progress, exit_codes::SUCCESS).await;
        }
        if built.sessions.is_empty() {
            error!("No assignment could be constructed");
            return finish(&built, progress, exit_codes::NOTHING_PLAYING).await;
        }

        info!("Starting {} session(s)", built.sessions.len());
        let mut starts = JoinSet::new();
        let mut tasks: HashMap<Id, usize> = HashMap::new();
        for (slot, session) in built.sessions.iter().enumerate() {
            let session = session.clone();
            let handle = starts.spawn(async move {
                let mut session = session.lock_owned().await;
                session.start().await
            });
            tasks.insert(handle.id(), slot);
        }

        let mut exit_code = exit_codes::SUCCESS;
        loop {
            tokio::select! {
                biased;

                _ = stop.cancelled() => {
                    info!("Stop trigger fired");
                    break;
                }
                joined = starts.join_next_with_id(), if !starts.is_empty() => {
                    if let Some(joined) = joined {
                        on_started(joined, &tasks, &built, &mut progress).await;
                    }
                    if starts.is_empty() && progress.playing == 0 {
                        error!("No session reached playback");
                        exit_code = exit_codes::NOTHING_PLAYING;
                        break;
                    }
                    if starts.is_empty() && self.options.stop_when_started {
                        info!("{} session(s) started; stopping", progress.playing);
                        break;
                    }
                    if starts.is_empty() {
                        info!("{} session(s) playing; waiting for stop", progress.playing);
                    }
                }
            }
        }

        starts.abort_all();
        while let Some(joined) = starts.join_next_with_id().await {
            on_started(joined, &tasks, &built, &mut progress).await;
        }

        finish(&built, progress, exit_code).await
    }

    /// Validate every assignment's screen before any window is created.
    ///
    /// The first assignment naming a screen keeps it. Returns `Err` when an
    /// invalid screen aborts the run.
    fn plan(
        &self,
        assignments: &[Assignment],
        failures: &mut Failures,
    ) -> std::result::Result<Vec<(usize, Assignment, MonitorGeometry)>, ()> {
        let mut holders: HashMap<u32, &str> = HashMap::new();
        let mut planned = Vec::with_capacity(assignments.len());

        for (position, assignment) in assignments.iter().enumerate() {
            let geometry = match self.registry.geometry_for(assignment.screen) {
                Ok(geometry) => geometry,
                Err(e) if self.options.abort_on_invalid_screen => {
                    error!(
                        screen = assignment.screen,
                        source = %assignment.source,
                        "Aborting run: {}", e
                    );
                    failures.0.push((
                        position,
                        AssignmentFailure {
                            assignment: assignment.clone(),
                            error: e,
                        },
                    ));
                    return Err(());
                }
                Err(e) => {
                    failures.skip(position, assignment.clone(), e);
                    continue;
                }
            };

            if let Some(holder) = holders.get(&assignment.screen) {
                let e = Error::ScreenAlreadyAssigned {
                    screen: assignment.screen,
                    holder: holder.to_string(),
                };
                failures.skip(position, assignment.clone(), e);
                continue;
            }
            holders.insert(assignment.screen, &assignment.source);
            planned.push((position, assignment.clone(), geometry));
        }

        Ok(planned)
    }

    async fn build(
        &self,
        assignment: &Assignment,
        geometry: MonitorGeometry,
    ) -> Result<PlaybackSession> {
        let playlist = self.resolver.resolve(&assignment.source)?;
        PlaybackSession::construct(
            assignment.clone(),
            geometry,
            playlist,
            &self.platform,
            &self.options.session,
        )
        .await
    }
}

/// Record the outcome of one start task. A session that failed to start,
/// including by panicking, is stopped and its assignment reported.
async fn on_started(
    joined: std::result::Result<(Id, Result<()>), JoinError>,
    tasks: &HashMap<Id, usize>,
    built: &Built,
    progress: &mut Progress,
) {
    let (id, error) = match joined {
        Ok((_, Ok(()))) => {
            progress.playing += 1;
            return;
        }
        Ok((id, Err(e))) => (id, e),
        Err(e) if e.is_cancelled() => return,
        Err(e) => (e.id(), Error::PlaybackStart(format!("start task failed: {e}"))),
    };

    let Some(&slot) = tasks.get(&id) else {
        warn!("Start task {} finished for an unknown session: {}", id, error);
        return;
    };

    let mut session = built.sessions[slot].lock().await;
    let assignment = session.assignment().clone();
    let report = session.stop().await;
    progress.teardown_failures += report.failures.len();
    progress
        .failures
        .skip(built.positions[slot], assignment, error);
}

/// Stop every session once and assemble the report.
async fn finish(built: &Built, mut progress: Progress, exit_code: i32) -> RunReport {
    let mut summaries = Vec::with_capacity(built.sessions.len());
    let mut started = 0;

    for session in &built.sessions {
        let mut session = session.lock().await;
        if session.state() == SessionState::Playing {
            started += 1;
        }
        let report = session.stop().await;
        progress.teardown_failures += report.failures.len();
        summaries.push(SessionSummary {
            assignment: session.assignment().clone(),
            geometry: session.geometry(),
            state: session.state(),
        });
    }

    if !summaries.is_empty() {
        info!("Stopped {} session(s)", summaries.len());
    }
    RunReport {
        started,
        sessions: summaries,
        failures: progress.failures.into_ordered(),
        teardown_failures: progress.teardown_failures,
        exit_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::dry_run::{DryRunBackend, DryRunEvent};
    use crate::platform::{EngineFactory, NativeHandle, PlaybackEngine, Window, WindowSystem};
    use async_trait::async_trait;
    use multiscreen_common::PlaybackMode;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn registry() -> MonitorRegistry {
        MonitorRegistry::from_geometries(vec![
            MonitorGeometry::new(0, 0, 1920, 1080),
            MonitorGeometry::new(1920, 0, 1920, 1080),
        ])
        .unwrap()
    }

    /// Fires the stop trigger from inside window creation.
    struct StoppingWindows {
        inner: DryRunBackend,
        stop: CancellationToken,
    }

    #[async_trait]
    impl WindowSystem for StoppingWindows {
        async fn create_window(&self, geometry: &MonitorGeometry) -> Result<Box<dyn Window>> {
            self.stop.cancel();
            self.inner.create_window(geometry).await
        }
    }

    /// Binds engines that panic when asked to play.
    struct PanickingEngines {
        inner: DryRunBackend,
    }

    struct PanickingEngine(Box<dyn PlaybackEngine>);

    #[async_trait]
    impl EngineFactory for PanickingEngines {
        fn supports_embedding(&self) -> bool {
            true
        }

        async fn bind(&self, handle: &NativeHandle) -> Result<Box<dyn PlaybackEngine>> {
            let engine = self.inner.bind(handle).await?;
            Ok(Box::new(PanickingEngine(engine)))
        }
    }

    #[async_trait]
    impl PlaybackEngine for PanickingEngine {
        async fn load(&mut self, locations: &[String], mode: PlaybackMode) -> Result<()> {
            self.0.load(locations, mode).await
        }

        async fn play(&mut self) -> Result<()> {
            panic!("engine crashed");
        }

        async fn request_fullscreen(&mut self) -> Result<()> {
            self.0.request_fullscreen().await
        }

        async fn stop(&mut self) -> Result<()> {
            self.0.stop().await
        }

        async fn release(&mut self) -> Result<()> {
            self.0.release().await
        }
    }

    fn video(dir: &tempfile::TempDir, name: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, b"").unwrap();
        path.to_str().unwrap().to_string()
    }

    fn options() -> OrchestratorOptions {
        OrchestratorOptions {
            session: SessionOptions {
                fullscreen_delay: Duration::ZERO,
                ..SessionOptions::default()
            },
            abort_on_invalid_screen: false,
            stop_when_started: false,
        }
    }

    #[tokio::test]
    async fn test_duplicate_screen_first_wins() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.mp4");
        let b = dir.path().join("b.mp4");
        fs::write(&a, b"").unwrap();
        fs::write(&b, b"").unwrap();

        let backend = DryRunBackend::new();
        let orchestrator = Orchestrator::new(registry(), backend.platform(), options());
        let assignments = vec![
            Assignment::new(a.to_str().unwrap(), 1),
            Assignment::new(b.to_str().unwrap(), 1),
        ];

        let stop = CancellationToken::new();
        stop.cancel();
        let report = orchestrator.run(&assignments, stop).await;

        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0].error,
            Error::ScreenAlreadyAssigned { screen: 1, .. }
        ));
        assert_eq!(report.failures[0].assignment.source, b.to_str().unwrap());
    }

    #[tokio::test]
    async fn test_out_of_range_screen_aborts_when_configured() {
        let backend = DryRunBackend::new();
        let orchestrator = Orchestrator::new(
            registry(),
            backend.platform(),
            OrchestratorOptions {
                abort_on_invalid_screen: true,
                ..options()
            },
        );

        let report = orchestrator
            .run(
                &[
                    Assignment::new("/videos/a.mp4", 1),
                    Assignment::new("/videos/b.mp4", 5),
                ],
                CancellationToken::new(),
            )
            .await;

        assert_eq!(report.exit_code, exit_codes::FAILURE);
        assert!(report.sessions.is_empty());
        assert!(backend.events().is_empty());
    }

    #[tokio::test]
    async fn test_nothing_constructed_exits_with_distinct_code() {
        let backend = DryRunBackend::new();
        let orchestrator = Orchestrator::new(registry(), backend.platform(), options());

        let report = orchestrator
            .run(
                &[
                    Assignment::new("/definitely/missing.mp4", 1),
                    Assignment::new("/videos/b.mp4", 9),
                ],
                CancellationToken::new(),
            )
            .await;

        assert_eq!(report.exit_code, exit_codes::NOTHING_PLAYING);
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(report.failures[0].error, Error::NotFound { .. }));
        assert!(matches!(
            report.failures[1].error,
            Error::ScreenOutOfRange { screen: 9, count: 2 }
        ));
    }

    #[tokio::test]
    async fn test_all_starts_failing_tears_down() {
        let dir = tempdir().unwrap();
        let video = dir.path().join("a.mp4");
        fs::write(&video, b"").unwrap();

        let backend = DryRunBackend::new().failing_play_on(MonitorGeometry::new(0, 0, 1920, 1080));
        let orchestrator = Orchestrator::new(registry(), backend.platform(), options());

        let report = orchestrator
            .run(
                &[Assignment::new(video.to_str().unwrap(), 1)],
                CancellationToken::new(),
            )
            .await;

        assert_eq!(report.exit_code, exit_codes::NOTHING_PLAYING);
        assert_eq!(report.started, 0);
        assert!(matches!(report.failures[0].error, Error::PlaybackStart(_)));
        assert_eq!(report.sessions[0].state, SessionState::Stopped);
        assert_eq!(backend.live_windows(), 0);
        assert_eq!(backend.live_engines(), 0);
    }

    #[tokio::test]
    async fn test_stop_when_started_ends_run() {
        let dir = tempdir().unwrap();
        let video = dir.path().join("a.mp4");
        fs::write(&video, b"").unwrap();

        let backend = DryRunBackend::new();
        let orchestrator = Orchestrator::new(
            registry(),
            backend.platform(),
            OrchestratorOptions {
                stop_when_started: true,
                ..options()
            },
        );

        let report = orchestrator
            .run(
                &[Assignment::new(video.to_str().unwrap(), 2)],
                CancellationToken::new(),
            )
            .await;

        assert_eq!(report.exit_code, exit_codes::SUCCESS);
        assert_eq!(report.started, 1);
        assert_eq!(report.sessions[0].geometry, MonitorGeometry::new(1920, 0, 1920, 1080));
        assert_eq!(backend.live_windows(), 0);
    }

    #[tokio::test]
    async fn test_failures_reported_in_assignment_order() {
        let dir = tempdir().unwrap();
        let a = video(&dir, "a.mp4");
        let backend = DryRunBackend::new();
        let orchestrator = Orchestrator::new(
            registry(),
            backend.platform(),
            OrchestratorOptions {
                stop_when_started: true,
                ..options()
            },
        );

        let report = orchestrator
            .run(
                &[
                    Assignment::new("/definitely/missing.mp4", 1),
                    Assignment::new(&a, 7),
                    Assignment::new(&a, 2),
                    Assignment::new(&a, 2),
                ],
                CancellationToken::new(),
            )
            .await;

        assert_eq!(report.started, 1);
        let screens: Vec<u32> = report.failures.iter().map(|f| f.assignment.screen).collect();
        assert_eq!(screens, vec![1, 7, 2]);
    }

    #[tokio::test]
    async fn test_stop_during_construction_starts_nothing() {
        let dir = tempdir().unwrap();
        let a = video(&dir, "a.mp4");
        let b = video(&dir, "b.mp4");

        let backend = DryRunBackend::new();
        let stop = CancellationToken::new();
        let windows = StoppingWindows {
            inner: backend.clone(),
            stop: stop.clone(),
        };
        let platform = Platform::new(Arc::new(windows), Arc::new(backend.clone()));
        let orchestrator = Orchestrator::new(registry(), platform, options());

        let report = orchestrator
            .run(&[Assignment::new(&a, 1), Assignment::new(&b, 2)], stop)
            .await;

        assert_eq!(report.exit_code, exit_codes::SUCCESS);
        assert_eq!(report.started, 0);
        assert_eq!(report.sessions.len(), 1);
        assert_eq!(report.sessions[0].state, SessionState::Stopped);
        assert_eq!(backend.count(|e| matches!(e, DryRunEvent::Played { .. })), 0);
        assert_eq!(backend.live_windows(), 0);
        assert_eq!(backend.live_engines(), 0);
    }

    #[tokio::test]
    async fn test_panicking_start_is_reported_and_torn_down() {
        let dir = tempdir().unwrap();
        let a = video(&dir, "a.mp4");

        let backend = DryRunBackend::new();
        let engines = PanickingEngines {
            inner: backend.clone(),
        };
        let platform = Platform::new(Arc::new(backend.clone()), Arc::new(engines));
        let orchestrator = Orchestrator::new(registry(), platform, options());

        let report = orchestrator
            .run(&[Assignment::new(&a, 2)], CancellationToken::new())
            .await;

        assert_eq!(report.exit_code, exit_codes::NOTHING_PLAYING);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].assignment.screen, 2);
        assert!(matches!(report.failures[0].error, Error::PlaybackStart(_)));
        assert_eq!(report.sessions[0].state, SessionState::Stopped);
        assert_eq!(backend.live_windows(), 0);
        assert_eq!(backend.live_engines(), 0);
    }

    #[tokio::test]
    async fn test_teardown_failure_after_failed_start_is_counted() {
        let dir = tempdir().unwrap();
        let a = video(&dir, "a.mp4");

        let backend = DryRunBackend::new()
            .failing_play_on(MonitorGeometry::new(0, 0, 1920, 1080))
            .failing_engine_stop();
        let orchestrator = Orchestrator::new(registry(), backend.platform(), options());

        let report = orchestrator
            .run(&[Assignment::new(&a, 1)], CancellationToken::new())
            .await;

        assert_eq!(report.exit_code, exit_codes::NOTHING_PLAYING);
        assert!(matches!(report.failures[0].error, Error::PlaybackStart(_)));
        assert_eq!(report.teardown_failures, 1);
        assert_eq!(backend.live_windows(), 0);
    }
}
