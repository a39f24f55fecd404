//! Orchestrator integration tests against the recording backend.

use multiscreen::monitor::{MonitorRegistry, StaticMonitors};
use multiscreen::orchestrator::{exit_codes, Orchestrator, OrchestratorOptions};
use multiscreen::platform::dry_run::{DryRunBackend, DryRunEvent};
use multiscreen::session::SessionOptions;
use multiscreen_common::{Assignment, Error, MonitorGeometry, PlaybackMode, SessionState};
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

const LEFT: MonitorGeometry = MonitorGeometry {
    x: 0,
    y: 0,
    width: 1920,
    height: 1080,
};
const RIGHT: MonitorGeometry = MonitorGeometry {
    x: 1920,
    y: 0,
    width: 1920,
    height: 1080,
};

fn two_monitors() -> MonitorRegistry {
    MonitorRegistry::enumerate(&StaticMonitors::new(vec![LEFT, RIGHT])).unwrap()
}

fn options(mode: PlaybackMode) -> OrchestratorOptions {
    OrchestratorOptions {
        session: SessionOptions {
            mode,
            fullscreen_delay: Duration::from_millis(10),
        },
        ..OrchestratorOptions::default()
    }
}

/// Wait until `backend` has recorded `count` play calls.
async fn wait_for_plays(backend: &DryRunBackend, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while backend.count(|e| matches!(e, DryRunEvent::Played { .. })) < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("sessions did not start in time");
}

#[tokio::test]
async fn test_missing_source_is_skipped_and_run_continues() {
    let dir = tempdir().unwrap();
    let video = dir.path().join("intro.mp4");
    fs::write(&video, b"").unwrap();
    let missing = dir.path().join("missing.mp4");

    let backend = DryRunBackend::new();
    let orchestrator = Arc::new(Orchestrator::new(
        two_monitors(),
        backend.platform(),
        options(PlaybackMode::Loop),
    ));
    let assignments = vec![
        Assignment::new(video.to_str().unwrap(), 1),
        Assignment::new(missing.to_str().unwrap(), 2),
    ];

    let stop = CancellationToken::new();
    let run = tokio::spawn({
        let orchestrator = orchestrator.clone();
        let stop = stop.clone();
        async move { orchestrator.run(&assignments, stop).await }
    });

    wait_for_plays(&backend, 1).await;
    assert!(!run.is_finished());
    assert_eq!(backend.live_windows(), 1);

    stop.cancel();
    let report = run.await.unwrap();

    assert_eq!(report.exit_code, exit_codes::SUCCESS);
    assert_eq!(report.started, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].error, Error::NotFound { .. }));
    assert_eq!(report.failures[0].assignment.screen, 2);

    assert_eq!(report.sessions.len(), 1);
    assert_eq!(report.sessions[0].geometry, LEFT);
    assert_eq!(report.sessions[0].state, SessionState::Stopped);

    assert_eq!(backend.live_windows(), 0);
    assert_eq!(backend.live_engines(), 0);
    assert_eq!(
        backend.count(|e| matches!(e, DryRunEvent::WindowDestroyed { .. })),
        1
    );
}

#[tokio::test]
async fn test_every_session_starts_and_stops_once() {
    let dir = tempdir().unwrap();
    let wall = dir.path().join("wall");
    fs::create_dir(&wall).unwrap();
    fs::write(wall.join("b.mp4"), b"").unwrap();
    fs::write(wall.join("a.mkv"), b"").unwrap();
    let playlist = dir.path().join("lobby.m3u");
    fs::write(&playlist, "# lobby loop\nintro.mp4\n\nhttps://cdn.example.com/live.m3u8\n").unwrap();

    let backend = DryRunBackend::new();
    let orchestrator = Arc::new(Orchestrator::new(
        two_monitors(),
        backend.platform(),
        options(PlaybackMode::Loop),
    ));
    let assignments = vec![
        Assignment::new(playlist.to_str().unwrap(), 1),
        Assignment::new(wall.to_str().unwrap(), 2).with_mode(PlaybackMode::Shuffle),
    ];

    let stop = CancellationToken::new();
    let run = tokio::spawn({
        let orchestrator = orchestrator.clone();
        let stop = stop.clone();
        async move { orchestrator.run(&assignments, stop).await }
    });

    wait_for_plays(&backend, 2).await;
    stop.cancel();
    let report = run.await.unwrap();

    assert_eq!(report.exit_code, exit_codes::SUCCESS);
    assert_eq!(report.started, 2);
    assert!(report.failures.is_empty());
    assert!(report
        .sessions
        .iter()
        .all(|s| s.state == SessionState::Stopped));

    let loaded: Vec<(Vec<String>, PlaybackMode)> = backend
        .events()
        .into_iter()
        .filter_map(|e| match e {
            DryRunEvent::Loaded {
                locations, mode, ..
            } => Some((locations, mode)),
            _ => None,
        })
        .collect();
    assert_eq!(loaded.len(), 2);
    assert_eq!(
        loaded[0].0,
        vec![
            dir.path().join("intro.mp4").to_string_lossy().into_owned(),
            "https://cdn.example.com/live.m3u8".to_string(),
        ]
    );
    assert_eq!(loaded[0].1, PlaybackMode::Loop);
    assert_eq!(
        loaded[1].0,
        vec![
            wall.join("a.mkv").to_string_lossy().into_owned(),
            wall.join("b.mp4").to_string_lossy().into_owned(),
        ]
    );
    assert_eq!(loaded[1].1, PlaybackMode::Shuffle);

    let teardown_steps: [fn(&DryRunEvent) -> bool; 3] = [
        |e| matches!(e, DryRunEvent::EngineStopped { .. }),
        |e| matches!(e, DryRunEvent::EngineReleased { .. }),
        |e| matches!(e, DryRunEvent::WindowDestroyed { .. }),
    ];
    for step in teardown_steps {
        assert_eq!(backend.count(step), 2);
    }
}

#[tokio::test]
async fn test_window_failure_skips_only_that_screen() {
    let dir = tempdir().unwrap();
    let video = dir.path().join("intro.mp4");
    fs::write(&video, b"").unwrap();

    let backend = DryRunBackend::new().failing_window_on(RIGHT);
    let orchestrator = Orchestrator::new(
        two_monitors(),
        backend.platform(),
        OrchestratorOptions {
            stop_when_started: true,
            ..options(PlaybackMode::Default)
        },
    );

    let report = orchestrator
        .run(
            &[
                Assignment::new(video.to_str().unwrap(), 1),
                Assignment::new(video.to_str().unwrap(), 2),
            ],
            CancellationToken::new(),
        )
        .await;

    assert_eq!(report.exit_code, exit_codes::SUCCESS);
    assert_eq!(report.started, 1);
    assert!(matches!(report.failures[0].error, Error::Window(_)));
    assert_eq!(backend.live_windows(), 0);
}

#[tokio::test]
async fn test_empty_playlist_reported_without_orphan_window() {
    let dir = tempdir().unwrap();
    let playlist = dir.path().join("empty.m3u");
    fs::write(&playlist, "#EXTM3U\n# nothing here\n").unwrap();

    let backend = DryRunBackend::new();
    let orchestrator = Orchestrator::new(
        two_monitors(),
        backend.platform(),
        options(PlaybackMode::Default),
    );

    let report = orchestrator
        .run(
            &[Assignment::new(playlist.to_str().unwrap(), 1)],
            CancellationToken::new(),
        )
        .await;

    assert_eq!(report.exit_code, exit_codes::NOTHING_PLAYING);
    assert!(matches!(report.failures[0].error, Error::EmptyPlaylist { .. }));
    assert!(backend.events().is_empty());
}

#[tokio::test]
async fn test_malformed_playlist_is_parse_failure() {
    let dir = tempdir().unwrap();
    let playlist = dir.path().join("broken.xspf");
    fs::write(&playlist, "<playlist><trackList><track>").unwrap();

    let backend = DryRunBackend::new();
    let orchestrator = Orchestrator::new(
        two_monitors(),
        backend.platform(),
        options(PlaybackMode::Default),
    );

    let report = orchestrator
        .run(
            &[Assignment::new(playlist.to_str().unwrap(), 1)],
            CancellationToken::new(),
        )
        .await;

    assert_eq!(report.exit_code, exit_codes::NOTHING_PLAYING);
    assert!(matches!(report.failures[0].error, Error::ParseFailure { .. }));
}

#[tokio::test]
async fn test_fullscreen_delays_overlap_across_sessions() {
    let dir = tempdir().unwrap();
    let mut assignments = Vec::new();
    for (screen, name) in [(1, "a.mp4"), (2, "b.mp4"), (3, "c.mp4")] {
        let video = dir.path().join(name);
        fs::write(&video, b"").unwrap();
        assignments.push(Assignment::new(video.to_str().unwrap(), screen));
    }

    let third = MonitorGeometry::new(3840, 0, 1920, 1080);
    let registry =
        MonitorRegistry::enumerate(&StaticMonitors::new(vec![LEFT, RIGHT, third])).unwrap();
    let backend = DryRunBackend::new();
    let orchestrator = Orchestrator::new(
        registry,
        backend.platform(),
        OrchestratorOptions {
            session: SessionOptions {
                mode: PlaybackMode::Loop,
                fullscreen_delay: Duration::from_millis(300),
            },
            stop_when_started: true,
            ..OrchestratorOptions::default()
        },
    );

    let started_at = Instant::now();
    let report = orchestrator.run(&assignments, CancellationToken::new()).await;
    let elapsed = started_at.elapsed();

    assert_eq!(report.exit_code, exit_codes::SUCCESS);
    assert_eq!(report.started, 3);
    assert_eq!(
        backend.count(|e| matches!(e, DryRunEvent::Fullscreen { .. })),
        3
    );
    // Three sequential delays would take at least 900ms
    assert!(elapsed < Duration::from_millis(700), "run took {elapsed:?}");
}
