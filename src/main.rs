mod cli;

use multiscreen::{
    config::{self, Config},
    monitor::{MonitorProvider, MonitorRegistry, StaticMonitors, XrandrMonitors},
    orchestrator::{exit_codes, Orchestrator, OrchestratorOptions},
    platform::{dry_run::DryRunBackend, mpv::MpvBackend},
    session::SessionOptions,
    source::SourceResolver,
};
use multiscreen_common::{Assignment, PlaybackMode};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::process::ExitCode;
use tokio::signal;
use tokio_util::sync::CancellationToken;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "multiscreen=trace,multiscreen_common=debug".to_string()
        } else {
            "multiscreen=info,multiscreen_common=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Play {
            assignments,
            mode,
            dry_run,
        } => play(cli.config.as_deref(), assignments, mode, dry_run),
        Commands::Resolve { source, json } => resolve_source(&source, json).map(|_| ExitCode::SUCCESS),
        Commands::Monitors => list_monitors(cli.config.as_deref()),
        Commands::CheckTools => check_tools().map(|_| ExitCode::SUCCESS),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref()).map(|_| ExitCode::SUCCESS)
        }
        Commands::Version => {
            println!("multiscreen {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

/// Static `[[monitors]]` win over detection.
fn monitor_provider(config: &Config) -> Box<dyn MonitorProvider> {
    if config.monitors.is_empty() {
        Box::new(XrandrMonitors::new())
    } else {
        Box::new(StaticMonitors::new(config.monitors.clone()))
    }
}

fn play(
    config_path: Option<&Path>,
    assignments: Vec<Assignment>,
    mode: Option<PlaybackMode>,
    dry_run: bool,
) -> Result<ExitCode> {
    let mut config = config::load_config_or_default(config_path)?;

    // Command-line assignments replace the file's
    if !assignments.is_empty() {
        config.assignments = assignments;
    }
    if let Some(mode) = mode {
        config.playback.mode = mode;
    }
    config::validate_config(&config)?;

    if config.assignments.is_empty() {
        anyhow::bail!("Nothing to play: pass --assign SCREEN=SOURCE or add [[assignments]] to the config");
    }

    let registry = match MonitorRegistry::enumerate(monitor_provider(&config).as_ref()) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("✗ {}", e);
            return Ok(exit_code(exit_codes::MONITOR_ENUMERATION));
        }
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_assignments(config, registry, dry_run))
}

async fn run_assignments(
    config: Config,
    registry: MonitorRegistry,
    dry_run: bool,
) -> Result<ExitCode> {
    let stop = CancellationToken::new();
    tokio::spawn(stop_on_signal(stop.clone()));

    let platform = if dry_run {
        println!("[DRY RUN] Recording window and player calls only");
        DryRunBackend::new().platform()
    } else {
        MpvBackend::new(&config.player, stop.clone())
            .context("Failed to initialize mpv backend")?
            .platform()
    };

    let options = OrchestratorOptions {
        session: SessionOptions {
            mode: config.playback.mode,
            fullscreen_delay: config.playback.fullscreen_delay(),
        },
        abort_on_invalid_screen: config.playback.abort_on_invalid_screen,
        stop_when_started: dry_run,
    };

    let orchestrator = Orchestrator::new(registry, platform, options);
    let report = orchestrator.run(&config.assignments, stop.clone()).await;
    stop.cancel();

    for session in &report.sessions {
        println!(
            "screen {} {} ({}): {}",
            session.assignment.screen, session.geometry, session.assignment.source, session.state
        );
    }
    for failure in &report.failures {
        eprintln!("✗ skipped {}", failure);
    }
    if report.teardown_failures > 0 {
        eprintln!("{} teardown step(s) failed; see log", report.teardown_failures);
    }
    println!(
        "{} of {} assignment(s) played",
        report.started,
        config.assignments.len()
    );

    Ok(exit_code(report.exit_code))
}

/// Fire `stop` on Ctrl-C or SIGTERM.
async fn stop_on_signal(stop: CancellationToken) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = stop.cancelled() => return,
    }

    tracing::info!("Stop signal received");
    stop.cancel();
}

fn resolve_source(source: &str, json: bool) -> Result<()> {
    let playlist = SourceResolver::new()
        .resolve(source)
        .with_context(|| format!("Failed to resolve {}", source))?;

    if json {
        let json_str = serde_json::to_string_pretty(&playlist)?;
        println!("{}", json_str);
    } else {
        println!("Source: {}", source);
        println!("Locations: {}", playlist.len());
        for (i, location) in playlist.iter().enumerate() {
            println!("  [{}] {}", i + 1, location);
        }
    }

    Ok(())
}

fn list_monitors(config_path: Option<&Path>) -> Result<ExitCode> {
    let config = config::load_config_or_default(config_path)?;
    let provider = monitor_provider(&config);

    let registry = match MonitorRegistry::enumerate(provider.as_ref()) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("✗ {}", e);
            return Ok(exit_code(exit_codes::MONITOR_ENUMERATION));
        }
    };

    println!("Monitors ({}): {}", provider.name(), registry.len());
    for (screen, geometry) in registry.iter() {
        println!("  {}: {}", screen, geometry);
    }

    Ok(ExitCode::SUCCESS)
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let tools = [
        ("mpv", "video playback"),
        ("xrandr", "monitor detection"),
    ];
    let mut all_ok = true;

    for (name, purpose) in tools {
        match which::which(name) {
            Ok(path) => println!("✓ {} - {} ({})", name, path.display(), purpose),
            Err(_) => {
                all_ok = false;
                println!("✗ {} ({})", name, purpose);
            }
        }
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_summary(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            print_summary(&config);
        }
    }

    Ok(())
}

fn print_summary(config: &Config) {
    println!("  Mode: {}", config.playback.mode);
    println!("  Fullscreen delay: {}ms", config.playback.fullscreen_delay_ms);
    if config.monitors.is_empty() {
        println!("  Monitors: detected");
    } else {
        println!("  Monitors: {} static", config.monitors.len());
    }
    println!("  Assignments: {}", config.assignments.len());
    for assignment in &config.assignments {
        println!(
            "    screen {} <- {} ({})",
            assignment.screen,
            assignment.source,
            assignment.effective_mode(config.playback.mode)
        );
    }
}
