mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

/// Upper bound for the fullscreen delay, in milliseconds
const MAX_FULLSCREEN_DELAY_MS: u64 = 10_000;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./multiscreen.toml",
        "~/.config/multiscreen/config.toml",
        "/etc/multiscreen/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.playback.fullscreen_delay_ms > MAX_FULLSCREEN_DELAY_MS {
        anyhow::bail!(
            "fullscreen_delay_ms must be at most {} (got {})",
            MAX_FULLSCREEN_DELAY_MS,
            config.playback.fullscreen_delay_ms
        );
    }

    if config.player.ipc_timeout_ms == 0 || config.player.startup_timeout_ms == 0 {
        anyhow::bail!("Player timeouts must be greater than 0");
    }

    for (i, monitor) in config.monitors.iter().enumerate() {
        if monitor.width == 0 || monitor.height == 0 {
            anyhow::bail!("Monitor {} has an empty size ({})", i + 1, monitor);
        }
    }

    let mut screens = HashSet::new();
    for assignment in &config.assignments {
        if assignment.source.trim().is_empty() {
            anyhow::bail!("Assignment for screen {} has no source", assignment.screen);
        }
        if assignment.screen == 0 {
            anyhow::bail!(
                "Assignment '{}' uses screen 0; screens are numbered from 1",
                assignment.source
            );
        }
        if !screens.insert(assignment.screen) {
            // Not fatal: the orchestrator reports the duplicate and skips it
            tracing::warn!("Screen {} is assigned more than once", assignment.screen);
        }
    }

    Ok(())
}
