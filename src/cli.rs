use clap::{Parser, Subcommand};
use multiscreen_common::{Assignment, PlaybackMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "multiscreen")]
#[command(author, version, about = "Borderless full-screen video playback pinned to individual monitors")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play every assignment on its monitor until stopped
    Play {
        /// Assignment as SCREEN=SOURCE; replaces the config file's assignments
        #[arg(short, long = "assign", value_name = "SCREEN=SOURCE")]
        assignments: Vec<Assignment>,

        /// Playback mode: default, loop or shuffle
        #[arg(short, long)]
        mode: Option<PlaybackMode>,

        /// Record window and player calls instead of opening players
        #[arg(long)]
        dry_run: bool,
    },

    /// Resolve a source and print the locations it would play
    Resolve {
        /// Video file, directory, playlist or stream URL
        #[arg(required = true)]
        source: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List detected monitors with their screen numbers
    Monitors,

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
