//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - play: run a practice session
//! - list: list learning objects
//! - show / flag: inspect or flag one container
//! - settings: show or change practice settings

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use xue::domain::SessionMode;

/// Xue - spaced-practice flashcard player
#[derive(Parser, Debug)]
#[command(name = "xue")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a practice session
    Play {
        /// Session mode (normal, chinese-first, pinyin, focused)
        #[arg(short, long, default_value = "normal")]
        mode: SessionMode,

        /// Directory of .xue containers (overrides config)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// List learning objects with their stats
    List {
        /// Show only flagged objects
        #[arg(short, long)]
        flagged: bool,

        /// Directory of .xue containers (overrides config)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Show one container's metadata and entries
    Show {
        /// Path to a .xue container
        path: PathBuf,
    },

    /// Toggle the flag on one container
    Flag {
        /// Path to a .xue container
        path: PathBuf,
    },

    /// Show or change practice settings
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommands>,
    },
}

/// Settings subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum SettingsCommands {
    /// Print current settings
    Show,

    /// Random -> Weighted -> Sequential
    CyclePicker,

    /// Add one second to the pinyin instruction delay (wraps past 20)
    BumpInstructionDelay,

    /// Add one second to the quiz interval (wraps past 59)
    BumpQuizInterval,

    /// Toggle native-script display
    ToggleNative,

    /// Set seconds of phase-one hold per native character
    SecondsPerChar {
        /// Positive number of seconds
        value: f64,
    },
}
