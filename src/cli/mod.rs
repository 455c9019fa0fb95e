//! CLI module for xue - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for practice sessions,
//! library inspection and settings.

pub mod commands;

pub use commands::Cli;
