// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `blogwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "blogwatch",
    version,
    about = "Generate a static blog and keep it up to date as content files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the site config file (JSON).
    ///
    /// Created with default values when it does not exist. Content
    /// directories are resolved relative to its parent directory.
    #[arg(long, value_name = "PATH", default_value = "blogwatch.json")]
    pub config: String,

    /// Keep running after the initial build and regenerate on file changes.
    #[arg(long)]
    pub watch: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BLOGWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
