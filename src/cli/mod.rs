//! CLI definitions for hellpot
//!
//! This module defines the CLI structure using clap's derive macros.
//! Only the flags that influence configuration resolution are carried into
//! [`CliOverrides`].

use crate::error::{BootstrapError, Result};
use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;

/// Where log output goes once the startup banner has been printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogTarget {
    /// Discard log output
    Off,
    /// Write to stdout
    Stdout,
    /// Write to stderr (default)
    #[default]
    Stderr,
    /// Append to hellpot.log inside logger.log_directory
    File,
}

/// HellPot startup options
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (skips search path discovery)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Force debug logging regardless of logger.debug
    #[arg(short, long)]
    pub debug: bool,

    /// Logging output after startup
    #[arg(short, long, value_enum, default_value_t = LogTarget::Stderr)]
    pub log: LogTarget,
}

impl Cli {
    /// The subset of options the resolver consumes.
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            config: self.config.clone(),
            debug: self.debug,
        }
    }
}

/// Command-line overrides applied during resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    /// Explicit config file; bypasses search path discovery and defaults.
    pub config: Option<PathBuf>,
    /// Forces debug on; OR-ed with `logger.debug`.
    pub debug: bool,
}

impl CliOverrides {
    /// Parse overrides from a full argument list (program name first).
    ///
    /// `-c` consumes exactly one following value; a missing value is a
    /// syntax error.
    pub fn parse_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Cli::try_parse_from(args)
            .map(|cli| cli.overrides())
            .map_err(|err| {
                let rendered = err.to_string();
                let first_line = rendered.lines().next().unwrap_or_default();
                BootstrapError::Syntax(first_line.trim_start_matches("error: ").to_string())
            })
    }
}
