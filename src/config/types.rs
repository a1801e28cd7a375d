//! Resolved startup configuration.

use crate::error::{BootstrapError, Result};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

static RESOLVED: OnceLock<BootstrapResult> = OnceLock::new();

/// Where the resolved values were read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum ConfigSource {
    /// File given with `-c`.
    Explicit(PathBuf),
    /// First `config.toml` found on the search path.
    Discovered(PathBuf),
    /// Nothing found; defaults were written to this path and used.
    WrittenDefaults(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Explicit(path) => write!(f, "explicit ({})", path.display()),
            ConfigSource::Discovered(path) => write!(f, "discovered ({})", path.display()),
            ConfigSource::WrittenDefaults(path) => {
                write!(f, "defaults written to {}", path.display())
            }
        }
    }
}

/// Typed values the rest of the application reads after startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapResult {
    /// `logger.debug` from the store, or forced on by `-d`.
    pub debug: bool,
    pub log_directory: PathBuf,
    pub bind_address: String,
    pub bind_port: String,
    /// `http.paths` in file order. Order matters for route matching.
    pub route_paths: Vec<String>,
    pub source: ConfigSource,
}

impl BootstrapResult {
    /// `"<bind_address>:<bind_port>"` for the HTTP listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }

    /// Publish this result for the rest of the process.
    ///
    /// Succeeds once per process; later calls return `AlreadyResolved`.
    pub fn freeze(self) -> Result<&'static BootstrapResult> {
        RESOLVED
            .set(self)
            .map_err(|_| BootstrapError::AlreadyResolved)?;
        RESOLVED.get().ok_or(BootstrapError::AlreadyResolved)
    }

    /// The published result, if `freeze` has run.
    pub fn current() -> Option<&'static BootstrapResult> {
        RESOLVED.get()
    }
}
