//! Error types for configuration bootstrap.

use crate::config::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures raised while resolving the startup configuration.
///
/// Every variant aborts startup. The one recoverable situation (no config file
/// on any search path) is handled inside the resolver and never surfaces here.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Malformed command line, e.g. `-c` with no following path.
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("error opening specified config file {path}: {source}")]
    ExplicitOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading specified config file {path}: {source}")]
    ExplicitRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing specified config file {path}: {source}")]
    ExplicitParse {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    /// The user's home directory could not be determined, so the first
    /// search path cannot be built.
    #[error(
        "failed to determine user's home directory, configuration stored there cannot be located"
    )]
    HomeDirectoryUnavailable,

    /// A config file was found on the search path but could not be loaded.
    #[error("error loading discovered config file: {0}")]
    DiscoveredLoad(#[source] StoreError),

    #[error("error writing new configuration file {path}: {source}")]
    WriteDefaults {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    /// `BootstrapResult::freeze` was called a second time.
    #[error("configuration has already been resolved for this process")]
    AlreadyResolved,
}

impl BootstrapError {
    /// Short machine-readable code, used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            BootstrapError::Syntax(_) => "SYNTAX",
            BootstrapError::ExplicitOpen { .. } => "EXPLICIT_OPEN",
            BootstrapError::ExplicitRead { .. } => "EXPLICIT_READ",
            BootstrapError::ExplicitParse { .. } => "EXPLICIT_PARSE",
            BootstrapError::HomeDirectoryUnavailable => "HOME_DIRECTORY_UNAVAILABLE",
            BootstrapError::DiscoveredLoad(_) => "DISCOVERED_LOAD",
            BootstrapError::WriteDefaults { .. } => "WRITE_DEFAULTS",
            BootstrapError::AlreadyResolved => "ALREADY_RESOLVED",
        }
    }
}

/// Result type for bootstrap operations.
pub type Result<T> = std::result::Result<T, BootstrapError>;
