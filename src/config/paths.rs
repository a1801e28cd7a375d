//! Config file search path.
//!
//! Directories are listed highest priority first. The store takes the first
//! `config.toml` it finds and never merges files from several directories.

use super::defaults::TITLE;
use crate::error::{BootstrapError, Result};
use std::path::{Path, PathBuf};

/// Ordered list of directories searched for `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPaths {
    dirs: Vec<PathBuf>,
}

impl SearchPaths {
    /// Build the search path from the current user's home directory.
    pub fn discover() -> Result<Self> {
        Self::from_home_lookup(dirs::home_dir)
    }

    /// Build the search path using a custom home directory lookup.
    ///
    /// A lookup returning `None` is fatal: the first entry cannot be skipped.
    pub fn from_home_lookup(lookup: impl FnOnce() -> Option<PathBuf>) -> Result<Self> {
        let home = lookup().ok_or(BootstrapError::HomeDirectoryUnavailable)?;
        Ok(Self::with_home(home))
    }

    /// Build the search path for a known home directory.
    pub fn with_home(home: impl AsRef<Path>) -> Self {
        let dirs = vec![
            // e.g. /home/user/.HellPot/config.toml
            home.as_ref().join(format!(".{TITLE}/")),
            // e.g. /etc/HellPot/config.toml
            PathBuf::from(format!("/etc/{TITLE}/")),
            PathBuf::from("./"),
            PathBuf::from("../"),
            PathBuf::from("./.config/"),
        ];
        Self { dirs }
    }
}

impl IntoIterator for SearchPaths {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.dirs.into_iter()
    }
}
