//! Startup configuration.
//!
//! Resolves `config.toml` from, in priority order:
//! 1. **Explicit** - `-c <path>` (bypasses everything below)
//! 2. **Search path** - first `config.toml` found in
//!    `~/.HellPot/`, `/etc/HellPot/`, `./`, `../`, `./.config/`
//! 3. **Defaults** - compiled in; written to `./config.toml` when no file exists
//!
//! `-d` forces debug on regardless of `logger.debug`.
//!
//! ## Merge Strategy
//! - A discovered file is layered over the defaults key by key
//! - Arrays (`http.paths`) are replaced, never concatenated
//! - Files from different search directories are never combined

pub mod defaults;
mod loader;
mod merge;
mod paths;
mod store;
mod types;

pub use loader::{DEFAULT_CONFIG_PATH, Resolver};
pub use merge::{deep_merge, merge_tables};
pub use paths::SearchPaths;
pub use store::{CONFIG_NAME, CONFIG_TYPE, ConfigStore, Discovery, StoreError, TomlStore};
pub use types::{BootstrapResult, ConfigSource};
