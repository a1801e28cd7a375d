//! Startup configuration resolver.
//!
//! Runs once per process:
//! 1. `-c <path>` given: load that file and nothing else
//! 2. Otherwise register defaults and the search path, load the first
//!    `config.toml` found, or write the defaults to `./config.toml`
//! 3. Copy typed values out of the store, OR-ing in the `-d` override

use super::defaults::{defaults, keys};
use super::paths::SearchPaths;
use super::store::{ConfigStore, Discovery};
use super::types::{BootstrapResult, ConfigSource};
use crate::cli::CliOverrides;
use crate::error::{BootstrapError, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where defaults are written when no config file is found.
pub const DEFAULT_CONFIG_PATH: &str = "./config.toml";

type HomeLookup = Box<dyn Fn() -> Option<PathBuf>>;
type DebugHook = Box<dyn Fn(bool)>;

/// Resolves a [`BootstrapResult`] from a store, defaults and CLI overrides.
pub struct Resolver<S: ConfigStore> {
    store: S,
    /// `None` uses the platform home directory.
    home_dir: Option<HomeLookup>,
    on_debug: Option<DebugHook>,
}

impl<S: ConfigStore> Resolver<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            home_dir: None,
            on_debug: None,
        }
    }

    /// Replace the home directory lookup used to build the search path.
    pub fn with_home_lookup(mut self, lookup: impl Fn() -> Option<PathBuf> + 'static) -> Self {
        self.home_dir = Some(Box::new(lookup));
        self
    }

    /// Called with the effective debug flag as soon as it is known, before
    /// the loaded keys are logged.
    pub fn with_debug_hook(mut self, hook: impl Fn(bool) + 'static) -> Self {
        self.on_debug = Some(Box::new(hook));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve the startup configuration.
    pub fn resolve(&mut self, overrides: &CliOverrides) -> Result<BootstrapResult> {
        let source = match overrides.config.as_deref() {
            Some(path) => self.load_explicit(path)?,
            None => self.discover()?,
        };
        Ok(self.associate(overrides.debug, source))
    }

    fn load_explicit(&mut self, path: &Path) -> Result<ConfigSource> {
        let path = self.store.resolve_path(path);
        let mut file = File::open(&path).map_err(|source| BootstrapError::ExplicitOpen {
            path: path.clone(),
            source,
        })?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|source| BootstrapError::ExplicitRead {
                path: path.clone(),
                source,
            })?;

        self.store
            .load_from_buffer(&buf)
            .map_err(|source| BootstrapError::ExplicitParse {
                path: path.clone(),
                source,
            })?;

        info!(file = %path.display(), "Loaded specified configuration file");
        Ok(ConfigSource::Explicit(path))
    }

    fn search_paths(&self) -> Result<SearchPaths> {
        match &self.home_dir {
            Some(lookup) => SearchPaths::from_home_lookup(|| lookup()),
            None => SearchPaths::discover(),
        }
    }

    fn discover(&mut self) -> Result<ConfigSource> {
        // Fails before the store is touched.
        let search_paths = self.search_paths()?;

        self.store.register_defaults(defaults());

        for dir in search_paths {
            debug!(directory = %dir.display(), "New config file location registered");
            self.store.register_search_path(dir);
        }

        match self
            .store
            .discover_and_load()
            .map_err(BootstrapError::DiscoveredLoad)?
        {
            Discovery::Found(path) => {
                info!(file = %path.display(), "Successfully loaded configuration file");
                Ok(ConfigSource::Discovered(path))
            }
            Discovery::NotFound => {
                warn!("Config file not found! Writing new config to {}", DEFAULT_CONFIG_PATH);
                let target = Path::new(DEFAULT_CONFIG_PATH);
                let written = self.store.write_current_state_to(target).map_err(|source| {
                    BootstrapError::WriteDefaults {
                        path: target.to_path_buf(),
                        source,
                    }
                })?;
                Ok(ConfigSource::WrittenDefaults(written))
            }
        }
    }

    fn associate(&self, force_debug: bool, source: ConfigSource) -> BootstrapResult {
        let debug = self.store.get_bool(keys::LOGGER_DEBUG).unwrap_or(false) || force_debug;
        if let Some(hook) = &self.on_debug {
            hook(debug);
        }

        for key in self.store.all_keys() {
            debug!(key = %key, "LOAD_CONFIG_DIRECTIVE");
        }

        BootstrapResult {
            debug,
            log_directory: PathBuf::from(
                self.store
                    .get_string(keys::LOGGER_LOG_DIRECTORY)
                    .unwrap_or_default(),
            ),
            bind_address: self
                .store
                .get_string(keys::HTTP_BIND_ADDR)
                .unwrap_or_default(),
            bind_port: self
                .store
                .get_string(keys::HTTP_BIND_PORT)
                .unwrap_or_default(),
            route_paths: self
                .store
                .get_string_list(keys::HTTP_PATHS)
                .unwrap_or_default(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::store::{StoreError, TomlStore};
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;
    use toml::Table;

    /// Store that records every call and never finds a file.
    #[derive(Default)]
    struct RecordingStore {
        calls: Rc<RefCell<Vec<&'static str>>>,
    }

    impl RecordingStore {
        fn record(&self, call: &'static str) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl ConfigStore for RecordingStore {
        fn register_defaults(&mut self, _defaults: Table) {
            self.record("register_defaults");
        }
        fn register_search_path(&mut self, _dir: PathBuf) {
            self.record("register_search_path");
        }
        fn load_from_path(&mut self, _path: &Path) -> std::result::Result<(), StoreError> {
            self.record("load_from_path");
            Ok(())
        }
        fn load_from_buffer(&mut self, _buf: &[u8]) -> std::result::Result<(), StoreError> {
            self.record("load_from_buffer");
            Ok(())
        }
        fn discover_and_load(&mut self) -> std::result::Result<Discovery, StoreError> {
            self.record("discover_and_load");
            Ok(Discovery::NotFound)
        }
        fn write_current_state_to(&self, path: &Path) -> std::result::Result<PathBuf, StoreError> {
            self.record("write_current_state_to");
            Ok(path.to_path_buf())
        }
        fn get_string(&self, _key: &str) -> Option<String> {
            None
        }
        fn get_bool(&self, _key: &str) -> Option<bool> {
            None
        }
        fn get_string_list(&self, _key: &str) -> Option<Vec<String>> {
            None
        }
        fn all_keys(&self) -> Vec<String> {
            Vec::new()
        }
        fn resolve_path(&self, path: &Path) -> PathBuf {
            path.to_path_buf()
        }
    }

    #[test]
    fn test_home_failure_happens_before_store_access() {
        let store = RecordingStore::default();
        let calls = Rc::clone(&store.calls);
        let mut resolver = Resolver::new(store).with_home_lookup(|| None);

        let err = resolver.resolve(&CliOverrides::default()).unwrap_err();

        assert!(matches!(err, BootstrapError::HomeDirectoryUnavailable));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_discovery_call_order() {
        let store = RecordingStore::default();
        let calls = Rc::clone(&store.calls);
        let mut resolver =
            Resolver::new(store).with_home_lookup(|| Some(PathBuf::from("/nonexistent-home")));

        let result = resolver.resolve(&CliOverrides::default()).unwrap();

        assert_eq!(
            *calls.borrow(),
            vec![
                "register_defaults",
                "register_search_path",
                "register_search_path",
                "register_search_path",
                "register_search_path",
                "register_search_path",
                "discover_and_load",
                "write_current_state_to",
            ]
        );
        assert_eq!(
            result.source,
            ConfigSource::WrittenDefaults(PathBuf::from(DEFAULT_CONFIG_PATH))
        );
    }

    #[test]
    fn test_explicit_mode_skips_search_and_defaults() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("custom.toml");
        fs::write(&file, "[http]\nbind_port = \"1234\"\n").unwrap();

        let store = RecordingStore::default();
        let calls = Rc::clone(&store.calls);
        // Explicit mode must not even ask for the home directory.
        let mut resolver = Resolver::new(store).with_home_lookup(|| None);

        let overrides = CliOverrides {
            config: Some(file.clone()),
            debug: false,
        };
        let result = resolver.resolve(&overrides).unwrap();

        assert_eq!(*calls.borrow(), vec!["load_from_buffer"]);
        assert_eq!(result.source, ConfigSource::Explicit(file));
    }

    #[test]
    fn test_debug_hook_receives_effective_flag() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut resolver = Resolver::new(RecordingStore::default())
            .with_home_lookup(|| Some(PathBuf::from("/nonexistent-home")))
            .with_debug_hook(move |debug| sink.borrow_mut().push(debug));

        let quiet = resolver.resolve(&CliOverrides::default()).unwrap();
        let forced = resolver
            .resolve(&CliOverrides {
                config: None,
                debug: true,
            })
            .unwrap();

        assert!(!quiet.debug);
        assert!(forced.debug);
        assert_eq!(*seen.borrow(), vec![false, true]);
    }

    #[test]
    fn test_explicit_relative_path_uses_store_resolution() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("custom.toml"), "[http]\nbind_port = \"4321\"\n").unwrap();

        let mut resolver = Resolver::new(TomlStore::new().with_working_dir(temp.path()));
        let result = resolver
            .resolve(&CliOverrides {
                config: Some(PathBuf::from("custom.toml")),
                debug: false,
            })
            .unwrap();

        assert_eq!(result.bind_port, "4321");
        assert_eq!(result.source, ConfigSource::Explicit(temp.path().join("custom.toml")));
    }

    #[test]
    fn test_explicit_missing_file_is_open_error() {
        let temp = TempDir::new().unwrap();
        let mut resolver = Resolver::new(TomlStore::new());
        let overrides = CliOverrides {
            config: Some(temp.path().join("nope.toml")),
            debug: false,
        };

        let err = resolver.resolve(&overrides).unwrap_err();
        assert!(matches!(err, BootstrapError::ExplicitOpen { .. }));
    }

    #[test]
    fn test_explicit_invalid_file_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("bad.toml");
        fs::write(&file, "[http\nbind_port").unwrap();

        let mut resolver = Resolver::new(TomlStore::new());
        let overrides = CliOverrides {
            config: Some(file),
            debug: false,
        };

        let err = resolver.resolve(&overrides).unwrap_err();
        assert!(matches!(err, BootstrapError::ExplicitParse { .. }));
    }

    #[test]
    fn test_explicit_mode_has_no_defaults() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("partial.toml");
        fs::write(&file, "[http]\nbind_addr = \"0.0.0.0\"\n").unwrap();

        let mut resolver = Resolver::new(TomlStore::new());
        let result = resolver
            .resolve(&CliOverrides {
                config: Some(file),
                debug: false,
            })
            .unwrap();

        assert_eq!(result.bind_address, "0.0.0.0");
        assert_eq!(result.bind_port, "");
        assert!(result.route_paths.is_empty());
        assert!(!result.debug);
    }

    #[test]
    fn test_unwritable_default_target_is_fatal() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        fs::create_dir_all(&work).unwrap();
        // A directory squatting on the target path makes the write fail.
        fs::create_dir_all(work.join("config.toml/inner")).unwrap();

        let home = temp.path().join("home");
        let mut resolver = Resolver::new(TomlStore::new().with_working_dir(&work))
            .with_home_lookup(move || Some(home.clone()));

        let err = resolver.resolve(&CliOverrides::default()).unwrap_err();
        assert!(matches!(err, BootstrapError::WriteDefaults { .. }));
    }

    #[test]
    fn test_broken_discovered_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        fs::create_dir_all(&work).unwrap();
        fs::write(work.join("config.toml"), "not = [valid").unwrap();

        let home = temp.path().join("home");
        let mut resolver = Resolver::new(TomlStore::new().with_working_dir(&work))
            .with_home_lookup(move || Some(home.clone()));

        let err = resolver.resolve(&CliOverrides::default()).unwrap_err();
        assert!(matches!(err, BootstrapError::DiscoveredLoad(_)));
    }
}
