//! Key/value configuration store.
//!
//! The resolver only talks to [`ConfigStore`]; [`TomlStore`] is the on-disk
//! implementation backed by `config.toml` files.

use super::merge::{lowercase_keys, merge_tables};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml::{Table, Value};

/// Base name of the config file looked up in each search directory.
pub const CONFIG_NAME: &str = "config";

/// Format (and extension) of the config file.
pub const CONFIG_TYPE: &str = "toml";

/// Errors raised by a configuration store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Writing current state never overwrites an existing file.
    #[error("config file already exists: {0}")]
    AlreadyExists(PathBuf),
}

/// Outcome of searching the registered directories for a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    /// A file was found and loaded from this path.
    Found(PathBuf),
    /// No registered directory contains a config file.
    NotFound,
}

/// Capabilities the resolver needs from a configuration store.
///
/// Keys are dotted paths such as `http.bind_port`. Getters return `None` when
/// the key is absent or cannot be coerced to the requested type.
pub trait ConfigStore {
    /// Register default values; loaded files are layered over them.
    fn register_defaults(&mut self, defaults: Table);

    /// Append a directory to the search path (lowest priority so far).
    fn register_search_path(&mut self, dir: PathBuf);

    /// Load a config file from disk, replacing any previously loaded file.
    fn load_from_path(&mut self, path: &Path) -> Result<(), StoreError>;

    /// Load config from an in-memory buffer.
    fn load_from_buffer(&mut self, buf: &[u8]) -> Result<(), StoreError>;

    /// Search the registered directories in order and load the first match.
    fn discover_and_load(&mut self) -> Result<Discovery, StoreError>;

    /// Serialize defaults plus loaded values to a new file.
    ///
    /// Returns the path actually written.
    fn write_current_state_to(&self, path: &Path) -> Result<PathBuf, StoreError>;

    fn get_string(&self, key: &str) -> Option<String>;

    fn get_bool(&self, key: &str) -> Option<bool>;

    fn get_string_list(&self, key: &str) -> Option<Vec<String>>;

    /// Every leaf key currently known, in dotted form.
    fn all_keys(&self) -> Vec<String>;

    /// Resolve `path` the way this store resolves search and write paths.
    fn resolve_path(&self, path: &Path) -> PathBuf;
}

/// TOML-backed [`ConfigStore`].
///
/// Relative paths (search directories, write targets) resolve against the
/// working directory, which defaults to the process's current directory.
#[derive(Debug, Clone, Default)]
pub struct TomlStore {
    working_dir: Option<PathBuf>,
    defaults: Table,
    loaded: Table,
    /// `defaults` with `loaded` merged over it.
    effective: Table,
    search_paths: Vec<PathBuf>,
}

impl TomlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `dir` instead of the process CWD.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Registered search directories, highest priority first.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// The merged table that getters read from.
    pub fn effective(&self) -> &Table {
        &self.effective
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.working_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn refresh(&mut self) {
        self.effective = merge_tables(self.defaults.clone(), self.loaded.clone());
    }

    fn find(&self, key: &str) -> Option<&Value> {
        let key = key.to_lowercase();
        let mut parts = key.split('.');
        let mut current = self.effective.get(parts.next()?)?;
        for part in parts {
            current = current.as_table()?.get(part)?;
        }
        Some(current)
    }
}

impl ConfigStore for TomlStore {
    fn register_defaults(&mut self, defaults: Table) {
        self.defaults = merge_tables(std::mem::take(&mut self.defaults), lowercase_keys(defaults));
        self.refresh();
    }

    fn register_search_path(&mut self, dir: PathBuf) {
        self.search_paths.push(dir);
    }

    fn load_from_path(&mut self, path: &Path) -> Result<(), StoreError> {
        let resolved = self.resolve(path);
        let buf = std::fs::read(&resolved).map_err(|source| StoreError::Io {
            path: resolved.clone(),
            source,
        })?;
        self.load_from_buffer(&buf)
    }

    fn load_from_buffer(&mut self, buf: &[u8]) -> Result<(), StoreError> {
        let text = std::str::from_utf8(buf)?;
        let table: Table = toml::from_str(text)?;
        self.loaded = lowercase_keys(table);
        self.refresh();
        Ok(())
    }

    fn discover_and_load(&mut self) -> Result<Discovery, StoreError> {
        let file_name = format!("{CONFIG_NAME}.{CONFIG_TYPE}");
        let found = self
            .search_paths
            .iter()
            .map(|dir| self.resolve(&dir.join(&file_name)))
            .find(|candidate| candidate.is_file());

        match found {
            Some(path) => {
                self.load_from_path(&path)?;
                Ok(Discovery::Found(path))
            }
            None => Ok(Discovery::NotFound),
        }
    }

    fn write_current_state_to(&self, path: &Path) -> Result<PathBuf, StoreError> {
        let resolved = self.resolve(path);
        let content = toml::to_string_pretty(&self.effective)?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&resolved)
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::AlreadyExists => StoreError::AlreadyExists(resolved.clone()),
                _ => StoreError::Io {
                    path: resolved.clone(),
                    source,
                },
            })?;
        file.write_all(content.as_bytes())
            .map_err(|source| StoreError::Io {
                path: resolved.clone(),
                source,
            })?;

        Ok(resolved)
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.find(key).and_then(coerce_string)
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.find(key).and_then(coerce_bool)
    }

    fn get_string_list(&self, key: &str) -> Option<Vec<String>> {
        match self.find(key)? {
            Value::Array(items) => Some(items.iter().filter_map(coerce_string).collect()),
            Value::String(s) => Some(s.split_whitespace().map(String::from).collect()),
            _ => None,
        }
    }

    fn all_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        collect_keys(&self.effective, None, &mut keys);
        keys
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        self.resolve(path)
    }
}

fn collect_keys(table: &Table, prefix: Option<&str>, out: &mut Vec<String>) {
    for (key, value) in table {
        let full = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Table(inner) => collect_keys(inner, Some(&full), out),
            _ => out.push(full),
        }
    }
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(d) => Some(d.to_string()),
        Value::Array(_) | Value::Table(_) => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(b) => Some(*b),
        Value::Integer(i) => Some(*i != 0),
        Value::Float(f) => Some(*f != 0.0),
        Value::String(s) => match s.as_str() {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
