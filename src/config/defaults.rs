//! Compiled-in default configuration.
//!
//! This table is what a missing config file resolves to, and what gets
//! written to `./config.toml` on first run. Adding a section or key here is
//! enough for it to be registered and written; the resolver never names
//! individual keys while registering defaults.

use toml::{Table, Value};

/// Application title, used for search paths and the banner.
pub const TITLE: &str = "HellPot";

/// Application version as `major.minor`.
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION_MAJOR"),
    ".",
    env!("CARGO_PKG_VERSION_MINOR")
);

/// Dotted keys read back out of the store after resolution.
pub mod keys {
    pub const NAME: &str = "name";
    pub const LOGGER_DEBUG: &str = "logger.debug";
    pub const LOGGER_LOG_DIRECTORY: &str = "logger.log_directory";
    pub const HTTP_BIND_ADDR: &str = "http.bind_addr";
    pub const HTTP_BIND_PORT: &str = "http.bind_port";
    pub const HTTP_PATHS: &str = "http.paths";
}

/// `"<title> <version>"`, the default value of the top-level `name` key.
pub fn app_label() -> String {
    format!("{TITLE} {VERSION}")
}

fn default_logger() -> Table {
    let mut logger = Table::new();
    logger.insert("debug".into(), Value::Boolean(true));
    logger.insert("log_directory".into(), Value::String("./.logs/".into()));
    logger
}

fn default_http() -> Table {
    let mut http = Table::new();
    http.insert("bind_addr".into(), Value::String("127.0.0.1".into()));
    http.insert("bind_port".into(), Value::String("8080".into()));
    http.insert(
        "paths".into(),
        Value::Array(vec![
            Value::String("wp-login.php".into()),
            Value::String("wp-login".into()),
        ]),
    );
    http
}

/// Every recognized key with its default value.
///
/// Top-level keys sit at the root of the table; sections are nested tables.
pub fn defaults() -> Table {
    let mut root = Table::new();
    root.insert(keys::NAME.into(), Value::String(app_label()));
    root.insert("logger".into(), Value::Table(default_logger()));
    root.insert("http".into(), Value::Table(default_http()));
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_section() {
        let defaults = defaults();
        assert!(defaults["logger"].is_table());
        assert!(defaults["http"].is_table());
        assert_eq!(defaults["name"].as_str(), Some(app_label().as_str()));
    }

    #[test]
    fn test_default_values() {
        let defaults = defaults();
        assert_eq!(defaults["logger"]["debug"].as_bool(), Some(true));
        assert_eq!(
            defaults["logger"]["log_directory"].as_str(),
            Some("./.logs/")
        );
        assert_eq!(defaults["http"]["bind_addr"].as_str(), Some("127.0.0.1"));
        assert_eq!(defaults["http"]["bind_port"].as_str(), Some("8080"));

        let paths: Vec<&str> = defaults["http"]["paths"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(paths, vec!["wp-login.php", "wp-login"]);
    }

    #[test]
    fn test_app_label() {
        assert_eq!(app_label(), format!("HellPot {VERSION}"));
        assert_eq!(app_label(), "HellPot 0.1");
    }

    #[test]
    fn test_version_has_major_and_minor_only() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|p| p.parse::<u32>().is_ok()));
    }
}
