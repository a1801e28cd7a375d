//! Deep merge for TOML tables.
//!
//! Used to layer a loaded config file over the registered defaults.
//! Arrays are replaced entirely, not concatenated.

use toml::{Table, Value};

/// Deep merge two TOML values, with `overlay` taking precedence over `base`.
///
/// - Tables are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers, booleans and datetimes are replaced entirely
///
/// # Example
/// ```
/// use hellpot::config::deep_merge;
///
/// let base: toml::Value = toml::from_str(r#"
/// [http]
/// bind_addr = "127.0.0.1"
/// bind_port = "8080"
/// "#).unwrap();
/// let overlay: toml::Value = toml::from_str(r#"
/// [http]
/// bind_port = "9000"
/// "#).unwrap();
///
/// let merged = deep_merge(base, overlay);
/// assert_eq!(merged["http"]["bind_addr"].as_str(), Some("127.0.0.1"));
/// assert_eq!(merged["http"]["bind_port"].as_str(), Some("9000"));
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Table(base_map), Value::Table(overlay_map)) => {
            Value::Table(merge_tables(base_map, overlay_map))
        }
        (_, overlay) => overlay,
    }
}

/// Merge `overlay` into `base` key by key.
pub fn merge_tables(mut base: Table, overlay: Table) -> Table {
    for (key, overlay_value) in overlay {
        let merged_value = match base.remove(&key) {
            Some(base_value) => deep_merge(base_value, overlay_value),
            None => overlay_value,
        };
        base.insert(key, merged_value);
    }
    base
}

/// Lowercase every key in a table, recursively.
///
/// Config keys are case-insensitive; `[HTTP] Bind_Port` and `[http] bind_port`
/// address the same setting.
pub fn lowercase_keys(table: Table) -> Table {
    table
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Table(inner) => Value::Table(lowercase_keys(inner)),
                other => other,
            };
            (key.to_lowercase(), value)
        })
        .collect()
}
