//! Load env pairs from `$XDG_CONFIG_HOME/<app>/config.toml`.
//!
//! Two tables are read: `[env]` holds raw variables, `[<app>]` holds settings whose keys map
//! to `<APP>_<KEY>` (e.g. `[vectorizer] max_in_flight = 4` → `VECTORIZER_MAX_IN_FLIGHT=4`).
//! When both define the same variable, `[env]` wins.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::LoadError;

fn config_home() -> Result<PathBuf, LoadError> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir().ok_or_else(|| LoadError::XdgPath("no config directory".to_string()))
}

fn xdg_config_path(app_name: &str) -> Result<Option<PathBuf>, LoadError> {
    let path = config_home()?.join(app_name).join("config.toml");
    if path.exists() {
        Ok(Some(path))
    } else {
        Ok(None)
    }
}

/// Scalar TOML value as it would appear in an env var.
fn scalar_to_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Returns env key-value pairs from the config file. Missing file or empty tables return an
/// empty map.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    let path = match xdg_config_path(app_name)? {
        Some(p) => p,
        None => return Ok(HashMap::new()),
    };
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    let mut doc: toml::Table = toml::from_str(&content)?;

    let mut out = HashMap::new();
    let prefix = app_name.to_ascii_uppercase().replace('-', "_");
    if let Some(toml::Value::Table(settings)) = doc.remove(app_name) {
        for (key, value) in &settings {
            let Some(v) = scalar_to_string(value) else {
                return Err(LoadError::InvalidValue {
                    key: format!("{}.{}", app_name, key),
                    value: value.to_string(),
                });
            };
            out.insert(format!("{}_{}", prefix, key.to_ascii_uppercase()), v);
        }
    }
    if let Some(toml::Value::Table(env)) = doc.remove("env") {
        for (key, value) in &env {
            if let Some(v) = scalar_to_string(value) {
                out.insert(key.clone(), v);
            }
        }
    }
    Ok(out)
}
