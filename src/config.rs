//! Configuration file loading.
//!
//! A config file is a JSON object whose keys name parameters; each value is
//! the default for that parameter when it is not given on the command line.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::TaskSyncError;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "tasksync.json";

/// Parameter defaults read from a config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigDefaults {
    pub path: Option<PathBuf>,
    pub values: Map<String, Value>,
}

impl ConfigDefaults {
    /// Locate and load the config file.
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load(explicit: Option<&str>, cwd: &Path) -> Result<Self, TaskSyncError> {
        let path = match explicit {
            Some(p) => {
                let path = cwd.join(p);
                if !path.is_file() {
                    return Err(TaskSyncError::ConfigFileNotFound { path });
                }
                path
            }
            None => {
                let path = cwd.join(DEFAULT_CONFIG_FILE);
                if !path.is_file() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let values = read_object(&path)?;
        debug!(path = %path.display(), keys = values.len(), "loaded config file");
        Ok(Self {
            path: Some(path),
            values,
        })
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|v| !v.is_null())
    }
}

fn read_object(path: &Path) -> Result<Map<String, Value>, TaskSyncError> {
    let invalid = |source: Box<dyn std::error::Error + Send + Sync>| TaskSyncError::InvalidConfig {
        path: path.to_path_buf(),
        source,
    };

    let text = std::fs::read_to_string(path).map_err(|e| invalid(e.into()))?;
    match serde_json::from_str::<Value>(&text).map_err(|e| invalid(e.into()))? {
        Value::Object(map) => Ok(map),
        _ => Err(invalid("expected a JSON object".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_default_file_yields_empty_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = ConfigDefaults::load(None, dir.path()).unwrap();
        assert!(defaults.path.is_none());
        assert!(defaults.values.is_empty());
    }

    #[test]
    fn default_file_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            r#"{"host": "acme", "username": "alice", "password": null}"#,
        )
        .unwrap();

        let defaults = ConfigDefaults::load(None, dir.path()).unwrap();
        assert_eq!(defaults.get("host"), Some(&json!("acme")));
        assert_eq!(defaults.get("username"), Some(&json!("alice")));
        assert_eq!(defaults.get("password"), None);
    }

    #[test]
    fn explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigDefaults::load(Some("nope.json"), dir.path()).unwrap_err();
        assert!(matches!(err, TaskSyncError::ConfigFileNotFound { path } if path.ends_with("nope.json")));
    }

    #[test]
    fn non_object_config_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("alt.json"), "[1, 2]").unwrap();
        let err = ConfigDefaults::load(Some("alt.json"), dir.path()).unwrap_err();
        assert!(matches!(err, TaskSyncError::InvalidConfig { .. }));
    }

    #[test]
    fn malformed_config_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "{host:").unwrap();
        let err = ConfigDefaults::load(None, dir.path()).unwrap_err();
        assert!(matches!(err, TaskSyncError::InvalidConfig { .. }));
    }
}
