//! Application settings.
//!
//! Settings come from three layers, later ones winning:
//! 1. [`AppConfig::default`]
//! 2. an optional TOML file
//! 3. `MVC_*` environment variables
//!
//! ```toml
//! views_dir = "views"
//! view_extension = "html"
//! max_partial_depth = 8
//! preload_views = ["user/index", "user/show"]
//! ```

use crate::framework::view::DEFAULT_MAX_PARTIAL_DEPTH;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const ENV_VIEWS_DIR: &str = "MVC_VIEWS_DIR";
pub const ENV_VIEW_EXTENSION: &str = "MVC_VIEW_EXTENSION";
pub const ENV_MAX_PARTIAL_DEPTH: &str = "MVC_MAX_PARTIAL_DEPTH";
/// Comma-separated list of view names.
pub const ENV_PRELOAD_VIEWS: &str = "MVC_PRELOAD_VIEWS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {var}: {value:?}")]
    InvalidOverride { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Directory view names are resolved against.
    pub views_dir: PathBuf,
    /// File extension of templates, without the dot.
    pub view_extension: String,
    pub max_partial_depth: usize,
    /// Views compiled at startup.
    pub preload_views: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            views_dir: PathBuf::from("views"),
            view_extension: "html".into(),
            max_partial_depth: DEFAULT_MAX_PARTIAL_DEPTH,
            preload_views: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `path` if given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Reads a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Applies `MVC_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_VIEWS_DIR) {
            self.views_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_VIEW_EXTENSION) {
            self.view_extension = v;
        }
        if let Some(v) = lookup(ENV_MAX_PARTIAL_DEPTH) {
            self.max_partial_depth = v.trim().parse().map_err(|_| ConfigError::InvalidOverride {
                var: ENV_MAX_PARTIAL_DEPTH,
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup(ENV_PRELOAD_VIEWS) {
            self.preload_views = v
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.views_dir, PathBuf::from("views"));
        assert_eq!(config.view_extension, "html");
        assert_eq!(config.max_partial_depth, DEFAULT_MAX_PARTIAL_DEPTH);
        assert!(config.preload_views.is_empty());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "views_dir = \"templates\"").unwrap();
        writeln!(file, "preload_views = [\"user/index\"]").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.views_dir, PathBuf::from("templates"));
        assert_eq!(config.view_extension, "html");
        assert_eq!(config.preload_views, vec!["user/index".to_string()]);
    }

    #[test]
    fn test_unknown_key_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "view_dir = \"typo\"").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(vars(&[
                (ENV_VIEWS_DIR, "/srv/views"),
                (ENV_VIEW_EXTENSION, "tpl"),
                (ENV_MAX_PARTIAL_DEPTH, "3"),
                (ENV_PRELOAD_VIEWS, "user/index, user/show,,"),
            ]))
            .unwrap();

        assert_eq!(config.views_dir, PathBuf::from("/srv/views"));
        assert_eq!(config.view_extension, "tpl");
        assert_eq!(config.max_partial_depth, 3);
        assert_eq!(config.preload_views, vec!["user/index", "user/show"]);
    }

    #[test]
    fn test_bad_depth_override() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(vars(&[(ENV_MAX_PARTIAL_DEPTH, "deep")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidOverride { var: ENV_MAX_PARTIAL_DEPTH, .. }
        ));
    }
}
