//! Manager configuration, loadable from RON, TOML or JSON.
//!
//! The format is picked from the file extension:
//!
//! ```ron
//! (
//!     assets_root: "assets",
//!     use_full_paths: false,
//!     track_dependencies: true,
//! )
//! ```

use crate::error::ResourceError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Ron,
    Toml,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Directory scanned by [`ResourceManager::init`](crate::ResourceManager::init).
    pub assets_root: PathBuf,
    /// Use the path relative to `assets_root` as the resource id instead of
    /// the bare file name.
    pub use_full_paths: bool,
    /// Maintain the dependency graph and deliver notifications.
    pub track_dependencies: bool,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("assets"),
            use_full_paths: false,
            track_dependencies: true,
        }
    }
}

impl ResourceConfig {
    pub fn with_root(assets_root: impl Into<PathBuf>) -> Self {
        Self {
            assets_root: assets_root.into(),
            ..Self::default()
        }
    }

    /// Read a config file. Missing keys take their default value.
    pub fn load(path: &Path) -> Result<Self, ResourceError> {
        let format = detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format).map_err(|detail| ResourceError::Config {
            file: path.to_path_buf(),
            detail,
        })
    }

    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, String> {
        match format {
            ConfigFormat::Ron => ron::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

pub fn detect_format(path: &Path) -> Result<ConfigFormat, ResourceError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(ConfigFormat::Ron),
        Some("toml") => Ok(ConfigFormat::Toml),
        Some("json") => Ok(ConfigFormat::Json),
        _ => Err(ResourceError::Config {
            file: path.to_path_buf(),
            detail: "unsupported config format (expected .ron, .toml or .json)".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{cleanup, make_test_dir, write_file};

    #[test]
    fn defaults() {
        let config = ResourceConfig::default();
        assert_eq!(config.assets_root, PathBuf::from("assets"));
        assert!(!config.use_full_paths);
        assert!(config.track_dependencies);
    }

    #[test]
    fn parse_each_format() {
        let ron = ResourceConfig::parse(
            r#"(assets_root: "data", use_full_paths: true)"#,
            ConfigFormat::Ron,
        )
        .unwrap();
        assert_eq!(ron.assets_root, PathBuf::from("data"));
        assert!(ron.use_full_paths);
        assert!(ron.track_dependencies);

        let toml = ResourceConfig::parse(
            "assets_root = \"data\"\ntrack_dependencies = false\n",
            ConfigFormat::Toml,
        )
        .unwrap();
        assert!(!toml.track_dependencies);

        let json = ResourceConfig::parse(r#"{"use_full_paths": true}"#, ConfigFormat::Json).unwrap();
        assert!(json.use_full_paths);
        assert_eq!(json.assets_root, PathBuf::from("assets"));
    }

    #[test]
    fn load_from_file() {
        let dir = make_test_dir("config_load");
        let path = write_file(&dir, "vellum.toml", "use_full_paths = true\n");
        let config = ResourceConfig::load(&path).unwrap();
        assert!(config.use_full_paths);
        cleanup(&dir);
    }

    #[test]
    fn unsupported_extension() {
        let result = ResourceConfig::load(Path::new("vellum.yaml"));
        assert!(matches!(result, Err(ResourceError::Config { .. })));
    }

    #[test]
    fn malformed_content_reports_the_file() {
        let dir = make_test_dir("config_bad");
        let path = write_file(&dir, "vellum.json", "{ not json");
        let err = ResourceConfig::load(&path).unwrap_err();
        match err {
            ResourceError::Config { file, .. } => assert_eq!(file, path),
            other => panic!("unexpected error: {other}"),
        }
        cleanup(&dir);
    }
}
