mod circular_detection;
mod merging;

use super::{Config, ConfigPaths};
use crate::{NowPlayingError, Result};
use circular_detection::CircularDetector;
use merging::merge_toml_configs;
use std::{
    fs,
    path::{Path, PathBuf},
};
use toml::Value;
use tracing::{debug, instrument};

impl Config {
    /// Loads the main configuration file, or defaults when it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined or the
    /// file exists but cannot be loaded (see [`Config::load_with_imports`])
    pub fn load() -> Result<Config> {
        let path = ConfigPaths::main_config()?;
        Self::load_or_default(&path)
    }

    /// Loads `path`, or defaults when it does not exist
    ///
    /// # Errors
    ///
    /// Same as [`Config::load_with_imports`]
    pub fn load_or_default(path: &Path) -> Result<Config> {
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Config::default());
        }

        Self::load_with_imports(path)
    }

    /// Loads a configuration file with support for importing other TOML files
    ///
    /// Imports are listed in a top-level `imports` array as `@`-prefixed
    /// paths relative to the importing file; a missing extension means
    /// `.toml`. Imported values sit beneath the importing file, so the
    /// importing file wins on conflicts. Imports may be nested but not
    /// circular.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration file cannot be read
    /// - The TOML content is invalid
    /// - Any imported files cannot be loaded
    /// - The merged configuration is invalid
    /// - Circular imports are detected
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load_with_imports(path: &Path) -> Result<Config> {
        let canonical_path = path.canonicalize()?;

        let mut detector = CircularDetector::new();
        let merged = Self::load_value_with_tracking(&canonical_path, &mut detector)?;

        merged
            .try_into()
            .map_err(|e| NowPlayingError::ConfigValidation {
                component: "config parsing".to_string(),
                details: format!("Configuration validation failed: {e}"),
            })
    }

    fn load_value_with_tracking(path: &Path, detector: &mut CircularDetector) -> Result<Value> {
        detector.detect_circular_import(path)?;
        detector.push_to_chain(path);

        let result = Self::load_toml_file_with_imports(path, detector);
        detector.pop_from_chain();
        result
    }

    fn load_toml_file_with_imports(path: &Path, detector: &mut CircularDetector) -> Result<Value> {
        let content = fs::read_to_string(path).map_err(|e| NowPlayingError::import(e, path))?;
        let main_value: Value =
            toml::from_str(&content).map_err(|e| NowPlayingError::toml_parse(e, Some(path)))?;

        let import_paths = Self::extract_import_paths(&main_value);
        let imported_configs = import_paths
            .iter()
            .map(|import_path| {
                let resolved_path = Self::resolve_import_path(path, import_path)?;
                let canonical_import = resolved_path
                    .canonicalize()
                    .map_err(|e| NowPlayingError::import(e, &resolved_path))?;

                Self::load_value_with_tracking(&canonical_import, detector)
            })
            .collect::<Result<Vec<Value>>>()?;

        Ok(merge_toml_configs(imported_configs, main_value))
    }

    fn extract_import_paths(value: &Value) -> Vec<String> {
        let Some(Value::Array(imports)) = value.get("imports") else {
            return Vec::new();
        };

        imports
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|s| s.strip_prefix('@'))
            .map(str::to_owned)
            .collect()
    }

    fn resolve_import_path(base_path: &Path, import_path: &str) -> Result<PathBuf> {
        let parent_dir = base_path
            .parent()
            .ok_or_else(|| NowPlayingError::ImportError {
                path: base_path.to_path_buf(),
                details: "Invalid base path - no parent directory".to_string(),
            })?;

        let mut import_path_buf = PathBuf::from(import_path);
        if import_path_buf.extension().is_none() {
            import_path_buf.set_extension("toml");
        }

        Ok(parent_dir.join(import_path_buf))
    }
}
