use std::{
    fmt, io,
    path::{Path, PathBuf},
    result,
};

use thiserror::Error;

/// Error types for the nowplaying application.
///
/// Covers configuration loading, TOML parsing and imports, and the replay
/// scenarios consumed by the command line harness. Media service failures
/// have their own type, [`MediaError`](crate::services::media::MediaError).
#[derive(Error, Debug)]
pub enum NowPlayingError {
    /// Configuration validation error
    #[error("configuration validation failed for '{component}': {details}")]
    ConfigValidation {
        /// Component that failed validation
        component: String,
        /// Validation error details
        details: String,
    },

    /// Configuration field missing or invalid
    #[error("invalid config field '{field}': {reason}")]
    InvalidConfigField {
        /// The field that is invalid
        field: String,
        /// Reason why the field is invalid
        reason: String,
    },

    /// Standard I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error with location context
    #[error("failed to parse TOML at '{location}': {details}")]
    TomlParseError {
        /// Location of TOML being parsed (file path or "string")
        location: String,
        /// Parse error details
        details: String,
    },

    /// Import operation error with file context
    #[error("failed to import '{path}': {details}")]
    ImportError {
        /// Path of file being imported
        path: PathBuf,
        /// Import error details
        details: String,
    },

    /// Replay scenario is inconsistent
    #[error("invalid scenario: {0}")]
    Scenario(String),
}

/// A specialized `Result` type for nowplaying operations.
pub type Result<T> = result::Result<T, NowPlayingError>;

impl NowPlayingError {
    /// Creates a TOML parsing error with optional file path context.
    ///
    /// # Arguments
    ///
    /// * `error` - The underlying parsing error
    /// * `path` - Optional path to the file that failed to parse
    pub fn toml_parse(error: impl fmt::Display, path: Option<&Path>) -> Self {
        let location = match path {
            Some(p) => {
                let clean_path = p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
                clean_path.to_string_lossy().to_string()
            }
            None => "string".to_string(),
        };

        NowPlayingError::TomlParseError {
            location,
            details: error.to_string(),
        }
    }

    /// Creates an import error with file path context.
    pub fn import(error: impl fmt::Display, path: &Path) -> Self {
        let clean_path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        NowPlayingError::ImportError {
            path: clean_path,
            details: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_parse_without_path_reports_string_location() {
        let err = NowPlayingError::toml_parse("unexpected token", None);

        assert_eq!(
            err.to_string(),
            "failed to parse TOML at 'string': unexpected token"
        );
    }

    #[test]
    fn import_keeps_missing_path_verbatim() {
        let path = Path::new("/definitely/not/here.toml");
        let err = NowPlayingError::import("not found", path);

        let NowPlayingError::ImportError { path: reported, .. } = err else {
            panic!("expected import error");
        };
        assert_eq!(reported, PathBuf::from("/definitely/not/here.toml"));
    }
}
