use crate::{NowPlayingError, Result};
use std::path::{Path, PathBuf};

/// Tracks the chain of files currently being imported
pub(super) struct CircularDetector {
    import_chain: Vec<PathBuf>,
}

impl CircularDetector {
    pub(super) fn new() -> Self {
        Self {
            import_chain: Vec::new(),
        }
    }

    /// Fails when `path` is already part of the chain
    pub(super) fn detect_circular_import(&self, path: &Path) -> Result<()> {
        if !self.import_chain.iter().any(|p| p == path) {
            return Ok(());
        }

        let chain: Vec<String> = self
            .import_chain
            .iter()
            .chain(std::iter::once(&path.to_path_buf()))
            .map(|p| {
                p.file_name()
                    .unwrap_or(p.as_os_str())
                    .to_string_lossy()
                    .to_string()
            })
            .collect();

        Err(NowPlayingError::ConfigValidation {
            component: "import system".to_string(),
            details: format!("Circular import detected: {}", chain.join(" -> ")),
        })
    }

    pub(super) fn push_to_chain(&mut self, path: &Path) {
        self.import_chain.push(path.to_path_buf());
    }

    pub(super) fn pop_from_chain(&mut self) {
        self.import_chain.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revisiting_a_file_in_the_chain_is_circular() {
        let mut detector = CircularDetector::new();
        detector.push_to_chain(Path::new("/cfg/config.toml"));
        detector.push_to_chain(Path::new("/cfg/base.toml"));

        let err = detector
            .detect_circular_import(Path::new("/cfg/config.toml"))
            .unwrap_err();

        assert!(err.to_string().contains("config.toml -> base.toml -> config.toml"));
    }

    #[test]
    fn popped_files_may_be_imported_again() {
        let mut detector = CircularDetector::new();
        detector.push_to_chain(Path::new("/cfg/base.toml"));
        detector.pop_from_chain();

        assert!(detector.detect_circular_import(Path::new("/cfg/base.toml")).is_ok());
    }
}
