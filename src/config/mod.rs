//! Configuration schema definitions and loading.
//!
//! The configuration lives in `config.toml` under the nowplaying config
//! directory. Every section is optional; a missing file means defaults.

mod general;
mod loading;
mod media;
mod paths;

#[cfg(test)]
mod tests;

pub use general::{GeneralConfig, LogLevel};
pub use media::MediaConfig;
pub use paths::ConfigPaths;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Main configuration structure for nowplaying.
///
/// Represents the complete configuration schema that can be loaded
/// from TOML files. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct Config {
    /// General application settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Media service settings.
    #[serde(default)]
    pub media: MediaConfig,
}
