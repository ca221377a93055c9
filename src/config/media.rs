use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Media service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(default)]
pub struct MediaConfig {
    /// Application ids (for example `"Spotify.exe"`) whose sessions are
    /// never tracked or attached
    pub denylist: Vec<String>,
}
