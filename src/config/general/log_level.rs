use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logging level for the application.
///
/// Controls the verbosity of log output. `RUST_LOG`, when set, takes
/// precedence over this value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only failures that stop a poll loop or the application.
    Error,

    /// Failures the service absorbed, such as a rejected command.
    Warn,

    /// Service lifecycle (default level).
    #[default]
    Info,

    /// Poll loop lifecycle and attachment changes.
    Debug,

    /// Every emitted event.
    Trace,
}

impl LogLevel {
    /// Directive usable in a `tracing_subscriber::EnvFilter`
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_directive())
    }
}
