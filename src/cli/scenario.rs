//! Replay scenario files.
//!
//! A scenario declares the sessions a simulated host knows about and an
//! ordered list of steps to drive it with:
//!
//! ```toml
//! denylist = ["B.exe"]
//!
//! [[sessions]]
//! id = "A.exe"
//! playback_state = "Playing"
//! title = "Song"
//! length_secs = 200
//!
//! [[steps]]
//! action = "add_session"
//! id = "A.exe"
//!
//! [[steps]]
//! action = "command"
//! name = "toggle_shuffle"
//! ```

use std::{path::Path, time::Duration};

use serde::Deserialize;

use crate::{
    NowPlayingError, Result,
    services::media::{
        Capabilities, LoopMode, Metadata, PlaybackState,
        memory::{SessionState, Timeline},
    },
};

const DEFAULT_SETTLE_MS: u64 = 25;

/// A complete replay scenario
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Session ids to deny, on top of the configured denylist
    #[serde(default)]
    pub denylist: Vec<String>,

    /// How long to let the poll loops run after each step, in milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Sessions the host can register
    #[serde(default)]
    pub sessions: Vec<SessionSpec>,

    /// Steps to run, in order
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_settle_ms() -> u64 {
    DEFAULT_SETTLE_MS
}

/// Initial state of one session
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSpec {
    /// Application id
    pub id: String,

    /// Playback state label
    #[serde(default = "default_playback_state")]
    pub playback_state: String,

    /// Track title
    #[serde(default)]
    pub title: String,

    /// Track artist
    #[serde(default)]
    pub artist: String,

    /// Album title
    pub album: Option<String>,

    /// Track length; zero means the session has no timeline
    #[serde(default)]
    pub length_secs: f64,

    /// Initial position
    #[serde(default)]
    pub position_secs: f64,

    /// Repeat mode label
    #[serde(default = "default_loop_mode")]
    pub loop_mode: String,

    /// Shuffle flag
    #[serde(default)]
    pub shuffle: bool,

    /// Whether the session accepts transport controls
    #[serde(default = "default_controllable")]
    pub controllable: bool,
}

fn default_playback_state() -> String {
    String::from("Stopped")
}

fn default_loop_mode() -> String {
    String::from("None")
}

fn default_controllable() -> bool {
    true
}

/// One scenario step
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Register a declared session with the host
    AddSession {
        /// Declared session id
        id: String,
    },

    /// Unregister a session from the host
    RemoveSession {
        /// Session id
        id: String,
    },

    /// Queue a raw manager notification
    ManagerEvent {
        /// Raw event name
        name: String,
    },

    /// Queue a raw notification on a registered session
    SessionEvent {
        /// Session id
        id: String,
        /// Raw event name
        name: String,
    },

    /// Make a tracked session the host's active one
    SetActive {
        /// Session id, absent for none
        id: Option<String>,
    },

    /// Change what the host reports as its own current session
    SetSystem {
        /// Session id, absent for none
        id: Option<String>,
    },

    /// Change a session's playback state from the host side
    SetPlayback {
        /// Session id
        id: String,
        /// Playback state label
        state: String,
    },

    /// Make a session's event source fail
    CloseSession {
        /// Session id
        id: String,
    },

    /// Issue a facade command
    Command {
        /// Command name, such as `play` or `cycle_repeat`
        name: String,
        /// Argument for the seek family of commands
        value: Option<f64>,
    },

    /// Wait before the next step
    Sleep {
        /// Milliseconds to wait
        ms: u64,
    },
}

impl Scenario {
    /// Parse a scenario from TOML text
    ///
    /// # Errors
    /// Returns an error if the TOML is invalid or a step refers to an
    /// undeclared session
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scenario: Scenario =
            toml::from_str(content).map_err(|e| NowPlayingError::toml_parse(e, None))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Read and parse a scenario file
    ///
    /// # Errors
    /// Same as [`Scenario::from_toml_str`], plus I/O failures
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let scenario: Scenario =
            toml::from_str(&content).map_err(|e| NowPlayingError::toml_parse(e, Some(path)))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Time given to the poll loops after each step
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Declared session by id
    pub fn session(&self, id: &str) -> Option<&SessionSpec> {
        self.sessions.iter().find(|spec| spec.id == id)
    }

    fn validate(&self) -> Result<()> {
        for (index, spec) in self.sessions.iter().enumerate() {
            if self.sessions[..index].iter().any(|other| other.id == spec.id) {
                return Err(NowPlayingError::Scenario(format!(
                    "session '{}' is declared twice",
                    spec.id
                )));
            }
        }

        for step in &self.steps {
            if let Step::AddSession { id } = step
                && self.session(id).is_none()
            {
                return Err(NowPlayingError::Scenario(format!(
                    "step adds undeclared session '{id}'"
                )));
            }
        }

        Ok(())
    }
}

impl SessionSpec {
    /// Initial in-memory state for this session
    pub fn to_state(&self) -> SessionState {
        let metadata = (!self.title.is_empty() || !self.artist.is_empty()).then(|| {
            Metadata {
                title: self.title.clone(),
                artist: self.artist.clone(),
                artists: vec![self.artist.clone()],
                album: self.album.clone(),
                ..Default::default()
            }
            .with_fingerprint()
        });

        let timeline = if self.length_secs > 0.0 {
            Timeline::new(
                secs(self.length_secs),
                secs(self.position_secs.min(self.length_secs)),
            )
        } else {
            Timeline::default()
        };

        let controllable = self.controllable;

        SessionState {
            metadata,
            capabilities: Capabilities::new(controllable, controllable, controllable, controllable),
            playback_state: PlaybackState::from(self.playback_state.as_str()),
            loop_mode: LoopMode::from(self.loop_mode.as_str()),
            shuffle: self.shuffle,
            timeline,
            ..Default::default()
        }
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_step_kind() {
        let scenario = Scenario::from_toml_str(
            r#"
            denylist = ["B.exe"]
            settle_ms = 5

            [[sessions]]
            id = "A.exe"

            [[steps]]
            action = "add_session"
            id = "A.exe"

            [[steps]]
            action = "remove_session"
            id = "A.exe"

            [[steps]]
            action = "manager_event"
            name = "SessionsChanged"

            [[steps]]
            action = "session_event"
            id = "A.exe"
            name = "PlaybackInfoChanged"

            [[steps]]
            action = "set_active"
            id = "A.exe"

            [[steps]]
            action = "set_system"

            [[steps]]
            action = "set_playback"
            id = "A.exe"
            state = "Paused"

            [[steps]]
            action = "close_session"
            id = "A.exe"

            [[steps]]
            action = "command"
            name = "seek"
            value = 10.0

            [[steps]]
            action = "sleep"
            ms = 1
            "#,
        )
        .unwrap();

        assert_eq!(scenario.steps.len(), 10);
        assert_eq!(scenario.settle(), Duration::from_millis(5));
        assert_eq!(scenario.steps[5], Step::SetSystem { id: None });
        assert_eq!(
            scenario.steps[8],
            Step::Command {
                name: "seek".to_string(),
                value: Some(10.0)
            }
        );
    }

    #[test]
    fn rejects_undeclared_sessions() {
        let err = Scenario::from_toml_str(
            r#"
            [[steps]]
            action = "add_session"
            id = "Ghost.exe"
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, NowPlayingError::Scenario(_)));
    }

    #[test]
    fn rejects_unknown_actions() {
        let err = Scenario::from_toml_str(
            r#"
            [[steps]]
            action = "explode"
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, NowPlayingError::TomlParseError { .. }));
    }

    #[test]
    fn session_spec_builds_state() {
        let scenario = Scenario::from_toml_str(
            r#"
            [[sessions]]
            id = "A.exe"
            playback_state = "Playing"
            title = "Song"
            artist = "Band"
            length_secs = 200
            position_secs = 30
            loop_mode = "Track"
            "#,
        )
        .unwrap();

        let state = scenario.sessions[0].to_state();

        assert_eq!(state.playback_state, PlaybackState::Playing);
        assert_eq!(state.loop_mode, LoopMode::Track);
        assert_eq!(state.timeline.end, Duration::from_secs(200));
        assert_eq!(state.timeline.position, Duration::from_secs(30));
        assert!(state.metadata.and_then(|m| m.id).is_some());
    }
}
