use std::fmt;

use serde::Serialize;

use super::{Position, SessionId, Status};

/// Raw notification delivered by the session manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerEvent {
    /// The host picked a different active session (or none)
    ActiveSessionChanged,

    /// The session the host itself considers current changed
    SystemSessionChanged,

    /// Sessions were added to or removed from the host
    SessionsChanged,

    /// A notification this crate does not know
    Unrecognized(String),
}

impl From<&str> for ManagerEvent {
    fn from(name: &str) -> Self {
        match name {
            "ActiveSessionChanged" => Self::ActiveSessionChanged,
            "SystemSessionChanged" => Self::SystemSessionChanged,
            "SessionsChanged" => Self::SessionsChanged,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl ManagerEvent {
    /// Event name as reported by the host
    pub fn name(&self) -> &str {
        match self {
            Self::ActiveSessionChanged => "ActiveSessionChanged",
            Self::SystemSessionChanged => "SystemSessionChanged",
            Self::SessionsChanged => "SessionsChanged",
            Self::Unrecognized(name) => name,
        }
    }
}

/// Raw notification delivered by a single session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Playback state, shuffle, repeat or controls changed
    PlaybackInfoChanged,

    /// Timeline (position, start, end) changed
    TimelinePropertiesChanged,

    /// Track metadata changed
    MediaPropertiesChanged,

    /// A notification this crate does not know
    Unrecognized(String),
}

impl From<&str> for SessionEvent {
    fn from(name: &str) -> Self {
        match name {
            "PlaybackInfoChanged" => Self::PlaybackInfoChanged,
            "TimelinePropertiesChanged" => Self::TimelinePropertiesChanged,
            "MediaPropertiesChanged" => Self::MediaPropertiesChanged,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl SessionEvent {
    /// Event name as reported by the host
    pub fn name(&self) -> &str {
        match self {
            Self::PlaybackInfoChanged => "PlaybackInfoChanged",
            Self::TimelinePropertiesChanged => "TimelinePropertiesChanged",
            Self::MediaPropertiesChanged => "MediaPropertiesChanged",
            Self::Unrecognized(name) => name,
        }
    }
}

/// Which poll loop an event or failure came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "session", rename_all = "snake_case")]
pub enum EventSource {
    /// The session manager loop
    Manager,

    /// The loop relaying the given session
    Session(SessionId),
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manager => write!(f, "manager"),
            Self::Session(id) => write!(f, "session {id}"),
        }
    }
}

/// Normalized events published by [`MediaService`](super::MediaService)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum MediaEvent {
    /// The attached session changed; carries the new session's id
    ActiveSessionChanged(Option<SessionId>),

    /// The host's own current session changed
    SystemSessionChanged(Option<SessionId>),

    /// The tracked set changed; ids in tracking order
    SessionsChanged(Vec<SessionId>),

    /// Playback info of the attached session changed
    PlaybackInfoChanged(Status),

    /// Timeline of the attached session changed
    TimelinePropertiesChanged(Option<Position>),

    /// Track metadata of the attached session changed
    MediaPropertiesChanged(Status),

    /// A notification the crate passes through without reacting to it
    Unrecognized {
        /// Loop that received it
        source: EventSource,
        /// Raw event name
        name: String,
    },

    /// A poll loop stopped because its event source failed
    LoopFailed {
        /// Loop that stopped
        source: EventSource,
        /// Failure description
        error: String,
    },
}

impl MediaEvent {
    /// Event name, matching the raw collaborator name where one exists
    pub fn name(&self) -> &str {
        match self {
            Self::ActiveSessionChanged(_) => "ActiveSessionChanged",
            Self::SystemSessionChanged(_) => "SystemSessionChanged",
            Self::SessionsChanged(_) => "SessionsChanged",
            Self::PlaybackInfoChanged(_) => "PlaybackInfoChanged",
            Self::TimelinePropertiesChanged(_) => "TimelinePropertiesChanged",
            Self::MediaPropertiesChanged(_) => "MediaPropertiesChanged",
            Self::Unrecognized { name, .. } => name,
            Self::LoopFailed { .. } => "LoopFailed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_event_names_round_trip() {
        for name in ["ActiveSessionChanged", "SystemSessionChanged", "SessionsChanged"] {
            assert_eq!(ManagerEvent::from(name).name(), name);
        }
    }

    #[test]
    fn unknown_names_are_kept_verbatim() {
        assert_eq!(
            ManagerEvent::from("None"),
            ManagerEvent::Unrecognized("None".to_string())
        );
        assert_eq!(SessionEvent::from("Bogus").name(), "Bogus");
    }

    #[test]
    fn media_event_serializes_with_name_and_payload() {
        let event = MediaEvent::SessionsChanged(vec![SessionId::from("A.exe")]);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "SessionsChanged");
        assert_eq!(json["payload"][0], "A.exe");
    }
}
