//! Formatting utilities for CLI output.
//!
//! Turns replay entries into one styled line each, and styles errors.

use std::time::Duration;

use super::replay::ReplayEntry;
use crate::services::media::{MediaEvent, PlaybackState, Position, SessionId, Status};

/// ANSI color codes for terminal output
pub struct Colors;

impl Colors {
    /// Reset all formatting
    pub const RESET: &'static str = "\x1b[0m";
    /// Bold text
    pub const BOLD: &'static str = "\x1b[1m";
    /// Dim text
    pub const DIM: &'static str = "\x1b[2m";

    /// Red color
    pub const RED: &'static str = "\x1b[31m";
    /// Green color
    pub const GREEN: &'static str = "\x1b[32m";
    /// Yellow color
    pub const YELLOW: &'static str = "\x1b[33m";
    /// Cyan color
    pub const CYAN: &'static str = "\x1b[36m";
}

/// Formats event names with styling
pub fn format_header(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::CYAN, text, Colors::RESET)
}

/// Formats command names with styling
pub fn format_command(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::GREEN, text, Colors::RESET)
}

/// Formats descriptions with muted styling
pub fn format_description(text: &str) -> String {
    format!("{}{}{}", Colors::DIM, text, Colors::RESET)
}

/// Formats warnings with yellow styling
pub fn format_warning(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::YELLOW, text, Colors::RESET)
}

/// Formats error messages with red styling
pub fn format_error(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::RED, text, Colors::RESET)
}

/// Format duration as MM:SS
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

/// One human-readable line for a replay entry
pub fn format_entry(entry: &ReplayEntry) -> String {
    match entry {
        ReplayEntry::Event(event) => format_event(event),
        ReplayEntry::Command { command, accepted } => {
            let outcome = if *accepted {
                format_description("accepted")
            } else {
                format_warning("ignored")
            };
            format!("{} {outcome}", format_command(command))
        }
    }
}

/// One human-readable line for an event
pub fn format_event(event: &MediaEvent) -> String {
    let details = match event {
        MediaEvent::ActiveSessionChanged(id) | MediaEvent::SystemSessionChanged(id) => {
            format_session(id.as_ref())
        }
        MediaEvent::SessionsChanged(ids) => {
            let ids: Vec<&str> = ids.iter().map(SessionId::as_str).collect();
            format!("[{}]", ids.join(", "))
        }
        MediaEvent::PlaybackInfoChanged(status) | MediaEvent::MediaPropertiesChanged(status) => {
            format_status(status)
        }
        MediaEvent::TimelinePropertiesChanged(position) => format_position(position.as_ref()),
        MediaEvent::Unrecognized { source, .. } => format!("from {source}"),
        MediaEvent::LoopFailed { source, error } => {
            return format!(
                "{} {}",
                format_error(event.name()),
                format_description(&format!("{source}: {error}"))
            );
        }
    };

    format!("{} {details}", format_header(event.name()))
}

fn format_session(id: Option<&SessionId>) -> String {
    id.map_or_else(|| format_description("none"), ToString::to_string)
}

fn format_position(position: Option<&Position>) -> String {
    position.map_or_else(
        || format_description("no timeline"),
        |p| format_duration(p.elapsed),
    )
}

fn format_status(status: &Status) -> String {
    let state = match status.playback_state {
        PlaybackState::Playing => "▶ Playing",
        PlaybackState::Paused => "⏸ Paused",
        PlaybackState::Stopped => "⏹ Stopped",
        other => other.label(),
    };

    let track = status.metadata.as_ref().map_or_else(
        || String::from("(no metadata)"),
        |m| {
            if m.artist.is_empty() {
                m.title.clone()
            } else {
                format!("{} - {}", m.artist, m.title)
            }
        },
    );

    let app = format_session(status.app.as_ref());
    let elapsed = format_position(status.elapsed.as_ref());
    let shuffle = if status.shuffle { "on" } else { "off" };

    format!(
        "{app} {state} {track} {elapsed} {}",
        format_description(&format!(
            "repeat {}, shuffle {shuffle}",
            status.loop_mode
        ))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::media::EventSource;

    #[test]
    fn duration_is_minutes_and_seconds() {
        assert_eq!(format_duration(Duration::from_secs(0)), "00:00");
        assert_eq!(format_duration(Duration::from_secs(125)), "02:05");
    }

    #[test]
    fn sessions_changed_lists_ids_in_order() {
        let event = MediaEvent::SessionsChanged(vec![
            SessionId::from("A.exe"),
            SessionId::from("C.exe"),
        ]);

        assert!(format_event(&event).ends_with("[A.exe, C.exe]"));
    }

    #[test]
    fn loop_failure_is_styled_as_error() {
        let event = MediaEvent::LoopFailed {
            source: EventSource::Manager,
            error: "gone".to_string(),
        };

        let line = format_event(&event);

        assert!(line.starts_with(&format_error("LoopFailed")));
        assert!(line.contains("manager: gone"));
    }

    #[test]
    fn rejected_command_is_marked_ignored() {
        let entry = ReplayEntry::Command {
            command: "play".to_string(),
            accepted: false,
        };

        assert!(format_entry(&entry).contains("ignored"));
    }
}
