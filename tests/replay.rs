//! Integration tests for the scenario replay harness.

#![cfg_attr(test, allow(clippy::unwrap_used))]

use nowplaying::{
    NowPlayingError,
    cli::{ReplayEntry, Scenario, replay},
    services::media::{LoopMode, MediaEvent, SessionId},
};

fn events(entries: &[ReplayEntry]) -> Vec<&MediaEvent> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            ReplayEntry::Event(event) => Some(event),
            ReplayEntry::Command { .. } => None,
        })
        .collect()
}

fn commands(entries: &[ReplayEntry]) -> Vec<(&str, bool)> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            ReplayEntry::Command { command, accepted } => Some((command.as_str(), *accepted)),
            ReplayEntry::Event(_) => None,
        })
        .collect()
}

#[tokio::test]
async fn denylisted_session_never_shows_up() {
    let scenario = Scenario::from_toml_str(
        r#"
        denylist = ["B.exe"]
        settle_ms = 20

        [[sessions]]
        id = "A.exe"
        playback_state = "Playing"

        [[sessions]]
        id = "B.exe"
        playback_state = "Playing"

        [[steps]]
        action = "add_session"
        id = "A.exe"

        [[steps]]
        action = "add_session"
        id = "B.exe"
        "#,
    )
    .unwrap();

    let entries = replay(&scenario, &[]).await.unwrap();
    let events = events(&entries);

    let last_tracked = events
        .iter()
        .rev()
        .find_map(|event| match event {
            MediaEvent::SessionsChanged(ids) => Some(ids.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(last_tracked, vec![SessionId::from("A.exe")]);
    assert!(events.contains(&&MediaEvent::ActiveSessionChanged(Some(SessionId::from("A.exe")))));
    assert!(!events.contains(&&MediaEvent::ActiveSessionChanged(Some(SessionId::from("B.exe")))));
}

#[tokio::test]
async fn configured_denylist_is_combined_with_the_scenario() {
    let scenario = Scenario::from_toml_str(
        r#"
        settle_ms = 20

        [[sessions]]
        id = "A.exe"

        [[sessions]]
        id = "B.exe"

        [[steps]]
        action = "add_session"
        id = "A.exe"

        [[steps]]
        action = "add_session"
        id = "B.exe"
        "#,
    )
    .unwrap();

    let entries = replay(&scenario, &["A.exe".to_string()]).await.unwrap();

    assert!(events(&entries).contains(&&MediaEvent::SessionsChanged(vec![SessionId::from("B.exe")])));
}

#[tokio::test]
async fn commands_are_recorded_with_their_outcome() {
    let scenario = Scenario::from_toml_str(
        r#"
        settle_ms = 20

        [[sessions]]
        id = "A.exe"
        playback_state = "Playing"
        title = "Song"
        length_secs = 180

        [[steps]]
        action = "command"
        name = "play"

        [[steps]]
        action = "add_session"
        id = "A.exe"

        [[steps]]
        action = "command"
        name = "cycle_repeat"

        [[steps]]
        action = "command"
        name = "set_position"
        value = 60.0
        "#,
    )
    .unwrap();

    let entries = replay(&scenario, &[]).await.unwrap();

    assert_eq!(
        commands(&entries),
        vec![("play", false), ("cycle_repeat", true), ("set_position", true)]
    );
    let repeat = events(&entries).into_iter().find_map(|event| match event {
        MediaEvent::PlaybackInfoChanged(status) => Some(status.loop_mode.clone()),
        _ => None,
    });
    assert_eq!(repeat, Some(LoopMode::Track));
    assert!(
        events(&entries)
            .iter()
            .any(|event| matches!(event, MediaEvent::TimelinePropertiesChanged(Some(_))))
    );
}

#[tokio::test]
async fn unknown_commands_fail_the_replay() {
    let scenario = Scenario::from_toml_str(
        r#"
        [[steps]]
        action = "command"
        name = "rewind"
        "#,
    )
    .unwrap();

    let err = replay(&scenario, &[]).await.unwrap_err();

    assert!(matches!(err, NowPlayingError::Scenario(_)));
}

#[tokio::test]
async fn json_lines_use_event_names() {
    let scenario = Scenario::from_toml_str(
        r#"
        settle_ms = 20

        [[steps]]
        action = "manager_event"
        name = "Mystery"
        "#,
    )
    .unwrap();

    let entries = replay(&scenario, &[]).await.unwrap();
    let lines: Vec<serde_json::Value> = entries
        .iter()
        .map(|entry| serde_json::to_value(entry).unwrap())
        .collect();

    assert!(lines.iter().any(|line| line["event"] == "SessionsChanged"));
    assert!(lines.iter().any(|line| {
        line["event"] == "Unrecognized"
            && line["payload"]["name"] == "Mystery"
            && line["payload"]["source"]["kind"] == "manager"
    }));
}
