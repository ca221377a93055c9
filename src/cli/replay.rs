//! Runs a [`Scenario`] against a [`MediaService`] backed by the in-memory
//! collaborator and records what the service published.

use std::{collections::HashMap, sync::Arc};

use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, instrument, warn};

use super::scenario::{Scenario, Step};
use crate::{
    NowPlayingError, Result,
    services::media::{
        Config, Denylist, ManagerEvent, MediaEvent, MediaService, PlaybackState, SessionEvent,
        SessionId, SessionManager,
        memory::{MemorySession, MemorySessionManager},
    },
};

/// One line of replay output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReplayEntry {
    /// An event published by the service
    Event(MediaEvent),

    /// Outcome of a facade command
    Command {
        /// Command name
        command: String,
        /// Whether the attached session accepted it
        accepted: bool,
    },
}

/// Run `scenario` and return every event and command outcome in order.
///
/// `denylist` is combined with the scenario's own denylist.
///
/// # Errors
/// Returns an error when a step names an unknown command or a session that
/// was never declared
#[instrument(skip_all, fields(steps = scenario.steps.len()))]
pub async fn replay(scenario: &Scenario, denylist: &[String]) -> Result<Vec<ReplayEntry>> {
    let manager = Arc::new(MemorySessionManager::new());
    let sessions: HashMap<SessionId, Arc<MemorySession>> = scenario
        .sessions
        .iter()
        .map(|spec| {
            let session = MemorySession::with_state(spec.id.as_str(), spec.to_state());
            (SessionId::from(spec.id.as_str()), Arc::new(session))
        })
        .collect();

    let config = Config {
        denylist: Denylist::new(denylist.iter().chain(&scenario.denylist).map(String::as_str)),
        ..Config::default()
    };
    let service = MediaService::start(Arc::clone(&manager) as Arc<dyn SessionManager>, config);
    let mut events = service.subscribe();

    let mut entries = Vec::new();
    info!("Replaying scenario");

    for step in &scenario.steps {
        debug!(?step, "Running step");
        if let Some(entry) = run_step(step, &service, &manager, &sessions).await? {
            entries.push(entry);
        }

        tokio::time::sleep(scenario.settle()).await;
        drain(&mut events, &mut entries);
    }

    service.shutdown();
    drain(&mut events, &mut entries);

    Ok(entries)
}

async fn run_step(
    step: &Step,
    service: &MediaService,
    manager: &MemorySessionManager,
    sessions: &HashMap<SessionId, Arc<MemorySession>>,
) -> Result<Option<ReplayEntry>> {
    let session = |id: &str| {
        sessions
            .get(&SessionId::from(id))
            .cloned()
            .ok_or_else(|| NowPlayingError::Scenario(format!("unknown session '{id}'")))
    };

    match step {
        Step::AddSession { id } => manager.add_session(session(id)?).await,
        Step::RemoveSession { id } => {
            if !manager.remove_session(&SessionId::from(id.as_str())).await {
                warn!(session = %id, "Removing a session that is not registered");
            }
        }
        Step::ManagerEvent { name } => manager.notify(ManagerEvent::from(name.as_str())),
        Step::SessionEvent { id, name } => session(id)?.emit(SessionEvent::from(name.as_str())),
        Step::SetActive { id } => {
            if !manager.set_active(id.as_deref().map(SessionId::from)).await {
                warn!(session = ?id, "Cannot activate a session that is not tracked");
            }
        }
        Step::SetSystem { id } => {
            manager
                .set_system_session(id.as_deref().map(SessionId::from))
                .await;
        }
        Step::SetPlayback { id, state } => {
            session(id)?
                .set_playback_state(PlaybackState::from(state.as_str()))
                .await;
        }
        Step::CloseSession { id } => session(id)?.close("closed by scenario"),
        Step::Command { name, value } => {
            let accepted = run_command(service, name, *value).await?;
            return Ok(Some(ReplayEntry::Command {
                command: name.clone(),
                accepted,
            }));
        }
        Step::Sleep { ms } => tokio::time::sleep(std::time::Duration::from_millis(*ms)).await,
    }

    Ok(None)
}

async fn run_command(service: &MediaService, name: &str, value: Option<f64>) -> Result<bool> {
    let argument = || {
        value.ok_or_else(|| NowPlayingError::Scenario(format!("command '{name}' needs a value")))
    };

    let accepted = match name {
        "play" => service.play().await,
        "pause" => service.pause().await,
        "play_pause" => service.play_pause().await,
        "stop" => service.stop().await,
        "next" => service.next().await,
        "previous" => service.previous().await,
        "seek" => service.seek(argument()?).await,
        "seek_percentage" => service.seek_percentage(argument()?).await,
        "set_position" => service.set_position(argument()?).await,
        "toggle_shuffle" => service.toggle_shuffle().await,
        "cycle_repeat" => service.cycle_repeat().await,
        other => {
            return Err(NowPlayingError::Scenario(format!(
                "unknown command '{other}'"
            )));
        }
    };

    Ok(accepted)
}

fn drain(events: &mut broadcast::Receiver<MediaEvent>, entries: &mut Vec<ReplayEntry>) {
    loop {
        match events.try_recv() {
            Ok(event) => entries.push(ReplayEntry::Event(event)),
            Err(TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "Replay fell behind, events were dropped");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}
