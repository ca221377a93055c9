use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::debug;

use super::MemorySession;
use crate::services::media::{
    Denylist, ManagerEvent, MediaError, MediaSession, PlaybackState, SessionId, SessionManager,
};

type QueuedEvent = Result<ManagerEvent, MediaError>;

#[derive(Debug, Default)]
struct ManagerState {
    registered: Vec<Arc<MemorySession>>,
    host_current: Option<SessionId>,
    tracked: Vec<Arc<MemorySession>>,
    active: Option<SessionId>,
    system: Option<SessionId>,
}

impl ManagerState {
    fn registered(&self, id: &SessionId) -> Option<Arc<MemorySession>> {
        self.registered.iter().find(|s| &s.id() == id).cloned()
    }

    fn tracked(&self, id: &SessionId) -> Option<Arc<MemorySession>> {
        self.tracked.iter().find(|s| &s.id() == id).cloned()
    }
}

/// In-memory session manager driven from code.
///
/// Sessions are registered with the "host" through [`add_session`] and
/// friends; the tracked set and the active session only change when the
/// manager is asked to refresh, exactly like a native manager reacting to
/// its own notifications.
///
/// A fresh manager has a `SessionsChanged` notification queued so the first
/// poll picks up whatever was registered before it.
///
/// [`add_session`]: MemorySessionManager::add_session
#[derive(Debug)]
pub struct MemorySessionManager {
    state: RwLock<ManagerState>,
    events_tx: mpsc::UnboundedSender<QueuedEvent>,
    events_rx: Mutex<mpsc::UnboundedReceiver<QueuedEvent>>,
}

impl Default for MemorySessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionManager {
    /// Manager with no sessions and a `SessionsChanged` notification queued
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let _ = events_tx.send(Ok(ManagerEvent::SessionsChanged));

        Self {
            state: RwLock::new(ManagerState::default()),
            events_tx,
            events_rx: Mutex::new(events_rx),
        }
    }

    /// Register a session with the host and notify
    pub async fn add_session(&self, session: Arc<MemorySession>) {
        {
            let mut state = self.state.write().await;
            let id = session.id();
            state.registered.retain(|s| s.id() != id);
            state.registered.push(session);
        }
        self.notify(ManagerEvent::SessionsChanged);
    }

    /// Unregister a session from the host and notify; returns whether it was registered
    pub async fn remove_session(&self, id: &SessionId) -> bool {
        let removed = {
            let mut state = self.state.write().await;
            let before = state.registered.len();
            state.registered.retain(|s| &s.id() != id);
            before != state.registered.len()
        };

        if removed {
            self.notify(ManagerEvent::SessionsChanged);
        }
        removed
    }

    /// Registered session by id, for driving it directly
    pub async fn registered_session(&self, id: &SessionId) -> Option<Arc<MemorySession>> {
        self.state.read().await.registered(id)
    }

    /// Change what the host reports as its own current session and notify
    pub async fn set_system_session(&self, id: Option<SessionId>) {
        self.state.write().await.host_current = id;
        self.notify(ManagerEvent::SystemSessionChanged);
    }

    /// Make a tracked session the active one and notify.
    ///
    /// Returns `false` when `id` is not tracked.
    pub async fn set_active(&self, id: Option<SessionId>) -> bool {
        {
            let mut state = self.state.write().await;
            if let Some(id) = &id
                && state.tracked(id).is_none()
            {
                return false;
            }
            state.active = id;
        }

        self.notify(ManagerEvent::ActiveSessionChanged);
        true
    }

    /// Queue a raw notification
    pub fn notify(&self, event: ManagerEvent) {
        let _ = self.events_tx.send(Ok(event));
    }

    /// Make the next poll fail, as if the host went away
    pub fn close(&self, details: impl Into<String>) {
        let _ = self
            .events_tx
            .send(Err(MediaError::ManagerEventSource(details.into())));
    }
}

#[async_trait]
impl SessionManager for MemorySessionManager {
    async fn poll_next_event(&self) -> Result<ManagerEvent, MediaError> {
        let mut events_rx = self.events_rx.lock().await;

        match events_rx.recv().await {
            Some(event) => event,
            None => Err(MediaError::ManagerEventSource(String::from(
                "event queue closed",
            ))),
        }
    }

    async fn active_session(&self) -> Option<Arc<dyn MediaSession>> {
        let state = self.state.read().await;
        let id = state.active.as_ref()?;
        state
            .tracked(id)
            .map(|session| session as Arc<dyn MediaSession>)
    }

    async fn system_session(&self) -> Option<Arc<dyn MediaSession>> {
        let state = self.state.read().await;
        let id = state.system.as_ref()?;
        state
            .registered(id)
            .map(|session| session as Arc<dyn MediaSession>)
    }

    async fn session_ids(&self) -> Vec<SessionId> {
        self.state
            .read()
            .await
            .tracked
            .iter()
            .map(|session| session.id())
            .collect()
    }

    async fn update_system_session(&self) {
        let mut state = self.state.write().await;
        let system = state
            .host_current
            .clone()
            .filter(|id| !id.is_empty() && state.registered(id).is_some());
        state.system = system;
    }

    async fn update_sessions(&self, denylist: &Denylist) {
        let active_changed = {
            let mut state = self.state.write().await;

            let tracked = state
                .registered
                .iter()
                .filter(|session| {
                    let id = session.id();
                    !id.is_empty() && !denylist.contains(&id)
                })
                .cloned()
                .collect();
            state.tracked = tracked;

            // First tracked session that is either the current active one or playing
            let previous = state.active.clone();
            let mut active = None;
            for session in &state.tracked {
                let id = session.id();
                if previous.as_ref() == Some(&id)
                    || session.state().await.playback_state == PlaybackState::Playing
                {
                    active = Some(id);
                    break;
                }
            }
            state.active = active;

            debug!(
                tracked = state.tracked.len(),
                active = ?state.active,
                "Refreshed tracked sessions"
            );
            state.active != previous
        };

        if active_changed {
            self.notify(ManagerEvent::ActiveSessionChanged);
        }
    }
}
