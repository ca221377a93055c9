use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use super::{MediaEventSender, SessionMonitoring, emit};
use crate::services::media::{
    Denylist, EventSource, ManagerEvent, MediaEvent, SessionEvents, SessionId, SessionManager,
    attachment::{Attachment, AttachmentSlot, ManagerHandle},
};

/// Relays session manager events and keeps the attached session current.
///
/// Runs until the service releases its manager reference or the manager's
/// event source fails. Only this loop attaches sessions.
pub(crate) struct ManagerMonitoring {
    manager: Arc<ManagerHandle>,
    slot: Arc<AttachmentSlot>,
    denylist: Denylist,
    events_tx: MediaEventSender,
}

impl ManagerMonitoring {
    /// Spawn the manager poll loop
    pub(crate) fn start(
        manager: Arc<ManagerHandle>,
        slot: Arc<AttachmentSlot>,
        denylist: Denylist,
        events_tx: MediaEventSender,
    ) -> JoinHandle<()> {
        let monitoring = Self {
            manager,
            slot,
            denylist,
            events_tx,
        };

        tokio::spawn(monitoring.run())
    }

    #[instrument(skip(self))]
    async fn run(self) {
        info!("Manager poll loop started");

        while let Some(manager) = self.manager.get() {
            let event = match manager.poll_next_event().await {
                Ok(event) => event,
                Err(err) => {
                    error!(error = %err, "Session manager event source failed, stopping");
                    emit(
                        &self.events_tx,
                        MediaEvent::LoopFailed {
                            source: EventSource::Manager,
                            error: err.to_string(),
                        },
                    );
                    break;
                }
            };

            if self.manager.get().is_none() {
                debug!(event = event.name(), "Manager released while waiting, discarding");
                break;
            }

            match event {
                ManagerEvent::ActiveSessionChanged => {
                    self.handle_active_session_changed(manager.as_ref()).await;
                }
                ManagerEvent::SystemSessionChanged => {
                    manager.update_system_session().await;
                    let system = manager.system_session().await.map(|session| session.id());
                    debug!(?system, "System session changed");
                    emit(&self.events_tx, MediaEvent::SystemSessionChanged(system));
                }
                ManagerEvent::SessionsChanged => {
                    manager.update_sessions(&self.denylist).await;
                    let tracked = self.tracked_ids(manager.as_ref()).await;
                    debug!(count = tracked.len(), "Tracked sessions changed");
                    emit(&self.events_tx, MediaEvent::SessionsChanged(tracked));
                }
                ManagerEvent::Unrecognized(name) => {
                    debug!(event = %name, "Passing through unrecognized manager event");
                    emit(
                        &self.events_tx,
                        MediaEvent::Unrecognized {
                            source: EventSource::Manager,
                            name,
                        },
                    );
                }
            }
        }

        info!("Manager poll loop ended");
    }

    async fn handle_active_session_changed(&self, manager: &dyn SessionManager) {
        self.slot.detach();

        let active = manager
            .active_session()
            .await
            .filter(|session| !self.denylist.contains(&session.id()));

        let Some(session) = active else {
            debug!("No active session to attach");
            emit(&self.events_tx, MediaEvent::ActiveSessionChanged(None));
            return;
        };

        // Subscribe before announcing so nothing raised after the announcement is missed
        let events = session.subscribe();
        let attachment = self.slot.attach(session);
        let id = attachment.session.id();
        debug!(session = %id, generation = attachment.generation, "Attached session");

        emit(&self.events_tx, MediaEvent::ActiveSessionChanged(Some(id)));
        self.start_session_loop(attachment, events);
    }

    fn start_session_loop(&self, attachment: Attachment, events: Box<dyn SessionEvents>) {
        SessionMonitoring::start(
            attachment,
            events,
            Arc::clone(&self.slot),
            self.events_tx.clone(),
        );
    }

    async fn tracked_ids(&self, manager: &dyn SessionManager) -> Vec<SessionId> {
        manager
            .session_ids()
            .await
            .into_iter()
            .filter(|id| !id.is_empty() && !self.denylist.contains(id))
            .collect()
    }
}
