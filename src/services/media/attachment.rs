use std::fmt;
use std::sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicU64, Ordering},
};

use futures::{Stream, StreamExt};

use super::{
    MediaEvent, MediaSession, SessionId, SessionManager,
    monitoring::{MediaEventSender, emit},
};
use crate::services::common::Property;

/// A session bound to the service under a specific generation.
///
/// Two attachments are equal only when they share a generation, so
/// re-attaching the same session still counts as a change.
#[derive(Clone)]
pub(crate) struct Attachment {
    pub(crate) generation: u64,
    pub(crate) session: Arc<dyn MediaSession>,
}

impl PartialEq for Attachment {
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("generation", &self.generation)
            .field("session", &self.session.id())
            .finish()
    }
}

/// Slot holding the currently attached session.
///
/// Written only by the manager poll loop; session poll loops compare their
/// own generation against it once per iteration and before every emission.
pub(crate) struct AttachmentSlot {
    current: Property<Option<Attachment>>,
    generations: AtomicU64,
}

impl AttachmentSlot {
    pub(crate) fn new() -> Self {
        Self {
            current: Property::new(None),
            generations: AtomicU64::new(0),
        }
    }

    /// Attach `session` under a fresh generation, replacing any previous attachment
    pub(crate) fn attach(&self, session: Arc<dyn MediaSession>) -> Attachment {
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let attachment = Attachment {
            generation,
            session,
        };

        self.current.set(Some(attachment.clone()));
        attachment
    }

    pub(crate) fn detach(&self) {
        self.current.set(None);
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.current
            .with(|current| current.as_ref().is_some_and(|a| a.generation == generation))
    }

    /// Emit `event` only if `generation` is still attached.
    ///
    /// The check and the send happen under the slot's read guard, so a
    /// concurrent `attach` or `detach` completes either before the check or
    /// after the send. Returns whether the event was sent.
    pub(crate) fn emit_if_current(
        &self,
        generation: u64,
        events_tx: &MediaEventSender,
        event: MediaEvent,
    ) -> bool {
        self.current.with(|current| {
            let attached = current.as_ref().is_some_and(|a| a.generation == generation);
            if attached {
                emit(events_tx, event);
            }
            attached
        })
    }

    pub(crate) fn session(&self) -> Option<Arc<dyn MediaSession>> {
        self.current
            .with(|current| current.as_ref().map(|a| Arc::clone(&a.session)))
    }

    pub(crate) fn session_id(&self) -> Option<SessionId> {
        self.current
            .with(|current| current.as_ref().map(|a| a.session.id()))
    }

    /// Stream of attached session ids, starting with the current one
    pub(crate) fn watch_ids(&self) -> impl Stream<Item = Option<SessionId>> + Send + use<> {
        self.current
            .watch()
            .map(|current| current.map(|a| a.session.id()))
    }
}

/// Shared reference to the session manager.
///
/// Releasing it is the only way the manager poll loop terminates.
pub(crate) struct ManagerHandle {
    manager: RwLock<Option<Arc<dyn SessionManager>>>,
}

impl ManagerHandle {
    pub(crate) fn new(manager: Arc<dyn SessionManager>) -> Self {
        Self {
            manager: RwLock::new(Some(manager)),
        }
    }

    pub(crate) fn get(&self) -> Option<Arc<dyn SessionManager>> {
        self.manager
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drop the service's reference; returns whether one was held
    pub(crate) fn release(&self) -> bool {
        self.manager
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::media::memory::MemorySession;

    #[test]
    fn reattaching_same_session_bumps_generation() {
        let slot = AttachmentSlot::new();
        let session: Arc<dyn MediaSession> = Arc::new(MemorySession::new("A.exe"));

        let first = slot.attach(Arc::clone(&session));
        let second = slot.attach(session);

        assert!(second.generation > first.generation);
        assert!(!slot.is_current(first.generation));
        assert!(slot.is_current(second.generation));
    }

    #[test]
    fn only_the_attached_generation_can_emit() {
        let slot = AttachmentSlot::new();
        let (events_tx, mut events_rx) = tokio::sync::broadcast::channel(4);
        let stale = slot.attach(Arc::new(MemorySession::new("A.exe")));
        let live = slot.attach(Arc::new(MemorySession::new("B.exe")));

        let event = || MediaEvent::SessionsChanged(Vec::new());

        assert!(!slot.emit_if_current(stale.generation, &events_tx, event()));
        assert!(slot.emit_if_current(live.generation, &events_tx, event()));
        slot.detach();
        assert!(!slot.emit_if_current(live.generation, &events_tx, event()));

        assert_eq!(events_rx.try_recv().unwrap(), event());
        assert!(events_rx.try_recv().is_err());
    }

    #[test]
    fn detach_clears_every_generation() {
        let slot = AttachmentSlot::new();
        let attachment = slot.attach(Arc::new(MemorySession::new("A.exe")));

        slot.detach();

        assert!(!slot.is_current(attachment.generation));
        assert!(slot.session().is_none());
        assert_eq!(slot.session_id(), None);
    }

    #[test]
    fn release_is_one_shot() {
        let handle = ManagerHandle::new(Arc::new(
            crate::services::media::memory::MemorySessionManager::new(),
        ));

        assert!(handle.get().is_some());
        assert!(handle.release());
        assert!(!handle.release());
        assert!(handle.get().is_none());
    }
}
