use std::sync::Arc;

use async_trait::async_trait;

use super::MediaSession;
use crate::services::media::{Denylist, ManagerEvent, MediaError, SessionId};

/// Host subsystem that tracks media sessions and designates the active one.
///
/// Implementations own the sessions they hand out; callers only keep shared
/// references for as long as a session stays attached.
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Wait for the next manager notification.
    ///
    /// Suspends until the host reports a change. An error means the event
    /// source is gone for good; callers must not retry.
    ///
    /// # Errors
    /// Returns `MediaError::ManagerEventSource` when the host stops delivering events
    async fn poll_next_event(&self) -> Result<ManagerEvent, MediaError>;

    /// Session currently designated as active, if any
    async fn active_session(&self) -> Option<Arc<dyn MediaSession>>;

    /// Session the host itself reports as current, if any
    async fn system_session(&self) -> Option<Arc<dyn MediaSession>>;

    /// Ids of all tracked sessions, in tracking order
    async fn session_ids(&self) -> Vec<SessionId>;

    /// Refresh the record of the host's current session
    async fn update_system_session(&self);

    /// Rebuild the tracked set, leaving out every id in `denylist`
    async fn update_sessions(&self, denylist: &Denylist);
}
