use super::SessionId;

/// Errors that can occur during media operations
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MediaError {
    /// The session manager stopped delivering events
    #[error("session manager event source failed: {0}")]
    ManagerEventSource(String),

    /// A session stopped delivering events
    #[error("event source for session {session} failed: {details}")]
    SessionEventSource {
        /// Session whose event source failed
        session: SessionId,
        /// Failure details reported by the host
        details: String,
    },

    /// The session is no longer known to the host
    #[error("session {0} is gone")]
    SessionGone(SessionId),

    /// The session rejected or failed a control request
    #[error("session {session} failed to {operation}: {details}")]
    ControlFailed {
        /// Session that was controlled
        session: SessionId,
        /// Name of the failed operation
        operation: String,
        /// Failure details reported by the host
        details: String,
    },

    /// A query against the session failed
    #[error("failed to query {what} from session {session}: {details}")]
    QueryFailed {
        /// Session that was queried
        session: SessionId,
        /// What was queried
        what: String,
        /// Failure details reported by the host
        details: String,
    },
}
