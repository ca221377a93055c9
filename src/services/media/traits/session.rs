use async_trait::async_trait;

use crate::services::media::{LoopMode, MediaError, Position, SessionEvent, SessionId, Status};

/// One subscriber's feed of a session's notifications.
///
/// Every subscription sees every notification raised after it was created,
/// independently of other subscriptions to the same session.
#[async_trait]
pub trait SessionEvents: Send + Sync {
    /// Wait for the next notification of this session.
    ///
    /// # Errors
    /// Returns `MediaError::SessionEventSource` when the session stops delivering events
    async fn poll_next_event(&mut self) -> Result<SessionEvent, MediaError>;
}

/// One media session exposed by the host.
///
/// Control methods report whether the host accepted the request. Seek
/// arguments are in seconds.
#[async_trait]
pub trait MediaSession: Send + Sync {
    /// Identifier of the owning application
    fn id(&self) -> SessionId;

    /// Start receiving this session's notifications
    fn subscribe(&self) -> Box<dyn SessionEvents>;

    /// Full status snapshot
    async fn status(&self) -> Result<Status, MediaError>;

    /// Elapsed position.
    ///
    /// With `current` set, a playing session's position is extrapolated to
    /// now; otherwise the last reported value is returned. `None` when the
    /// session has no timeline.
    async fn position(&self, current: bool) -> Result<Option<Position>, MediaError>;

    /// Start playback
    async fn play(&self) -> Result<bool, MediaError>;

    /// Pause playback
    async fn pause(&self) -> Result<bool, MediaError>;

    /// Toggle between playing and paused
    async fn play_pause(&self) -> Result<bool, MediaError>;

    /// Stop playback
    async fn stop(&self) -> Result<bool, MediaError>;

    /// Skip to the next track
    async fn next(&self) -> Result<bool, MediaError>;

    /// Go back to the previous track
    async fn previous(&self) -> Result<bool, MediaError>;

    /// Current shuffle flag
    async fn shuffle(&self) -> Result<bool, MediaError>;

    /// Request a shuffle flag
    async fn set_shuffle(&self, shuffle: bool) -> Result<bool, MediaError>;

    /// Current repeat mode
    async fn repeat(&self) -> Result<LoopMode, MediaError>;

    /// Request a repeat mode
    async fn set_repeat(&self, mode: LoopMode) -> Result<bool, MediaError>;

    /// Move the position by `offset_secs` relative to the current one
    async fn seek(&self, offset_secs: f64) -> Result<bool, MediaError>;

    /// Move to `percentage` (0.0 to 1.0) of the track length
    async fn seek_percentage(&self, percentage: f64) -> Result<bool, MediaError>;

    /// Move to an absolute position
    async fn set_position(&self, position_secs: f64) -> Result<bool, MediaError>;
}
