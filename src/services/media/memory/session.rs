use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{
    RwLock,
    broadcast::{self, error::RecvError},
};
use tracing::debug;

use crate::services::media::{
    Capabilities, LoopMode, MediaError, MediaSession, Metadata, PlaybackState, Position,
    SessionEvent, SessionEvents, SessionId, Status,
};

const NOTIFICATION_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
enum Notification {
    Event(SessionEvent),
    Closed(String),
}

/// Start, end and position of the current track, as a host reports them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeline {
    /// Start of the seekable range
    pub start: Duration,

    /// End of the seekable range; zero when the session has no timeline
    pub end: Duration,

    /// Last reported position
    pub position: Duration,

    /// When `position` was reported
    pub last_updated: DateTime<Utc>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            start: Duration::ZERO,
            end: Duration::ZERO,
            position: Duration::ZERO,
            last_updated: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl Timeline {
    /// Timeline of a track `length` long, positioned at `position` right now
    pub fn new(length: Duration, position: Duration) -> Self {
        Self {
            start: Duration::ZERO,
            end: length,
            position,
            last_updated: Utc::now(),
        }
    }

    fn length(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }
}

/// Mutable state behind a [`MemorySession`]
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Track metadata
    pub metadata: Option<Metadata>,

    /// Controls the session accepts
    pub capabilities: Capabilities,

    /// Playback state
    pub playback_state: PlaybackState,

    /// Repeat mode
    pub loop_mode: LoopMode,

    /// Shuffle flag
    pub shuffle: bool,

    /// Volume, negative when unknown
    pub volume: f64,

    /// Timeline of the current track
    pub timeline: Timeline,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            metadata: None,
            capabilities: Capabilities::new(true, true, true, true),
            playback_state: PlaybackState::Stopped,
            loop_mode: LoopMode::None,
            shuffle: false,
            volume: -1.0,
            timeline: Timeline::default(),
        }
    }
}

impl SessionState {
    fn position(&self, current: bool, now: DateTime<Utc>) -> Option<Position> {
        let timeline = &self.timeline;
        if timeline.end.is_zero() {
            return None;
        }

        let raw = Position {
            elapsed: timeline.position.saturating_sub(timeline.start),
            measured_at: timeline.last_updated,
        };

        if current && self.playback_state == PlaybackState::Playing {
            Some(raw.extrapolated_to(now))
        } else {
            Some(raw)
        }
    }

    /// Pin the timeline to the extrapolated position so it stays correct
    /// across a playback state change
    fn settle_timeline(&mut self, now: DateTime<Utc>) {
        if let Some(current) = self.position(true, now) {
            self.timeline.position = self.timeline.start + current.elapsed;
            self.timeline.last_updated = now;
        }
    }
}

/// In-memory media session driven from code.
///
/// Transport commands change the state the way a well-behaved player would
/// and raise the notification a host would send for that change. Every
/// subscription receives every notification raised after it subscribed.
#[derive(Debug)]
pub struct MemorySession {
    id: SessionId,
    state: RwLock<SessionState>,
    events_tx: broadcast::Sender<Notification>,
    closed: OnceLock<String>,
    pending_polls: Arc<AtomicUsize>,
}

impl MemorySession {
    /// Stopped session with every control available
    pub fn new(id: impl Into<SessionId>) -> Self {
        Self::with_state(id, SessionState::default())
    }

    /// Session starting from `state`
    pub fn with_state(id: impl Into<SessionId>, state: SessionState) -> Self {
        let (events_tx, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        Self {
            id: id.into(),
            state: RwLock::new(state),
            events_tx,
            closed: OnceLock::new(),
            pending_polls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Change the state without raising any notification
    pub async fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.state.write().await;
        f(&mut state)
    }

    /// Raise a raw notification to every subscription
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.events_tx.send(Notification::Event(event));
    }

    /// Fail every poll from now on, as if the host dropped the session.
    ///
    /// Only the first call's `details` are kept.
    pub fn close(&self, details: impl Into<String>) {
        let details = details.into();
        if self.closed.set(details.clone()).is_ok() {
            let _ = self.events_tx.send(Notification::Closed(details));
        }
    }

    /// Replace the track metadata and notify
    pub async fn set_metadata(&self, metadata: Metadata) {
        self.update(|state| state.metadata = Some(metadata)).await;
        self.emit(SessionEvent::MediaPropertiesChanged);
    }

    /// Replace the playback state and notify
    pub async fn set_playback_state(&self, playback_state: PlaybackState) {
        self.update(|state| {
            state.settle_timeline(Utc::now());
            state.playback_state = playback_state;
        })
        .await;
        self.emit(SessionEvent::PlaybackInfoChanged);
    }

    /// Replace the timeline and notify
    pub async fn set_timeline(&self, timeline: Timeline) {
        self.update(|state| state.timeline = timeline).await;
        self.emit(SessionEvent::TimelinePropertiesChanged);
    }

    /// Number of subscriptions currently waiting in `poll_next_event`
    pub fn pending_polls(&self) -> usize {
        self.pending_polls.load(Ordering::SeqCst)
    }

    async fn transition(&self, allowed: impl FnOnce(&Capabilities) -> bool, target: PlaybackState) -> bool {
        let accepted = self
            .update(|state| {
                if !allowed(&state.capabilities) {
                    return false;
                }
                state.settle_timeline(Utc::now());
                state.playback_state = target;
                true
            })
            .await;

        if accepted {
            self.emit(SessionEvent::PlaybackInfoChanged);
        }
        accepted
    }

    async fn skip(&self, allowed: impl FnOnce(&Capabilities) -> bool) -> bool {
        let accepted = self
            .update(|state| {
                if !allowed(&state.capabilities) {
                    return false;
                }
                state.timeline.position = state.timeline.start;
                state.timeline.last_updated = Utc::now();
                true
            })
            .await;

        if accepted {
            self.emit(SessionEvent::MediaPropertiesChanged);
            self.emit(SessionEvent::TimelinePropertiesChanged);
        }
        accepted
    }

    async fn move_to(&self, target: impl FnOnce(&SessionState) -> f64) -> bool {
        let accepted = self
            .update(|state| {
                if !state.capabilities.can_seek || state.timeline.end.is_zero() {
                    return false;
                }

                let offset_secs = target(state);
                if !offset_secs.is_finite() || offset_secs < 0.0 {
                    return false;
                }

                let length = state.timeline.length();
                let offset = if offset_secs >= length.as_secs_f64() {
                    length
                } else {
                    Duration::from_secs_f64(offset_secs)
                };
                state.timeline.position = state.timeline.start + offset;
                state.timeline.last_updated = Utc::now();
                true
            })
            .await;

        if accepted {
            self.emit(SessionEvent::TimelinePropertiesChanged);
        }
        accepted
    }
}

/// Subscription handed out by [`MemorySession::subscribe`]
struct MemorySubscription {
    session: SessionId,
    events_rx: broadcast::Receiver<Notification>,
    closed: Option<String>,
    pending_polls: Arc<AtomicUsize>,
}

impl MemorySubscription {
    fn failure(&self, details: String) -> MediaError {
        MediaError::SessionEventSource {
            session: self.session.clone(),
            details,
        }
    }
}

#[async_trait]
impl SessionEvents for MemorySubscription {
    async fn poll_next_event(&mut self) -> Result<SessionEvent, MediaError> {
        let _pending = PendingPoll::enter(&self.pending_polls);

        loop {
            if let Some(details) = self.closed.clone() {
                return Err(self.failure(details));
            }

            match self.events_rx.recv().await {
                Ok(Notification::Event(event)) => return Ok(event),
                Ok(Notification::Closed(details)) => self.closed = Some(details),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(session = %self.session, skipped, "Subscription lagged");
                }
                Err(RecvError::Closed) => {
                    return Err(self.failure(String::from("event queue closed")));
                }
            }
        }
    }
}

struct PendingPoll<'a>(&'a AtomicUsize);

impl<'a> PendingPoll<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingPoll<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaSession for MemorySession {
    fn id(&self) -> SessionId {
        self.id.clone()
    }

    fn subscribe(&self) -> Box<dyn SessionEvents> {
        Box::new(MemorySubscription {
            session: self.id.clone(),
            events_rx: self.events_tx.subscribe(),
            closed: self.closed.get().cloned(),
            pending_polls: Arc::clone(&self.pending_polls),
        })
    }

    async fn status(&self) -> Result<Status, MediaError> {
        let state = self.state.read().await;
        let mut capabilities = state.capabilities;
        if state.timeline.end.is_zero() {
            capabilities.can_seek = false;
        }
        let capabilities = Capabilities::new(
            capabilities.can_play_pause,
            capabilities.can_go_next,
            capabilities.can_go_previous,
            capabilities.can_seek,
        );

        let metadata = state.metadata.clone().map(|metadata| Metadata {
            length: state.timeline.length(),
            ..metadata
        });

        Ok(Status {
            metadata,
            capabilities,
            playback_state: state.playback_state,
            loop_mode: state.loop_mode.clone(),
            shuffle: state.shuffle,
            volume: state.volume,
            elapsed: state.position(false, Utc::now()),
            app: Some(self.id.clone()),
        })
    }

    async fn position(&self, current: bool) -> Result<Option<Position>, MediaError> {
        Ok(self.state.read().await.position(current, Utc::now()))
    }

    async fn play(&self) -> Result<bool, MediaError> {
        Ok(self
            .transition(|caps| caps.can_play_pause, PlaybackState::Playing)
            .await)
    }

    async fn pause(&self) -> Result<bool, MediaError> {
        Ok(self
            .transition(|caps| caps.can_play_pause, PlaybackState::Paused)
            .await)
    }

    async fn play_pause(&self) -> Result<bool, MediaError> {
        let target = match self.state.read().await.playback_state {
            PlaybackState::Playing => PlaybackState::Paused,
            _ => PlaybackState::Playing,
        };
        Ok(self.transition(|caps| caps.can_play_pause, target).await)
    }

    async fn stop(&self) -> Result<bool, MediaError> {
        let accepted = self
            .transition(|caps| caps.can_play_pause, PlaybackState::Stopped)
            .await;
        if accepted {
            self.update(|state| state.timeline.position = state.timeline.start)
                .await;
        }
        Ok(accepted)
    }

    async fn next(&self) -> Result<bool, MediaError> {
        Ok(self.skip(|caps| caps.can_go_next).await)
    }

    async fn previous(&self) -> Result<bool, MediaError> {
        Ok(self.skip(|caps| caps.can_go_previous).await)
    }

    async fn shuffle(&self) -> Result<bool, MediaError> {
        Ok(self.state.read().await.shuffle)
    }

    async fn set_shuffle(&self, shuffle: bool) -> Result<bool, MediaError> {
        self.update(|state| state.shuffle = shuffle).await;
        self.emit(SessionEvent::PlaybackInfoChanged);
        Ok(true)
    }

    async fn repeat(&self) -> Result<LoopMode, MediaError> {
        Ok(self.state.read().await.loop_mode.clone())
    }

    async fn set_repeat(&self, mode: LoopMode) -> Result<bool, MediaError> {
        if let LoopMode::Unrecognized(label) = &mode {
            debug!(session = %self.id, %label, "Rejecting unknown repeat mode");
            return Ok(false);
        }

        self.update(|state| state.loop_mode = mode).await;
        self.emit(SessionEvent::PlaybackInfoChanged);
        Ok(true)
    }

    async fn seek(&self, offset_secs: f64) -> Result<bool, MediaError> {
        Ok(self
            .move_to(|state| {
                let current = state.timeline.position.saturating_sub(state.timeline.start);
                current.as_secs_f64() + offset_secs
            })
            .await)
    }

    async fn seek_percentage(&self, percentage: f64) -> Result<bool, MediaError> {
        Ok(self
            .move_to(|state| state.timeline.length().as_secs_f64() * percentage)
            .await)
    }

    async fn set_position(&self, position_secs: f64) -> Result<bool, MediaError> {
        Ok(self.move_to(|_| position_secs).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_at(position: u64) -> SessionState {
        SessionState {
            playback_state: PlaybackState::Playing,
            timeline: Timeline::new(Duration::from_secs(200), Duration::from_secs(position)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn no_timeline_means_no_position() {
        let session = MemorySession::new("A.exe");

        assert_eq!(session.position(true).await.unwrap(), None);
        assert!(!session.status().await.unwrap().capabilities.can_seek);
    }

    #[tokio::test]
    async fn paused_position_is_not_extrapolated() {
        let mut state = playing_at(30);
        state.playback_state = PlaybackState::Paused;
        state.timeline.last_updated = Utc::now() - chrono::Duration::seconds(10);
        let session = MemorySession::with_state("A.exe", state);

        let position = session.position(true).await.unwrap().unwrap();

        assert_eq!(position.elapsed, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn playing_position_is_extrapolated() {
        let mut state = playing_at(30);
        state.timeline.last_updated = Utc::now() - chrono::Duration::seconds(10);
        let session = MemorySession::with_state("A.exe", state);

        let raw = session.position(false).await.unwrap().unwrap();
        let current = session.position(true).await.unwrap().unwrap();

        assert_eq!(raw.elapsed, Duration::from_secs(30));
        assert!(current.elapsed >= Duration::from_secs(40));
    }

    #[tokio::test]
    async fn seek_is_relative_to_reported_position() {
        let session = MemorySession::with_state("A.exe", playing_at(30));
        let mut events = session.subscribe();

        assert!(session.seek(15.0).await.unwrap());

        assert_eq!(session.state().await.timeline.position, Duration::from_secs(45));
        assert_eq!(
            events.poll_next_event().await.unwrap(),
            SessionEvent::TimelinePropertiesChanged
        );
    }

    #[tokio::test]
    async fn huge_targets_clamp_to_track_end() {
        let session = MemorySession::with_state("A.exe", playing_at(30));

        assert!(session.seek(1e300).await.unwrap());
        assert_eq!(session.state().await.timeline.position, Duration::from_secs(200));

        assert!(session.set_position(f64::MAX).await.unwrap());
        assert!(session.seek_percentage(1e300).await.unwrap());
        assert_eq!(session.state().await.timeline.position, Duration::from_secs(200));
        assert!(!session.seek(f64::INFINITY).await.unwrap());
    }

    #[tokio::test]
    async fn seek_percentage_targets_share_of_length() {
        let session = MemorySession::with_state("A.exe", playing_at(0));

        assert!(session.seek_percentage(0.25).await.unwrap());

        assert_eq!(session.state().await.timeline.position, Duration::from_secs(50));
    }

    #[tokio::test]
    async fn negative_position_is_rejected() {
        let session = MemorySession::with_state("A.exe", playing_at(30));

        assert!(!session.set_position(-1.0).await.unwrap());
        assert_eq!(session.state().await.timeline.position, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn play_requires_play_pause_control() {
        let state = SessionState {
            capabilities: Capabilities::new(false, true, true, true),
            ..Default::default()
        };
        let session = MemorySession::with_state("A.exe", state);

        assert!(!session.play().await.unwrap());
        assert_eq!(session.state().await.playback_state, PlaybackState::Stopped);
    }

    #[tokio::test]
    async fn close_fails_current_and_later_subscriptions() {
        let session = MemorySession::new("A.exe");
        let mut before = session.subscribe();
        session.close("gone");
        let mut after = session.subscribe();

        let err = before.poll_next_event().await.unwrap_err();
        assert!(matches!(err, MediaError::SessionEventSource { .. }));
        assert!(before.poll_next_event().await.is_err());
        assert!(after.poll_next_event().await.is_err());
        assert_eq!(session.pending_polls(), 0);
    }

    #[tokio::test]
    async fn every_subscription_sees_every_notification() {
        let session = MemorySession::new("A.exe");
        let mut first = session.subscribe();
        let mut second = session.subscribe();

        session.emit(SessionEvent::PlaybackInfoChanged);

        assert_eq!(
            first.poll_next_event().await.unwrap(),
            SessionEvent::PlaybackInfoChanged
        );
        assert_eq!(
            second.poll_next_event().await.unwrap(),
            SessionEvent::PlaybackInfoChanged
        );
    }

    #[tokio::test]
    async fn notifications_before_subscribing_are_not_replayed() {
        let session = MemorySession::new("A.exe");
        session.emit(SessionEvent::PlaybackInfoChanged);
        let mut events = session.subscribe();

        session.emit(SessionEvent::MediaPropertiesChanged);

        assert_eq!(
            events.poll_next_event().await.unwrap(),
            SessionEvent::MediaPropertiesChanged
        );
    }

    #[tokio::test]
    async fn status_reports_track_length() {
        let session = MemorySession::with_state("A.exe", playing_at(0));
        session
            .set_metadata(Metadata {
                title: "Song".to_string(),
                ..Default::default()
            })
            .await;

        let status = session.status().await.unwrap();

        assert_eq!(status.metadata.map(|m| m.length), Some(Duration::from_secs(200)));
        assert_eq!(status.app, Some(SessionId::from("A.exe")));
    }
}
