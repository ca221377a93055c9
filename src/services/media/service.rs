use std::future::Future;
use std::sync::Arc;

use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, instrument, warn};

use super::{
    Denylist, IdentifierNameResolver, MediaError, MediaEvent, MediaSession, NameResolver,
    Position, SessionId, SessionManager, Status,
    attachment::{AttachmentSlot, ManagerHandle},
    monitoring::{ManagerMonitoring, MediaEventSender},
};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Configuration for the media service
#[derive(Clone)]
pub struct Config {
    /// Sessions that must never be tracked or attached
    pub denylist: Denylist,

    /// Lookup used by [`MediaService::friendly_name`]
    pub name_resolver: Arc<dyn NameResolver>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            denylist: Denylist::default(),
            name_resolver: Arc::new(IdentifierNameResolver),
        }
    }
}

impl From<&crate::config::MediaConfig> for Config {
    fn from(config: &crate::config::MediaConfig) -> Self {
        Self {
            denylist: Denylist::new(config.denylist.iter().map(String::as_str)),
            ..Self::default()
        }
    }
}

/// Event-driven view of the host's current media session.
///
/// Owns the manager poll loop, which in turn starts a session poll loop for
/// whichever session is active. Commands and queries go to the attached
/// session and quietly degrade to `false` or `None` when there is none.
///
/// Dropping the service releases the manager; both loops wind down on their
/// next wake-up.
pub struct MediaService {
    manager: Arc<ManagerHandle>,
    attachment: Arc<AttachmentSlot>,
    events_tx: MediaEventSender,
    name_resolver: Arc<dyn NameResolver>,
}

impl MediaService {
    /// Start the service on top of an already discovered session manager.
    ///
    /// Spawns the manager poll loop immediately, so this must be called
    /// from within a Tokio runtime.
    #[instrument(skip_all, fields(denied = config.denylist.iter().count()))]
    pub fn start(manager: Arc<dyn SessionManager>, config: Config) -> Self {
        info!("Starting media service");

        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let service = Self {
            manager: Arc::new(ManagerHandle::new(manager)),
            attachment: Arc::new(AttachmentSlot::new()),
            events_tx,
            name_resolver: config.name_resolver,
        };

        ManagerMonitoring::start(
            Arc::clone(&service.manager),
            Arc::clone(&service.attachment),
            config.denylist,
            service.events_tx.clone(),
        );

        service
    }

    /// Run `discovery` and start the service on the manager it yields.
    ///
    /// Returns `None`, without spawning anything, when discovery finds no
    /// session manager.
    pub async fn discover<F>(discovery: F, config: Config) -> Option<Self>
    where
        F: Future<Output = Option<Arc<dyn SessionManager>>>,
    {
        let Some(manager) = discovery.await else {
            info!("No session manager available, media service disabled");
            return None;
        };

        Some(Self::start(manager, config))
    }

    /// Subscribe to normalized events.
    ///
    /// Only events emitted after subscribing are received.
    pub fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.events_tx.subscribe()
    }

    /// Stream of normalized events.
    ///
    /// Lagging subscribers skip the events they missed and keep going.
    pub fn events(&self) -> impl Stream<Item = MediaEvent> + Send + use<> {
        let mut rx = self.events_tx.subscribe();

        async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(event) => yield event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Media event subscriber lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    /// Id of the attached session
    pub fn active_session(&self) -> Option<SessionId> {
        self.attachment.session_id()
    }

    /// Stream of attached session ids, starting with the current one
    pub fn active_session_monitored(&self) -> impl Stream<Item = Option<SessionId>> + Send + use<> {
        self.attachment.watch_ids()
    }

    /// Ids of the tracked sessions, in tracking order
    pub async fn tracked_sessions(&self) -> Vec<SessionId> {
        match self.manager.get() {
            Some(manager) => manager.session_ids().await,
            None => Vec::new(),
        }
    }

    /// Id of the session the host itself reports as current
    pub async fn system_session(&self) -> Option<SessionId> {
        let manager = self.manager.get()?;
        manager.system_session().await.map(|session| session.id())
    }

    /// Status snapshot of the attached session
    pub async fn status(&self) -> Option<Status> {
        self.query("status", |session| async move { session.status().await })
            .await
    }

    /// Display name of the application owning the attached session
    pub async fn friendly_name(&self) -> Option<String> {
        let id = self.active_session()?;
        self.name_resolver.friendly_name(&id).await
    }

    /// Last reported position of the attached session
    pub async fn position(&self) -> Option<Position> {
        self.query("position", |session| async move { session.position(false).await })
            .await
            .flatten()
    }

    /// Position extrapolated to now.
    ///
    /// Falls back to zero elapsed at the Unix epoch when nothing is attached
    /// or the session has no timeline.
    pub async fn current_position(&self) -> Position {
        self.query("current position", |session| async move {
            session.position(true).await
        })
        .await
        .flatten()
        .unwrap_or_else(Position::epoch)
    }

    /// Start playback
    pub async fn play(&self) -> bool {
        self.command("play", |session| async move { session.play().await })
            .await
    }

    /// Pause playback
    pub async fn pause(&self) -> bool {
        self.command("pause", |session| async move { session.pause().await })
            .await
    }

    /// Toggle between playing and paused
    pub async fn play_pause(&self) -> bool {
        self.command("play_pause", |session| async move { session.play_pause().await })
            .await
    }

    /// Stop playback
    pub async fn stop(&self) -> bool {
        self.command("stop", |session| async move { session.stop().await })
            .await
    }

    /// Skip to the next track
    pub async fn next(&self) -> bool {
        self.command("next", |session| async move { session.next().await })
            .await
    }

    /// Go back to the previous track
    pub async fn previous(&self) -> bool {
        self.command("previous", |session| async move { session.previous().await })
            .await
    }

    /// Move the position by `offset_secs`
    pub async fn seek(&self, offset_secs: f64) -> bool {
        self.command("seek", |session| async move { session.seek(offset_secs).await })
            .await
    }

    /// Move to `percentage` (0.0 to 1.0) of the track
    pub async fn seek_percentage(&self, percentage: f64) -> bool {
        self.command("seek_percentage", |session| async move {
            session.seek_percentage(percentage).await
        })
        .await
    }

    /// Move to an absolute position in seconds
    pub async fn set_position(&self, position_secs: f64) -> bool {
        self.command("set_position", |session| async move {
            session.set_position(position_secs).await
        })
        .await
    }

    /// Request the opposite of the current shuffle flag
    pub async fn toggle_shuffle(&self) -> bool {
        self.command("toggle_shuffle", |session| async move {
            let shuffle = session.shuffle().await?;
            session.set_shuffle(!shuffle).await
        })
        .await
    }

    /// Advance the repeat mode one step through `None -> Track -> List -> None`
    pub async fn cycle_repeat(&self) -> bool {
        self.command("cycle_repeat", |session| async move {
            let mode = session.repeat().await?;
            session.set_repeat(mode.next()).await
        })
        .await
    }

    /// Release the session manager and detach the current session.
    ///
    /// Both poll loops exit the next time they wake up. Calling this more
    /// than once has no further effect.
    pub fn shutdown(&self) {
        if self.manager.release() {
            info!("Media service shutting down");
        }
        self.attachment.detach();
    }

    async fn command<F, Fut>(&self, operation: &'static str, f: F) -> bool
    where
        F: FnOnce(Arc<dyn MediaSession>) -> Fut,
        Fut: Future<Output = Result<bool, MediaError>>,
    {
        let Some(session) = self.attachment.session() else {
            debug!(operation, "No attached session, ignoring command");
            return false;
        };

        match f(session).await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(operation, error = %err, "Session command failed");
                false
            }
        }
    }

    async fn query<T, F, Fut>(&self, what: &'static str, f: F) -> Option<T>
    where
        F: FnOnce(Arc<dyn MediaSession>) -> Fut,
        Fut: Future<Output = Result<T, MediaError>>,
    {
        let session = self.attachment.session()?;

        match f(session).await {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(what, error = %err, "Session query failed");
                None
            }
        }
    }
}

impl Drop for MediaService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
