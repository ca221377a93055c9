use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Identifier of the application that owns a media session.
///
/// On hosts that expose application user model ids this is that id (for
/// example `Spotify.exe`); it is the key used by the denylist and by the
/// friendly name lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session id from an application identifier
    pub fn new(app_id: impl Into<String>) -> Self {
        Self(app_id.into())
    }

    /// Get the raw application identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hosts report sessions without an application identifier; those are never tracked
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(app_id: &str) -> Self {
        Self::new(app_id)
    }
}

impl From<String> for SessionId {
    fn from(app_id: String) -> Self {
        Self(app_id)
    }
}

/// Ordered set of session ids that must never be tracked or attached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Denylist(Vec<SessionId>);

impl Denylist {
    /// Build a denylist, dropping duplicates while keeping first-seen order
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SessionId>,
    {
        let mut entries: Vec<SessionId> = Vec::new();
        for id in ids.into_iter().map(Into::into) {
            if !entries.contains(&id) {
                entries.push(id);
            }
        }
        Self(entries)
    }

    /// Whether the given session is denied
    pub fn contains(&self, id: &SessionId) -> bool {
        self.0.contains(id)
    }

    /// Whether the denylist has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &SessionId> {
        self.0.iter()
    }
}

/// Playback state label reported by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Session is playing
    Playing,

    /// Session is paused
    Paused,

    /// Session is stopped
    Stopped,

    /// Session is switching tracks or buffering
    Changing,

    /// Session is closed
    Closed,

    /// Session is opened but has not started playback
    Opened,

    /// Host reported a state this crate does not know
    #[default]
    Unknown,
}

impl From<&str> for PlaybackState {
    fn from(status: &str) -> Self {
        match status {
            "Playing" => Self::Playing,
            "Paused" => Self::Paused,
            "Stopped" => Self::Stopped,
            "Changing" => Self::Changing,
            "Closed" => Self::Closed,
            "Opened" => Self::Opened,
            _ => Self::Unknown,
        }
    }
}

impl PlaybackState {
    /// Label as exposed in status snapshots
    pub fn label(self) -> &'static str {
        match self {
            Self::Playing => "Playing",
            Self::Paused => "Paused",
            Self::Stopped => "Stopped",
            Self::Changing => "Changing",
            Self::Closed => "Closed",
            Self::Opened => "Opened",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for PlaybackState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Repeat mode label reported by a session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// No repetition
    #[default]
    None,

    /// Repeat the current track
    Track,

    /// Repeat the whole list
    List,

    /// Host reported a label this crate does not know
    Unrecognized(String),
}

impl From<&str> for LoopMode {
    fn from(label: &str) -> Self {
        match label {
            "None" => Self::None,
            "Track" => Self::Track,
            "List" => Self::List,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl LoopMode {
    /// Next mode in the repeat cycle `None -> Track -> List -> None`.
    ///
    /// Unrecognized labels rotate as if they were `List`.
    pub fn next(&self) -> LoopMode {
        match self {
            LoopMode::None => LoopMode::Track,
            LoopMode::Track => LoopMode::List,
            LoopMode::List | LoopMode::Unrecognized(_) => LoopMode::None,
        }
    }

    /// Label as exposed in status snapshots
    pub fn label(&self) -> &str {
        match self {
            LoopMode::None => "None",
            LoopMode::Track => "Track",
            LoopMode::List => "List",
            LoopMode::Unrecognized(label) => label,
        }
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for LoopMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Transport controls a session currently accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Capabilities {
    /// Any control is available
    pub can_control: bool,

    /// Play or pause is available
    pub can_play_pause: bool,

    /// Skip to next track is available
    pub can_go_next: bool,

    /// Skip to previous track is available
    pub can_go_previous: bool,

    /// Seeking is available
    pub can_seek: bool,
}

impl Capabilities {
    /// Build capabilities, deriving `can_control` from the individual controls
    pub fn new(can_play_pause: bool, can_go_next: bool, can_go_previous: bool, can_seek: bool) -> Self {
        Self {
            can_control: can_play_pause || can_go_next || can_go_previous || can_seek,
            can_play_pause,
            can_go_next,
            can_go_previous,
            can_seek,
        }
    }
}

/// Raw artwork bytes; decoding is left to the consumer
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ArtData {
    /// Encoded image bytes
    #[serde(skip)]
    pub data: Vec<u8>,

    /// Mimetype of `data`
    pub mimetype: String,
}

impl fmt::Debug for ArtData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtData")
            .field("bytes", &self.data.len())
            .field("mimetype", &self.mimetype)
            .finish()
    }
}

/// Metadata for the track a session is playing
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Metadata {
    /// Track title
    pub title: String,

    /// Primary artist
    pub artist: String,

    /// All artists
    pub artists: Vec<String>,

    /// Album title
    pub album: Option<String>,

    /// Primary album artist
    pub album_artist: Option<String>,

    /// All album artists
    pub album_artists: Option<Vec<String>>,

    /// Stable fingerprint of the track, see [`Metadata::with_fingerprint`]
    pub id: Option<String>,

    /// Artwork, when the session provides it
    pub art_data: Option<ArtData>,

    /// Track duration
    #[serde(serialize_with = "serialize_secs")]
    pub length: Duration,
}

impl Metadata {
    /// Fill `id` with the hex SHA-256 of album artist, artist, album and title.
    ///
    /// Left untouched when all four fields are empty.
    pub fn with_fingerprint(mut self) -> Self {
        let key = format!(
            "{}{}{}{}",
            self.album_artist.as_deref().unwrap_or_default(),
            self.artist,
            self.album.as_deref().unwrap_or_default(),
            self.title
        );

        if !key.is_empty() {
            let digest = Sha256::digest(key.as_bytes());
            self.id = Some(format!("{digest:x}"));
        }

        self
    }
}

/// Elapsed playback position and when it was measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    /// Elapsed time into the track
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,

    /// Instant the elapsed time refers to
    pub measured_at: DateTime<Utc>,
}

impl Position {
    /// Zero elapsed, measured at the Unix epoch
    pub fn epoch() -> Self {
        Self {
            elapsed: Duration::ZERO,
            measured_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Advance the position to `now`, as if playback never stopped since `measured_at`.
    ///
    /// Positions measured in the future are returned with `measured_at = now`
    /// and their elapsed time unchanged.
    pub fn extrapolated_to(&self, now: DateTime<Utc>) -> Self {
        let drift = (now - self.measured_at).to_std().unwrap_or(Duration::ZERO);

        Self {
            elapsed: self.elapsed + drift,
            measured_at: now,
        }
    }
}

/// Point-in-time snapshot of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    /// Track metadata, if the session exposes any
    pub metadata: Option<Metadata>,

    /// Available transport controls
    pub capabilities: Capabilities,

    /// Playback state label
    pub playback_state: PlaybackState,

    /// Repeat mode label
    pub loop_mode: LoopMode,

    /// Shuffle flag
    pub shuffle: bool,

    /// Session volume, negative when the host does not report one
    pub volume: f64,

    /// Raw elapsed position
    pub elapsed: Option<Position>,

    /// Identifier of the owning application
    pub app: Option<SessionId>,
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
