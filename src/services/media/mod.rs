//! Event-driven access to the host's current media session.
//!
//! [`MediaService`] runs a manager poll loop over a [`SessionManager`] and a
//! session poll loop over whichever [`MediaSession`] is active, publishing
//! [`MediaEvent`]s and forwarding transport commands.

mod attachment;
mod error;
mod events;
/// In-memory collaborator implementation
pub mod memory;
mod monitoring;
mod service;
/// Collaborator contracts
pub mod traits;
mod types;

pub use error::MediaError;
pub use events::{EventSource, ManagerEvent, MediaEvent, SessionEvent};
pub use service::{Config, MediaService};
pub use traits::{
    IdentifierNameResolver, MediaSession, NameResolver, SessionEvents, SessionManager,
};
pub use types::{
    ArtData, Capabilities, Denylist, LoopMode, Metadata, PlaybackState, Position, SessionId,
    Status,
};
