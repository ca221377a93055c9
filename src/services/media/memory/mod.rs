//! In-memory collaborator for driving the media service from code.
//!
//! Used by the tests and by the `nowplaying replay` harness in place of the
//! host's native session subsystem.

mod manager;
mod session;

pub use manager::MemorySessionManager;
pub use session::{MemorySession, SessionState, Timeline};
