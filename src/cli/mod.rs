//! Replay harness behind the `nowplaying` binary.
//!
//! Drives the media service with the in-memory collaborator from a scenario
//! file and reports what it published.

pub mod formatting;
pub mod replay;
pub mod scenario;

pub use replay::{ReplayEntry, replay};
pub use scenario::{Scenario, SessionSpec, Step};
