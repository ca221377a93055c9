//! nowplaying - event-driven access to the desktop's current media session.
//!
//! The [`MediaService`](services::media::MediaService) follows the host's
//! active media session through two poll loops: one over the session
//! manager, one over whichever session is active. It publishes normalized
//! events, answers status and position queries, and forwards transport
//! commands.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use nowplaying::services::media::{Config, MediaService, memory::MemorySessionManager};
//!
//! # async fn run() {
//! let manager = Arc::new(MemorySessionManager::new());
//! let service = MediaService::start(manager, Config::default());
//!
//! let mut events = service.subscribe();
//! while let Ok(event) = events.recv().await {
//!     println!("{}", event.name());
//! }
//! # }
//! ```

/// Configuration schema definitions and loading.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// Scenario replay harness.
pub mod cli;

/// Reactive services.
pub mod services;

/// Logging setup.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use core::{NowPlayingError, Result};
