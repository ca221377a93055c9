/// Shared building blocks for services
pub mod common;
/// Current media session service
pub mod media;

pub use media::{MediaEvent, MediaService};
