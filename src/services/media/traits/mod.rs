/// Session manager contract
pub mod manager;
/// Friendly name lookup contract
pub mod names;
/// Per-session contract
pub mod session;

pub use manager::*;
pub use names::*;
pub use session::*;
