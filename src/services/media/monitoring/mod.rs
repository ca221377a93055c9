/// Manager poll loop
pub(crate) mod manager;
/// Session poll loop
pub(crate) mod session;

use tokio::sync::broadcast;
use tracing::trace;

use super::MediaEvent;

pub(crate) use manager::ManagerMonitoring;
pub(crate) use session::SessionMonitoring;

/// Sender side of the normalized event channel
pub(crate) type MediaEventSender = broadcast::Sender<MediaEvent>;

/// Publish `event` to every current subscriber.
///
/// Having no subscribers is not an error; the event is simply dropped.
pub(crate) fn emit(events_tx: &MediaEventSender, event: MediaEvent) {
    trace!(event = event.name(), "Emitting media event");
    let _ = events_tx.send(event);
}
