use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use super::MediaEventSender;
use crate::services::media::{
    EventSource, MediaEvent, SessionEvent, SessionEvents, attachment::Attachment,
    attachment::AttachmentSlot,
};

/// Relays events of one attached session until it is detached.
///
/// The loop never holds the slot; it only checks whether its generation is
/// still the attached one. It owns its own subscription, so a stale loop
/// still waiting on the same session never takes events from a newer one.
pub(crate) struct SessionMonitoring {
    attachment: Attachment,
    events: Box<dyn SessionEvents>,
    slot: Arc<AttachmentSlot>,
    events_tx: MediaEventSender,
}

impl SessionMonitoring {
    /// Spawn the poll loop for `attachment`, reading from `events`
    pub(crate) fn start(
        attachment: Attachment,
        events: Box<dyn SessionEvents>,
        slot: Arc<AttachmentSlot>,
        events_tx: MediaEventSender,
    ) -> JoinHandle<()> {
        let monitoring = Self {
            attachment,
            events,
            slot,
            events_tx,
        };

        tokio::spawn(monitoring.run())
    }

    fn is_attached(&self) -> bool {
        self.slot.is_current(self.attachment.generation)
    }

    #[instrument(
        skip(self),
        fields(session = %self.attachment.session.id(), generation = self.attachment.generation)
    )]
    async fn run(mut self) {
        debug!("Session poll loop started");

        while self.is_attached() {
            let event = match self.events.poll_next_event().await {
                Ok(event) => event,
                Err(err) => {
                    self.report_failure(err.to_string());
                    break;
                }
            };

            if !self.is_attached() {
                debug!(event = event.name(), "Discarding event from detached session");
                break;
            }

            let Some(event) = self.normalize(event).await else {
                continue;
            };

            let name = event.name().to_owned();
            if !self.emit_if_attached(event) {
                debug!(event = %name, "Session detached while querying, discarding");
                break;
            }
        }

        debug!("Session poll loop ended");
    }

    async fn normalize(&self, event: SessionEvent) -> Option<MediaEvent> {
        let session = &self.attachment.session;

        match event {
            SessionEvent::PlaybackInfoChanged => match session.status().await {
                Ok(status) => Some(MediaEvent::PlaybackInfoChanged(status)),
                Err(err) => {
                    warn!(error = %err, "Dropping PlaybackInfoChanged, status query failed");
                    None
                }
            },
            SessionEvent::MediaPropertiesChanged => match session.status().await {
                Ok(status) => Some(MediaEvent::MediaPropertiesChanged(status)),
                Err(err) => {
                    warn!(error = %err, "Dropping MediaPropertiesChanged, status query failed");
                    None
                }
            },
            SessionEvent::TimelinePropertiesChanged => match session.position(false).await {
                Ok(position) => Some(MediaEvent::TimelinePropertiesChanged(position)),
                Err(err) => {
                    warn!(error = %err, "Dropping TimelinePropertiesChanged, position query failed");
                    None
                }
            },
            SessionEvent::Unrecognized(name) => {
                debug!(event = %name, "Passing through unrecognized session event");
                Some(MediaEvent::Unrecognized {
                    source: EventSource::Session(session.id()),
                    name,
                })
            }
        }
    }

    fn emit_if_attached(&self, event: MediaEvent) -> bool {
        self.slot
            .emit_if_current(self.attachment.generation, &self.events_tx, event)
    }

    fn report_failure(&self, error: String) {
        let failure = MediaEvent::LoopFailed {
            source: EventSource::Session(self.attachment.session.id()),
            error: error.clone(),
        };

        if self.emit_if_attached(failure) {
            warn!(%error, "Session event source failed, stopping poll loop");
        } else {
            debug!(%error, "Event source of detached session failed");
        }
    }
}
