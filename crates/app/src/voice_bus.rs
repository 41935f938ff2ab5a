//! In-process voice event bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use soundboard_domain::error::SoundboardError;
use soundboard_domain::voice::VoiceEvent;

use crate::ports::VoiceEventPublisher;

/// In-process voice event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when nobody listens; the event is dropped.
pub struct InProcessVoiceBus {
    sender: broadcast::Sender<VoiceEvent>,
}

impl InProcessVoiceBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events published *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<VoiceEvent> {
        self.sender.subscribe()
    }
}

impl VoiceEventPublisher for InProcessVoiceBus {
    fn publish(
        &self,
        event: VoiceEvent,
    ) -> impl Future<Output = Result<(), SoundboardError>> + Send {
        if self.sender.send(event).is_err() {
            tracing::debug!("voice event dropped, no listener");
        }
        async { Ok(()) }
    }
}
