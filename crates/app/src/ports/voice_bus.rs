//! Voice bus port — pushes voice notifications towards the engine.

use std::future::Future;

use soundboard_domain::error::SoundboardError;
use soundboard_domain::voice::VoiceEvent;

/// Publishes voice events to the engine.
pub trait VoiceEventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: VoiceEvent)
    -> impl Future<Output = Result<(), SoundboardError>> + Send;
}

impl<T: VoiceEventPublisher + Send + Sync> VoiceEventPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        event: VoiceEvent,
    ) -> impl Future<Output = Result<(), SoundboardError>> + Send {
        (**self).publish(event)
    }
}
