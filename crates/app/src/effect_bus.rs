//! In-process effect bus — hands dispatched effects to whatever bridges the
//! engine to the chat platform.

use std::future::Future;

use tokio::sync::broadcast;

use soundboard_domain::effect::Effect;
use soundboard_domain::error::DispatchError;
use soundboard_domain::id::{ChannelId, GuildId};

use crate::ports::{Messenger, SoundDispatcher};

/// Broadcasts [`Effect`]s to subscribers.
///
/// Unlike the voice bus, an effect with nobody listening is a failed
/// dispatch ([`DispatchError::Unavailable`]) so that the run aborts and
/// the failure is reported.
pub struct InProcessEffectBus {
    sender: broadcast::Sender<Effect>,
}

impl InProcessEffectBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Effect> {
        self.sender.subscribe()
    }

    fn emit(&self, effect: Effect) -> Result<(), DispatchError> {
        tracing::debug!(%effect, "dispatching effect");
        self.sender
            .send(effect)
            .map(|_| ())
            .map_err(|_| DispatchError::Unavailable)
    }
}

impl SoundDispatcher for InProcessEffectBus {
    fn play(
        &self,
        guild_id: &GuildId,
        channel_id: Option<&ChannelId>,
        sound_name: &str,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send {
        let result = self.emit(Effect::PlaySound {
            guild_id: guild_id.clone(),
            channel_id: channel_id.cloned(),
            sound_name: sound_name.to_string(),
        });
        async { result }
    }
}

impl Messenger for InProcessEffectBus {
    fn send(
        &self,
        channel_id: &ChannelId,
        text: &str,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send {
        let result = self.emit(Effect::Message {
            channel_id: channel_id.clone(),
            text: text.to_string(),
        });
        async { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_broadcast_play_sound_effect() {
        let bus = InProcessEffectBus::new(8);
        let mut rx = bus.subscribe();
        let guild = GuildId::new("1").unwrap();

        bus.play(&guild, None, "airhorn").await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            Effect::PlaySound {
                guild_id: guild,
                channel_id: None,
                sound_name: "airhorn".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn should_broadcast_message_effect() {
        let bus = InProcessEffectBus::new(8);
        let mut rx = bus.subscribe();
        let channel = ChannelId::new("5").unwrap();

        bus.send(&channel, "hello").await.unwrap();

        assert!(matches!(
            rx.recv().await.unwrap(),
            Effect::Message { text, .. } if text == "hello"
        ));
    }

    #[tokio::test]
    async fn should_report_unavailable_when_nobody_listens() {
        let bus = InProcessEffectBus::new(8);
        let result = bus.play(&GuildId::new("1").unwrap(), None, "x").await;
        assert_eq!(result, Err(DispatchError::Unavailable));
    }
}
