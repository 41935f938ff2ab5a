//! Sound dispatcher port — plays a named sound.

use std::future::Future;

use soundboard_domain::error::DispatchError;
use soundboard_domain::id::{ChannelId, GuildId};

/// Plays sounds on behalf of routines.
pub trait SoundDispatcher {
    /// Play `sound_name` in `guild_id`, in `channel_id` when a voice
    /// channel was resolved for the step.
    ///
    /// Fails with [`DispatchError::SoundNotFound`] for an unknown sound and
    /// [`DispatchError::Playback`] when playback itself fails.
    fn play(
        &self,
        guild_id: &GuildId,
        channel_id: Option<&ChannelId>,
        sound_name: &str,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

impl<T: SoundDispatcher + Send + Sync> SoundDispatcher for std::sync::Arc<T> {
    fn play(
        &self,
        guild_id: &GuildId,
        channel_id: Option<&ChannelId>,
        sound_name: &str,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send {
        (**self).play(guild_id, channel_id, sound_name)
    }
}
