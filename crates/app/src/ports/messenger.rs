//! Messenger port — posts text messages.

use std::future::Future;

use soundboard_domain::error::DispatchError;
use soundboard_domain::id::ChannelId;

/// Sends text messages to channels.
pub trait Messenger {
    /// Post `text` to `channel_id`.
    ///
    /// Fails with [`DispatchError::Forbidden`] or
    /// [`DispatchError::ChannelNotFound`].
    fn send(
        &self,
        channel_id: &ChannelId,
        text: &str,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

impl<T: Messenger + Send + Sync> Messenger for std::sync::Arc<T> {
    fn send(
        &self,
        channel_id: &ChannelId,
        text: &str,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send {
        (**self).send(channel_id, text)
    }
}
