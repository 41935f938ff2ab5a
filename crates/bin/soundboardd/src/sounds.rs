//! Sound library — checks a sound exists on disk before it is dispatched.

use std::future::Future;
use std::path::{Path, PathBuf};

use soundboard_app::ports::SoundDispatcher;
use soundboard_domain::error::DispatchError;
use soundboard_domain::id::{ChannelId, GuildId};

const GLOBAL_DIR: &str = "global";

/// Decorates a [`SoundDispatcher`], failing with
/// [`DispatchError::SoundNotFound`] unless the guild's directory or the
/// shared `global` directory holds a file whose stem is the sound name.
///
/// The guild directory wins when both have the sound.
pub struct SoundLibrary<S> {
    root: PathBuf,
    inner: S,
}

impl<S> SoundLibrary<S> {
    pub fn new(root: impl Into<PathBuf>, inner: S) -> Self {
        Self {
            root: root.into(),
            inner,
        }
    }

    /// Locate the file backing `sound_name` for a guild.
    pub async fn resolve(&self, guild_id: &GuildId, sound_name: &str) -> Option<PathBuf> {
        let guild_dir = Some(guild_id.as_str())
            .filter(|id| is_plain_component(id))
            .map(|id| self.root.join(id));
        for dir in guild_dir
            .into_iter()
            .chain(std::iter::once(self.root.join(GLOBAL_DIR)))
        {
            if let Some(path) = find_by_stem(&dir, sound_name).await {
                return Some(path);
            }
        }
        None
    }
}

/// A path component that cannot climb out of the library root.
fn is_plain_component(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

async fn find_by_stem(dir: &Path, stem: &str) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.file_stem().is_none_or(|s| s != stem) {
            continue;
        }
        if tokio::fs::metadata(&path)
            .await
            .is_ok_and(|meta| meta.is_file())
        {
            return Some(path);
        }
    }
    None
}

impl<S: SoundDispatcher + Sync> SoundDispatcher for SoundLibrary<S> {
    fn play(
        &self,
        guild_id: &GuildId,
        channel_id: Option<&ChannelId>,
        sound_name: &str,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send {
        async move {
            let Some(path) = self.resolve(guild_id, sound_name).await else {
                return Err(DispatchError::SoundNotFound(sound_name.to_string()));
            };
            tracing::debug!(sound = sound_name, path = %path.display(), "sound resolved");
            self.inner.play(guild_id, channel_id, sound_name).await
        }
    }
}
