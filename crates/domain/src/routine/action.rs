//! Action — one step of a routine's sequence.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{ChannelId, UserId};

/// A step executed when a routine fires. Steps run strictly in list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Play a named sound in the triggering member's voice channel.
    ///
    /// `channel_id` names the voice channel to use when the firing has no
    /// channel of its own, e.g. a timer with nobody present.
    PlaySound {
        sound_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel_id: Option<ChannelId>,
    },
    /// Suspend this run for a number of seconds (fractions allowed).
    Wait { seconds: f64 },
    /// Post a text message. `{user}` and `{user_id}` are substituted.
    Message { channel_id: ChannelId, text: String },
}

impl Action {
    #[must_use]
    pub fn play(sound_name: impl Into<String>) -> Self {
        Self::PlaySound {
            sound_name: sound_name.into(),
            channel_id: None,
        }
    }

    /// A sound with a fallback voice channel.
    #[must_use]
    pub fn play_in(sound_name: impl Into<String>, channel_id: ChannelId) -> Self {
        Self::PlaySound {
            sound_name: sound_name.into(),
            channel_id: Some(channel_id),
        }
    }

    #[must_use]
    pub fn wait(seconds: f64) -> Self {
        Self::Wait { seconds }
    }

    #[must_use]
    pub fn message(channel_id: ChannelId, text: impl Into<String>) -> Self {
        Self::Message {
            channel_id,
            text: text.into(),
        }
    }

    /// # Errors
    ///
    /// - [`ValidationError::EmptySoundName`] for a blank sound name
    /// - [`ValidationError::NonPositiveWait`] for a wait that is not a
    ///   finite number above zero
    /// - [`ValidationError::EmptyMessage`] for blank message text
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::PlaySound { sound_name, .. } if sound_name.trim().is_empty() => {
                Err(ValidationError::EmptySoundName)
            }
            Self::Wait { seconds } if !(seconds.is_finite() && *seconds > 0.0) => {
                Err(ValidationError::NonPositiveWait)
            }
            Self::Message { text, .. } if text.trim().is_empty() => {
                Err(ValidationError::EmptyMessage)
            }
            _ => Ok(()),
        }
    }
}

/// Substitute `{user}` with a mention and `{user_id}` with the raw id.
///
/// Without a triggering user the text is returned untouched.
#[must_use]
pub fn render_text<'a>(text: &'a str, user_id: Option<&UserId>) -> Cow<'a, str> {
    match user_id {
        Some(user_id) if text.contains('{') => Cow::Owned(
            text.replace("{user_id}", user_id.as_str())
                .replace("{user}", &format!("<@{user_id}>")),
        ),
        _ => Cow::Borrowed(text),
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlaySound {
                sound_name,
                channel_id: None,
            } => write!(f, "play({sound_name})"),
            Self::PlaySound {
                sound_name,
                channel_id: Some(channel_id),
            } => write!(f, "play({sound_name} in {channel_id})"),
            Self::Wait { seconds } => write!(f, "wait({seconds}s)"),
            Self::Message { channel_id, .. } => write!(f, "message({channel_id})"),
        }
    }
}
