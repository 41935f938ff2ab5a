//! Effect — a side effect a routine asks the outside world to perform.
//!
//! Effects are broadcast to whatever bridges the engine to the chat
//! platform (audio playback, message posting).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{ChannelId, GuildId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Play a sound in a guild, in `channel_id` when known.
    PlaySound {
        guild_id: GuildId,
        channel_id: Option<ChannelId>,
        sound_name: String,
    },
    /// Post `text` to a text channel.
    Message { channel_id: ChannelId, text: String },
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlaySound {
                guild_id,
                channel_id: Some(channel_id),
                sound_name,
            } => write!(f, "play({sound_name}) in {guild_id}/{channel_id}"),
            Self::PlaySound {
                guild_id,
                channel_id: None,
                sound_name,
            } => write!(f, "play({sound_name}) in {guild_id}"),
            Self::Message { channel_id, .. } => write!(f, "message to {channel_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_effect_with_type_tag() {
        let effect = Effect::PlaySound {
            guild_id: GuildId::new("1").unwrap(),
            channel_id: None,
            sound_name: "airhorn".to_string(),
        };
        let json = serde_json::to_value(&effect).unwrap();
        assert_eq!(json["type"], "play_sound");
        assert_eq!(json["sound_name"], "airhorn");
        assert!(json["channel_id"].is_null());
    }

    #[test]
    fn should_display_effect_target() {
        let effect = Effect::PlaySound {
            guild_id: GuildId::new("1").unwrap(),
            channel_id: Some(ChannelId::new("2").unwrap()),
            sound_name: "airhorn".to_string(),
        };
        assert_eq!(effect.to_string(), "play(airhorn) in 1/2");
    }
}
