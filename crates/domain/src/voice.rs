//! Voice events — notifications about members joining, leaving or moving
//! between voice channels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommandError;
use crate::facts::Facts;
use crate::id::{ChannelId, GuildId, RoleId, UserId};

/// The kind of voice transition an event trigger listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VoiceEventKind {
    #[serde(rename = "voice_join")]
    Join,
    #[serde(rename = "voice_leave")]
    Leave,
    #[serde(rename = "voice_move")]
    Move,
}

impl VoiceEventKind {
    pub const ALL: [Self; 3] = [Self::Join, Self::Leave, Self::Move];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Join => "voice_join",
            Self::Leave => "voice_leave",
            Self::Move => "voice_move",
        }
    }
}

impl fmt::Display for VoiceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoiceEventKind {
    type Err = CommandError;

    /// Accepts both the short command form (`join`) and the wire form
    /// (`voice_join`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.strip_prefix("voice_").unwrap_or(&lower) {
            "join" => Ok(Self::Join),
            "leave" => Ok(Self::Leave),
            "move" => Ok(Self::Move),
            _ => Err(CommandError::UnknownEvent(s.to_string())),
        }
    }
}

/// A single voice notification, as pushed by the voice event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceEvent {
    pub guild_id: GuildId,
    /// The channel the transition concerns: the joined channel for `join`
    /// and `move`, the left channel for `leave`.
    pub channel_id: ChannelId,
    pub user_id: UserId,
    /// Roles of the member at the time of the event.
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
    pub kind: VoiceEventKind,
}

impl VoiceEvent {
    /// Attach the member, channel and roles of this event to clock facts.
    #[must_use]
    pub fn facts(&self, clock: Facts) -> Facts {
        clock
            .with_user(self.user_id.clone())
            .with_channel(self.channel_id.clone())
            .with_roles(self.role_ids.iter().cloned())
    }
}

/// A raw before/after voice state update for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceStateChange {
    pub guild_id: GuildId,
    pub user_id: UserId,
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
    pub before: Option<ChannelId>,
    pub after: Option<ChannelId>,
}

impl VoiceStateChange {
    /// Derive the voice events this update produces.
    ///
    /// - nothing → channel: `join`
    /// - channel → nothing: `leave`
    /// - channel A → channel B: `leave` A, `join` B, then `move` B
    /// - same channel (mute, deafen, …): nothing
    #[must_use]
    pub fn events(&self) -> Vec<VoiceEvent> {
        let event = |channel_id: &ChannelId, kind| VoiceEvent {
            guild_id: self.guild_id.clone(),
            channel_id: channel_id.clone(),
            user_id: self.user_id.clone(),
            role_ids: self.role_ids.clone(),
            kind,
        };
        match (&self.before, &self.after) {
            (None, Some(after)) => vec![event(after, VoiceEventKind::Join)],
            (Some(before), None) => vec![event(before, VoiceEventKind::Leave)],
            (Some(before), Some(after)) if before != after => vec![
                event(before, VoiceEventKind::Leave),
                event(after, VoiceEventKind::Join),
                event(after, VoiceEventKind::Move),
            ],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(before: Option<&str>, after: Option<&str>) -> VoiceStateChange {
        VoiceStateChange {
            guild_id: GuildId::new("1").unwrap(),
            user_id: UserId::new("2").unwrap(),
            role_ids: vec![],
            before: before.map(|c| ChannelId::new(c).unwrap()),
            after: after.map(|c| ChannelId::new(c).unwrap()),
        }
    }

    fn kinds(events: &[VoiceEvent]) -> Vec<(VoiceEventKind, &str)> {
        events
            .iter()
            .map(|e| (e.kind, e.channel_id.as_str()))
            .collect()
    }

    #[test]
    fn should_emit_join_when_member_enters_voice() {
        let events = change(None, Some("10")).events();
        assert_eq!(kinds(&events), vec![(VoiceEventKind::Join, "10")]);
    }

    #[test]
    fn should_emit_leave_with_previous_channel_when_member_exits() {
        let events = change(Some("10"), None).events();
        assert_eq!(kinds(&events), vec![(VoiceEventKind::Leave, "10")]);
    }

    #[test]
    fn should_emit_leave_join_and_move_when_member_switches_channel() {
        let events = change(Some("10"), Some("20")).events();
        assert_eq!(
            kinds(&events),
            vec![
                (VoiceEventKind::Leave, "10"),
                (VoiceEventKind::Join, "20"),
                (VoiceEventKind::Move, "20"),
            ]
        );
    }

    #[test]
    fn should_emit_nothing_when_channel_is_unchanged() {
        assert!(change(Some("10"), Some("10")).events().is_empty());
        assert!(change(None, None).events().is_empty());
    }

    #[test]
    fn should_parse_short_and_wire_event_names() {
        assert_eq!("join".parse::<VoiceEventKind>().unwrap(), VoiceEventKind::Join);
        assert_eq!(
            "VOICE_LEAVE".parse::<VoiceEventKind>().unwrap(),
            VoiceEventKind::Leave
        );
        assert!("mute".parse::<VoiceEventKind>().is_err());
    }

    #[test]
    fn should_serialize_kind_with_voice_prefix() {
        let json = serde_json::to_string(&VoiceEventKind::Move).unwrap();
        assert_eq!(json, "\"voice_move\"");
    }

    #[test]
    fn should_default_roles_when_absent_from_json() {
        let event: VoiceEvent = serde_json::from_value(serde_json::json!({
            "guild_id": "1",
            "channel_id": "10",
            "user_id": "2",
            "kind": "voice_join"
        }))
        .unwrap();
        assert!(event.role_ids.is_empty());
    }
}
