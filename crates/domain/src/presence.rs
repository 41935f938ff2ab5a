//! Voice presence — who currently sits in which voice channel.
//!
//! Maintained from the voice event stream so that timer routines, which
//! have no triggering member, can still be evaluated against the members
//! that are present.

use std::collections::{BTreeMap, HashMap};

use crate::facts::Facts;
use crate::id::{ChannelId, GuildId, RoleId, UserId};
use crate::voice::{VoiceEvent, VoiceEventKind};

/// A member currently connected to a voice channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentMember {
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub role_ids: Vec<RoleId>,
}

impl PresentMember {
    #[must_use]
    pub fn facts(&self, clock: Facts) -> Facts {
        clock
            .with_user(self.user_id.clone())
            .with_channel(self.channel_id.clone())
            .with_roles(self.role_ids.iter().cloned())
    }
}

/// Per-guild voice occupancy.
#[derive(Debug, Default)]
pub struct VoicePresence {
    guilds: HashMap<GuildId, BTreeMap<UserId, PresentMember>>,
}

impl VoicePresence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one voice event into the occupancy map.
    pub fn apply(&mut self, event: &VoiceEvent) {
        match event.kind {
            VoiceEventKind::Join | VoiceEventKind::Move => {
                self.guilds.entry(event.guild_id.clone()).or_default().insert(
                    event.user_id.clone(),
                    PresentMember {
                        user_id: event.user_id.clone(),
                        channel_id: event.channel_id.clone(),
                        role_ids: event.role_ids.clone(),
                    },
                );
            }
            VoiceEventKind::Leave => {
                let Some(members) = self.guilds.get_mut(&event.guild_id) else {
                    return;
                };
                // A leave for a channel the member already moved out of is stale.
                if members
                    .get(&event.user_id)
                    .is_some_and(|m| m.channel_id == event.channel_id)
                {
                    members.remove(&event.user_id);
                }
                if members.is_empty() {
                    self.guilds.remove(&event.guild_id);
                }
            }
        }
    }

    /// Members present in `guild_id`, ordered by user id.
    #[must_use]
    pub fn members(&self, guild_id: &GuildId) -> Vec<PresentMember> {
        self.guilds
            .get(guild_id)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    /// The voice channel `user_id` currently sits in.
    #[must_use]
    pub fn channel_of(&self, guild_id: &GuildId, user_id: &UserId) -> Option<ChannelId> {
        self.guilds
            .get(guild_id)?
            .get(user_id)
            .map(|member| member.channel_id.clone())
    }

    /// Some occupied voice channel of the guild: the channel of the first
    /// member by user id.
    #[must_use]
    pub fn active_channel(&self, guild_id: &GuildId) -> Option<ChannelId> {
        self.guilds
            .get(guild_id)?
            .values()
            .next()
            .map(|member| member.channel_id.clone())
    }

    #[must_use]
    pub fn is_empty(&self, guild_id: &GuildId) -> bool {
        !self.guilds.contains_key(guild_id)
    }
}
