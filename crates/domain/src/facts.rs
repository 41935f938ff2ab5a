//! Facts — the runtime snapshot a condition is evaluated against.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::id::{ChannelId, RoleId, UserId};

/// Everything a condition atom may look at, captured once per firing.
///
/// Built from the triggering context (who, where) and the clock (when, in
/// the configured timezone). Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facts {
    pub user_id: Option<UserId>,
    pub channel_id: Option<ChannelId>,
    pub role_ids: Vec<RoleId>,
    pub time: NaiveTime,
    pub date: NaiveDate,
}

impl Facts {
    /// Facts with no triggering member, only the local clock reading.
    #[must_use]
    pub fn at(local: NaiveDateTime) -> Self {
        Self {
            user_id: None,
            channel_id: None,
            role_ids: Vec::new(),
            time: local.time(),
            date: local.date(),
        }
    }

    #[must_use]
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn with_channel(mut self, channel_id: ChannelId) -> Self {
        self.channel_id = Some(channel_id);
        self
    }

    #[must_use]
    pub fn with_roles(mut self, role_ids: impl IntoIterator<Item = RoleId>) -> Self {
        self.role_ids = role_ids.into_iter().collect();
        self
    }

    #[must_use]
    pub fn has_role(&self, role_id: &RoleId) -> bool {
        self.role_ids.contains(role_id)
    }
}
