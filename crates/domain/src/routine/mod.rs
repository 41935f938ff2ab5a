//! Routine — trigger → condition → actions, scoped to one guild.
//!
//! A routine has a [`Trigger`] deciding when it fires, an optional
//! [`Condition`] that must hold against the firing's [`Facts`], and an
//! ordered list of [`Action`]s to run.

mod action;
mod condition;
pub mod expr;
mod trigger;

pub use action::{Action, render_text};
pub use condition::{Atom, AtomTable, Condition};
pub use expr::{AtomLabel, ConditionExpr};
pub use trigger::{MAX_INTERVAL_SECS, MIN_INTERVAL_SECS, Trigger};

use serde::{Deserialize, Serialize};

use crate::error::{SoundboardError, ValidationError};
use crate::facts::Facts;
use crate::id::{GuildId, RoutineId};

/// A guild automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub id: RoutineId,
    pub guild_id: GuildId,
    pub name: String,
    pub enabled: bool,
    pub trigger: Trigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    pub actions: Vec<Action>,
}

impl Routine {
    /// Create a builder for constructing a [`Routine`].
    #[must_use]
    pub fn builder() -> RoutineBuilder {
        RoutineBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SoundboardError::Validation`] when:
    /// - `name` is blank ([`ValidationError::EmptyName`])
    /// - the routine is enabled without actions ([`ValidationError::NoActions`])
    /// - the timer interval is outside one second to one year
    /// - an action is invalid
    pub fn validate(&self) -> Result<(), SoundboardError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.enabled && self.actions.is_empty() {
            return Err(ValidationError::NoActions.into());
        }
        self.trigger.validate()?;
        for action in &self.actions {
            action.validate()?;
        }
        Ok(())
    }

    /// Whether the condition holds. No condition always holds.
    #[must_use]
    pub fn condition_holds(&self, facts: &Facts) -> bool {
        self.condition
            .as_ref()
            .is_none_or(|condition| condition.evaluate(facts))
    }

    #[must_use]
    pub fn is_timer(&self) -> bool {
        matches!(self.trigger, Trigger::Timer { .. })
    }
}

/// Step-by-step builder for [`Routine`].
#[derive(Debug, Default)]
pub struct RoutineBuilder {
    id: Option<RoutineId>,
    guild_id: Option<GuildId>,
    name: Option<String>,
    enabled: Option<bool>,
    trigger: Option<Trigger>,
    condition: Option<Condition>,
    actions: Vec<Action>,
}

impl RoutineBuilder {
    #[must_use]
    pub fn id(mut self, id: RoutineId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn guild_id(mut self, guild_id: GuildId) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub fn maybe_condition(mut self, condition: Option<Condition>) -> Self {
        self.condition = condition;
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Consume the builder, validate, and return a [`Routine`].
    ///
    /// # Errors
    ///
    /// Returns [`SoundboardError::Validation`] if the guild or trigger is
    /// missing, or if [`Routine::validate`] fails.
    pub fn build(self) -> Result<Routine, SoundboardError> {
        let guild_id = self
            .guild_id
            .ok_or(ValidationError::EmptyId { kind: "guild" })?;
        let trigger = self.trigger.ok_or(ValidationError::MissingTrigger)?;
        let routine = Routine {
            id: self.id.unwrap_or_default(),
            guild_id,
            name: self.name.unwrap_or_default().trim().to_string(),
            enabled: self.enabled.unwrap_or(true),
            trigger,
            condition: self.condition,
            actions: self.actions,
        };
        routine.validate()?;
        Ok(routine)
    }
}
