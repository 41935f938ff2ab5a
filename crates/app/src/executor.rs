//! Action executor — runs a routine's actions in order.
//!
//! The voice channel of a `PlaySound` step is resolved when the step runs,
//! not when the routine fired: a member may have moved during a `Wait`.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use soundboard_domain::error::DispatchError;
use soundboard_domain::facts::Facts;
use soundboard_domain::id::{ChannelId, GuildId, RoutineId};
use soundboard_domain::presence::VoicePresence;
use soundboard_domain::routine::{Action, Routine, render_text};

use crate::ports::{Messenger, SoundDispatcher};

/// Who and where a firing happens for.
#[derive(Debug, Clone)]
pub struct FiringContext {
    pub guild_id: GuildId,
    pub facts: Facts,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed,
    /// Step `step` (zero-based) failed; later steps did not run.
    Aborted { step: usize, error: DispatchError },
}

/// Report of one run of a routine's actions.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub routine_id: RoutineId,
    /// Number of steps that finished successfully.
    pub completed: usize,
    pub outcome: RunOutcome,
}

impl ExecutionResult {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}

/// Runs action sequences, dispatching side effects to collaborators.
///
/// Runs are independent: nothing stops two runs of the same routine from
/// overlapping, and a `Wait` only suspends its own run.
pub struct ActionExecutor<S, M> {
    sounds: S,
    messenger: M,
    presence: Arc<RwLock<VoicePresence>>,
}

impl<S, M> ActionExecutor<S, M>
where
    S: SoundDispatcher,
    M: Messenger,
{
    /// `presence` is read before each sound to find where members are now.
    pub fn new(sounds: S, messenger: M, presence: Arc<RwLock<VoicePresence>>) -> Self {
        Self {
            sounds,
            messenger,
            presence,
        }
    }

    /// Run `routine`'s actions for `context`.
    ///
    /// The first failing dispatch aborts the rest of the run. The failure
    /// is logged and reported in the result, never retried.
    #[tracing::instrument(skip_all, fields(routine_id = %routine.id, guild_id = %context.guild_id))]
    pub async fn run(&self, routine: &Routine, context: &FiringContext) -> ExecutionResult {
        let mut completed = 0;
        for (step, action) in routine.actions.iter().enumerate() {
            if let Err(error) = self.execute(action, context).await {
                tracing::warn!(step, %action, %error, "routine run aborted");
                return ExecutionResult {
                    routine_id: routine.id,
                    completed,
                    outcome: RunOutcome::Aborted { step, error },
                };
            }
            completed += 1;
        }
        tracing::debug!(steps = completed, "routine run completed");
        ExecutionResult {
            routine_id: routine.id,
            completed,
            outcome: RunOutcome::Completed,
        }
    }

    async fn execute(&self, action: &Action, context: &FiringContext) -> Result<(), DispatchError> {
        match action {
            Action::PlaySound {
                sound_name,
                channel_id,
            } => {
                let target = self.target_channel(context, channel_id.as_ref());
                self.sounds
                    .play(&context.guild_id, target.as_ref(), sound_name)
                    .await
            }
            Action::Wait { seconds } => {
                let delay = Duration::try_from_secs_f64(*seconds)
                    .map_err(|_| DispatchError::InvalidWait(seconds.to_string()))?;
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Action::Message { channel_id, text } => {
                let text = render_text(text, context.facts.user_id.as_ref());
                self.messenger.send(channel_id, &text).await
            }
        }
    }

    /// Where a sound plays, first match wins:
    /// 1. the triggering member's current voice channel
    /// 2. the firing's channel, when it has no member
    /// 3. the channel named on the action
    /// 4. any occupied channel of the guild
    fn target_channel(
        &self,
        context: &FiringContext,
        requested: Option<&ChannelId>,
    ) -> Option<ChannelId> {
        let presence = self.presence.read().unwrap_or_else(PoisonError::into_inner);
        let current = match &context.facts.user_id {
            Some(user_id) => presence.channel_of(&context.guild_id, user_id),
            None => context.facts.channel_id.clone(),
        };
        current
            .or_else(|| requested.cloned())
            .or_else(|| presence.active_channel(&context.guild_id))
    }
}
