//! Routine repository port — persistence for routines.

use std::future::Future;

use soundboard_domain::error::SoundboardError;
use soundboard_domain::id::{GuildId, RoutineId};
use soundboard_domain::routine::Routine;

/// Repository for persisting and loading [`Routine`]s.
///
/// The store loads every guild in full at startup and writes through on
/// each change, so no query beyond "all of a guild" is needed.
pub trait RoutineRepository {
    /// Guilds that own at least one routine.
    fn list_guilds(&self) -> impl Future<Output = Result<Vec<GuildId>, SoundboardError>> + Send;

    /// Every routine of a guild.
    fn load_routines(
        &self,
        guild_id: &GuildId,
    ) -> impl Future<Output = Result<Vec<Routine>, SoundboardError>> + Send;

    /// Insert or replace a routine.
    fn save_routine(
        &self,
        routine: &Routine,
    ) -> impl Future<Output = Result<(), SoundboardError>> + Send;

    /// Delete a routine. Deleting an unknown id is not an error.
    fn delete_routine(
        &self,
        id: RoutineId,
    ) -> impl Future<Output = Result<(), SoundboardError>> + Send;
}

impl<T: RoutineRepository + Send + Sync> RoutineRepository for std::sync::Arc<T> {
    fn list_guilds(&self) -> impl Future<Output = Result<Vec<GuildId>, SoundboardError>> + Send {
        (**self).list_guilds()
    }

    fn load_routines(
        &self,
        guild_id: &GuildId,
    ) -> impl Future<Output = Result<Vec<Routine>, SoundboardError>> + Send {
        (**self).load_routines(guild_id)
    }

    fn save_routine(
        &self,
        routine: &Routine,
    ) -> impl Future<Output = Result<(), SoundboardError>> + Send {
        (**self).save_routine(routine)
    }

    fn delete_routine(
        &self,
        id: RoutineId,
    ) -> impl Future<Output = Result<(), SoundboardError>> + Send {
        (**self).delete_routine(id)
    }
}
