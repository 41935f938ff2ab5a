//! Routine service — the in-memory routine store.
//!
//! Every guild is loaded in full at startup. Writes go through the
//! repository first and only then replace the in-memory snapshot, so a
//! failed write leaves the store untouched. Readers get `Arc<Routine>`
//! snapshots that never change under them.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use soundboard_domain::error::{NotFoundError, SoundboardError, ValidationError};
use soundboard_domain::id::{GuildId, RoutineId};
use soundboard_domain::routine::Routine;
use soundboard_domain::voice::VoiceEventKind;

use crate::ports::RoutineRepository;

#[derive(Debug, Default)]
struct GuildRoutines {
    routines: HashMap<RoutineId, Arc<Routine>>,
    by_kind: HashMap<VoiceEventKind, BTreeSet<RoutineId>>,
}

impl GuildRoutines {
    fn insert(&mut self, routine: Arc<Routine>) -> Option<Arc<Routine>> {
        let previous = self.remove(routine.id);
        if let Some(kind) = routine.trigger.event_kind() {
            self.by_kind.entry(kind).or_default().insert(routine.id);
        }
        self.routines.insert(routine.id, routine);
        previous
    }

    fn remove(&mut self, id: RoutineId) -> Option<Arc<Routine>> {
        let previous = self.routines.remove(&id)?;
        if let Some(kind) = previous.trigger.event_kind()
            && let Some(ids) = self.by_kind.get_mut(&kind)
        {
            ids.remove(&id);
        }
        Some(previous)
    }
}

/// Application service for routine CRUD, scoped by guild.
pub struct RoutineService<R> {
    repo: R,
    guilds: RwLock<HashMap<GuildId, GuildRoutines>>,
    // serializes writers across the repository await
    writes: tokio::sync::Mutex<()>,
}

impl<R: RoutineRepository> RoutineService<R> {
    /// Create an empty store backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            guilds: RwLock::new(HashMap::new()),
            writes: tokio::sync::Mutex::new(()),
        }
    }

    /// Guilds that own at least one persisted routine.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn persisted_guilds(&self) -> Result<Vec<GuildId>, SoundboardError> {
        self.repo.list_guilds().await
    }

    /// Load (or reload) a guild from persistence, replacing its snapshot.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn load_guild(
        &self,
        guild_id: &GuildId,
    ) -> Result<Vec<Arc<Routine>>, SoundboardError> {
        let _write = self.writes.lock().await;
        let loaded = self.repo.load_routines(guild_id).await?;
        let mut guild = GuildRoutines::default();
        let mut routines = Vec::with_capacity(loaded.len());
        for routine in loaded {
            if &routine.guild_id != guild_id {
                tracing::warn!(routine_id = %routine.id, "skipping routine stored under another guild");
                continue;
            }
            let routine = Arc::new(routine);
            guild.insert(Arc::clone(&routine));
            routines.push(routine);
        }
        self.write_guilds().insert(guild_id.clone(), guild);
        tracing::info!(count = routines.len(), "guild routines loaded");
        Ok(routines)
    }

    /// All routines of a guild, ordered by name.
    #[must_use]
    pub fn list(&self, guild_id: &GuildId) -> Vec<Arc<Routine>> {
        let mut routines: Vec<_> = self
            .read_guilds()
            .get(guild_id)
            .map(|g| g.routines.values().cloned().collect())
            .unwrap_or_default();
        routines.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        routines
    }

    /// Look up a routine, returning an error if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SoundboardError::NotFound`] when the guild has no routine
    /// with this `id`.
    pub fn get(&self, guild_id: &GuildId, id: RoutineId) -> Result<Arc<Routine>, SoundboardError> {
        self.read_guilds()
            .get(guild_id)
            .and_then(|g| g.routines.get(&id).cloned())
            .ok_or_else(|| not_found(id))
    }

    /// Enabled routines of a guild listening to `kind`.
    #[must_use]
    pub fn matching(&self, guild_id: &GuildId, kind: VoiceEventKind) -> Vec<Arc<Routine>> {
        let guilds = self.read_guilds();
        let Some(guild) = guilds.get(guild_id) else {
            return Vec::new();
        };
        guild
            .by_kind
            .get(&kind)
            .into_iter()
            .flatten()
            .filter_map(|id| guild.routines.get(id))
            .filter(|r| r.enabled)
            .cloned()
            .collect()
    }

    /// Store a new routine.
    ///
    /// # Errors
    ///
    /// Returns [`SoundboardError::Validation`] if invariants fail or the id
    /// already exists in the guild, or a storage error from the repository.
    #[tracing::instrument(skip(self, routine), fields(routine_id = %routine.id, guild_id = %routine.guild_id))]
    pub async fn create(&self, routine: Routine) -> Result<Arc<Routine>, SoundboardError> {
        routine.validate()?;
        let _write = self.writes.lock().await;
        if self.get(&routine.guild_id, routine.id).is_ok() {
            return Err(ValidationError::DuplicateRoutine {
                guild_id: routine.guild_id.to_string(),
                id: routine.id.to_string(),
            }
            .into());
        }
        self.repo.save_routine(&routine).await?;
        let routine = Arc::new(routine);
        self.publish(Arc::clone(&routine));
        tracing::info!(name = %routine.name, trigger = %routine.trigger, "routine created");
        Ok(routine)
    }

    /// Replace an existing routine wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`SoundboardError::NotFound`] for an unknown id,
    /// [`SoundboardError::Validation`] if invariants fail, or a storage
    /// error from the repository.
    #[tracing::instrument(skip(self, routine), fields(routine_id = %routine.id, guild_id = %routine.guild_id))]
    pub async fn update(&self, routine: Routine) -> Result<Arc<Routine>, SoundboardError> {
        routine.validate()?;
        let _write = self.writes.lock().await;
        self.get(&routine.guild_id, routine.id)?;
        self.repo.save_routine(&routine).await?;
        let routine = Arc::new(routine);
        self.publish(Arc::clone(&routine));
        tracing::info!("routine updated");
        Ok(routine)
    }

    /// Remove a routine, returning the last snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SoundboardError::NotFound`] for an unknown id, or a storage
    /// error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete(
        &self,
        guild_id: &GuildId,
        id: RoutineId,
    ) -> Result<Arc<Routine>, SoundboardError> {
        let _write = self.writes.lock().await;
        self.get(guild_id, id)?;
        self.repo.delete_routine(id).await?;
        let removed = self
            .write_guilds()
            .get_mut(guild_id)
            .and_then(|g| g.remove(id))
            .ok_or_else(|| not_found(id))?;
        tracing::info!("routine deleted");
        Ok(removed)
    }

    /// Flip `enabled`, returning the new snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SoundboardError::NotFound`] for an unknown id,
    /// [`SoundboardError::Validation`] when enabling a routine without
    /// actions, or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn toggle(
        &self,
        guild_id: &GuildId,
        id: RoutineId,
    ) -> Result<Arc<Routine>, SoundboardError> {
        let _write = self.writes.lock().await;
        let current = self.get(guild_id, id)?;
        let mut routine = Routine::clone(&current);
        routine.enabled = !routine.enabled;
        routine.validate()?;
        self.repo.save_routine(&routine).await?;
        let routine = Arc::new(routine);
        self.publish(Arc::clone(&routine));
        tracing::info!(enabled = routine.enabled, "routine toggled");
        Ok(routine)
    }

    fn publish(&self, routine: Arc<Routine>) {
        self.write_guilds()
            .entry(routine.guild_id.clone())
            .or_default()
            .insert(routine);
    }

    fn read_guilds(&self) -> std::sync::RwLockReadGuard<'_, HashMap<GuildId, GuildRoutines>> {
        self.guilds.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guilds(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<GuildId, GuildRoutines>> {
        self.guilds.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(id: RoutineId) -> SoundboardError {
    NotFoundError {
        entity: "Routine",
        id: id.to_string(),
    }
    .into()
}
