//! `SQLite` implementation of [`RoutineRepository`].

use std::future::Future;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use soundboard_app::ports::RoutineRepository;
use soundboard_domain::error::SoundboardError;
use soundboard_domain::id::{GuildId, RoutineId};
use soundboard_domain::routine::{Action, Condition, Routine, Trigger};

use crate::error::StorageError;

struct Wrapper(Routine);

fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, sqlx::Error> {
    serde_json::from_str(raw).map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let guild_id: String = row.try_get("guild_id")?;
        let name: String = row.try_get("name")?;
        let enabled: bool = row.try_get("enabled")?;
        let trigger: String = row.try_get("trigger")?;
        let condition: Option<String> = row.try_get("condition")?;
        let actions: String = row.try_get("actions")?;

        let id = RoutineId::from_str(&id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let guild_id =
            GuildId::new(guild_id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let trigger: Trigger = decode_json(&trigger)?;
        let condition: Option<Condition> = condition.as_deref().map(decode_json).transpose()?;
        let actions: Vec<Action> = decode_json(&actions)?;

        Ok(Self(Routine {
            id,
            guild_id,
            name,
            enabled,
            trigger,
            condition,
            actions,
        }))
    }
}

const SELECT_GUILDS: &str = "SELECT DISTINCT guild_id FROM routines ORDER BY guild_id";
const SELECT_BY_GUILD: &str = "SELECT * FROM routines WHERE guild_id = ? ORDER BY name";
const UPSERT: &str = "INSERT INTO routines (id, guild_id, name, enabled, trigger, condition, actions) \
     VALUES (?, ?, ?, ?, ?, ?, ?) \
     ON CONFLICT(id) DO UPDATE SET guild_id = excluded.guild_id, name = excluded.name, \
     enabled = excluded.enabled, trigger = excluded.trigger, \
     condition = excluded.condition, actions = excluded.actions";
const DELETE_BY_ID: &str = "DELETE FROM routines WHERE id = ?";

/// Routine columns as they are written.
struct Encoded {
    trigger: String,
    condition: Option<String>,
    actions: String,
}

impl Encoded {
    fn new(routine: &Routine) -> Result<Self, StorageError> {
        Ok(Self {
            trigger: serde_json::to_string(&routine.trigger)?,
            condition: routine
                .condition
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            actions: serde_json::to_string(&routine.actions)?,
        })
    }
}

/// `SQLite`-backed routine repository.
#[derive(Clone)]
pub struct SqliteRoutineRepository {
    pool: SqlitePool,
}

impl SqliteRoutineRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RoutineRepository for SqliteRoutineRepository {
    fn list_guilds(&self) -> impl Future<Output = Result<Vec<GuildId>, SoundboardError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<(String,)> = sqlx::query_as(SELECT_GUILDS)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;
            let mut guilds = Vec::with_capacity(rows.len());
            for (raw,) in rows {
                match GuildId::new(raw) {
                    Ok(guild_id) => guilds.push(guild_id),
                    Err(err) => tracing::warn!(%err, "skipping stored routines with invalid guild id"),
                }
            }
            Ok(guilds)
        }
    }

    fn load_routines(
        &self,
        guild_id: &GuildId,
    ) -> impl Future<Output = Result<Vec<Routine>, SoundboardError>> + Send {
        let pool = self.pool.clone();
        let guild_id = guild_id.as_str().to_string();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_GUILD)
                .bind(guild_id)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;
            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn save_routine(
        &self,
        routine: &Routine,
    ) -> impl Future<Output = Result<(), SoundboardError>> + Send {
        let pool = self.pool.clone();
        let encoded = Encoded::new(routine);
        let id = routine.id.to_string();
        let guild_id = routine.guild_id.as_str().to_string();
        let name = routine.name.clone();
        let enabled = routine.enabled;
        async move {
            let encoded = encoded?;
            sqlx::query(UPSERT)
                .bind(id)
                .bind(guild_id)
                .bind(name)
                .bind(enabled)
                .bind(encoded.trigger)
                .bind(encoded.condition)
                .bind(encoded.actions)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;
            Ok(())
        }
    }

    fn delete_routine(
        &self,
        id: RoutineId,
    ) -> impl Future<Output = Result<(), SoundboardError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(DELETE_BY_ID)
                .bind(id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;
            Ok(())
        }
    }
}
