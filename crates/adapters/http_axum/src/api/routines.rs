//! JSON handlers for a guild's routines.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use soundboard_app::ports::{
    Clock, Messenger, RoutineRepository, SoundDispatcher, VoiceEventPublisher,
};
use soundboard_domain::command::parse_command;
use soundboard_domain::error::NotFoundError;
use soundboard_domain::id::{GuildId, RoutineId};
use soundboard_domain::routine::{Action, Condition, Routine, Trigger};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating or replacing a routine.
#[derive(Deserialize)]
pub struct RoutineRequest {
    pub name: String,
    pub enabled: Option<bool>,
    pub trigger: Trigger,
    pub condition: Option<Condition>,
    pub actions: Vec<Action>,
}

impl RoutineRequest {
    fn into_routine(self, guild_id: GuildId, id: Option<RoutineId>) -> Result<Routine, ApiError> {
        let mut builder = Routine::builder()
            .guild_id(guild_id)
            .name(self.name)
            .enabled(self.enabled.unwrap_or(true))
            .trigger(self.trigger)
            .maybe_condition(self.condition)
            .actions(self.actions);
        if let Some(id) = id {
            builder = builder.id(id);
        }
        Ok(builder.build()?)
    }
}

/// Request body for creating a routine from the command DSL.
#[derive(Deserialize)]
pub struct CommandRequest {
    pub name: String,
    /// e.g. `on join if user=42 do play hello then wait 2s`
    pub command: String,
}

pub enum CreateResponse {
    Created(Json<Routine>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

fn parse_guild(raw: String) -> Result<GuildId, ApiError> {
    Ok(GuildId::new(raw)?)
}

/// An id that is not a UUID cannot name an existing routine.
fn parse_routine_id(raw: &str) -> Result<RoutineId, ApiError> {
    RoutineId::from_str(raw).map_err(|_| {
        ApiError::from(NotFoundError {
            entity: "routine",
            id: raw.to_string(),
        })
    })
}

/// `GET /api/guilds/{guild}/routines` — list a guild's routines, by name.
pub async fn list<R, S, M, C, V>(
    State(state): State<AppState<R, S, M, C, V>>,
    Path(guild): Path<String>,
) -> Result<Json<Vec<Routine>>, ApiError>
where
    R: RoutineRepository + Send + Sync + 'static,
    S: SoundDispatcher + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    V: VoiceEventPublisher + Send + Sync + 'static,
{
    let guild_id = parse_guild(guild)?;
    let routines = state
        .engine
        .routines()
        .list(&guild_id)
        .iter()
        .map(|routine| (**routine).clone())
        .collect();
    Ok(Json(routines))
}

/// `GET /api/guilds/{guild}/routines/{id}`
pub async fn get<R, S, M, C, V>(
    State(state): State<AppState<R, S, M, C, V>>,
    Path((guild, id)): Path<(String, String)>,
) -> Result<Json<Routine>, ApiError>
where
    R: RoutineRepository + Send + Sync + 'static,
    S: SoundDispatcher + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    V: VoiceEventPublisher + Send + Sync + 'static,
{
    let guild_id = parse_guild(guild)?;
    let id = parse_routine_id(&id)?;
    let routine = state.engine.routines().get(&guild_id, id)?;
    Ok(Json(Routine::clone(&routine)))
}

/// `POST /api/guilds/{guild}/routines` — create a routine from its JSON form.
pub async fn create<R, S, M, C, V>(
    State(state): State<AppState<R, S, M, C, V>>,
    Path(guild): Path<String>,
    Json(req): Json<RoutineRequest>,
) -> Result<CreateResponse, ApiError>
where
    R: RoutineRepository + Send + Sync + 'static,
    S: SoundDispatcher + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    V: VoiceEventPublisher + Send + Sync + 'static,
{
    let routine = req.into_routine(parse_guild(guild)?, None)?;
    let created = state.engine.create(routine).await?;
    Ok(CreateResponse::Created(Json(Routine::clone(&created))))
}

/// `POST /api/guilds/{guild}/routines/command` — create a routine from a
/// one-line command.
pub async fn command<R, S, M, C, V>(
    State(state): State<AppState<R, S, M, C, V>>,
    Path(guild): Path<String>,
    Json(req): Json<CommandRequest>,
) -> Result<CreateResponse, ApiError>
where
    R: RoutineRepository + Send + Sync + 'static,
    S: SoundDispatcher + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    V: VoiceEventPublisher + Send + Sync + 'static,
{
    let guild_id = parse_guild(guild)?;
    let routine = parse_command(&req.command)?.into_routine(guild_id, &req.name)?;
    let created = state.engine.create(routine).await?;
    Ok(CreateResponse::Created(Json(Routine::clone(&created))))
}

/// `PUT /api/guilds/{guild}/routines/{id}` — replace a routine.
pub async fn update<R, S, M, C, V>(
    State(state): State<AppState<R, S, M, C, V>>,
    Path((guild, id)): Path<(String, String)>,
    Json(req): Json<RoutineRequest>,
) -> Result<Json<Routine>, ApiError>
where
    R: RoutineRepository + Send + Sync + 'static,
    S: SoundDispatcher + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    V: VoiceEventPublisher + Send + Sync + 'static,
{
    let id = parse_routine_id(&id)?;
    let routine = req.into_routine(parse_guild(guild)?, Some(id))?;
    let updated = state.engine.update(routine).await?;
    Ok(Json(Routine::clone(&updated)))
}

/// `DELETE /api/guilds/{guild}/routines/{id}`
pub async fn delete<R, S, M, C, V>(
    State(state): State<AppState<R, S, M, C, V>>,
    Path((guild, id)): Path<(String, String)>,
) -> Result<DeleteResponse, ApiError>
where
    R: RoutineRepository + Send + Sync + 'static,
    S: SoundDispatcher + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    V: VoiceEventPublisher + Send + Sync + 'static,
{
    let guild_id = parse_guild(guild)?;
    let id = parse_routine_id(&id)?;
    state.engine.delete(&guild_id, id).await?;
    Ok(DeleteResponse::NoContent)
}

/// `POST /api/guilds/{guild}/routines/{id}/toggle` — flip `enabled`.
pub async fn toggle<R, S, M, C, V>(
    State(state): State<AppState<R, S, M, C, V>>,
    Path((guild, id)): Path<(String, String)>,
) -> Result<Json<Routine>, ApiError>
where
    R: RoutineRepository + Send + Sync + 'static,
    S: SoundDispatcher + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    V: VoiceEventPublisher + Send + Sync + 'static,
{
    let guild_id = parse_guild(guild)?;
    let id = parse_routine_id(&id)?;
    let toggled = state.engine.toggle(&guild_id, id).await?;
    Ok(Json(Routine::clone(&toggled)))
}
