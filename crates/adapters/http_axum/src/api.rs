//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod conditions;
#[allow(clippy::missing_errors_doc)]
pub mod routines;
pub mod sse;
#[allow(clippy::missing_errors_doc)]
pub mod voice;

use axum::Router;
use axum::routing::{get, post};

use soundboard_app::ports::{
    Clock, Messenger, RoutineRepository, SoundDispatcher, VoiceEventPublisher,
};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<R, S, M, C, V>() -> Router<AppState<R, S, M, C, V>>
where
    R: RoutineRepository + Send + Sync + 'static,
    S: SoundDispatcher + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    V: VoiceEventPublisher + Send + Sync + 'static,
{
    Router::new()
        // Routines
        .route(
            "/guilds/{guild}/routines",
            get(routines::list::<R, S, M, C, V>).post(routines::create::<R, S, M, C, V>),
        )
        .route(
            "/guilds/{guild}/routines/command",
            post(routines::command::<R, S, M, C, V>),
        )
        .route(
            "/guilds/{guild}/routines/{id}",
            get(routines::get::<R, S, M, C, V>)
                .put(routines::update::<R, S, M, C, V>)
                .delete(routines::delete::<R, S, M, C, V>),
        )
        .route(
            "/guilds/{guild}/routines/{id}/toggle",
            post(routines::toggle::<R, S, M, C, V>),
        )
        // Conditions
        .route("/conditions/parse", post(conditions::parse))
        // Voice ingestion
        .route("/voice-events", post(voice::publish_event::<R, S, M, C, V>))
        .route("/voice-states", post(voice::publish_state::<R, S, M, C, V>))
        // Effects
        .route("/effects/stream", get(sse::stream::<R, S, M, C, V>))
}
