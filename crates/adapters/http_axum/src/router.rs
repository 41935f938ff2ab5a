//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use soundboard_app::ports::{
    Clock, Messenger, RoutineRepository, SoundDispatcher, VoiceEventPublisher,
};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the JSON API under `/api`. Each request and response is logged
/// through a [`TraceLayer`].
pub fn build<R, S, M, C, V>(state: AppState<R, S, M, C, V>) -> Router
where
    R: RoutineRepository + Send + Sync + 'static,
    S: SoundDispatcher + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    V: VoiceEventPublisher + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
