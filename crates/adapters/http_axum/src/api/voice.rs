//! Voice notification ingestion.
//!
//! The bridge to the chat platform posts either ready-made voice events or
//! raw before/after voice states; both end up on the voice bus where the
//! engine picks them up.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use soundboard_app::ports::{
    Clock, Messenger, RoutineRepository, SoundDispatcher, VoiceEventPublisher,
};
use soundboard_domain::voice::{VoiceEvent, VoiceStateChange};

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/voice-events` — publish one voice event.
pub async fn publish_event<R, S, M, C, V>(
    State(state): State<AppState<R, S, M, C, V>>,
    Json(event): Json<VoiceEvent>,
) -> Result<StatusCode, ApiError>
where
    R: RoutineRepository + Send + Sync + 'static,
    S: SoundDispatcher + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    V: VoiceEventPublisher + Send + Sync + 'static,
{
    state.voice_bus.publish(event).await?;
    Ok(StatusCode::ACCEPTED)
}

/// `POST /api/voice-states` — derive events from a voice state update and
/// publish them in order. Responds with the derived events.
pub async fn publish_state<R, S, M, C, V>(
    State(state): State<AppState<R, S, M, C, V>>,
    Json(change): Json<VoiceStateChange>,
) -> Result<(StatusCode, Json<Vec<VoiceEvent>>), ApiError>
where
    R: RoutineRepository + Send + Sync + 'static,
    S: SoundDispatcher + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    V: VoiceEventPublisher + Send + Sync + 'static,
{
    let events = change.events();
    for event in &events {
        state.voice_bus.publish(event.clone()).await?;
    }
    Ok((StatusCode::ACCEPTED, Json(events)))
}
