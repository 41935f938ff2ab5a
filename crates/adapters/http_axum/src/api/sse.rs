//! Server-Sent Events stream of dispatched effects.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use soundboard_app::ports::{
    Clock, Messenger, RoutineRepository, SoundDispatcher, VoiceEventPublisher,
};

use crate::state::AppState;

/// `GET /api/effects/stream` — one JSON `data:` frame per effect.
///
/// Subscribing counts as a listener on the effect bus, so routines stop
/// failing with `Unavailable` while at least one bridge is connected. The
/// event name is the effect type (`play_sound`, `message`).
pub async fn stream<R, S, M, C, V>(
    State(state): State<AppState<R, S, M, C, V>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>
where
    R: RoutineRepository + Send + Sync + 'static,
    S: SoundDispatcher + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    V: VoiceEventPublisher + Send + Sync + 'static,
{
    let receiver = state.effects.subscribe();
    tracing::debug!("effect stream subscriber connected");
    let effects = BroadcastStream::new(receiver).filter_map(|result| match result {
        Ok(effect) => {
            let name = match &effect {
                soundboard_domain::effect::Effect::PlaySound { .. } => "play_sound",
                soundboard_domain::effect::Effect::Message { .. } => "message",
            };
            match Event::default().event(name).json_data(&effect) {
                Ok(event) => Some(Ok(event)),
                Err(err) => {
                    tracing::warn!(%err, "failed to encode effect for SSE stream");
                    None
                }
            }
        }
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "effect stream subscriber lagged, effects dropped");
            None
        }
    });

    Sse::new(effects).keep_alive(KeepAlive::default())
}
