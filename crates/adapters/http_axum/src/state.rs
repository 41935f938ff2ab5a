//! Shared application state for axum handlers.

use std::sync::Arc;

use soundboard_app::effect_bus::InProcessEffectBus;
use soundboard_app::engine::RoutineEngine;

/// Application state shared across all axum handlers.
///
/// Generic over the engine's ports and the voice event publisher to avoid
/// dynamic dispatch. `Clone` is implemented manually so the underlying
/// types themselves do not need to be `Clone`.
pub struct AppState<R, S, M, C, V> {
    pub engine: RoutineEngine<R, S, M, C>,
    /// Where ingested voice events are published.
    pub voice_bus: Arc<V>,
    /// Source of the effect stream served to bridges.
    pub effects: Arc<InProcessEffectBus>,
}

impl<R, S, M, C, V> Clone for AppState<R, S, M, C, V> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            voice_bus: Arc::clone(&self.voice_bus),
            effects: Arc::clone(&self.effects),
        }
    }
}

impl<R, S, M, C, V> AppState<R, S, M, C, V> {
    pub fn new(
        engine: RoutineEngine<R, S, M, C>,
        voice_bus: Arc<V>,
        effects: Arc<InProcessEffectBus>,
    ) -> Self {
        Self {
            engine,
            voice_bus,
            effects,
        }
    }
}
