//! # soundboardd — soundboard daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`soundboard.toml`, environment overrides)
//! - Install the `tracing` subscriber
//! - Open the `SQLite` database and run migrations
//! - Build the routine engine on top of the repository, the effect bus and
//!   the sound library, then load every guild's routines and arm timers
//! - Feed the voice bus into the engine
//! - Serve the HTTP API until SIGINT, then stop the engine
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod sounds;

use std::sync::Arc;

use soundboard_adapter_http_axum::router;
use soundboard_adapter_http_axum::state::AppState;
use soundboard_adapter_storage_sqlite_sqlx::SqliteRoutineRepository;
use soundboard_app::clock::SystemClock;
use soundboard_app::effect_bus::InProcessEffectBus;
use soundboard_app::engine::RoutineEngine;
use soundboard_app::voice_bus::InProcessVoiceBus;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::sounds::SoundLibrary;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Database
    let db = soundboard_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database.url.clone(),
    }
    .build()
    .await?;
    let repo = SqliteRoutineRepository::new(db.pool().clone());

    // Buses
    let effects = Arc::new(InProcessEffectBus::new(config.engine.effect_bus_capacity));
    let voice_bus = Arc::new(InProcessVoiceBus::new(config.engine.voice_bus_capacity));

    // Engine
    let sounds = SoundLibrary::new(&config.sounds.dir, Arc::clone(&effects));
    let clock = SystemClock::new(config.timezone()?);
    let engine = RoutineEngine::new(repo, sounds, Arc::clone(&effects), clock);
    let loaded = engine.start().await?;
    engine.listen(voice_bus.subscribe());
    tracing::info!(
        routines = loaded,
        timezone = %config.engine.timezone,
        sounds = %config.sounds.dir.display(),
        "engine ready"
    );

    // HTTP
    let app = router::build(AppState::new(engine.clone(), voice_bus, effects));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "soundboardd listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                tracing::warn!("cannot listen for ctrl-c, running until killed");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutdown requested");
        })
        .await;
    engine.shutdown();
    served?;

    Ok(())
}
