//! # soundboard-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `RoutineRepository` — persistence for routines
//!   - `SoundDispatcher` — play a named sound
//!   - `Messenger` — post a text message
//!   - `Clock` — local wall-clock time in the configured timezone
//!   - `VoiceEventPublisher` — push voice notifications to the engine
//! - Define **driving/inbound** use-cases:
//!   - `RoutineService` — the routine store (CRUD, per-guild index)
//!   - `TriggerScheduler` — one recurring timer per enabled timer routine
//!   - `ActionExecutor` — run an action sequence, honoring waits
//!   - `RoutineEngine` — the facade tying them together
//! - Provide **in-process infrastructure** (voice and effect buses, clocks)
//!
//! ## Dependency rule
//! Depends on `soundboard-domain` only (plus `tokio` for channels, timers
//! and tasks). Never imports adapter crates.

pub mod clock;
pub mod effect_bus;
pub mod engine;
pub mod executor;
pub mod ports;
pub mod scheduler;
pub mod services;
pub mod voice_bus;
