//! # soundboard-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a JSON API for managing a guild's routines (`/api/guilds/{guild}/routines`)
//! - Accept voice notifications and publish them onto the voice bus
//! - Stream dispatched effects to bridges over Server-Sent Events
//! - Map [`SoundboardError`](soundboard_domain::error::SoundboardError) into
//!   HTTP status codes
//!
//! ## Dependency rule
//! Depends on `soundboard-app` (engine, buses, ports) and `soundboard-domain`
//! (request and response types). Never leaks axum types into either.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
