//! # soundboard-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement [`RoutineRepository`](soundboard_app::ports::RoutineRepository)
//! - Manage the `SQLite` connection pool and run embedded migrations
//! - Map routines to rows, with trigger, condition and actions stored as JSON
//!
//! ## Dependency rule
//! Depends on `soundboard-app` (for the port trait) and `soundboard-domain`
//! (for domain types). Neither of them references this adapter.

mod error;
mod pool;
mod routine_repo;

pub use error::StorageError;
pub use pool::{Config, Database};
pub use routine_repo::SqliteRoutineRepository;
