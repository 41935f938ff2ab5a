//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod clock;
pub mod messenger;
pub mod routine_repo;
pub mod sound;
pub mod voice_bus;

pub use clock::Clock;
pub use messenger::Messenger;
pub use routine_repo::RoutineRepository;
pub use sound::SoundDispatcher;
pub use voice_bus::VoiceEventPublisher;
