//! Trigger — what makes a routine fire.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::voice::VoiceEventKind;

/// Shortest accepted timer interval, in seconds.
pub const MIN_INTERVAL_SECS: u64 = 1;

/// Longest accepted timer interval, in seconds (365 days).
pub const MAX_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

/// Describes when a routine should fire.
///
/// Replaced wholesale on edit, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Fires every `interval_secs`, first one full interval after arming.
    Timer { interval_secs: u64 },
    /// Fires on each matching voice notification.
    Event { kind: VoiceEventKind },
}

impl Trigger {
    /// Build a timer trigger.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::IntervalTooShort`] below one second and
    /// [`ValidationError::IntervalTooLong`] above [`MAX_INTERVAL_SECS`].
    pub fn timer(interval_secs: u64) -> Result<Self, ValidationError> {
        let trigger = Self::Timer { interval_secs };
        trigger.validate()?;
        Ok(trigger)
    }

    #[must_use]
    pub fn event(kind: VoiceEventKind) -> Self {
        Self::Event { kind }
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::IntervalTooShort`] for a timer below
    /// [`MIN_INTERVAL_SECS`], [`ValidationError::IntervalTooLong`] above
    /// [`MAX_INTERVAL_SECS`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            Self::Timer { interval_secs } if interval_secs < MIN_INTERVAL_SECS => {
                Err(ValidationError::IntervalTooShort {
                    min: MIN_INTERVAL_SECS,
                    actual: interval_secs,
                })
            }
            Self::Timer { interval_secs } if interval_secs > MAX_INTERVAL_SECS => {
                Err(ValidationError::IntervalTooLong {
                    max: MAX_INTERVAL_SECS,
                    actual: interval_secs,
                })
            }
            _ => Ok(()),
        }
    }

    /// Timer period, `None` for event triggers.
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        match self {
            Self::Timer { interval_secs } => Some(Duration::from_secs(*interval_secs)),
            Self::Event { .. } => None,
        }
    }

    /// The voice event kind this trigger listens to, if any.
    #[must_use]
    pub fn event_kind(&self) -> Option<VoiceEventKind> {
        match self {
            Self::Event { kind } => Some(*kind),
            Self::Timer { .. } => None,
        }
    }

    #[must_use]
    pub fn matches(&self, kind: VoiceEventKind) -> bool {
        self.event_kind() == Some(kind)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timer { interval_secs } => write!(f, "timer({interval_secs}s)"),
            Self::Event { kind } => write!(f, "on({kind})"),
        }
    }
}
