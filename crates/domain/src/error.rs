//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`SoundboardError`] via `#[from]`. Adapters box their own error types
//! into [`SoundboardError::Storage`].

use std::fmt;

/// Top-level error for every fallible operation of the engine.
#[derive(Debug, thiserror::Error)]
pub enum SoundboardError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("invalid condition expression")]
    Parse(#[from] ParseError),

    #[error("invalid routine command")]
    Command(#[from] CommandError),

    #[error("dispatch failed")]
    Dispatch(#[from] DispatchError),

    #[error("scheduler error")]
    Scheduler(#[from] SchedulerError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant was violated on create or update.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("a routine needs at least one action")]
    NoActions,

    #[error("a routine needs a trigger")]
    MissingTrigger,

    #[error("timer interval must be at least {min}s, got {actual}s")]
    IntervalTooShort { min: u64, actual: u64 },

    #[error("timer interval must be at most {max}s, got {actual}s")]
    IntervalTooLong { max: u64, actual: u64 },

    #[error("wait duration must be a positive number of seconds")]
    NonPositiveWait,

    #[error("sound name must not be empty")]
    EmptySoundName,

    #[error("message text must not be empty")]
    EmptyMessage,

    #[error("{kind} id must not be empty")]
    EmptyId { kind: &'static str },

    #[error("invalid time range `{0}`, expected HH:MM-HH:MM")]
    InvalidTimeRange(String),

    #[error("invalid date range `{0}`, expected DD/MM-DD/MM")]
    InvalidDateRange(String),

    #[error("condition has no atoms")]
    EmptyCondition,

    #[error("condition references unknown label {0}")]
    UnknownLabel(String),

    #[error("invalid condition expression: {0}")]
    Expression(ParseError),

    #[error("routine {id} already exists in guild {guild_id}")]
    DuplicateRoutine { guild_id: String, id: String },

    #[error("routine {id} belongs to guild {actual}, not {expected}")]
    GuildMismatch {
        id: String,
        expected: String,
        actual: String,
    },
}

/// A looked-up record does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// What went wrong while parsing a condition expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The expression contains no tokens at all.
    Empty,
    /// A word that is neither an operator nor an atom label.
    InvalidToken,
    /// A label such as `C4` that the atom table does not define.
    UnknownLabel,
    /// A token appeared where it cannot (e.g. `C1 C2`, `AND C1`).
    UnexpectedToken,
    /// Input ended while an operand or `)` was still expected.
    UnexpectedEnd,
    /// A `(` without its matching `)`.
    UnclosedParen,
    /// A `)` without a preceding `(`.
    UnmatchedParen,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "empty expression",
            Self::InvalidToken => "invalid token",
            Self::UnknownLabel => "unknown condition label",
            Self::UnexpectedToken => "unexpected token",
            Self::UnexpectedEnd => "missing operand",
            Self::UnclosedParen => "unclosed parenthesis",
            Self::UnmatchedParen => "unmatched closing parenthesis",
        })
    }
}

/// A condition expression could not be parsed.
///
/// `token` is the offending token text (empty at end of input) and
/// `position` its character offset in the source text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} `{token}` at position {position}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub token: String,
    pub position: usize,
}

/// A routine command (`on join if … do …`) could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("missing ` do ` separator between trigger and actions")]
    MissingDo,

    #[error("empty trigger")]
    EmptyTrigger,

    #[error("unknown trigger `{0}`, expected `timer` or `on`")]
    UnknownTrigger(String),

    #[error("unknown event `{0}`, expected join, leave or move")]
    UnknownEvent(String),

    #[error("invalid duration `{0}`, expected e.g. 30s, 5m or 1h")]
    InvalidDuration(String),

    #[error("invalid condition `{0}`, expected key=value or key!=value")]
    InvalidCondition(String),

    #[error("unknown condition key `{0}`, expected user, channel, role, time or date")]
    UnknownConditionKey(String),

    #[error("unknown action `{0}`, expected play, wait or msg")]
    UnknownAction(String),

    #[error("action `{verb}` is missing its argument")]
    MissingArgument { verb: String },

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A side-effect collaborator refused or failed an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("sound `{0}` not found")]
    SoundNotFound(String),

    #[error("playback failed: {0}")]
    Playback(String),

    #[error("not allowed to post in channel {0}")]
    Forbidden(String),

    #[error("channel {0} not found")]
    ChannelNotFound(String),

    #[error("no dispatcher is listening")]
    Unavailable,

    #[error("invalid wait duration `{0}`")]
    InvalidWait(String),
}

/// An internal scheduling fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("no async runtime available to schedule routine {0}")]
    NoRuntime(String),

    #[error("interval of routine {0} is out of range for the clock")]
    IntervalOverflow(String),

    #[error("firing of routine {id} aborted: {reason}")]
    FiringFailed { id: String, reason: String },
}
