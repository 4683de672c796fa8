// ── Core Error Types ───────────────────────────────────────────────────────
// Argument validation failures for admin operations. None of these mutate
// state; callers turn them into a usage hint.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A chat id argument that is not a signed integer.
    #[error("invalid chat id: {0}")]
    InvalidChatId(String),

    /// A mood name outside angry / normal / chill.
    #[error("unknown mood: {0}")]
    UnknownMood(String),

    /// A required positional argument was not supplied.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
}

pub type CoreResult<T> = Result<T, CoreError>;
