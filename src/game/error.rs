//! Errors raised by the arena simulation

use super::PlayerId;

/// Game-level errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    /// Malformed join payload, unknown move direction or unparsable message
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A player with this id is already in the arena
    #[error("Player {0} has already joined")]
    DuplicateJoin(PlayerId),

    /// A tick left the state in a shape the simulation cannot continue from
    #[error("Tick failed: {0}")]
    TickFailure(String),

    /// The arena task is no longer running
    #[error("Arena is not running")]
    ArenaClosed,
}

impl GameError {
    /// Machine-readable code sent to clients in `error` messages
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::DuplicateJoin(_) => "duplicate_join",
            Self::TickFailure(_) => "tick_failure",
            Self::ArenaClosed => "arena_closed",
        }
    }
}
