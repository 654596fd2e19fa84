//! Error types for the room layer.

use sketchturn_protocol::{ParticipantId, RoomId};

/// Why a room operation was refused.
///
/// A refused operation never changes room state and never broadcasts.
/// Duplicate guesses are not errors; see
/// [`GuessOutcome::AlreadyCounted`](crate::GuessOutcome::AlreadyCounted).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No active session under this id. Expected when an action races a
    /// room's teardown.
    #[error("room {0} not found")]
    UnknownRoom(RoomId),

    #[error("game has not started")]
    NotStarted,

    #[error("game is already running")]
    AlreadyStarted,

    /// The drawer tried to guess, or someone else tried to pick the word.
    #[error("invalid drawer action: {0}")]
    InvalidDrawerAction(&'static str),

    #[error("{action} is not allowed during {phase}")]
    WrongPhase {
        action: &'static str,
        phase: String,
    },

    #[error("word must not be empty")]
    EmptyWord,

    #[error("need at least {required} participants, have {present}")]
    NotEnoughParticipants { required: usize, present: usize },

    #[error("participant {0} already in room {1}")]
    AlreadyInRoom(ParticipantId, RoomId),

    #[error("participant {0} not in room {1}")]
    NotInRoom(ParticipantId, RoomId),

    #[error("room {0} is full")]
    RoomFull(RoomId),

    #[error("invalid game config: {0}")]
    InvalidConfig(String),

    /// The room's command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

impl RoomError {
    /// HTTP-style status code sent to clients alongside the message.
    pub fn code(&self) -> u16 {
        match self {
            Self::UnknownRoom(_) | Self::NotInRoom(..) => 404,
            Self::AlreadyInRoom(..) | Self::RoomFull(_) | Self::AlreadyStarted => 409,
            Self::Unavailable(_) => 503,
            _ => 400,
        }
    }
}
