//! Errors reported back to the requesting connection.

use strictly_chess::{ChessError, ChessErrorKind};

/// A rejected client request. Never leaves room state modified.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RoomError {
    /// Move sent while the opponent is to move.
    #[display("Not your turn")]
    NotYourTurn,

    /// Game command from a session with no game.
    #[display("You are not in a game")]
    SessionNotInGame,

    /// Referenced game does not exist.
    #[display("Game {} not found", _0)]
    GameNotFound(String),

    /// Join from a session already in the waiting slot.
    #[display("Already waiting for an opponent")]
    AlreadyWaiting,

    /// Join or spectate from a session already playing.
    #[display("Already in a game")]
    AlreadyInGame,

    /// Spectate without a game id while nothing is being played.
    #[display("No active games to spectate")]
    NoActiveGames,

    /// Rejected by the rules engine.
    #[display("{}", _0)]
    Chess(ChessErrorKind),
}

impl std::error::Error for RoomError {}

impl From<ChessError> for RoomError {
    fn from(err: ChessError) -> Self {
        RoomError::Chess(err.kind)
    }
}
