//! Chess rule errors.

use derive_more::{Display, Error};
use tracing::instrument;

/// What went wrong while parsing or playing a move.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ChessErrorKind {
    /// FEN or UCI text could not be parsed.
    #[display("Malformed input: {}", _0)]
    MalformedInput(String),

    /// The destination is not reachable legally.
    #[display("Illegal move: {}", _0)]
    IllegalMove(String),

    /// The source square is empty or holds the other side's piece.
    #[display("Not your piece: {}", _0)]
    NotPlayersPiece(String),

    /// No more moves are accepted.
    #[display("Game is already over")]
    GameOver,
}

/// Chess error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Chess error: {} at {}:{}", kind, file, line)]
pub struct ChessError {
    /// Error category.
    pub kind: ChessErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ChessError {
    /// Creates a new chess error with caller location tracking.
    #[track_caller]
    #[instrument]
    pub fn new(kind: ChessErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Shorthand for [`ChessErrorKind::MalformedInput`].
    #[track_caller]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ChessErrorKind::MalformedInput(message.into()))
    }

    /// Returns the error category.
    pub fn kind(&self) -> &ChessErrorKind {
        &self.kind
    }
}
