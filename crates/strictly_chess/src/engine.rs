//! Game engine: one position, its move history and its lifecycle.

use super::error::{ChessError, ChessErrorKind};
use super::fen::{load_fen, to_fen};
use super::position::Position;
use super::rules::{self, Terminal};
use super::types::{Color, Move, MoveFlags, PieceKind, Promotion};
use super::uci::parse_uci;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Why a game stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    /// The side to move was mated.
    Checkmate,
    /// The side to move had no legal move and was not in check.
    Stalemate,
    /// A player resigned.
    Resignation,
    /// A player left mid-game.
    Disconnection,
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndReason::Checkmate => write!(f, "checkmate"),
            EndReason::Stalemate => write!(f, "stalemate"),
            EndReason::Resignation => write!(f, "resignation"),
            EndReason::Disconnection => write!(f, "disconnection"),
        }
    }
}

/// Lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Moves are accepted.
    Active,
    /// No further moves are accepted.
    Ended(EndReason),
}

/// What a successfully applied move did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// The move as recorded in the history.
    pub mv: Move,
    /// Board side effects.
    pub flags: MoveFlags,
    /// The side now to move is in check.
    pub check: bool,
    /// The side now to move is mated.
    pub checkmate: bool,
    /// The side now to move is stalemated.
    pub stalemate: bool,
}

/// Read-only view of a game, suitable for sending to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Position as FEN.
    pub fen: String,
    /// Board rows in FEN order, each square a FEN letter or empty.
    pub board: [[Option<char>; 8]; 8],
    /// Side to move.
    pub turn: Color,
    /// Legal moves for the side to move, as UCI text.
    pub legal_moves: Vec<String>,
    /// The side to move is in check.
    pub check: bool,
    /// The side to move is mated.
    pub checkmate: bool,
    /// The side to move is stalemated.
    pub stalemate: bool,
    /// Most recent move, as UCI text.
    pub last_move: Option<String>,
}

/// Chess game engine.
#[derive(Debug, Clone)]
pub struct GameEngine {
    position: Position,
    history: Vec<Move>,
    status: GameStatus,
}

impl GameEngine {
    /// Creates a game from the standard starting position.
    #[instrument]
    pub fn new() -> Self {
        Self::from_position(Position::start())
    }

    /// Creates a game from an arbitrary position.
    #[instrument(skip(position))]
    pub fn from_position(position: Position) -> Self {
        let status = match rules::classify(&position) {
            Terminal::Ongoing => GameStatus::Active,
            Terminal::Checkmate => GameStatus::Ended(EndReason::Checkmate),
            Terminal::Stalemate => GameStatus::Ended(EndReason::Stalemate),
        };
        Self {
            position,
            history: Vec::new(),
            status,
        }
    }

    /// Creates a game from FEN text.
    ///
    /// # Errors
    ///
    /// Returns [`ChessErrorKind::MalformedInput`] if the FEN does not parse.
    #[instrument]
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        Ok(Self::from_position(load_fen(fen)?))
    }

    /// Current position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Moves played so far, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Lifecycle status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Side to move.
    pub fn turn(&self) -> Color {
        self.position.side_to_move()
    }

    /// Whether the game still accepts moves.
    pub fn is_active(&self) -> bool {
        self.status == GameStatus::Active
    }

    /// Parses and plays a UCI move for the side to move.
    ///
    /// # Errors
    ///
    /// - [`ChessErrorKind::MalformedInput`] for bad notation
    /// - [`ChessErrorKind::GameOver`] once the game has ended
    /// - [`ChessErrorKind::NotPlayersPiece`] if the origin is empty or holds
    ///   the other side's piece
    /// - [`ChessErrorKind::IllegalMove`] if the destination is not legal
    #[instrument(skip(self), fields(turn = %self.turn()))]
    pub fn apply_move(&mut self, uci: &str) -> Result<MoveOutcome, ChessError> {
        let requested = parse_uci(uci)?;

        if !self.is_active() {
            warn!(uci, "Move after game end");
            return Err(ChessError::new(ChessErrorKind::GameOver));
        }

        let piece = self.position.piece_at(requested.from).ok_or_else(|| {
            ChessError::new(ChessErrorKind::NotPlayersPiece(format!(
                "no piece on {}",
                requested.from
            )))
        })?;
        if piece.color != self.turn() {
            return Err(ChessError::new(ChessErrorKind::NotPlayersPiece(format!(
                "{} belongs to {}",
                requested.from, piece.color
            ))));
        }

        if !rules::legal_moves(&self.position, requested.from).contains(&requested.to) {
            debug!(uci, "Destination not legal");
            return Err(ChessError::new(ChessErrorKind::IllegalMove(
                requested.to_string(),
            )));
        }

        let promotes = piece.kind == PieceKind::Pawn
            && requested.to.row() == piece.color.promotion_row();
        let mv = Move {
            promotion: promotes.then(|| requested.promotion.unwrap_or(Promotion::Queen)),
            ..requested
        };

        let applied = rules::apply_move(&self.position, mv);
        self.verify(&applied.position);
        self.position = applied.position;
        self.history.push(mv);

        let mover = self.turn().opponent();
        let check = rules::in_check(&self.position, self.turn());
        let terminal = rules::classify(&self.position);
        match terminal {
            Terminal::Ongoing => {}
            Terminal::Checkmate => {
                info!(winner = %mover, "Checkmate");
                self.status = GameStatus::Ended(EndReason::Checkmate);
            }
            Terminal::Stalemate => {
                info!("Stalemate");
                self.status = GameStatus::Ended(EndReason::Stalemate);
            }
        }

        debug!(mv = %mv, check, ?terminal, "Move applied");
        Ok(MoveOutcome {
            mv,
            flags: applied.flags,
            check,
            checkmate: terminal == Terminal::Checkmate,
            stalemate: terminal == Terminal::Stalemate,
        })
    }

    /// Ends an active game for a reason outside the board.
    ///
    /// Has no effect on a game that already ended.
    #[instrument(skip(self))]
    pub fn end(&mut self, reason: EndReason) {
        if self.is_active() {
            info!(%reason, "Game ended");
            self.status = GameStatus::Ended(reason);
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> GameSnapshot {
        let legal_moves = if self.is_active() {
            rules::all_legal_moves(&self.position)
                .iter()
                .map(Move::to_string)
                .collect()
        } else {
            Vec::new()
        };

        let mut board = [[None; 8]; 8];
        for (row, rank) in self.position.board().iter().enumerate() {
            for (col, square) in rank.iter().enumerate() {
                board[row][col] = square.map(|p| p.to_fen_char());
            }
        }

        let check = rules::in_check(&self.position, self.turn());
        let status = self.status;
        GameSnapshot {
            fen: to_fen(&self.position),
            board,
            turn: self.turn(),
            legal_moves,
            check,
            checkmate: status == GameStatus::Ended(EndReason::Checkmate),
            stalemate: status == GameStatus::Ended(EndReason::Stalemate),
            last_move: self.history.last().map(Move::to_string),
        }
    }

    #[cfg(debug_assertions)]
    fn verify(&self, after: &Position) {
        use super::invariants::{Transition, check_transition};

        let transition = Transition {
            before: &self.position,
            after,
        };
        if let Err(violations) = check_transition(&transition) {
            for violation in violations {
                tracing::error!(description = %violation.description, "Invariant violated");
            }
        }
    }

    #[cfg(not(debug_assertions))]
    fn verify(&self, _after: &Position) {}
}

impl Default for GameEngine {
    fn default() -> Self {
        Self::new()
    }
}
