//! Strictly Chess - pure chess rules
//!
//! Positions, legal move generation, FEN and UCI notation, and a game engine
//! that tracks history and detects check, checkmate and stalemate.
//!
//! # Example
//!
//! ```
//! use strictly_chess::{GameEngine, Color};
//!
//! let mut game = GameEngine::new();
//! let outcome = game.apply_move("e2e4").unwrap();
//! assert!(!outcome.flags.is_capture);
//! assert_eq!(game.turn(), Color::Black);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod engine;
mod error;
mod fen;
mod invariants;
mod position;
mod rules;
mod types;
mod uci;

// Crate-level exports - Core types
pub use types::{Color, Move, MoveFlags, Piece, PieceKind, Promotion, Square};

// Crate-level exports - Position and notation
pub use fen::{load_fen, to_fen};
pub use position::{CastlingRights, Position, START_FEN};
pub use uci::{parse_uci, to_uci};

// Crate-level exports - Rules
pub use rules::{
    Applied, Terminal, all_legal_moves, apply_move, classify, in_check, is_square_attacked,
    legal_moves, raw_moves,
};

// Crate-level exports - Game engine
pub use engine::{EndReason, GameEngine, GameSnapshot, GameStatus, MoveOutcome};

// Crate-level exports - Errors
pub use error::{ChessError, ChessErrorKind};

// Crate-level exports - Invariants
pub use invariants::{
    CastlingMonotonic, EnPassantConsistent, Invariant, InvariantSet, InvariantViolation,
    KingsPresent, Transition, check_transition,
};
