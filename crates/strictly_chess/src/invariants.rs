//! First-class invariants for chess positions.
//!
//! Invariants are logical properties that must hold throughout game execution.
//! They are testable independently and serve as documentation of system guarantees.

use super::position::Position;
use super::types::{Color, PieceKind};

/// A logical property that must hold for a given state.
pub trait Invariant<S: ?Sized> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
pub trait InvariantSet<S: ?Sized> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S: ?Sized, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();

        if !I1::holds(state) {
            violations.push(InvariantViolation::new(I1::description()));
        }

        if !I2::holds(state) {
            violations.push(InvariantViolation::new(I2::description()));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// A single move's before and after positions.
#[derive(Debug, Clone, Copy)]
pub struct Transition<'a> {
    /// Position before the move.
    pub before: &'a Position,
    /// Position after the move.
    pub after: &'a Position,
}

/// Each side has exactly one king.
pub struct KingsPresent;

impl Invariant<Position> for KingsPresent {
    fn holds(state: &Position) -> bool {
        [Color::White, Color::Black].into_iter().all(|color| {
            state
                .squares_of(color)
                .filter(|(_, piece)| piece.kind == PieceKind::King)
                .count()
                == 1
        })
    }

    fn description() -> &'static str {
        "Each side must have exactly one king"
    }
}

/// An en passant target sits behind a pawn of the side that just moved.
pub struct EnPassantConsistent;

impl Invariant<Position> for EnPassantConsistent {
    fn holds(state: &Position) -> bool {
        let Some(target) = state.en_passant() else {
            return true;
        };
        let pusher = state.side_to_move().opponent();
        let expected_row = match pusher {
            Color::White => 5,
            Color::Black => 2,
        };
        let pawn_square = target.offset(pusher.pawn_direction(), 0);
        target.row() == expected_row
            && state.piece_at(target).is_none()
            && pawn_square
                .and_then(|sq| state.piece_at(sq))
                .is_some_and(|p| p.kind == PieceKind::Pawn && p.color == pusher)
    }

    fn description() -> &'static str {
        "En passant target must be the square a pawn just skipped"
    }
}

/// Castling rights only ever disappear.
pub struct CastlingMonotonic;

impl<'a> Invariant<Transition<'a>> for CastlingMonotonic {
    fn holds(state: &Transition<'a>) -> bool {
        state.after.castling().is_subset_of(&state.before.castling())
    }

    fn description() -> &'static str {
        "Castling rights must never reappear"
    }
}

/// Checks every invariant that applies to a played move.
pub fn check_transition(transition: &Transition<'_>) -> Result<(), Vec<InvariantViolation>> {
    let mut violations = match <(KingsPresent, EnPassantConsistent) as InvariantSet<Position>>::check_all(
        transition.after,
    ) {
        Ok(()) => Vec::new(),
        Err(found) => found,
    };
    if !CastlingMonotonic::holds(transition) {
        violations.push(InvariantViolation::new(CastlingMonotonic::description()));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
