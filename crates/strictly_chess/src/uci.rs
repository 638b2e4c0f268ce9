//! UCI long algebraic move notation (`e2e4`, `e7e8q`).

use super::error::ChessError;
use super::types::{Move, Promotion, Square};
use tracing::instrument;

/// Parses UCI move text.
///
/// Surrounding whitespace is ignored. The optional fifth character must be
/// one of `q`, `r`, `b`, `n`.
///
/// # Errors
///
/// Returns [`ChessErrorKind::MalformedInput`](super::ChessErrorKind::MalformedInput)
/// for anything that is not `<file><rank><file><rank>[promotion]`.
#[instrument]
pub fn parse_uci(text: &str) -> Result<Move, ChessError> {
    let text = text.trim();
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return Err(ChessError::malformed(format!("Bad UCI move '{}'", text)));
    }

    let from = Square::from_algebraic(&text[0..2])
        .ok_or_else(|| ChessError::malformed(format!("Bad origin square in '{}'", text)))?;
    let to = Square::from_algebraic(&text[2..4])
        .ok_or_else(|| ChessError::malformed(format!("Bad target square in '{}'", text)))?;

    let promotion = match text[4..].chars().next() {
        None => None,
        Some(c) => Some(Promotion::from_char(c).ok_or_else(|| {
            ChessError::malformed(format!("Bad promotion piece '{}' in '{}'", c, text))
        })?),
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

/// Formats a move as UCI text.
pub fn to_uci(mv: &Move) -> String {
    mv.to_string()
}
