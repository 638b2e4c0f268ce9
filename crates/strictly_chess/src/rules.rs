//! Move generation, legality and move execution.
//!
//! Legality is decided by playing each candidate on a scratch copy of the
//! position and asking whether the mover's king is attacked afterwards. At
//! 64 squares this is cheap enough that no incremental attack map is kept.

use super::position::Position;
use super::types::{Color, Move, MoveFlags, Piece, PieceKind, Promotion, Square};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::{instrument, trace};

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const ROOK_RAYS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const BISHOP_RAYS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// Classification of a position for the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terminal {
    /// At least one legal move exists.
    Ongoing,
    /// No legal moves and the king is attacked.
    Checkmate,
    /// No legal moves and the king is safe.
    Stalemate,
}

/// Result of executing a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Position after the move.
    pub position: Position,
    /// What the move did.
    pub flags: MoveFlags,
}

/// Pseudo-legal destinations for the piece on `from`.
///
/// Ignores whether the mover's own king ends up in check. Castling targets
/// are included when the right is held, the path is empty and the king does
/// not start on, pass through or land on an attacked square.
#[instrument(level = "trace", skip(position), fields(from = %from))]
pub fn raw_moves(position: &Position, from: Square) -> Vec<Square> {
    pseudo_moves(position, from, true)
}

fn pseudo_moves(position: &Position, from: Square, with_castling: bool) -> Vec<Square> {
    let Some(piece) = position.piece_at(from) else {
        return Vec::new();
    };

    let mut targets = Vec::new();
    match piece.kind {
        PieceKind::Pawn => pawn_moves(position, from, piece.color, &mut targets),
        PieceKind::Knight => step_moves(position, from, piece.color, &KNIGHT_OFFSETS, &mut targets),
        PieceKind::Bishop => slide_moves(position, from, piece.color, &BISHOP_RAYS, &mut targets),
        PieceKind::Rook => slide_moves(position, from, piece.color, &ROOK_RAYS, &mut targets),
        PieceKind::Queen => {
            slide_moves(position, from, piece.color, &ROOK_RAYS, &mut targets);
            slide_moves(position, from, piece.color, &BISHOP_RAYS, &mut targets);
        }
        PieceKind::King => {
            step_moves(position, from, piece.color, &KING_OFFSETS, &mut targets);
            if with_castling {
                castling_moves(position, from, piece.color, &mut targets);
            }
        }
    }
    targets
}

fn pawn_moves(position: &Position, from: Square, color: Color, targets: &mut Vec<Square>) {
    let dir = color.pawn_direction();

    if let Some(one) = from.offset(dir, 0)
        && position.piece_at(one).is_none()
    {
        targets.push(one);
        if from.row() == color.pawn_home_row()
            && let Some(two) = from.offset(2 * dir, 0)
            && position.piece_at(two).is_none()
        {
            targets.push(two);
        }
    }

    for d_col in [-1, 1] {
        let Some(target) = from.offset(dir, d_col) else {
            continue;
        };
        match position.piece_at(target) {
            Some(other) if other.color != color => targets.push(target),
            None if position.en_passant() == Some(target) => targets.push(target),
            _ => {}
        }
    }
}

fn step_moves(
    position: &Position,
    from: Square,
    color: Color,
    offsets: &[(i8, i8)],
    targets: &mut Vec<Square>,
) {
    for &(d_row, d_col) in offsets {
        if let Some(target) = from.offset(d_row, d_col) {
            match position.piece_at(target) {
                Some(other) if other.color == color => {}
                _ => targets.push(target),
            }
        }
    }
}

fn slide_moves(
    position: &Position,
    from: Square,
    color: Color,
    rays: &[(i8, i8)],
    targets: &mut Vec<Square>,
) {
    for &(d_row, d_col) in rays {
        let mut current = from;
        while let Some(next) = current.offset(d_row, d_col) {
            match position.piece_at(next) {
                None => targets.push(next),
                Some(other) => {
                    if other.color != color {
                        targets.push(next);
                    }
                    break;
                }
            }
            current = next;
        }
    }
}

fn castling_moves(position: &Position, from: Square, color: Color, targets: &mut Vec<Square>) {
    let row = color.back_row();
    if from != square(row, 4) {
        return;
    }
    let rights = position.castling();
    let enemy = color.opponent();
    let rook = Some(Piece::new(PieceKind::Rook, color));

    if rights.kingside(color)
        && position.piece_at(square(row, 7)) == rook
        && [5, 6].iter().all(|&c| position.piece_at(square(row, c)).is_none())
        && [4, 5, 6]
            .iter()
            .all(|&c| !is_square_attacked(position, square(row, c), enemy))
    {
        targets.push(square(row, 6));
    }

    if rights.queenside(color)
        && position.piece_at(square(row, 0)) == rook
        && [1, 2, 3].iter().all(|&c| position.piece_at(square(row, c)).is_none())
        && [4, 3, 2]
            .iter()
            .all(|&c| !is_square_attacked(position, square(row, c), enemy))
    {
        targets.push(square(row, 2));
    }
}

/// Builds an on-board square from constants known to be in range.
fn square(row: u8, col: u8) -> Square {
    Square::new(row, col).unwrap_or_else(|| unreachable!("square ({row}, {col}) off board"))
}

/// Whether any piece of color `by` attacks `target`.
///
/// Castling is never considered an attack, which keeps castling legality
/// checks from recursing into themselves.
pub fn is_square_attacked(position: &Position, target: Square, by: Color) -> bool {
    position.squares_of(by).any(|(from, piece)| match piece.kind {
        PieceKind::King => {
            from != target
                && from.row().abs_diff(target.row()) <= 1
                && from.col().abs_diff(target.col()) <= 1
        }
        PieceKind::Pawn => {
            target.row() as i8 == from.row() as i8 + by.pawn_direction()
                && from.col().abs_diff(target.col()) == 1
        }
        _ => pseudo_moves(position, from, false).contains(&target),
    })
}

/// Whether `color`'s king is attacked. A missing king is never in check.
pub fn in_check(position: &Position, color: Color) -> bool {
    position
        .king_square(color)
        .is_some_and(|king| is_square_attacked(position, king, color.opponent()))
}

/// Destinations for the piece on `from` that do not leave its king in check.
#[instrument(level = "trace", skip(position), fields(from = %from))]
pub fn legal_moves(position: &Position, from: Square) -> Vec<Square> {
    let Some(piece) = position.piece_at(from) else {
        return Vec::new();
    };

    let legal: Vec<Square> = raw_moves(position, from)
        .into_iter()
        .filter(|&to| {
            let mut scratch = position.clone();
            play(&mut scratch, Move::new(from, to));
            !in_check(&scratch, piece.color)
        })
        .collect();

    trace!(count = legal.len(), "Legal destinations computed");
    legal
}

/// Every legal move for the side to move.
///
/// Pawn moves onto the last rank appear once per promotion piece.
#[instrument(level = "trace", skip(position))]
pub fn all_legal_moves(position: &Position) -> Vec<Move> {
    let color = position.side_to_move();
    let mut moves = Vec::new();

    for (from, piece) in position.squares_of(color) {
        for to in legal_moves(position, from) {
            if piece.kind == PieceKind::Pawn && to.row() == color.promotion_row() {
                moves.extend(Promotion::iter().map(|p| Move::with_promotion(from, to, p)));
            } else {
                moves.push(Move::new(from, to));
            }
        }
    }
    moves
}

/// Executes a move already known to be legal.
///
/// No validation happens here; callers check against [`legal_moves`] or
/// [`all_legal_moves`] first.
#[instrument(skip(position), fields(mv = %mv))]
pub fn apply_move(position: &Position, mv: Move) -> Applied {
    let mut next = position.clone();
    let flags = play(&mut next, mv);
    Applied {
        position: next,
        flags,
    }
}

/// Plays `mv` on `position` in place, updating every field.
fn play(position: &mut Position, mv: Move) -> MoveFlags {
    let mut flags = MoveFlags::default();
    let Some(mut piece) = position.piece_at(mv.from) else {
        return flags;
    };
    let mover = piece.color;
    let captured = position.piece_at(mv.to);
    flags.is_capture = captured.is_some();

    if piece.kind == PieceKind::Pawn
        && mv.from.col() != mv.to.col()
        && captured.is_none()
        && position.en_passant() == Some(mv.to)
    {
        flags.is_en_passant = true;
        flags.is_capture = true;
        position.set_piece(square(mv.from.row(), mv.to.col()), None);
    }

    if piece.kind == PieceKind::King && mv.from.col().abs_diff(mv.to.col()) == 2 {
        flags.is_castle = true;
        let row = mv.from.row();
        let (rook_from, rook_to) = if mv.to.col() == 6 { (7, 5) } else { (0, 3) };
        let rook = position.piece_at(square(row, rook_from));
        position.set_piece(square(row, rook_from), None);
        position.set_piece(square(row, rook_to), rook);
    }

    if piece.kind == PieceKind::Pawn && mv.to.row() == mover.promotion_row() {
        flags.is_promotion = true;
        piece.kind = mv.promotion.unwrap_or(Promotion::Queen).kind();
    }

    let pawn_move = position
        .piece_at(mv.from)
        .is_some_and(|p| p.kind == PieceKind::Pawn);

    position.set_piece(mv.from, None);
    position.set_piece(mv.to, Some(piece));

    let rights = position.castling_mut();
    rights.touch(mv.from);
    rights.touch(mv.to);

    let en_passant = (pawn_move && mv.from.row().abs_diff(mv.to.row()) == 2)
        .then(|| square((mv.from.row() + mv.to.row()) / 2, mv.from.col()));
    position.set_en_passant(en_passant);

    let halfmove = if pawn_move || flags.is_capture {
        0
    } else {
        position.halfmove_clock().saturating_add(1)
    };
    let fullmove = match mover {
        Color::Black => position.fullmove_number().saturating_add(1),
        Color::White => position.fullmove_number(),
    };
    position.set_clocks(halfmove, fullmove);
    position.set_side_to_move(mover.opponent());

    flags
}

/// Classifies the position for the side to move.
#[instrument(level = "trace", skip(position))]
pub fn classify(position: &Position) -> Terminal {
    if !all_legal_moves(position).is_empty() {
        return Terminal::Ongoing;
    }
    if in_check(position, position.side_to_move()) {
        Terminal::Checkmate
    } else {
        Terminal::Stalemate
    }
}
