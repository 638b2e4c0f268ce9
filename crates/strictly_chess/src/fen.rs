//! Forsyth–Edwards Notation import and export.

use super::error::ChessError;
use super::position::{CastlingRights, Position};
use super::types::{Color, Piece, Square};
use tracing::{debug, instrument};

/// Parses a six-field FEN string.
///
/// # Errors
///
/// Returns [`ChessErrorKind::MalformedInput`](super::ChessErrorKind::MalformedInput)
/// when a field is missing or any field fails to parse.
#[instrument]
pub fn load_fen(text: &str) -> Result<Position, ChessError> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(ChessError::malformed(format!(
            "FEN needs 6 fields, found {}",
            fields.len()
        )));
    }

    let mut position = Position::empty();
    parse_placement(fields[0], &mut position)?;

    let side = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => {
            return Err(ChessError::malformed(format!("Bad side to move '{}'", other)));
        }
    };
    position.set_side_to_move(side);
    position.set_castling(parse_castling(fields[2])?);

    let en_passant = match fields[3] {
        "-" => None,
        text => Some(Square::from_algebraic(text).ok_or_else(|| {
            ChessError::malformed(format!("Bad en passant square '{}'", text))
        })?),
    };
    position.set_en_passant(en_passant);

    let halfmove = fields[4]
        .parse::<u32>()
        .map_err(|_| ChessError::malformed(format!("Bad halfmove clock '{}'", fields[4])))?;
    let fullmove = fields[5]
        .parse::<u32>()
        .map_err(|_| ChessError::malformed(format!("Bad fullmove number '{}'", fields[5])))?;
    position.set_clocks(halfmove, fullmove);

    debug!(side = %side, "FEN parsed");
    Ok(position)
}

fn parse_placement(text: &str, position: &mut Position) -> Result<(), ChessError> {
    let rows: Vec<&str> = text.split('/').collect();
    if rows.len() != 8 {
        return Err(ChessError::malformed(format!(
            "Placement needs 8 ranks, found {}",
            rows.len()
        )));
    }

    for (row, rank_text) in rows.iter().enumerate() {
        let mut col: u8 = 0;
        for c in rank_text.chars() {
            if let Some(run) = c.to_digit(10) {
                if !(1..=8).contains(&run) {
                    return Err(ChessError::malformed(format!("Bad empty run '{}'", c)));
                }
                col += run as u8;
            } else {
                let piece = Piece::from_fen_char(c)
                    .ok_or_else(|| ChessError::malformed(format!("Unknown piece '{}'", c)))?;
                let square = Square::new(row as u8, col).ok_or_else(|| {
                    ChessError::malformed(format!("Rank '{}' overflows 8 files", rank_text))
                })?;
                position.set_piece(square, Some(piece));
                col += 1;
            }
            if col > 8 {
                return Err(ChessError::malformed(format!(
                    "Rank '{}' overflows 8 files",
                    rank_text
                )));
            }
        }
        if col != 8 {
            return Err(ChessError::malformed(format!(
                "Rank '{}' covers {} files, expected 8",
                rank_text, col
            )));
        }
    }
    Ok(())
}

fn parse_castling(text: &str) -> Result<CastlingRights, ChessError> {
    let mut rights = CastlingRights::none();
    if text == "-" {
        return Ok(rights);
    }
    for c in text.chars() {
        match c {
            'K' => rights.white_kingside = true,
            'Q' => rights.white_queenside = true,
            'k' => rights.black_kingside = true,
            'q' => rights.black_queenside = true,
            _ => {
                return Err(ChessError::malformed(format!(
                    "Bad castling field '{}'",
                    text
                )));
            }
        }
    }
    Ok(rights)
}

/// Encodes a position as FEN.
#[instrument(skip(position))]
pub fn to_fen(position: &Position) -> String {
    let mut fen = String::new();

    for (row, rank) in position.board().iter().enumerate() {
        let mut empty = 0;
        for square in rank {
            match square {
                Some(piece) => {
                    if empty > 0 {
                        fen.push_str(&empty.to_string());
                        empty = 0;
                    }
                    fen.push(piece.to_fen_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            fen.push_str(&empty.to_string());
        }
        if row < 7 {
            fen.push('/');
        }
    }

    fen.push(' ');
    fen.push(match position.side_to_move() {
        Color::White => 'w',
        Color::Black => 'b',
    });

    fen.push(' ');
    let rights = position.castling();
    let mut castling = String::new();
    if rights.white_kingside {
        castling.push('K');
    }
    if rights.white_queenside {
        castling.push('Q');
    }
    if rights.black_kingside {
        castling.push('k');
    }
    if rights.black_queenside {
        castling.push('q');
    }
    if castling.is_empty() {
        castling.push('-');
    }
    fen.push_str(&castling);

    fen.push(' ');
    match position.en_passant() {
        Some(square) => fen.push_str(&square.to_string()),
        None => fen.push('-'),
    }

    fen.push_str(&format!(
        " {} {}",
        position.halfmove_clock(),
        position.fullmove_number()
    ));
    fen
}
