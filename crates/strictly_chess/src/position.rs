//! Board position: pieces, side to move, castling rights and clocks.

use super::types::{Color, Piece, PieceKind, Square};
use serde::{Deserialize, Serialize};

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Which castling moves are still permitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastlingRights {
    /// White may castle short.
    pub white_kingside: bool,
    /// White may castle long.
    pub white_queenside: bool,
    /// Black may castle short.
    pub black_kingside: bool,
    /// Black may castle long.
    pub black_queenside: bool,
}

impl CastlingRights {
    /// All four rights held.
    pub fn all() -> Self {
        Self {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    /// No rights held.
    pub fn none() -> Self {
        Self::default()
    }

    /// Kingside right for a color.
    pub fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    /// Queenside right for a color.
    pub fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    /// True when every right held in `self` is also held in `earlier`.
    pub fn is_subset_of(&self, earlier: &CastlingRights) -> bool {
        (!self.white_kingside || earlier.white_kingside)
            && (!self.white_queenside || earlier.white_queenside)
            && (!self.black_kingside || earlier.black_kingside)
            && (!self.black_queenside || earlier.black_queenside)
    }

    /// Drops whatever rights depend on a piece standing on `square`.
    ///
    /// Called for both the origin and destination of every move, which
    /// covers the king moving, a rook leaving its corner and a rook being
    /// captured on its corner.
    pub(crate) fn touch(&mut self, square: Square) {
        match (square.row(), square.col()) {
            (7, 4) => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            (7, 7) => self.white_kingside = false,
            (7, 0) => self.white_queenside = false,
            (0, 4) => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
            (0, 7) => self.black_kingside = false,
            (0, 0) => self.black_queenside = false,
            _ => {}
        }
    }
}

/// A complete chess position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    board: [[Option<Piece>; 8]; 8],
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Position {
    /// An empty board with White to move and no rights.
    pub fn empty() -> Self {
        Self {
            board: [[None; 8]; 8],
            side_to_move: Color::White,
            castling: CastlingRights::none(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// The standard starting position.
    pub fn start() -> Self {
        let mut position = Self::empty();
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (col, kind) in back.into_iter().enumerate() {
            position.board[0][col] = Some(Piece::new(kind, Color::Black));
            position.board[1][col] = Some(Piece::new(PieceKind::Pawn, Color::Black));
            position.board[6][col] = Some(Piece::new(PieceKind::Pawn, Color::White));
            position.board[7][col] = Some(Piece::new(kind, Color::White));
        }
        position.castling = CastlingRights::all();
        position
    }

    /// Piece on a square.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board[square.row() as usize][square.col() as usize]
    }

    /// Places (or clears) a square.
    pub fn set_piece(&mut self, square: Square, piece: Option<Piece>) {
        self.board[square.row() as usize][square.col() as usize] = piece;
    }

    /// Rows of the board in FEN order.
    pub fn board(&self) -> &[[Option<Piece>; 8]; 8] {
        &self.board
    }

    /// Side to move.
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Castling rights.
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    /// En passant target square, valid for the current ply only.
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Plies since the last capture or pawn move.
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// Full move number, starting at 1 and incremented after Black moves.
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Squares holding pieces of the given color.
    pub fn squares_of(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| {
            self.piece_at(sq)
                .filter(|piece| piece.color == color)
                .map(|piece| (sq, piece))
        })
    }

    /// Location of the given color's king.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.squares_of(color)
            .find(|(_, piece)| piece.kind == PieceKind::King)
            .map(|(sq, _)| sq)
    }

    pub(crate) fn set_side_to_move(&mut self, color: Color) {
        self.side_to_move = color;
    }

    pub(crate) fn set_castling(&mut self, rights: CastlingRights) {
        self.castling = rights;
    }

    pub(crate) fn castling_mut(&mut self) -> &mut CastlingRights {
        &mut self.castling
    }

    pub(crate) fn set_en_passant(&mut self, square: Option<Square>) {
        self.en_passant = square;
    }

    pub(crate) fn set_clocks(&mut self, halfmove_clock: u32, fullmove_number: u32) {
        self.halfmove_clock = halfmove_clock;
        self.fullmove_number = fullmove_number;
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}
