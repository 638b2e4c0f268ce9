//! Tests for FEN import and export.

use strictly_chess::{
    CastlingRights, ChessErrorKind, Color, Piece, PieceKind, Position, START_FEN, Square,
    all_legal_moves, apply_move, load_fen, to_fen,
};

fn sq(text: &str) -> Square {
    Square::from_algebraic(text).expect("valid square")
}

#[test]
fn test_start_position_round_trips() {
    let position = load_fen(START_FEN).expect("start FEN parses");
    assert_eq!(position, Position::start());
    assert_eq!(to_fen(&position), START_FEN);
}

#[test]
fn test_fields_are_parsed() {
    let position = load_fen("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2")
        .expect("valid FEN");
    assert_eq!(position.side_to_move(), Color::White);
    assert_eq!(position.en_passant(), Some(sq("e6")));
    assert_eq!(position.halfmove_clock(), 0);
    assert_eq!(position.fullmove_number(), 2);
    assert_eq!(
        position.piece_at(sq("e5")),
        Some(Piece::new(PieceKind::Pawn, Color::Black))
    );
    assert_eq!(
        position.piece_at(sq("e4")),
        Some(Piece::new(PieceKind::Pawn, Color::White))
    );
}

#[test]
fn test_dash_fields_mean_none() {
    let position = load_fen("4k3/8/8/8/8/8/8/4K3 b - - 12 40").expect("valid FEN");
    assert_eq!(position.castling(), CastlingRights::none());
    assert_eq!(position.en_passant(), None);
    assert_eq!(position.side_to_move(), Color::Black);
    assert_eq!(to_fen(&position), "4k3/8/8/8/8/8/8/4K3 b - - 12 40");
}

#[test]
fn test_partial_castling_rights() {
    let position = load_fen("r3k2r/8/8/8/8/8/8/R3K2R w Kq - 0 1").expect("valid FEN");
    let rights = position.castling();
    assert!(rights.white_kingside);
    assert!(!rights.white_queenside);
    assert!(!rights.black_kingside);
    assert!(rights.black_queenside);
}

#[test]
fn test_short_rank_rejected() {
    let result = load_fen("rnbqkbnr/ppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    let err = result.expect_err("seven pawns cover only 7 files");
    assert!(matches!(err.kind(), ChessErrorKind::MalformedInput(_)));
}

#[test]
fn test_long_rank_rejected() {
    let result = load_fen("rnbqkbnrp/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    assert!(matches!(
        result.map_err(|e| e.kind),
        Err(ChessErrorKind::MalformedInput(_))
    ));
}

#[test]
fn test_missing_fields_rejected() {
    let result = load_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -");
    assert!(matches!(
        result.map_err(|e| e.kind),
        Err(ChessErrorKind::MalformedInput(_))
    ));
}

#[test]
fn test_wrong_rank_count_rejected() {
    let result = load_fen("rnbqkbnr/pppppppp/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    assert!(result.is_err());
}

#[test]
fn test_bad_tokens_rejected() {
    for fen in [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQxq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq z9 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 -1",
    ] {
        assert!(load_fen(fen).is_err(), "should reject {fen}");
    }
}

#[test]
fn test_round_trip_through_played_positions() {
    let mut position = Position::start();
    for ply in 0..40 {
        let moves = all_legal_moves(&position);
        if moves.is_empty() {
            break;
        }
        let mv = moves[(ply * 5 + 1) % moves.len()];
        position = apply_move(&position, mv).position;

        let fen = to_fen(&position);
        let reparsed = load_fen(&fen).expect("engine FEN parses");
        assert_eq!(reparsed, position, "round trip failed for {fen}");
    }
}
