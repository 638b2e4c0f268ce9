//! Tests for the game engine.

use strictly_chess::{
    ChessErrorKind, Color, EndReason, GameEngine, GameStatus, Piece, PieceKind, Promotion,
    Square, parse_uci,
};

fn sq(text: &str) -> Square {
    Square::from_algebraic(text).expect("valid square")
}

fn play(game: &mut GameEngine, moves: &[&str]) {
    for uci in moves {
        game.apply_move(uci)
            .unwrap_or_else(|e| panic!("{uci} should be legal: {e}"));
    }
}

#[test]
fn test_first_move_updates_fen() {
    let mut game = GameEngine::new();
    let outcome = game.apply_move("e2e4").expect("legal");
    assert!(!outcome.flags.is_capture);
    assert!(!outcome.check);

    let fen = game.state().fen;
    let fields: Vec<&str> = fen.split(' ').collect();
    assert_eq!(fields[1], "b");
    assert_eq!(fields[3], "e3");
}

#[test]
fn test_en_passant_sequence() {
    let mut game = GameEngine::new();
    play(&mut game, &["e2e4", "a7a6", "e4e5", "d7d5"]);

    let outcome = game.apply_move("e5d6").expect("en passant is legal");
    assert!(outcome.flags.is_en_passant);
    assert!(outcome.flags.is_capture);

    let position = game.position();
    assert_eq!(position.piece_at(sq("d5")), None);
    assert_eq!(
        position.piece_at(sq("d6")),
        Some(Piece::new(PieceKind::Pawn, Color::White))
    );
}

#[test]
fn test_castling_via_engine() {
    let mut game = GameEngine::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").expect("valid");
    let outcome = game.apply_move("e1g1").expect("castling legal");
    assert!(outcome.flags.is_castle);
    assert_eq!(
        game.position().piece_at(sq("f1")),
        Some(Piece::new(PieceKind::Rook, Color::White))
    );
    assert!(game.state().fen.contains(" kq "));
}

#[test]
fn test_promotion_defaults_to_queen() {
    let mut game = GameEngine::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").expect("valid");
    let outcome = game.apply_move("a7a8").expect("legal");
    assert!(outcome.flags.is_promotion);
    assert_eq!(outcome.mv.promotion, Some(Promotion::Queen));
    assert_eq!(
        game.position().piece_at(sq("a8")),
        Some(Piece::new(PieceKind::Queen, Color::White))
    );
    assert_eq!(game.state().last_move.as_deref(), Some("a7a8q"));
}

#[test]
fn test_explicit_underpromotion() {
    let mut game = GameEngine::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").expect("valid");
    game.apply_move("a7a8n").expect("legal");
    assert_eq!(
        game.position().piece_at(sq("a8")),
        Some(Piece::new(PieceKind::Knight, Color::White))
    );
}

#[test]
fn test_promotion_suffix_ignored_on_ordinary_move() {
    let mut game = GameEngine::new();
    let outcome = game.apply_move("e2e4q").expect("legal");
    assert_eq!(outcome.mv.promotion, None);
    assert_eq!(game.history()[0], parse_uci("e2e4").expect("valid"));
}

#[test]
fn test_malformed_notation_rejected() {
    let mut game = GameEngine::new();
    for text in ["", "e2", "e9e4", "i2i4", "e2e4x", "hello"] {
        let err = game.apply_move(text).expect_err("malformed");
        assert!(
            matches!(err.kind(), ChessErrorKind::MalformedInput(_)),
            "{text}: {err}"
        );
    }
    assert!(game.history().is_empty());
}

#[test]
fn test_wrong_side_piece_rejected() {
    let mut game = GameEngine::new();
    let err = game.apply_move("e7e5").expect_err("black piece on white's turn");
    assert!(matches!(err.kind(), ChessErrorKind::NotPlayersPiece(_)));

    let err = game.apply_move("e3e4").expect_err("empty square");
    assert!(matches!(err.kind(), ChessErrorKind::NotPlayersPiece(_)));
}

#[test]
fn test_illegal_destination_rejected() {
    let mut game = GameEngine::new();
    let before = game.state();
    let err = game.apply_move("e2e5").expect_err("pawn cannot jump three");
    assert!(matches!(err.kind(), ChessErrorKind::IllegalMove(_)));
    assert_eq!(game.state(), before);
}

#[test]
fn test_fools_mate_ends_game() {
    let mut game = GameEngine::new();
    play(&mut game, &["f2f3", "e7e5", "g2g4"]);
    let outcome = game.apply_move("d8h4").expect("legal");

    assert!(outcome.check);
    assert!(outcome.checkmate);
    assert!(!outcome.stalemate);
    assert_eq!(game.status(), GameStatus::Ended(EndReason::Checkmate));

    let state = game.state();
    assert!(state.checkmate);
    assert!(state.legal_moves.is_empty());

    let err = game.apply_move("a2a3").expect_err("game over");
    assert_eq!(err.kind(), &ChessErrorKind::GameOver);
}

#[test]
fn test_stalemate_ends_game() {
    let mut game = GameEngine::from_fen("7k/4Q3/6K1/8/8/8/8/8 w - - 0 1").expect("valid");
    let outcome = game.apply_move("e7f7").expect("legal");
    assert!(outcome.stalemate);
    assert!(!outcome.check);
    assert_eq!(game.status(), GameStatus::Ended(EndReason::Stalemate));
    assert!(game.state().stalemate);
}

#[test]
fn test_external_end_is_idempotent() {
    let mut game = GameEngine::new();
    game.end(EndReason::Resignation);
    game.end(EndReason::Disconnection);
    assert_eq!(game.status(), GameStatus::Ended(EndReason::Resignation));
    assert!(game.state().legal_moves.is_empty());
}

#[test]
fn test_start_snapshot() {
    let state = GameEngine::new().state();
    assert_eq!(state.turn, Color::White);
    assert_eq!(state.legal_moves.len(), 20);
    assert!(state.legal_moves.contains(&"g1f3".to_string()));
    assert_eq!(state.last_move, None);
    assert_eq!(state.board[7][4], Some('K'));
    assert_eq!(state.board[0][3], Some('q'));
    assert_eq!(state.board[4][4], None);
    assert!(!state.check);
}

#[test]
fn test_snapshot_serializes_lowercase_turn() {
    let state = GameEngine::new().state();
    let json = serde_json::to_value(&state).expect("serializable");
    assert_eq!(json["turn"], "white");
}

#[test]
fn test_history_records_moves_in_order() {
    let mut game = GameEngine::new();
    play(&mut game, &["d2d4", "d7d5", "c2c4"]);
    let history: Vec<String> = game.history().iter().map(|m| m.to_string()).collect();
    assert_eq!(history, vec!["d2d4", "d7d5", "c2c4"]);
    assert_eq!(game.turn(), Color::Black);
}
