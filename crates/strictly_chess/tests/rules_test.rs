//! Tests for move generation, legality and move execution.

use strictly_chess::{
    Color, Move, Piece, PieceKind, Position, Promotion, Square, Terminal, all_legal_moves,
    apply_move, classify, in_check, is_square_attacked, legal_moves, load_fen, raw_moves,
};

fn sq(text: &str) -> Square {
    Square::from_algebraic(text).expect("valid square")
}

fn fen(text: &str) -> Position {
    load_fen(text).expect("valid FEN")
}

fn sorted(mut squares: Vec<Square>) -> Vec<Square> {
    squares.sort();
    squares
}

#[test]
fn test_start_position_has_twenty_moves() {
    assert_eq!(all_legal_moves(&Position::start()).len(), 20);
}

#[test]
fn test_knight_moves_from_start() {
    let moves = sorted(legal_moves(&Position::start(), sq("b1")));
    assert_eq!(moves, sorted(vec![sq("a3"), sq("c3")]));
}

#[test]
fn test_pawn_single_and_double_push() {
    let moves = sorted(legal_moves(&Position::start(), sq("e2")));
    assert_eq!(moves, sorted(vec![sq("e3"), sq("e4")]));
}

#[test]
fn test_blocked_pawn_has_no_push() {
    let position = fen("4k3/8/8/8/4p3/4P3/8/4K3 w - - 0 1");
    assert!(legal_moves(&position, sq("e3")).is_empty());
}

#[test]
fn test_slider_stops_at_first_piece() {
    let position = fen("4k3/8/8/8/1p1R2P1/8/8/4K3 w - - 0 1");
    let moves = legal_moves(&position, sq("d4"));
    assert!(moves.contains(&sq("b4")), "enemy pawn capturable");
    assert!(!moves.contains(&sq("a4")), "ray stops at enemy pawn");
    assert!(moves.contains(&sq("f4")));
    assert!(!moves.contains(&sq("g4")), "own pawn not capturable");
    assert!(moves.contains(&sq("d8")));
    assert!(moves.contains(&sq("d1")));
}

#[test]
fn test_empty_square_has_no_moves() {
    assert!(raw_moves(&Position::start(), sq("e4")).is_empty());
    assert!(legal_moves(&Position::start(), sq("e4")).is_empty());
}

#[test]
fn test_pinned_piece_cannot_move() {
    let position = fen("k7/4r3/8/8/8/8/4B3/4K3 w - - 0 1");
    assert!(!raw_moves(&position, sq("e2")).is_empty());
    assert!(legal_moves(&position, sq("e2")).is_empty());
}

#[test]
fn test_king_cannot_step_into_attack() {
    let position = fen("k7/8/8/8/8/8/3r4/4K3 w - - 0 1");
    let moves = legal_moves(&position, sq("e1"));
    assert!(moves.contains(&sq("d2")), "undefended rook can be taken");
    assert!(!moves.contains(&sq("d1")));
    assert!(!moves.contains(&sq("e2")));
    assert!(moves.contains(&sq("f1")));
}

#[test]
fn test_attack_detection() {
    let start = Position::start();
    assert!(is_square_attacked(&start, sq("e3"), Color::White));
    assert!(!is_square_attacked(&start, sq("e4"), Color::White));
    assert!(is_square_attacked(&start, sq("f6"), Color::Black));
    assert!(!in_check(&start, Color::White));
}

#[test]
fn test_kingside_castle_moves_rook_and_clears_rights() {
    let position = fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
    let king_moves = legal_moves(&position, sq("e1"));
    assert!(king_moves.contains(&sq("g1")));
    assert!(king_moves.contains(&sq("c1")));

    let applied = apply_move(&position, Move::new(sq("e1"), sq("g1")));
    let after = &applied.position;
    assert!(applied.flags.is_castle);
    assert!(!applied.flags.is_capture);
    assert_eq!(
        after.piece_at(sq("g1")),
        Some(Piece::new(PieceKind::King, Color::White))
    );
    assert_eq!(
        after.piece_at(sq("f1")),
        Some(Piece::new(PieceKind::Rook, Color::White))
    );
    assert_eq!(after.piece_at(sq("h1")), None);
    assert_eq!(after.piece_at(sq("e1")), None);

    let rights = after.castling();
    assert!(!rights.white_kingside);
    assert!(!rights.white_queenside);
    assert!(rights.black_kingside);
    assert!(rights.black_queenside);
}

#[test]
fn test_queenside_castle_moves_rook() {
    let position = fen("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1");
    let applied = apply_move(&position, Move::new(sq("e8"), sq("c8")));
    assert!(applied.flags.is_castle);
    assert_eq!(
        applied.position.piece_at(sq("d8")),
        Some(Piece::new(PieceKind::Rook, Color::Black))
    );
    assert_eq!(applied.position.piece_at(sq("a8")), None);
    assert!(!applied.position.castling().black_queenside);
    assert!(!applied.position.castling().black_kingside);
}

#[test]
fn test_no_castling_through_attacked_square() {
    let position = fen("r3k2r/8/8/8/8/8/5r2/R3K2R w KQkq - 0 1");
    let moves = legal_moves(&position, sq("e1"));
    assert!(!moves.contains(&sq("g1")), "f1 is attacked");
    assert!(moves.contains(&sq("c1")));
}

#[test]
fn test_no_castling_out_of_check() {
    let position = fen("4k3/8/8/8/8/8/4r3/R3K2R w KQ - 0 1");
    let moves = raw_moves(&position, sq("e1"));
    assert!(!moves.contains(&sq("g1")));
    assert!(!moves.contains(&sq("c1")));
}

#[test]
fn test_no_castling_when_path_blocked() {
    let moves = legal_moves(&Position::start(), sq("e1"));
    assert!(moves.is_empty());
}

#[test]
fn test_no_castling_without_right() {
    let position = fen("r3k2r/8/8/8/8/8/8/R3K2R w kq - 0 1");
    let moves = legal_moves(&position, sq("e1"));
    assert!(!moves.contains(&sq("g1")));
    assert!(!moves.contains(&sq("c1")));
}

#[test]
fn test_capturing_rook_on_home_clears_right() {
    let position = fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
    let applied = apply_move(&position, Move::new(sq("a1"), sq("a8")));
    let rights = applied.position.castling();
    assert!(applied.flags.is_capture);
    assert!(!rights.white_queenside, "rook left its corner");
    assert!(!rights.black_queenside, "rook captured on its corner");
    assert!(rights.white_kingside);
    assert!(rights.black_kingside);
}

#[test]
fn test_en_passant_capture_removes_pawn() {
    let position = fen("rnbqkbnr/1pp1pppp/p7/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3");
    assert!(legal_moves(&position, sq("e5")).contains(&sq("d6")));

    let applied = apply_move(&position, Move::new(sq("e5"), sq("d6")));
    assert!(applied.flags.is_en_passant);
    assert!(applied.flags.is_capture);
    assert_eq!(applied.position.piece_at(sq("d5")), None);
    assert_eq!(applied.position.piece_at(sq("e5")), None);
    assert_eq!(
        applied.position.piece_at(sq("d6")),
        Some(Piece::new(PieceKind::Pawn, Color::White))
    );
    assert_eq!(applied.position.en_passant(), None);
    assert_eq!(applied.position.halfmove_clock(), 0);
}

#[test]
fn test_en_passant_unavailable_without_target() {
    let position = fen("rnbqkbnr/1pp1pppp/p7/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq - 0 3");
    assert!(!legal_moves(&position, sq("e5")).contains(&sq("d6")));
}

#[test]
fn test_double_push_sets_en_passant_target() {
    let applied = apply_move(&Position::start(), Move::new(sq("e2"), sq("e4")));
    assert_eq!(applied.position.en_passant(), Some(sq("e3")));

    let next = apply_move(&applied.position, Move::new(sq("g8"), sq("f6")));
    assert_eq!(next.position.en_passant(), None);
}

#[test]
fn test_promotion_expands_to_four_moves() {
    let position = fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
    let promotions: Vec<Option<Promotion>> = all_legal_moves(&position)
        .into_iter()
        .filter(|mv| mv.from == sq("a7"))
        .map(|mv| mv.promotion)
        .collect();
    assert_eq!(promotions.len(), 4);
    for promotion in [
        Promotion::Queen,
        Promotion::Rook,
        Promotion::Bishop,
        Promotion::Knight,
    ] {
        assert!(promotions.contains(&Some(promotion)));
    }
}

#[test]
fn test_promotion_defaults_to_queen() {
    let position = fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
    let applied = apply_move(&position, Move::new(sq("a7"), sq("a8")));
    assert!(applied.flags.is_promotion);
    assert_eq!(
        applied.position.piece_at(sq("a8")),
        Some(Piece::new(PieceKind::Queen, Color::White))
    );
}

#[test]
fn test_underpromotion() {
    let position = fen("4k3/8/8/8/8/8/p7/4K3 b - - 0 1");
    let applied = apply_move(
        &position,
        Move::with_promotion(sq("a2"), sq("a1"), Promotion::Knight),
    );
    assert_eq!(
        applied.position.piece_at(sq("a1")),
        Some(Piece::new(PieceKind::Knight, Color::Black))
    );
}

#[test]
fn test_clocks_update() {
    let start = Position::start();
    let after_knight = apply_move(&start, Move::new(sq("g1"), sq("f3"))).position;
    assert_eq!(after_knight.halfmove_clock(), 1);
    assert_eq!(after_knight.fullmove_number(), 1);
    assert_eq!(after_knight.side_to_move(), Color::Black);

    let after_black = apply_move(&after_knight, Move::new(sq("g8"), sq("f6"))).position;
    assert_eq!(after_black.halfmove_clock(), 2);
    assert_eq!(after_black.fullmove_number(), 2);

    let after_pawn = apply_move(&after_black, Move::new(sq("e2"), sq("e4"))).position;
    assert_eq!(after_pawn.halfmove_clock(), 0);
}

#[test]
fn test_clocks_saturate_at_limit() {
    let position = fen("4k3/8/8/8/8/8/8/4K3 b - - 4294967295 4294967295");
    let after = apply_move(&position, Move::new(sq("e8"), sq("d8"))).position;
    assert_eq!(after.halfmove_clock(), u32::MAX);
    assert_eq!(after.fullmove_number(), u32::MAX);
    assert_eq!(after.side_to_move(), Color::White);
}

#[test]
fn test_checkmate_classified() {
    let position = fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
    assert!(in_check(&position, Color::White));
    assert!(all_legal_moves(&position).is_empty());
    assert_eq!(classify(&position), Terminal::Checkmate);
}

#[test]
fn test_stalemate_classified() {
    let position = fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
    assert!(!in_check(&position, Color::Black));
    assert!(all_legal_moves(&position).is_empty());
    assert_eq!(classify(&position), Terminal::Stalemate);
}

#[test]
fn test_check_is_not_terminal_when_escapable() {
    let position = fen("4k3/8/8/8/8/8/4r3/4K3 w - - 0 1");
    assert!(in_check(&position, Color::White));
    assert_eq!(classify(&position), Terminal::Ongoing);
}

#[test]
fn test_playout_is_sound_and_rights_monotonic() {
    let mut position = Position::start();
    for ply in 0..80 {
        let moves = all_legal_moves(&position);
        if moves.is_empty() {
            break;
        }
        let mv = moves[(ply * 7 + 3) % moves.len()];
        let mover = position.side_to_move();
        let applied = apply_move(&position, mv);

        assert!(
            !in_check(&applied.position, mover),
            "{mv} left the mover in check"
        );
        assert!(
            applied
                .position
                .castling()
                .is_subset_of(&position.castling()),
            "{mv} restored a castling right"
        );
        position = applied.position;
    }
}
