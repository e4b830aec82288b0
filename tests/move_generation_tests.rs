mod test_utils;

use test_utils::{find_move, position_from_fen};

use tempo_engine::{
    position::Position,
    types::{Move, MoveKind, Piece, Square},
};

#[test]
fn start_position_has_twenty_moves() {
    let moves = Position::startpos().legal_moves();

    assert_eq!(moves.len(), 20);
    assert_eq!(
        moves.iter().filter(|m| m.kind == MoveKind::DoublePush).count(),
        8
    );
}

#[test]
fn both_castles_generated_when_clear() {
    let position = position_from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
    let moves = position.legal_moves();

    assert!(moves.contains(&Move::new(Square::E1, Square::G1, MoveKind::Castle)));
    assert!(moves.contains(&Move::new(Square::E1, Square::C1, MoveKind::Castle)));
    assert_eq!(moves.len(), 26);
}

#[test]
fn castle_blocked_by_pieces_is_not_generated() {
    let position = position_from_fen("r3k2r/8/8/8/8/8/8/RN2K2R w KQkq - 0 1");
    let moves = position.legal_moves();

    // The b1 knight blocks queenside but kingside is still open.
    assert!(!moves.contains(&Move::new(Square::E1, Square::C1, MoveKind::Castle)));
    assert!(moves.contains(&Move::new(Square::E1, Square::G1, MoveKind::Castle)));
}

#[test]
fn castle_through_an_attacked_square_is_not_generated() {
    // White's f1 rook covers f8: black may not castle kingside across it,
    // but queenside stays legal.
    let position = position_from_fen("r3k2r/8/8/8/8/8/8/R4RK1 b kq - 0 1");
    let moves = position.legal_moves();

    assert!(!moves.contains(&Move::new(Square::E8, Square::G8, MoveKind::Castle)));
    assert!(moves.contains(&Move::new(Square::E8, Square::C8, MoveKind::Castle)));
}

#[test]
fn no_castling_while_in_check() {
    let position = position_from_fen("r3k2r/8/8/8/8/8/4R3/4K3 b kq - 0 1");

    for mv in position.legal_moves() {
        assert_ne!(mv.kind, MoveKind::Castle);
    }
}

#[test]
fn en_passant_capture_is_generated() {
    let position =
        position_from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");

    let ep = Move::new(Square::E5, Square::F6, MoveKind::EnPassant);
    assert!(position.legal_moves().contains(&ep));

    // Applying it removes the f5 pawn, not a piece on the target square.
    let next = position.apply(ep);
    assert_eq!(next.kind_at(Square::F5), Piece::Empty);
    assert_eq!(next.kind_at(Square::F6), Piece::Pawn);
}

#[test]
fn en_passant_exposing_the_king_is_filtered_out() {
    // After exd3 both pawns leave the fourth rank and the h4 queen hits
    // the a4 king, so the capture is pseudo-legal but not legal.
    let position = position_from_fen("8/8/8/8/k2Pp2Q/8/8/4K3 b - d3 0 1");

    let ep = Move::new(Square::E4, Square::D3, MoveKind::EnPassant);
    assert!(position.pseudo_legal_moves().contains(&ep));
    assert!(!position.legal_moves().contains(&ep));
}

#[test]
fn promotions_generate_all_four_pieces() {
    let position = position_from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1");

    let promotions: Vec<Piece> = position
        .legal_moves()
        .into_iter()
        .filter_map(|mv| mv.promotion())
        .collect();

    assert_eq!(promotions.len(), 4);
    for piece in [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight] {
        assert!(promotions.contains(&piece));
    }
}

#[test]
fn capture_promotions_are_generated() {
    let position = position_from_fen("1n5k/P7/8/8/8/8/8/K7 w - - 0 1");
    let moves = position.legal_moves();

    // Push promotions and capture promotions toward b8.
    assert!(moves.contains(&Move::new(
        Square::A7,
        Square::B8,
        MoveKind::Promotion(Piece::Queen)
    )));
    assert!(moves.contains(&Move::new(
        Square::A7,
        Square::A8,
        MoveKind::Promotion(Piece::Queen)
    )));
}

#[test]
fn pinned_piece_may_not_move() {
    let position = position_from_fen("4k3/8/8/8/8/4r3/4N3/4K3 w - - 0 1");

    for mv in position.legal_moves() {
        assert_ne!(mv.from, Square::E2, "pinned knight moved: {mv}");
    }
}

#[test]
fn double_push_blocked_by_any_piece() {
    let position = position_from_fen("4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1");

    for mv in position.legal_moves() {
        assert_ne!(mv.kind, MoveKind::DoublePush);
        assert_ne!(mv.to, Square::E3);
    }
}

#[test]
fn parse_move_accepts_legal_input_and_rejects_the_rest() {
    let position = Position::startpos();

    let parsed = position.parse_move("e2e4").expect("e2e4 is legal");
    assert_eq!(parsed, Move::new(Square::E2, Square::E4, MoveKind::DoublePush));

    assert!(position.parse_move("e2e5").is_err());
    assert!(position.parse_move("e2").is_err());
    assert!(position.parse_move("x9e4").is_err());
}

#[test]
fn parse_move_requires_explicit_promotion_piece() {
    let position = position_from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1");

    let queen = position.parse_move("a7a8q").expect("promotion is legal");
    assert_eq!(queen.promotion(), Some(Piece::Queen));

    let knight = position.parse_move("a7a8n").expect("promotion is legal");
    assert_eq!(knight.promotion(), Some(Piece::Knight));

    // A bare pawn-to-last-rank move without the piece letter matches
    // nothing in the legal list.
    assert!(position.parse_move("a7a8").is_err());
}

#[test]
fn castling_also_moves_the_rook() {
    let position = position_from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
    let castled = position.apply(find_move(&position, Square::E1, Square::G1).expect("castle"));

    assert_eq!(castled.kind_at(Square::G1), Piece::King);
    assert_eq!(castled.kind_at(Square::F1), Piece::Rook);
    assert_eq!(castled.kind_at(Square::H1), Piece::Empty);
    assert_eq!(castled.castle & 0b0011, 0);
}

#[test]
fn moving_a_rook_revokes_one_castling_right() {
    let position = position_from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
    let moved = position.apply(find_move(&position, Square::H1, Square::G1).expect("rook move"));

    // Kingside gone, queenside kept.
    assert_eq!(moved.castle & 0b0001, 0);
    assert_ne!(moved.castle & 0b0010, 0);
}

#[test]
fn capturing_a_rook_revokes_the_opponents_right() {
    let position = position_from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
    let captured = position.apply(find_move(&position, Square::A1, Square::A8).expect("capture"));

    // Black queenside right disappears with the a8 rook.
    assert_eq!(captured.castle & 0b1000, 0);
    assert_ne!(captured.castle & 0b0100, 0);
}
