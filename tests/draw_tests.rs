mod test_utils;

use test_utils::position_from_fen;

use tempo_engine::{
    constants::DRAW_SCORE,
    position::Position,
    search::{SearchLimits, Searcher},
};

#[test]
fn bare_kings_are_insufficient_material() {
    assert!(position_from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").insufficient_material());
}

#[test]
fn a_lone_minor_piece_cannot_mate() {
    assert!(position_from_fen("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1").insufficient_material());
    assert!(position_from_fen("4k3/8/8/8/8/8/8/1N2K3 w - - 0 1").insufficient_material());
}

#[test]
fn same_colored_single_bishops_cannot_mate() {
    // c1 and f8 are both dark squares.
    assert!(position_from_fen("4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1").insufficient_material());
}

#[test]
fn opposite_colored_bishops_can_still_mate() {
    // c1 is dark, e6 is light.
    assert!(!position_from_fen("4k3/8/4b3/8/8/8/8/2B1K3 w - - 0 1").insufficient_material());
}

#[test]
fn heavy_pieces_and_pawns_are_sufficient() {
    assert!(!position_from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").insufficient_material());
    assert!(!position_from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").insufficient_material());
    assert!(!position_from_fen("4k3/8/8/8/8/8/8/Q3K3 w - - 0 1").insufficient_material());
}

#[test]
fn two_minors_are_not_an_automatic_draw() {
    assert!(!position_from_fen("4k3/8/8/8/8/8/8/1NN1K3 w - - 0 1").insufficient_material());
}

#[test]
fn half_move_clock_advances_and_resets() {
    let position = position_from_fen("4k3/8/8/8/8/8/4P3/R3K3 w - - 10 40");

    let quiet = position.apply(position.parse_move("a1a5").expect("legal"));
    assert_eq!(quiet.fifty, 11);

    let pawn_push = position.apply(position.parse_move("e2e4").expect("legal"));
    assert_eq!(pawn_push.fifty, 0);
}

#[test]
fn capture_resets_the_half_move_clock() {
    let position = position_from_fen("4k3/8/8/8/r7/8/8/R3K3 w - - 30 60");

    let capture = position.apply(position.parse_move("a1a4").expect("legal"));
    assert_eq!(capture.fifty, 0);
}

/// With the clock at 99, every quiet reply lands on the no-progress
/// threshold, so the whole search collapses to the draw score despite
/// white's extra rook.
#[test]
fn fifty_move_rule_drains_a_winning_position_to_a_draw() {
    let position = position_from_fen("k7/8/8/8/8/8/8/1K5R w - - 99 80");
    let mut searcher = Searcher::new();

    let report = searcher.search(&position, &SearchLimits::depth(3), &[]);

    assert_eq!(report.score, DRAW_SCORE);
}

/// Seeding the game history with every successor hash makes each root
/// move an immediate repetition, so the search scores them all as drawn.
#[test]
fn repeating_a_game_position_scores_as_a_draw() {
    let position = Position::startpos();
    let history: Vec<u64> = position
        .legal_moves()
        .into_iter()
        .map(|mv| position.apply(mv).hash)
        .collect();

    let mut searcher = Searcher::new();
    let report = searcher.search(&position, &SearchLimits::depth(3), &history);

    assert_eq!(report.score, DRAW_SCORE);
}

#[test]
fn insufficient_material_ends_the_search_with_a_draw_score() {
    let position = position_from_fen("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1");
    let mut searcher = Searcher::new();

    let report = searcher.search(&position, &SearchLimits::depth(4), &[]);

    assert_eq!(report.score, DRAW_SCORE);
    assert!(report.best_move.is_some());
}
