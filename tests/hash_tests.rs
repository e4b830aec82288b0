mod test_utils;

use test_utils::{play, position_from_fen};

use tempo_engine::{
    hash::{Bound, HashTable},
    position::Position,
    search::{SearchLimits, Searcher},
    types::{Move, Square},
    zobrist_hash,
};

#[test]
fn incremental_hash_matches_full_recomputation() {
    // A line touching every special case: double push, en passant,
    // castling and promotion.
    let mut position = Position::startpos();
    let line = [
        "e2e4", "d7d5", "e4d5", "g8f6", "g1f3", "c7c5", "d5c6", "b8c6", "f1b5", "e7e6", "e1g1",
        "f8e7", "b5c6", "b7c6", "f3e5", "e8g8", "d2d4", "a7a5", "d4d5", "a5a4", "d5d6", "a4a3",
        "d6e7", "a3b2", "e7d8q", "b2a1r",
    ];

    for text in line {
        let mv = position.parse_move(text).expect("scripted move is legal");
        position = position.apply(mv);

        assert_eq!(
            position.hash,
            zobrist_hash::full_hash(&position),
            "incremental hash diverged after {text}"
        );
    }
}

#[test]
fn transposing_back_restores_the_hash() {
    let start = Position::startpos();
    let toured = play(&start, &["g1f3", "g8f6", "f3g1", "f6g8"]);

    assert_eq!(toured.hash, start.hash);
}

#[test]
fn different_move_orders_reach_the_same_hash() {
    let start = Position::startpos();
    let via_e4 = play(&start, &["e2e3", "e7e6", "d2d3", "d7d6"]);
    let via_d3 = play(&start, &["d2d3", "d7d6", "e2e3", "e7e6"]);

    assert_eq!(via_e4.hash, via_d3.hash);
}

#[test]
fn side_to_move_changes_the_hash() {
    let white = position_from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1");
    let black = position_from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 1");

    assert_ne!(white.hash, black.hash);
}

#[test]
fn en_passant_file_is_hashed() {
    let without = position_from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
    let with = position_from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");

    assert_ne!(without.hash, with.hash);
}

#[test]
fn each_castling_right_changes_the_hash() {
    let all = position_from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
    let partial = ["Qkq", "Kkq", "KQq", "KQk"];

    for rights in partial {
        let fen = format!("r3k2r/8/8/8/8/8/8/R3K2R w {rights} - 0 1");
        assert_ne!(all.hash, position_from_fen(&fen).hash, "rights {rights}");
    }
}

#[test]
fn clocks_do_not_affect_the_hash() {
    let early = position_from_fen("4k3/8/8/8/8/8/4R3/4K3 w - - 0 1");
    let late = position_from_fen("4k3/8/8/8/8/8/4R3/4K3 w - - 42 90");

    assert_eq!(early.hash, late.hash);
}

#[test]
fn probe_misses_on_an_index_collision() {
    // One slot: every key maps to the same index, so any two distinct
    // keys collide. The full-key comparison must keep them apart.
    let mut table = HashTable::with_capacity(1);
    let first = Position::startpos();
    let second = position_from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1");
    assert_ne!(first.hash, second.hash);

    let mv = Move::normal(Square::G1, Square::F3);
    table.store(first.hash, 5, 33, Some(mv), Bound::Exact);

    assert!(table.probe(first.hash).is_some());
    assert!(table.probe(second.hash).is_none());

    // Always-replace: storing the second key evicts the first.
    let displaced = table.store(second.hash, 1, -10, None, Bound::Upper);
    assert!(displaced);
    assert!(table.probe(first.hash).is_none());
    assert!(table.probe(second.hash).is_some());
}

#[test]
fn stored_entries_come_back_intact() {
    let mut table = HashTable::with_capacity(1024);
    let position = Position::startpos();
    let mv = Move::normal(Square::E2, Square::E3);

    table.store(position.hash, 7, -125, Some(mv), Bound::Lower);

    let entry = table.probe(position.hash).expect("entry stored");
    assert_eq!(entry.depth, 7);
    assert_eq!(entry.score, -125);
    assert_eq!(entry.best_move, Some(mv));
    assert_eq!(entry.bound, Bound::Lower);
}

/// A cache entry whose key matches but whose move belongs to some other
/// position must never leak into play: the search re-validates the move
/// and the legality check rejects it.
#[test]
fn poisoned_table_entry_cannot_produce_an_illegal_move() {
    let position = position_from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");

    // A move no white piece in this position can make.
    let foreign_move = Move::normal(Square::A8, Square::A1);
    assert!(!position.is_legal(foreign_move));

    let mut table = HashTable::with_capacity(1);
    table.store(position.hash, 50, 25_000, Some(foreign_move), Bound::Exact);

    let mut searcher = Searcher::with_table(table);
    let report = searcher.search(&position, &SearchLimits::depth(3), &[]);

    let best = report.best_move.expect("white has legal moves");
    assert!(position.is_legal(best));
    assert_ne!(best, foreign_move);
}
