#![allow(dead_code)]

/// Shared helpers for the integration tests.
use tempo_engine::{
    position::Position,
    search::{SearchLimits, Searcher},
    types::{Move, Square},
};

pub const KIWIPETE_FEN: &str =
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

pub fn position_from_fen(fen: &str) -> Position {
    Position::from_fen(fen).unwrap_or_else(|e| panic!("failed to load FEN '{fen}': {e}"))
}

pub fn search_to_depth(fen: &str, depth: u8) -> tempo_engine::search::SearchReport {
    let position = position_from_fen(fen);
    let mut searcher = Searcher::new();
    searcher.search(&position, &SearchLimits::depth(depth), &[])
}

/// Leaf-node count of the legal move tree, the standard move-generation
/// correctness measure.
pub fn perft(position: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut nodes = 0;

    for mv in position.legal_moves() {
        nodes += perft(&position.apply(mv), depth - 1);
    }

    nodes
}

pub fn find_move(position: &Position, from: Square, to: Square) -> Option<Move> {
    position
        .legal_moves()
        .into_iter()
        .find(|mv| mv.from == from && mv.to == to)
}

pub fn play(position: &Position, moves: &[&str]) -> Position {
    let mut current = position.clone();

    for text in moves {
        let mv = current
            .parse_move(text)
            .unwrap_or_else(|e| panic!("bad move '{text}': {e}"));
        current = current.apply(mv);
    }

    current
}
