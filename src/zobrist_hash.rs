use rand::{RngCore, SeedableRng, rngs::StdRng};
use std::sync::OnceLock;

use crate::{
    constants::{NUM_FILES, NUM_PIECE_TYPES, NUM_SIDES, NUM_SQUARES, ZOBRIST_SEED},
    position::Position,
    types::{Piece, Side, Square},
};

/// The pseudo-random XOR constants for every hashed position feature.
///
/// En-passant is hashed by file only: positions that transpose into each
/// other with en-passant targets on the same file must not get distinct
/// keys just because the target rank differs by side.
pub struct ZobristKeys {
    pub pieces: [[[u64; NUM_SQUARES]; NUM_PIECE_TYPES]; NUM_SIDES],
    pub side_to_move: u64,
    pub castling: [u64; 4],
    pub en_passant_file: [u64; NUM_FILES],
}

static KEYS: OnceLock<ZobristKeys> = OnceLock::new();

/// The key tables, generated once from a fixed seed so that the same
/// position hashes identically in every process.
pub fn keys() -> &'static ZobristKeys {
    KEYS.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);

        let mut pieces = [[[0u64; NUM_SQUARES]; NUM_PIECE_TYPES]; NUM_SIDES];

        for side in 0..NUM_SIDES {
            for piece in 0..NUM_PIECE_TYPES {
                for square in 0..NUM_SQUARES {
                    pieces[side][piece][square] = rng.next_u64();
                }
            }
        }

        let side_to_move = rng.next_u64();
        let castling = [
            rng.next_u64(),
            rng.next_u64(),
            rng.next_u64(),
            rng.next_u64(),
        ];

        let mut en_passant_file = [0u64; NUM_FILES];
        for key in en_passant_file.iter_mut() {
            *key = rng.next_u64();
        }

        ZobristKeys {
            pieces,
            side_to_move,
            castling,
            en_passant_file,
        }
    })
}

pub fn piece_key(side: Side, piece: Piece, square: Square) -> u64 {
    debug_assert!(piece != Piece::Empty, "cannot hash an empty square");
    keys().pieces[side as usize][piece as usize][square as usize]
}

/// XOR of the keys for every castling right set in the nibble.
pub fn castle_hash(castle: u8) -> u64 {
    let mut hash = 0u64;

    for bit in 0..4 {
        if castle & (1 << bit) != 0 {
            hash ^= keys().castling[bit];
        }
    }

    hash
}

pub fn en_passant_hash(en_passant: Option<Square>) -> u64 {
    match en_passant {
        Some(square) => keys().en_passant_file[square.file() as usize],
        None => 0,
    }
}

/// Recomputes the position hash from scratch. `Position::apply` maintains
/// the hash incrementally; the two must always agree.
pub fn full_hash(position: &Position) -> u64 {
    let mut hash = 0u64;

    for square in Square::iter() {
        let piece = position.kind_at(square);

        if piece != Piece::Empty {
            let side = position
                .side_at(square)
                .expect("occupied square must have an owner");
            hash ^= piece_key(side, piece, square);
        }
    }

    if position.side == Side::Black {
        hash ^= keys().side_to_move;
    }

    hash ^= castle_hash(position.castle);
    hash ^= en_passant_hash(position.en_passant);

    hash
}
