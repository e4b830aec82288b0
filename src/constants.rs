/// NOTE: 1 ply = one move by a single player

pub const NUM_SQUARES: usize = 64;
pub const NUM_PIECE_TYPES: usize = 6;
pub const NUM_SIDES: usize = 2;
pub const NUM_RANKS: usize = 8;
pub const NUM_FILES: usize = 8;

pub const START_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Hard limit for search depth (in ply). Sizes the per-ply arrays.
pub const MAX_PLY: usize = 64;

/// Default depth ceiling when the caller gives neither a clock nor a depth.
pub const DEFAULT_MAX_DEPTH: u8 = 6;

// Scores
pub const INFINITY_SCORE: i32 = 50_000;
pub const MATE_SCORE: i32 = 30_000;
/// Anything above this is a mate score; the gap leaves room for ply offsets.
pub const MATE_BOUND: i32 = 29_000;
pub const DRAW_SCORE: i32 = 0;

// Move-ordering score bands. Sorted descending, so the hash move is tried
// first, then promotions, captures, killers, and finally history scores.
pub const HASH_SCORE: i32 = 100_000_000;
pub const PROMOTION_SCORE: i32 = 11_000_000;
pub const CAPTURE_SCORE: i32 = 10_000_000;
pub const KILLER_SCORE: i32 = 9_000_000;

/// History counters are halved across the board once any cell passes this.
pub const MAX_HISTORY_SCORE: i32 = 10_000;

// Quiescence pruning
/// Delta-pruning margin: a queen plus change, the largest plausible swing
/// a single capture can produce.
pub const DELTA_MARGIN: i32 = 975;
/// Captures estimated to lose more than a pawn are skipped in quiescence.
pub const SEE_PRUNE_MARGIN: i32 = -100;

// Null-move pruning
pub const NULL_MOVE_REDUCTION: i32 = 2;
pub const NULL_MOVE_MIN_DEPTH: i32 = 3;
/// Minimum non-pawn material for the side to move before a null move is
/// tried; below this, zugzwang makes the "free move" assumption unsound.
pub const NULL_MOVE_MATERIAL_FLOOR: i32 = 500;

/// Depth of the full-window root scoring pass that feeds the selector.
pub const CANDIDATE_DEPTH: u8 = 3;

// Time
pub const SOFT_TO_HARD_LIMIT_RATIO: f64 = 0.75;
/// How often (in visited nodes) the search polls the clock and stop flag.
pub const NODE_POLL_INTERVAL: u64 = 2048;

// Transposition table: power-of-2 slot count, indexed by key modulo size.
pub const NUM_HASH_SLOTS: usize = 1 << 20;

/// Seed for the Zobrist key tables. Fixed so that position hashes are
/// reproducible across processes.
pub const ZOBRIST_SEED: u64 = 0xB5AD_4ECE_DA1C_E2A9;

// Castling-right bits
pub const CASTLE_WHITE_KINGSIDE: u8 = 1;
pub const CASTLE_WHITE_QUEENSIDE: u8 = 2;
pub const CASTLE_BLACK_KINGSIDE: u8 = 4;
pub const CASTLE_BLACK_QUEENSIDE: u8 = 8;

/// Used to determine the castling permissions after a move.
/// We logical-AND the castle bits with the CASTLE_MASK bits for
/// both of the move's squares.
///
/// If white can castle kingside (bit 1) and a move touches h1 (the rook
/// moves away, or it is captured there), ANDing with CASTLE_MASK[7] = 14
/// clears that right. Squares that never affect castling hold 15.
#[rustfmt::skip]
pub const CASTLE_MASK: [u8; NUM_SQUARES] = [
	  13, 15, 15, 15, 12, 15, 15, 14,
	  15, 15, 15, 15, 15, 15, 15, 15,
	  15, 15, 15, 15, 15, 15, 15, 15,
	  15, 15, 15, 15, 15, 15, 15, 15,
	  15, 15, 15, 15, 15, 15, 15, 15,
	  15, 15, 15, 15, 15, 15, 15, 15,
	  15, 15, 15, 15, 15, 15, 15, 15,
	   7, 15, 15, 15,  3, 15, 15, 11
];
