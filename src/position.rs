use std::fmt;
use thiserror::Error;

use crate::{
    attacks,
    bitboard::BitBoard,
    constants::{
        CASTLE_BLACK_KINGSIDE, CASTLE_BLACK_QUEENSIDE, CASTLE_MASK, CASTLE_WHITE_KINGSIDE,
        CASTLE_WHITE_QUEENSIDE, NUM_PIECE_TYPES, NUM_RANKS, NUM_SIDES, NUM_SQUARES,
        START_POSITION_FEN,
    },
    types::{Move, MoveKind, Piece, Side, Square},
    zobrist_hash,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("expected at least 4 space-separated fields, found {0}")]
    MissingFields(usize),
    #[error("malformed board field: {0}")]
    Board(String),
    #[error("unknown side to move: {0}")]
    SideToMove(String),
    #[error("unknown castling flag: {0}")]
    Castling(char),
    #[error("malformed en passant field: {0}")]
    EnPassant(String),
    #[error("malformed clock field: {0}")]
    Clock(String),
}

/// A chess position. Every search step derives a new value via [`apply`];
/// nothing ever mutates a position another node still holds, so rollback
/// is just dropping the derived value.
///
/// Invariants: the two side masks are disjoint, every occupied square has
/// exactly one kind and one owner, and each side has exactly one king in
/// any position reachable through legal play.
///
/// [`apply`]: Position::apply
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    bit_pieces: [[BitBoard; NUM_PIECE_TYPES]; NUM_SIDES],
    bit_units: [BitBoard; NUM_SIDES],
    bit_all: BitBoard,
    board: [Piece; NUM_SQUARES],
    pub side: Side,
    pub castle: u8,
    pub en_passant: Option<Square>,
    /// Half-moves since the last capture or pawn move (no-progress rule).
    pub fifty: u8,
    pub fullmove: u16,
    /// Zobrist hash, maintained incrementally by `apply`.
    pub hash: u64,
}

impl Position {
    /// An empty board with white to move and no castling rights. Intended
    /// for building synthetic positions in tests.
    pub fn empty() -> Self {
        Self {
            bit_pieces: [[BitBoard::EMPTY; NUM_PIECE_TYPES]; NUM_SIDES],
            bit_units: [BitBoard::EMPTY; NUM_SIDES],
            bit_all: BitBoard::EMPTY,
            board: [Piece::Empty; NUM_SQUARES],
            side: Side::White,
            castle: 0,
            en_passant: None,
            fifty: 0,
            fullmove: 1,
            hash: 0,
        }
    }

    pub fn startpos() -> Self {
        Self::from_fen(START_POSITION_FEN).expect("start position FEN is valid")
    }

    pub fn place(&mut self, square: Square, piece: Piece, side: Side) {
        debug_assert!(piece != Piece::Empty, "cannot place an empty piece");
        debug_assert!(
            self.board[square as usize] == Piece::Empty,
            "place on occupied square {square}"
        );

        self.bit_pieces[side as usize][piece as usize].set_bit(square);
        self.bit_units[side as usize].set_bit(square);
        self.bit_all.set_bit(square);
        self.board[square as usize] = piece;
        self.hash ^= zobrist_hash::piece_key(side, piece, square);
    }

    /// Removes whatever stands on `square`; a no-op for empty squares.
    pub fn remove(&mut self, square: Square) {
        let piece = self.board[square as usize];

        if piece == Piece::Empty {
            return;
        }

        let side = self
            .side_at(square)
            .expect("occupied square must have an owner");

        self.bit_pieces[side as usize][piece as usize].clear_bit(square);
        self.bit_units[side as usize].clear_bit(square);
        self.bit_all.clear_bit(square);
        self.board[square as usize] = Piece::Empty;
        self.hash ^= zobrist_hash::piece_key(side, piece, square);
    }

    fn move_piece(&mut self, side: Side, piece: Piece, from: Square, to: Square) {
        debug_assert_eq!(self.board[from as usize], piece);

        self.bit_pieces[side as usize][piece as usize].clear_bit(from);
        self.bit_pieces[side as usize][piece as usize].set_bit(to);
        self.bit_units[side as usize].clear_bit(from);
        self.bit_units[side as usize].set_bit(to);
        self.bit_all.clear_bit(from);
        self.bit_all.set_bit(to);
        self.board[from as usize] = Piece::Empty;
        self.board[to as usize] = piece;
        self.hash ^= zobrist_hash::piece_key(side, piece, from);
        self.hash ^= zobrist_hash::piece_key(side, piece, to);
    }

    pub fn kind_at(&self, square: Square) -> Piece {
        self.board[square as usize]
    }

    pub fn side_at(&self, square: Square) -> Option<Side> {
        if self.bit_units[Side::White as usize].is_bit_set(square) {
            Some(Side::White)
        } else if self.bit_units[Side::Black as usize].is_bit_set(square) {
            Some(Side::Black)
        } else {
            None
        }
    }

    pub fn pieces(&self, side: Side, piece: Piece) -> BitBoard {
        self.bit_pieces[side as usize][piece as usize]
    }

    pub fn units(&self, side: Side) -> BitBoard {
        self.bit_units[side as usize]
    }

    pub fn occupied(&self) -> BitBoard {
        self.bit_all
    }

    pub fn king_square(&self, side: Side) -> Square {
        self.bit_pieces[side as usize][Piece::King as usize]
            .lsb_square()
            .expect("side has no king; position is corrupt")
    }

    pub fn is_square_attacked(&self, square: Square, by: Side) -> bool {
        if (attacks::pawn_attacks(by.opponent(), square) & self.pieces(by, Piece::Pawn)).any() {
            return true;
        }

        if (attacks::knight_attacks(square) & self.pieces(by, Piece::Knight)).any() {
            return true;
        }

        if (attacks::king_attacks(square) & self.pieces(by, Piece::King)).any() {
            return true;
        }

        let straight = self.pieces(by, Piece::Rook) | self.pieces(by, Piece::Queen);
        if (attacks::rook_attacks(square, self.bit_all) & straight).any() {
            return true;
        }

        let diagonal = self.pieces(by, Piece::Bishop) | self.pieces(by, Piece::Queen);
        if (attacks::bishop_attacks(square, self.bit_all) & diagonal).any() {
            return true;
        }

        false
    }

    pub fn in_check(&self, side: Side) -> bool {
        self.is_square_attacked(self.king_square(side), side.opponent())
    }

    /// Derives the position after `mv`. The receiver is untouched.
    ///
    /// `mv` must be pseudo-legal here; feeding an arbitrary move is a
    /// programming error. Whether the mover's king is left attacked is the
    /// caller's concern (that is the legality filter).
    pub fn apply(&self, mv: Move) -> Position {
        let mut next = self.clone();
        let mover = self.side;
        let piece = self.kind_at(mv.from);

        debug_assert!(piece != Piece::Empty, "apply from an empty square");
        debug_assert_eq!(self.side_at(mv.from), Some(mover), "apply moves a piece of the wrong side");

        next.fifty = self.fifty.saturating_add(1);
        next.hash ^= zobrist_hash::en_passant_hash(next.en_passant);
        next.en_passant = None;
        next.hash ^= zobrist_hash::castle_hash(next.castle);

        match mv.kind {
            MoveKind::Normal => {
                if next.kind_at(mv.to) != Piece::Empty {
                    next.remove(mv.to);
                    next.fifty = 0;
                }

                next.move_piece(mover, piece, mv.from, mv.to);

                if piece == Piece::Pawn {
                    next.fifty = 0;
                }
            }
            MoveKind::DoublePush => {
                next.move_piece(mover, Piece::Pawn, mv.from, mv.to);
                next.fifty = 0;

                let skipped = Square::from_index((mv.from as u8 + mv.to as u8) / 2);
                next.en_passant = Some(skipped);
                next.hash ^= zobrist_hash::en_passant_hash(next.en_passant);
            }
            MoveKind::EnPassant => {
                // The captured pawn is not on the destination square.
                let captured = match mover {
                    Side::White => Square::from_index(mv.to as u8 - 8),
                    Side::Black => Square::from_index(mv.to as u8 + 8),
                };

                next.remove(captured);
                next.move_piece(mover, Piece::Pawn, mv.from, mv.to);
                next.fifty = 0;
            }
            MoveKind::Castle => {
                let (rook_from, rook_to) = match mv.to {
                    Square::G1 => (Square::H1, Square::F1),
                    Square::C1 => (Square::A1, Square::D1),
                    Square::G8 => (Square::H8, Square::F8),
                    Square::C8 => (Square::A8, Square::D8),
                    _ => unreachable!("castle move to a non-castling square"),
                };

                next.move_piece(mover, Piece::King, mv.from, mv.to);
                next.move_piece(mover, Piece::Rook, rook_from, rook_to);
            }
            MoveKind::Promotion(promoted) => {
                if next.kind_at(mv.to) != Piece::Empty {
                    next.remove(mv.to);
                }

                next.remove(mv.from);
                next.place(mv.to, promoted, mover);
                next.fifty = 0;
            }
        }

        next.castle &= CASTLE_MASK[mv.from as usize] & CASTLE_MASK[mv.to as usize];
        next.hash ^= zobrist_hash::castle_hash(next.castle);

        next.side = mover.opponent();
        next.hash ^= zobrist_hash::keys().side_to_move;

        if mover == Side::Black {
            next.fullmove += 1;
        }

        next
    }

    /// Derives the position with the move passed to the opponent. Used by
    /// null-move pruning; not a legal chess move.
    pub fn make_null(&self) -> Position {
        let mut next = self.clone();

        next.hash ^= zobrist_hash::en_passant_hash(next.en_passant);
        next.en_passant = None;
        next.side = self.side.opponent();
        next.hash ^= zobrist_hash::keys().side_to_move;

        next
    }

    /// Total material excluding pawns and the king, for one side.
    pub fn non_pawn_material(&self, side: Side) -> i32 {
        [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen]
            .into_iter()
            .map(|piece| piece.value() * self.pieces(side, piece).pop_count() as i32)
            .sum()
    }

    /// Neither side can force mate: bare kings, a lone minor piece, or a
    /// single bishop each on same-colored squares.
    pub fn insufficient_material(&self) -> bool {
        for piece in [Piece::Pawn, Piece::Rook, Piece::Queen] {
            for side in Side::iter() {
                if self.pieces(side, piece).any() {
                    return false;
                }
            }
        }

        let minors = |side: Side| {
            self.pieces(side, Piece::Knight).pop_count() + self.pieces(side, Piece::Bishop).pop_count()
        };

        let (white_minors, black_minors) = (minors(Side::White), minors(Side::Black));

        if white_minors + black_minors <= 1 {
            return true;
        }

        if white_minors == 1
            && black_minors == 1
            && self.pieces(Side::White, Piece::Bishop).pop_count() == 1
            && self.pieces(Side::Black, Piece::Bishop).pop_count() == 1
        {
            let color_of = |bishops: BitBoard| {
                let square = bishops.lsb_square().expect("bishop count checked");
                (square.rank() + square.file()) % 2
            };

            return color_of(self.pieces(Side::White, Piece::Bishop))
                == color_of(self.pieces(Side::Black, Piece::Bishop));
        }

        false
    }

    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();

        if fields.len() < 4 {
            return Err(FenError::MissingFields(fields.len()));
        }

        let mut position = Position::empty();

        // Board: ranks from 8 down to 1, '/' separated
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != NUM_RANKS {
            return Err(FenError::Board(format!(
                "expected 8 ranks, found {}",
                ranks.len()
            )));
        }

        for (row, rank_text) in ranks.iter().enumerate() {
            let rank = 7 - row as u8;
            let mut file = 0u8;

            for c in rank_text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                    continue;
                }

                if file >= 8 {
                    return Err(FenError::Board(format!("rank {} overflows", rank + 1)));
                }

                let side = if c.is_ascii_uppercase() {
                    Side::White
                } else {
                    Side::Black
                };

                let piece = match c.to_ascii_lowercase() {
                    'p' => Piece::Pawn,
                    'n' => Piece::Knight,
                    'b' => Piece::Bishop,
                    'r' => Piece::Rook,
                    'q' => Piece::Queen,
                    'k' => Piece::King,
                    _ => return Err(FenError::Board(format!("unknown piece '{c}'"))),
                };

                position.place(Square::from_index(rank * 8 + file), piece, side);
                file += 1;
            }

            if file != 8 {
                return Err(FenError::Board(format!("rank {} has {file} files", rank + 1)));
            }
        }

        for side in Side::iter() {
            if position.pieces(side, Piece::King).pop_count() != 1 {
                return Err(FenError::Board(format!("{side:?} must have exactly one king")));
            }
        }

        position.side = match fields[1] {
            "w" => Side::White,
            "b" => Side::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };

        if fields[2] != "-" {
            for c in fields[2].chars() {
                position.castle |= match c {
                    'K' => CASTLE_WHITE_KINGSIDE,
                    'Q' => CASTLE_WHITE_QUEENSIDE,
                    'k' => CASTLE_BLACK_KINGSIDE,
                    'q' => CASTLE_BLACK_QUEENSIDE,
                    _ => return Err(FenError::Castling(c)),
                };
            }
        }

        position.sanitize_castling_rights();

        position.en_passant = match fields[3] {
            "-" => None,
            text => Some(
                Square::from_algebraic(text)
                    .ok_or_else(|| FenError::EnPassant(text.to_string()))?,
            ),
        };

        if let Some(field) = fields.get(4) {
            position.fifty = field
                .parse()
                .map_err(|_| FenError::Clock((*field).to_string()))?;
        }

        if let Some(field) = fields.get(5) {
            position.fullmove = field
                .parse()
                .map_err(|_| FenError::Clock((*field).to_string()))?;
        }

        position.hash = zobrist_hash::full_hash(&position);

        Ok(position)
    }

    /// Drops castling rights whose king or rook is no longer on its home
    /// square, so a sloppy FEN cannot smuggle in an impossible castle.
    fn sanitize_castling_rights(&mut self) {
        let rook_at = |position: &Position, square: Square, side: Side| {
            position.kind_at(square) == Piece::Rook && position.side_at(square) == Some(side)
        };

        if self.kind_at(Square::E1) != Piece::King || self.side_at(Square::E1) != Some(Side::White)
        {
            self.castle &= !(CASTLE_WHITE_KINGSIDE | CASTLE_WHITE_QUEENSIDE);
        }
        if !rook_at(self, Square::H1, Side::White) {
            self.castle &= !CASTLE_WHITE_KINGSIDE;
        }
        if !rook_at(self, Square::A1, Side::White) {
            self.castle &= !CASTLE_WHITE_QUEENSIDE;
        }

        if self.kind_at(Square::E8) != Piece::King || self.side_at(Square::E8) != Some(Side::Black)
        {
            self.castle &= !(CASTLE_BLACK_KINGSIDE | CASTLE_BLACK_QUEENSIDE);
        }
        if !rook_at(self, Square::H8, Side::Black) {
            self.castle &= !CASTLE_BLACK_KINGSIDE;
        }
        if !rook_at(self, Square::A8, Side::Black) {
            self.castle &= !CASTLE_BLACK_QUEENSIDE;
        }
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::new();

        for rank in (0..8u8).rev() {
            let mut empty_run = 0;

            for file in 0..8u8 {
                let square = Square::from_index(rank * 8 + file);
                let piece = self.kind_at(square);

                if piece == Piece::Empty {
                    empty_run += 1;
                    continue;
                }

                if empty_run > 0 {
                    fen.push_str(&empty_run.to_string());
                    empty_run = 0;
                }

                fen.push(Self::piece_char(
                    piece,
                    self.side_at(square).expect("occupied square has an owner"),
                ));
            }

            if empty_run > 0 {
                fen.push_str(&empty_run.to_string());
            }

            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side {
            Side::White => 'w',
            Side::Black => 'b',
        });

        fen.push(' ');
        if self.castle == 0 {
            fen.push('-');
        } else {
            for (bit, c) in [
                (CASTLE_WHITE_KINGSIDE, 'K'),
                (CASTLE_WHITE_QUEENSIDE, 'Q'),
                (CASTLE_BLACK_KINGSIDE, 'k'),
                (CASTLE_BLACK_QUEENSIDE, 'q'),
            ] {
                if self.castle & bit != 0 {
                    fen.push(c);
                }
            }
        }

        match self.en_passant {
            Some(square) => fen.push_str(&format!(" {square}")),
            None => fen.push_str(" -"),
        }

        fen.push_str(&format!(" {} {}", self.fifty, self.fullmove));

        fen
    }

    fn piece_char(piece: Piece, side: Side) -> char {
        let c = match piece {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
            Piece::Empty => '.',
        };

        match side {
            Side::White => c.to_ascii_uppercase(),
            Side::Black => c,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8u8).rev() {
            write!(f, "{} ", rank + 1)?;

            for file in 0..8u8 {
                let square = Square::from_index(rank * 8 + file);

                match self.side_at(square) {
                    Some(side) => write!(f, "{} ", Self::piece_char(self.kind_at(square), side))?,
                    None => write!(f, ". ")?,
                }
            }

            writeln!(f)?;
        }

        writeln!(f, "  a b c d e f g h")
    }
}
