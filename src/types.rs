#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[rustfmt::skip]
pub enum Square {
  A1 = 0, B1, C1, D1, E1, F1, G1, H1,
  A2, B2, C2, D2, E2, F2, G2, H2,
  A3, B3, C3, D3, E3, F3, G3, H3,
  A4, B4, C4, D4, E4, F4, G4, H4,
  A5, B5, C5, D5, E5, F5, G5, H5,
  A6, B6, C6, D6, E6, F6, G6, H6,
  A7, B7, C7, D7, E7, F7, G7, H7,
  A8, B8, C8, D8, E8, F8, G8, H8,
}

/// From white's viewpoint. Used to index the sliding-attack rays.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    N = 0,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Piece {
    Pawn = 0,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
    Empty,
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    White = 0,
    Black = 1,
}

impl Side {
    pub const fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn iter() -> impl Iterator<Item = Side> {
        [Side::White, Side::Black].into_iter()
    }
}

/// What a move does beyond relocating a piece. Each variant's application
/// logic lives in `Position::apply` and is matched exhaustively.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveKind {
    Normal,
    /// A two-square pawn advance, which makes the skipped square an
    /// en-passant target for one ply.
    DoublePush,
    EnPassant,
    Castle,
    Promotion(Piece),
}

/// A move is a pure value: two equal encodings are the same move.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub kind: MoveKind,
}

impl Move {
    pub const fn new(from: Square, to: Square, kind: MoveKind) -> Self {
        Self { from, to, kind }
    }

    pub const fn normal(from: Square, to: Square) -> Self {
        Self::new(from, to, MoveKind::Normal)
    }

    pub const fn promotion(self) -> Option<Piece> {
        match self.kind {
            MoveKind::Promotion(piece) => Some(piece),
            _ => None,
        }
    }
}

impl std::fmt::Display for Move {
    /// Long algebraic notation: "e2e4", "e7e8q". Castling prints as the
    /// king move ("e1g1"), matching the UCI convention.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;

        if let Some(piece) = self.promotion() {
            write!(f, "{}", piece.promotion_char())?;
        }

        Ok(())
    }
}
