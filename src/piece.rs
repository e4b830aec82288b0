use crate::types::Piece;

impl Piece {
    /// Material value in centipawns. The king carries no material value;
    /// its safety is the legality filter's concern, not the evaluator's.
    pub const fn value(self) -> i32 {
        match self {
            Piece::Pawn => 100,
            Piece::Knight => 320,
            Piece::Bishop => 330,
            Piece::Rook => 500,
            Piece::Queen => 900,
            Piece::King => 0,
            Piece::Empty => 0,
        }
    }

    pub fn iter() -> impl Iterator<Item = Piece> {
        [
            Piece::Pawn,
            Piece::Knight,
            Piece::Bishop,
            Piece::Rook,
            Piece::Queen,
            Piece::King,
        ]
        .into_iter()
    }

    /// The lowercase letter used for this piece in move notation.
    pub const fn promotion_char(self) -> char {
        match self {
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            _ => 'q',
        }
    }

    pub const fn from_promotion_char(c: char) -> Option<Piece> {
        match c {
            'n' => Some(Piece::Knight),
            'b' => Some(Piece::Bishop),
            'r' => Some(Piece::Rook),
            'q' => Some(Piece::Queen),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Piece {
    type Error = &'static str;

    /// Converts from a number representing the piece
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 6 {
            return Err("Piece index out of range (must be 0-6)");
        }

        // SAFETY: We've verified value is in range 0-6, which matches our enum variants
        Ok(unsafe { std::mem::transmute::<u8, Piece>(value) })
    }
}
