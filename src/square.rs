use crate::{constants::NUM_FILES, types::Square};

impl Square {
    pub fn iter() -> impl Iterator<Item = Square> {
        (0u8..64).map(Square::from_index)
    }

    /// Converts a known-valid index (0-63) into a Square.
    #[inline]
    pub fn from_index(index: u8) -> Square {
        debug_assert!(index < 64, "square index out of range: {index}");

        // SAFETY: index is in range 0-63, which matches our enum variants
        unsafe { std::mem::transmute::<u8, Square>(index & 63) }
    }

    #[inline]
    pub fn as_bit(self) -> u64 {
        1u64 << (self as u64)
    }

    /// 0-indexed (0-7)
    pub fn rank(self) -> u8 {
        self as u8 / NUM_FILES as u8
    }

    /// 0-indexed (0-7)
    pub fn file(self) -> u8 {
        (self as u8) % (NUM_FILES as u8)
    }

    /// The same square from the other side's point of view ("e4" <-> "e5").
    pub fn mirrored(self) -> Square {
        Square::from_index(self as u8 ^ 56)
    }

    /// Parses coordinates like "e4". Returns `None` for anything else.
    pub fn from_algebraic(text: &str) -> Option<Square> {
        let mut chars = text.chars();
        let file = chars.next()?;
        let rank = chars.next()?;

        if chars.next().is_some() || !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return None;
        }

        Some(Square::from_index(
            (rank as u8 - b'1') * 8 + (file as u8 - b'a'),
        ))
    }
}

impl TryFrom<u8> for Square {
    type Error = &'static str;

    /// Converts from a number representing the square index
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 63 {
            return Err("Square index out of range (must be 0-63)");
        }

        Ok(Square::from_index(value))
    }
}

impl TryFrom<i32> for Square {
    type Error = &'static str;

    /// Converts from a number representing the square index
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if !(0..=63).contains(&value) {
            return Err("Square index out of range (must be 0-63)");
        }

        Ok(Square::from_index(value as u8))
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            (self.file() + b'a') as char,
            (self.rank() + b'1') as char
        )
    }
}
