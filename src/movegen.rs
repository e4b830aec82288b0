use thiserror::Error;

use crate::{
    attacks,
    constants::{
        CASTLE_BLACK_KINGSIDE, CASTLE_BLACK_QUEENSIDE, CASTLE_WHITE_KINGSIDE,
        CASTLE_WHITE_QUEENSIDE,
    },
    position::Position,
    types::{Move, MoveKind, Piece, Side, Square},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveParseError {
    #[error("move string must be 4 or 5 characters: {0}")]
    Length(String),
    #[error("malformed square in move: {0}")]
    Square(String),
    #[error("unknown promotion piece: {0}")]
    Promotion(char),
    #[error("move is not legal in this position: {0}")]
    Illegal(String),
}

const PROMOTION_PIECES: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

impl Position {
    /// Every move the side to move could make if checks did not exist.
    /// Castling is fully gated here (rights, empty path, safe transit);
    /// everything else must pass the king-safety filter before it counts
    /// as legal.
    pub fn pseudo_legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(48);

        self.push_pawn_moves(&mut moves);
        self.push_leaper_moves(Piece::Knight, &mut moves);
        self.push_slider_moves(&mut moves);
        self.push_leaper_moves(Piece::King, &mut moves);
        self.push_castle_moves(&mut moves);

        moves
    }

    /// The complete, sound set of legal moves: every pseudo-legal move
    /// whose resulting position does not leave the mover's king attacked.
    pub fn legal_moves(&self) -> Vec<Move> {
        self.pseudo_legal_moves()
            .into_iter()
            .filter(|&mv| !self.apply(mv).in_check(self.side))
            .collect()
    }

    /// Captures and promotions only, still pseudo-legal. Quiescence search
    /// applies the king-safety filter as it derives each move.
    pub fn tactical_moves(&self) -> Vec<Move> {
        self.pseudo_legal_moves()
            .into_iter()
            .filter(|&mv| self.is_tactical(mv))
            .collect()
    }

    pub fn is_tactical(&self, mv: Move) -> bool {
        match mv.kind {
            MoveKind::EnPassant | MoveKind::Promotion(_) => true,
            MoveKind::Castle | MoveKind::DoublePush => false,
            MoveKind::Normal => self.kind_at(mv.to) != Piece::Empty,
        }
    }

    /// Whether `mv` is legal here right now. Used to re-validate moves
    /// whose provenance is untrusted (transposition cache, root selector)
    /// before they are played or surfaced.
    pub fn is_legal(&self, mv: Move) -> bool {
        self.pseudo_legal_moves().contains(&mv) && !self.apply(mv).in_check(self.side)
    }

    fn push_pawn_moves(&self, moves: &mut Vec<Move>) {
        let side = self.side;
        let enemy = self.units(side.opponent());

        let (push, double_rank, promotion_rank) = match side {
            Side::White => (8i8, 1u8, 7u8),
            Side::Black => (-8i8, 6u8, 0u8),
        };

        for from in self.pieces(side, Piece::Pawn) {
            let ahead = Square::from_index((from as i8 + push) as u8);

            if self.kind_at(ahead) == Piece::Empty {
                if ahead.rank() == promotion_rank {
                    for promoted in PROMOTION_PIECES {
                        moves.push(Move::new(from, ahead, MoveKind::Promotion(promoted)));
                    }
                } else {
                    moves.push(Move::normal(from, ahead));

                    if from.rank() == double_rank {
                        let double = Square::from_index((from as i8 + 2 * push) as u8);

                        if self.kind_at(double) == Piece::Empty {
                            moves.push(Move::new(from, double, MoveKind::DoublePush));
                        }
                    }
                }
            }

            for to in attacks::pawn_attacks(side, from) & enemy {
                if to.rank() == promotion_rank {
                    for promoted in PROMOTION_PIECES {
                        moves.push(Move::new(from, to, MoveKind::Promotion(promoted)));
                    }
                } else {
                    moves.push(Move::normal(from, to));
                }
            }
        }

        if let Some(target) = self.en_passant {
            // Our pawns that attack the target square may capture in passing.
            let capturers =
                attacks::pawn_attacks(side.opponent(), target) & self.pieces(side, Piece::Pawn);

            for from in capturers {
                moves.push(Move::new(from, target, MoveKind::EnPassant));
            }
        }
    }

    fn push_leaper_moves(&self, piece: Piece, moves: &mut Vec<Move>) {
        let own = self.units(self.side);

        for from in self.pieces(self.side, piece) {
            let targets = match piece {
                Piece::Knight => attacks::knight_attacks(from),
                Piece::King => attacks::king_attacks(from),
                _ => unreachable!("not a leaper"),
            };

            for to in targets & !own {
                moves.push(Move::normal(from, to));
            }
        }
    }

    fn push_slider_moves(&self, moves: &mut Vec<Move>) {
        let own = self.units(self.side);
        let occupied = self.occupied();

        for piece in [Piece::Bishop, Piece::Rook, Piece::Queen] {
            for from in self.pieces(self.side, piece) {
                let targets = match piece {
                    Piece::Bishop => attacks::bishop_attacks(from, occupied),
                    Piece::Rook => attacks::rook_attacks(from, occupied),
                    _ => attacks::queen_attacks(from, occupied),
                };

                for to in targets & !own {
                    moves.push(Move::normal(from, to));
                }
            }
        }
    }

    /// Castling is generated fully legal: unrevoked rights, an empty path
    /// between king and rook, the king not currently in check, and neither
    /// the transit nor the landing square attacked.
    fn push_castle_moves(&self, moves: &mut Vec<Move>) {
        let side = self.side;
        let opponent = side.opponent();
        let occupied = self.occupied().0;

        if self.in_check(side) {
            return;
        }

        let empty = |squares: &[Square]| squares.iter().all(|s| (occupied & s.as_bit()) == 0);
        let safe = |squares: &[Square]| {
            squares
                .iter()
                .all(|&s| !self.is_square_attacked(s, opponent))
        };

        match side {
            Side::White => {
                if self.castle & CASTLE_WHITE_KINGSIDE != 0
                    && empty(&[Square::F1, Square::G1])
                    && safe(&[Square::F1, Square::G1])
                {
                    moves.push(Move::new(Square::E1, Square::G1, MoveKind::Castle));
                }

                if self.castle & CASTLE_WHITE_QUEENSIDE != 0
                    && empty(&[Square::B1, Square::C1, Square::D1])
                    && safe(&[Square::D1, Square::C1])
                {
                    moves.push(Move::new(Square::E1, Square::C1, MoveKind::Castle));
                }
            }
            Side::Black => {
                if self.castle & CASTLE_BLACK_KINGSIDE != 0
                    && empty(&[Square::F8, Square::G8])
                    && safe(&[Square::F8, Square::G8])
                {
                    moves.push(Move::new(Square::E8, Square::G8, MoveKind::Castle));
                }

                if self.castle & CASTLE_BLACK_QUEENSIDE != 0
                    && empty(&[Square::B8, Square::C8, Square::D8])
                    && safe(&[Square::D8, Square::C8])
                {
                    moves.push(Move::new(Square::E8, Square::C8, MoveKind::Castle));
                }
            }
        }
    }

    /// Parses long algebraic notation ("e2e4", "e7e8q") by matching it
    /// against the legal move list, so the result is legal by construction.
    pub fn parse_move(&self, text: &str) -> Result<Move, MoveParseError> {
        if !text.is_ascii() || text.len() < 4 || text.len() > 5 {
            return Err(MoveParseError::Length(text.to_string()));
        }

        let from = Square::from_algebraic(&text[0..2])
            .ok_or_else(|| MoveParseError::Square(text.to_string()))?;
        let to = Square::from_algebraic(&text[2..4])
            .ok_or_else(|| MoveParseError::Square(text.to_string()))?;

        let promotion = match text.chars().nth(4) {
            Some(c) => Some(Piece::from_promotion_char(c).ok_or(MoveParseError::Promotion(c))?),
            None => None,
        };

        self.legal_moves()
            .into_iter()
            .find(|mv| mv.from == from && mv.to == to && mv.promotion() == promotion)
            .ok_or_else(|| MoveParseError::Illegal(text.to_string()))
    }
}
