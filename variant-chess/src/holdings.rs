//! Pieces in hand for Crazyhouse and Bughouse, and the squares holding
//! promoted pieces (which revert to pawns when captured).

use cozy_chess::{BitBoard, Color, Piece, Square};

use crate::engine::NormalizedMove;
use crate::rules::MoveKind;

/// One color's pieces in hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct Holdings {
    pub pawns: u32,
    pub knights: u32,
    pub bishops: u32,
    pub rooks: u32,
    pub queens: u32,
}

impl Holdings {
    /// Tally piece letters as the server lists them ("PNNQ").
    pub fn from_letters(letters: &str) -> Self {
        let mut holdings = Self::default();
        for c in letters.chars() {
            if let Some(piece) = crate::converters::piece_from_char(c) {
                holdings.add(piece);
            }
        }
        holdings
    }

    pub fn get(&self, piece: Piece) -> u32 {
        match piece {
            Piece::Pawn => self.pawns,
            Piece::Knight => self.knights,
            Piece::Bishop => self.bishops,
            Piece::Rook => self.rooks,
            Piece::Queen => self.queens,
            Piece::King => 0,
        }
    }

    fn slot(&mut self, piece: Piece) -> Option<&mut u32> {
        match piece {
            Piece::Pawn => Some(&mut self.pawns),
            Piece::Knight => Some(&mut self.knights),
            Piece::Bishop => Some(&mut self.bishops),
            Piece::Rook => Some(&mut self.rooks),
            Piece::Queen => Some(&mut self.queens),
            Piece::King => None,
        }
    }

    pub fn add(&mut self, piece: Piece) {
        if let Some(count) = self.slot(piece) {
            *count += 1;
        }
    }

    /// Take one piece out of hand. Returns false (and changes nothing) if
    /// none is held.
    pub fn remove(&mut self, piece: Piece) -> bool {
        match self.slot(piece) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn total(&self) -> u32 {
        self.pawns + self.knights + self.bishops + self.rooks + self.queens
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Squares occupied by a piece that was promoted from a pawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PromotedSet(BitBoard);

impl PromotedSet {
    pub fn contains(&self, sq: Square) -> bool {
        self.0.has(sq)
    }

    pub fn insert(&mut self, sq: Square) {
        self.0 |= sq.bitboard();
    }

    /// Remove `sq`, returning whether it was present.
    pub fn remove(&mut self, sq: Square) -> bool {
        let present = self.contains(sq);
        self.0 &= !sq.bitboard();
        present
    }

    pub fn len(&self) -> usize {
        self.0.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn squares(&self) -> impl Iterator<Item = Square> {
        self.0.into_iter()
    }
}

/// Everything the drop variants track besides the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HoldingsState {
    pub white: Holdings,
    pub black: Holdings,
    pub promoted: PromotedSet,
}

impl HoldingsState {
    pub fn of(&self, color: Color) -> &Holdings {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    pub fn of_mut(&mut self, color: Color) -> &mut Holdings {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Overwrite local counts with the server's authoritative ones.
    pub fn apply_server_counts(&mut self, white: Holdings, black: Holdings) {
        self.white = white;
        self.black = black;
    }

    /// Update counts and promoted squares for a resolved move.
    ///
    /// In Crazyhouse a capture goes to the capturer's hand; in Bughouse it
    /// goes to the partner, and the piece and color the partner receives are
    /// returned instead. A captured promoted piece counts as a pawn.
    pub fn record(&mut self, mv: &NormalizedMove, bughouse: bool) -> Option<(Piece, Color)> {
        if mv.kind == MoveKind::Drop {
            self.of_mut(mv.color).remove(mv.piece);
            return None;
        }

        let mut partner_gain = None;
        if let Some(captured) = mv.captured {
            let captured_on = mv.captured_on.unwrap_or(mv.to);
            let was_promoted = self.promoted.remove(captured_on);
            let gained = if was_promoted || mv.kind == MoveKind::EnPassant {
                Piece::Pawn
            } else {
                captured
            };
            if bughouse {
                partner_gain = Some((gained, !mv.color));
            } else {
                self.of_mut(mv.color).add(gained);
            }
        }

        if let Some(from) = mv.from {
            if self.promoted.remove(from) {
                self.promoted.insert(mv.to);
            }
        }
        if mv.promotion.is_some() {
            self.promoted.insert(mv.to);
        }
        partner_gain
    }
}
