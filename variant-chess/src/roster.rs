//! Which king and rooks take part in castling, resolved once per game.
//!
//! The live board is never scanned for castling pieces: a rook that has
//! already moved would be missed, and a king that re-castles from its
//! castled square would be mistaken for an unmoved one.

use cozy_chess::{Color, File, Piece, Square};

use crate::category::{VariantCategory, Wild};
use crate::converters::back_rank;
use crate::position::{CastleSide, Position};

/// Starting squares of one color's castling pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastlingRoster {
    pub king: Option<Square>,
    /// Queenside (a-file direction) rook.
    pub left_rook: Option<Square>,
    /// Kingside (h-file direction) rook.
    pub right_rook: Option<Square>,
    /// King starts on the d-file in a non-Fischer wild game: short castling
    /// goes toward the a-file and lands the king on b1/b8.
    pub mirrored: bool,
}

impl CastlingRoster {
    /// Rook that castles to `side`.
    pub fn rook(&self, side: CastleSide) -> Option<Square> {
        match (side, self.mirrored) {
            (CastleSide::Short, false) | (CastleSide::Long, true) => self.right_rook,
            (CastleSide::Long, false) | (CastleSide::Short, true) => self.left_rook,
        }
    }

    /// The castling side whose rook lies toward `to` as seen from the king.
    pub fn side_toward(&self, to: Square) -> Option<CastleSide> {
        let king = self.king?;
        let rightward = to.file() as u8 > king.file() as u8;
        let side = match (rightward, self.mirrored) {
            (true, false) | (false, true) => CastleSide::Short,
            (false, false) | (true, true) => CastleSide::Long,
        };
        Some(side)
    }

    /// Destination squares of king and rook after castling to `side`.
    pub fn targets(&self, side: CastleSide) -> Option<(Square, Square)> {
        let rank = self.king?.rank();
        let (king_file, rook_file) = match (side, self.mirrored) {
            (CastleSide::Short, false) => (File::G, File::F),
            (CastleSide::Long, false) => (File::C, File::D),
            (CastleSide::Short, true) => (File::B, File::C),
            (CastleSide::Long, true) => (File::F, File::E),
        };
        Some((Square::new(king_file, rank), Square::new(rook_file, rank)))
    }
}

/// Resolve a color's castling pieces from the game's starting position.
pub fn resolve_roster(start: &Position, color: Color, category: VariantCategory) -> CastlingRoster {
    let rank = back_rank(color);
    let on_back_rank = |piece: Piece| -> Vec<Square> {
        File::ALL
            .iter()
            .map(|file| Square::new(*file, rank))
            .filter(|sq| start.piece_at(*sq) == Some((piece, color)))
            .collect()
    };
    let rooks = on_back_rank(Piece::Rook);

    if category.is_fischer_random() {
        let king = on_back_rank(Piece::King).first().copied();
        let Some(king_sq) = king else {
            return CastlingRoster::default();
        };
        let (left, right): (Vec<Square>, Vec<Square>) = rooks
            .iter()
            .copied()
            .partition(|sq| (sq.file() as u8) < king_sq.file() as u8);
        return CastlingRoster {
            king,
            left_rook: pick_fischer_rook(start, color, &left, true),
            right_rook: pick_fischer_rook(start, color, &right, false),
            mirrored: false,
        };
    }

    let king_file = conventional_king_file(category, color);
    let king_sq = Square::new(king_file, rank);
    let king = (start.piece_at(king_sq) == Some((Piece::King, color))).then_some(king_sq);

    let (left_rook, right_rook) = match rooks.as_slice() {
        [] => (None, None),
        [only] => {
            if (only.file() as u8) < king_file as u8 {
                (Some(*only), None)
            } else {
                (None, Some(*only))
            }
        }
        [first, .., last] => (Some(*first), Some(*last)),
    };

    CastlingRoster {
        king,
        left_rook,
        right_rook,
        mirrored: category.is_wild() && king_file == File::D,
    }
}

/// Both colors' rosters, white first.
pub fn resolve_rosters(start: &Position, category: VariantCategory) -> [CastlingRoster; 2] {
    [
        resolve_roster(start, Color::White, category),
        resolve_roster(start, Color::Black, category),
    ]
}

fn conventional_king_file(category: VariantCategory, color: Color) -> File {
    match (category, color) {
        (VariantCategory::Wild(Wild::Zero | Wild::One), Color::Black) => File::D,
        _ => File::E,
    }
}

/// Pick the castling rook among candidates on one side of the king.
///
/// With more than one candidate, a rook mirrored by an opposing rook on the
/// same file is taken as part of the genuine starting setup. Otherwise the
/// outermost candidate wins.
fn pick_fischer_rook(start: &Position, color: Color, candidates: &[Square], left: bool) -> Option<Square> {
    let outermost = |squares: &[Square]| -> Option<Square> {
        if left {
            squares.first().copied()
        } else {
            squares.last().copied()
        }
    };
    if candidates.len() <= 1 {
        return candidates.first().copied();
    }
    let mirrored: Vec<Square> = candidates
        .iter()
        .copied()
        .filter(|sq| {
            let opposite = Square::new(sq.file(), back_rank(!color));
            start.piece_at(opposite) == Some((Piece::Rook, !color))
        })
        .collect();
    outermost(&mirrored).or_else(|| outermost(candidates))
}
