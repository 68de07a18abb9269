//! Chess960 starting positions by Scharnagl's numbering.
//!
//! An index `idn` in `0..960` splits into a bishop placement (`idn % 16`) and
//! an ordering of the remaining six pieces (`idn / 16`). The six pieces fill
//! the bishop pattern's empty slots from left to right.

use cozy_chess::{Color, File, Piece, Rank, Square};
use rand::Rng;

use crate::position::{CastlingRights, Position};

pub const CHESS960_COUNT: u32 = 960;

/// Scharnagl index of the classic starting position.
pub const CLASSIC_IDN: u32 = 518;

/// Knight placements over the five slots left after bishops and queen.
const KNIGHT_TABLE: [[usize; 2]; 10] = [
    [0, 1],
    [0, 2],
    [0, 3],
    [0, 4],
    [1, 2],
    [1, 3],
    [1, 4],
    [2, 3],
    [2, 4],
    [3, 4],
];

/// Bishop pattern for `idn % 16`: a back rank with the two bishops placed
/// and the six other slots empty.
fn bishop_pattern(n: u32) -> [Option<Piece>; 8] {
    let mut rank = [None; 8];
    let light = (n % 4) as usize * 2 + 1;
    let dark = (n / 4 % 4) as usize * 2;
    rank[light] = Some(Piece::Bishop);
    rank[dark] = Some(Piece::Bishop);
    rank
}

/// Ordering of queen, knights, rooks and king for `idn / 16` (0..60).
fn piece_ordering(n: u32) -> [Piece; 6] {
    let queen = (n % 6) as usize;
    let knights = KNIGHT_TABLE[(n / 6) as usize];

    // Knights go into the five slots left after the queen; the three slots
    // still open after that take rook, king, rook.
    let mut rest = [None; 5];
    for slot in knights {
        rest[slot] = Some(Piece::Knight);
    }
    let mut rkr = [Piece::Rook, Piece::King, Piece::Rook].into_iter();
    let rest = rest.map(|slot| slot.or_else(|| rkr.next()));

    let mut ordering = [Piece::Queen; 6];
    let mut rest = rest.into_iter().flatten();
    for (i, piece) in ordering.iter_mut().enumerate() {
        if i != queen {
            if let Some(next) = rest.next() {
                *piece = next;
            }
        }
    }
    ordering
}

/// White's back rank for a Scharnagl index. Out-of-range input wraps.
pub fn back_rank(idn: u32) -> [Piece; 8] {
    let idn = idn % CHESS960_COUNT;
    let pattern = bishop_pattern(idn % 16);
    let mut fill = piece_ordering(idn / 16).into_iter();
    pattern.map(|slot| slot.or_else(|| fill.next()).unwrap_or(Piece::Rook))
}

/// Starting position for `idn`, or a uniformly random one when `idn` is
/// absent or out of range.
pub fn generate(idn: Option<u32>) -> Position {
    let idn = match idn {
        Some(n) if n < CHESS960_COUNT => n,
        _ => rand::rng().random_range(0..CHESS960_COUNT),
    };
    tracing::debug!("Generating Chess960 position {}", idn);
    position_for(idn)
}

/// Deterministic starting position for an in-range index.
pub fn position_for(idn: u32) -> Position {
    let mut position = Position::empty();
    for (i, piece) in back_rank(idn).into_iter().enumerate() {
        let file = File::index(i);
        position.set(Square::new(file, Rank::First), Some((piece, Color::White)));
        position.set(Square::new(file, Rank::Second), Some((Piece::Pawn, Color::White)));
        position.set(Square::new(file, Rank::Seventh), Some((Piece::Pawn, Color::Black)));
        position.set(Square::new(file, Rank::Eighth), Some((piece, Color::Black)));
    }
    position.castling = CastlingRights::ALL;
    position
}
