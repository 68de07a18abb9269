use cozy_chess::{BitBoard, Color, Piece, Square};

use crate::position::Position;

/// Returns all pieces of `color` that attack the given square.
pub fn attackers_of(position: &Position, sq: Square, color: Color) -> BitBoard {
    let occupied = position.occupied();
    let pieces = |piece| position.colored_pieces(color, piece);

    let mut attackers = BitBoard::EMPTY;

    // A pawn of `color` attacks `sq` if `sq` is in the pawn's attack set;
    // look from `sq` as if it were the opposite color's pawn.
    attackers |= cozy_chess::get_pawn_attacks(sq, !color) & pieces(Piece::Pawn);
    attackers |= cozy_chess::get_knight_moves(sq) & pieces(Piece::Knight);
    attackers |= cozy_chess::get_bishop_moves(sq, occupied) & (pieces(Piece::Bishop) | pieces(Piece::Queen));
    attackers |= cozy_chess::get_rook_moves(sq, occupied) & (pieces(Piece::Rook) | pieces(Piece::Queen));
    attackers |= cozy_chess::get_king_moves(sq) & pieces(Piece::King);

    attackers
}

pub fn is_attacked(position: &Position, sq: Square, by: Color) -> bool {
    !attackers_of(position, sq, by).is_empty()
}

/// Whether `color`'s king stands attacked. A side without a king is never in check.
pub fn in_check(position: &Position, color: Color) -> bool {
    position
        .king(color)
        .is_some_and(|king| is_attacked(position, king, !color))
}

/// Can a piece of this type move from `from` to `to` on an otherwise empty board?
///
/// Pawns may step, double-step from their second rank, or capture diagonally.
/// Kings may also slide along their own back rank, which is how coordinate
/// notation spells castling.
pub fn reachable_on_empty_board(piece: Piece, color: Color, from: Square, to: Square) -> bool {
    if from == to {
        return false;
    }
    let empty = BitBoard::EMPTY;
    match piece {
        Piece::Pawn => {
            let step = match color {
                Color::White => 1,
                Color::Black => -1,
            };
            let d_rank = to.rank() as i32 - from.rank() as i32;
            let d_file = to.file() as i32 - from.file() as i32;
            let start_rank = match color {
                Color::White => 1,
                Color::Black => 6,
            };
            (d_file == 0 && (d_rank == step || (d_rank == 2 * step && from.rank() as i32 == start_rank)))
                || (d_file.abs() == 1 && d_rank == step)
        }
        Piece::Knight => cozy_chess::get_knight_moves(from).has(to),
        Piece::Bishop => cozy_chess::get_bishop_moves(from, empty).has(to),
        Piece::Rook => cozy_chess::get_rook_moves(from, empty).has(to),
        Piece::Queen => {
            (cozy_chess::get_bishop_moves(from, empty) | cozy_chess::get_rook_moves(from, empty)).has(to)
        }
        Piece::King => {
            let back = crate::converters::back_rank(color);
            cozy_chess::get_king_moves(from).has(to) || (from.rank() == back && to.rank() == back)
        }
    }
}
