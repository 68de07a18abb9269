//! Adjust the collaborator's result to what the server reports for the
//! variant being played.

use cozy_chess::{Color, Piece};

use super::GameSetup;
use crate::position::{CastleSide, Position};

pub(super) fn reconcile(before: &Position, next: &mut Position, setup: &GameSetup) {
    let category = setup.category;
    if category.has_drops() {
        // Drop variants never draw by the fifty-move rule.
        next.halfmove_clock = 0;
    }
    if category.is_wild() {
        rederive_castling(before, next, setup);
    }
}

/// Castling rights survive while the right was held before the move and the
/// roster's king and rook for that side are still on their starting squares.
fn rederive_castling(before: &Position, next: &mut Position, setup: &GameSetup) {
    for color in Color::ALL {
        let roster = setup.roster(color);
        for side in CastleSide::ALL {
            let in_place = match (roster.king, roster.rook(side)) {
                (Some(king), Some(rook)) => {
                    next.piece_at(king) == Some((Piece::King, color)) && next.piece_at(rook) == Some((Piece::Rook, color))
                }
                _ => false,
            };
            next.castling.set(color, side, before.castling.has(color, side) && in_place);
        }
    }
}
