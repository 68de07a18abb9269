//! Dropping pieces from hand.

use cozy_chess::{Color, Piece, Rank, Square};

use super::{IllegalMove, MoveEngine, MoveError};
use crate::attacks;
use crate::category::VariantCategory;
use crate::holdings::HoldingsState;
use crate::position::Position;
use crate::rules::{Applied, MoveKind, StandardRules};

impl<R: StandardRules> MoveEngine<R> {
    /// Drop `piece` from `mover`'s hand onto `to`.
    ///
    /// Holdings are checked only when known, and never for premoves: the
    /// piece may still arrive before the premove is played.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn resolve_drop(
        &self,
        position: &Position,
        piece: Piece,
        to: Square,
        mover: Color,
        category: VariantCategory,
        holdings: Option<&HoldingsState>,
        premove: bool,
    ) -> Result<(Position, Applied), MoveError> {
        if !category.has_drops() {
            return Err(IllegalMove::DropNotAllowed.into());
        }
        if piece == Piece::King {
            return Err(IllegalMove::NotInHand.into());
        }
        if piece == Piece::Pawn && matches!(to.rank(), Rank::First | Rank::Eighth) {
            return Err(IllegalMove::PawnOnBackRank.into());
        }
        if !position.is_empty(to) {
            return Err(IllegalMove::DropOccupied.into());
        }
        if let Some(held) = holdings {
            if !premove && held.of(mover).get(piece) == 0 {
                return Err(IllegalMove::NotInHand.into());
            }
        }

        let mut next = position.clone();
        next.set(to, Some((piece, mover)));
        if !premove && attacks::in_check(&next, mover) {
            return Err(IllegalMove::SelfCheck.into());
        }
        next.en_passant = None;
        if !premove {
            next.finish_turn(true);
        }

        Ok((
            next,
            Applied {
                piece,
                color: mover,
                from: to,
                to,
                promotion: None,
                captured: None,
                captured_on: None,
                kind: MoveKind::Drop,
            },
        ))
    }
}

/// Whether the side to move could answer an apparent mate by dropping a
/// piece between its king and the checker.
///
/// Only squares next to the king are tried, with a pawn standing in for
/// whatever piece would be dropped. Without holdings the defender is assumed
/// to have something to drop.
pub(super) fn interposition_possible(position: &Position, holdings: Option<&HoldingsState>) -> bool {
    let defender = position.side_to_move;
    let Some(king) = position.king(defender) else {
        return false;
    };
    cozy_chess::get_king_moves(king)
        .into_iter()
        .filter(|sq| position.is_empty(*sq))
        .any(|sq| {
            let mut blocked = position.clone();
            blocked.set(sq, Some((Piece::Pawn, defender)));
            !attacks::in_check(&blocked, defender) && can_drop_on(holdings, defender, sq)
        })
}

fn can_drop_on(holdings: Option<&HoldingsState>, color: Color, sq: Square) -> bool {
    let Some(state) = holdings else {
        return true;
    };
    let held = state.of(color);
    let pieces = held.knights + held.bishops + held.rooks + held.queens;
    pieces > 0 || (held.pawns > 0 && !matches!(sq.rank(), Rank::First | Rank::Eighth))
}
