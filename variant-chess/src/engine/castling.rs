//! Castling from the per-game roster, for wild categories and premoves.

use cozy_chess::{Color, Piece, Rank, Square};

use super::{file_distance, IllegalMove, MoveEngine, MoveError};
use crate::notation::CandidateMove;
use crate::position::{CastleSide, Position};
use crate::roster::CastlingRoster;
use crate::rules::{Applied, MoveKind, StandardRules};

/// Whether `candidate` asks the roster king to castle, and to which side.
///
/// A king move counts as castling when it lands on its own rook or travels
/// two or more files along the back rank.
pub(super) fn castle_intent(
    position: &Position,
    candidate: &CandidateMove,
    roster: &CastlingRoster,
    mover: Color,
) -> Option<CastleSide> {
    match *candidate {
        CandidateMove::Castle(side) => Some(side),
        CandidateMove::Coordinate { from, to, .. } => {
            if roster.king != Some(from) || position.piece_at(from) != Some((Piece::King, mover)) {
                return None;
            }
            if from.rank() != to.rank() {
                return None;
            }
            let onto_own_rook = position.piece_at(to) == Some((Piece::Rook, mover));
            if !onto_own_rook && file_distance(from, to) < 2 {
                return None;
            }
            roster.side_toward(to)
        }
        _ => None,
    }
}

/// Squares from `a` to `b` inclusive, on `a`'s rank.
fn span(a: Square, b: Square) -> impl Iterator<Item = Square> {
    let rank: Rank = a.rank();
    let (lo, hi) = if (a.file() as u8) <= b.file() as u8 {
        (a.file() as usize, b.file() as usize)
    } else {
        (b.file() as usize, a.file() as usize)
    };
    (lo..=hi).map(move |file| Square::new(cozy_chess::File::index(file), rank))
}

impl<R: StandardRules> MoveEngine<R> {
    /// Castle `side` using the roster's king and rook.
    ///
    /// Premoves skip the attacked-square test; the position they will be
    /// played in is not known yet.
    pub(super) fn resolve_castle(
        &self,
        position: &Position,
        side: CastleSide,
        setup: &super::GameSetup,
        mover: Color,
        premove: bool,
    ) -> Result<(Position, Applied), MoveError> {
        let roster = setup.roster(mover);
        let (Some(king_from), Some(rook_from), Some((king_to, rook_to))) =
            (roster.king, roster.rook(side), roster.targets(side))
        else {
            return Err(IllegalMove::NoCastlingRight.into());
        };
        if !position.castling.has(mover, side)
            || position.piece_at(king_from) != Some((Piece::King, mover))
            || position.piece_at(rook_from) != Some((Piece::Rook, mover))
        {
            return Err(IllegalMove::NoCastlingRight.into());
        }

        let castling_pieces = [king_from, rook_from];
        let blocked = |sq: Square| !castling_pieces.contains(&sq) && !position.is_empty(sq);
        if span(king_from, king_to).any(blocked) || span(rook_from, rook_to).any(blocked) {
            return Err(IllegalMove::CastlingBlocked.into());
        }

        if !premove {
            // Attacks are checked with both castling pieces lifted off the board.
            let mut lifted = position.clone();
            lifted.take(king_from);
            lifted.take(rook_from);
            if span(king_from, king_to).any(|sq| self.rules.attacked(&lifted, sq, !mover)) {
                return Err(IllegalMove::CastlingThroughCheck.into());
            }
        }

        let mut next = position.clone();
        next.take(king_from);
        next.take(rook_from);
        next.set(king_to, Some((Piece::King, mover)));
        next.set(rook_to, Some((Piece::Rook, mover)));

        next.castling.set(mover, side, false);
        if king_to != king_from {
            next.castling.set(mover, side.other(), false);
        }
        next.en_passant = None;
        if !premove {
            next.finish_turn(false);
        }

        tracing::debug!("Castled {:?} for {:?} from {} to {}", side, mover, king_from, king_to);
        Ok((
            next,
            Applied {
                piece: Piece::King,
                color: mover,
                from: king_from,
                to: king_to,
                promotion: None,
                captured: None,
                captured_on: None,
                kind: MoveKind::Castle(side),
            },
        ))
    }
}
