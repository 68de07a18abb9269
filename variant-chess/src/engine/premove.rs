//! Premoves: moves queued by the side not to move.
//!
//! Legality cannot be known until the opponent has replied, so a premove is
//! only checked for geometry and occupancy and the piece is relocated. The
//! side to move does not change.

use cozy_chess::{Color, Piece, Square};

use super::{IllegalMove, MoveError};
use crate::attacks::reachable_on_empty_board;
use crate::converters::promotion_rank;
use crate::notation::{CandidateMove, SanMove};
use crate::position::Position;
use crate::rules::{Applied, MoveKind};

pub(super) fn relocate(position: &Position, candidate: &CandidateMove, mover: Color) -> Result<(Position, Applied), MoveError> {
    let (from, to, promotion) = match *candidate {
        CandidateMove::Coordinate { from, to, promotion, .. } => (from, to, promotion),
        CandidateMove::San(ref san) => (origin_for(position, san, mover)?, san.to, san.promotion),
        // Drops and castling are resolved before relocation.
        CandidateMove::Drop { .. } | CandidateMove::Castle(_) => return Err(IllegalMove::NoSuchMove.into()),
    };

    let Some((piece, color)) = position.piece_at(from) else {
        return Err(IllegalMove::NoPiece.into());
    };
    if color != mover {
        return Err(IllegalMove::WrongColor.into());
    }
    if !reachable_on_empty_board(piece, mover, from, to) {
        return Err(IllegalMove::Unreachable.into());
    }

    let mut next = position.clone();
    let captured = match next.take(to) {
        Some((_, owner)) if owner == mover => return Err(IllegalMove::OwnPieceOnTarget.into()),
        other => other.map(|(p, _)| p),
    };
    next.take(from);
    let promotion = (piece == Piece::Pawn && to.rank() == promotion_rank(mover)).then(|| promotion.unwrap_or(Piece::Queen));
    next.set(to, Some((promotion.unwrap_or(piece), mover)));
    next.en_passant = None;

    Ok((
        next,
        Applied {
            piece,
            color: mover,
            from,
            to,
            promotion,
            captured,
            captured_on: captured.map(|_| to),
            kind: MoveKind::Normal,
        },
    ))
}

/// Find the one piece a SAN premove could mean, by geometry alone.
fn origin_for(position: &Position, san: &SanMove, mover: Color) -> Result<Square, MoveError> {
    let origins: Vec<Square> = position
        .colored_pieces(mover, san.piece)
        .into_iter()
        .filter(|from| san.from_file.map_or(true, |f| from.file() == f))
        .filter(|from| san.from_rank.map_or(true, |r| from.rank() == r))
        .filter(|from| reachable_on_empty_board(san.piece, mover, *from, san.to))
        .collect();
    match origins.as_slice() {
        [] => Err(IllegalMove::NoSuchMove.into()),
        [from] => Ok(*from),
        _ => Err(IllegalMove::Ambiguous.into()),
    }
}
