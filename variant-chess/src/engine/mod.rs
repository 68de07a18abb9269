//! The variant move/position engine.
//!
//! Standard categories are handed to the [`StandardRules`] collaborator
//! untouched. Variant categories and premoves go through the same
//! collaborator where it agrees with the server, and through the overrides in
//! the submodules where it does not: drops, roster-based castling and
//! premove relocation. Results are then post-processed to match what the
//! server itself reports.

mod castling;
mod drops;
mod postprocess;
mod premove;

use std::collections::HashMap;

use cozy_chess::{Color, Move, Piece, Square};
use smallvec::SmallVec;

use crate::attacks::reachable_on_empty_board;
use crate::category::VariantCategory;
use crate::converters::{format_square, promotion_rank};
use crate::holdings::HoldingsState;
use crate::notation::{format_san, san_candidates, CandidateMove, SanParts};
use crate::position::{CastleSide, CastlingRights, Position};
use crate::roster::{resolve_rosters, CastlingRoster};
use crate::rules::{is_castling_move, Applied, CozyRules, MoveKind, RulesError, StandardRules};

/// Per-game facts that never change once the game has started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSetup {
    pub category: VariantCategory,
    pub start: Position,
    rosters: [CastlingRoster; 2],
}

impl GameSetup {
    /// Resolve castling rosters from the starting position.
    pub fn new(start: Position, category: VariantCategory) -> Self {
        let rosters = resolve_rosters(&start, category);
        Self {
            category,
            start,
            rosters,
        }
    }

    /// Set up from the server's category string, e.g. "wild/fr".
    pub fn from_fics(category: &str, start: Position) -> Result<Self, MoveError> {
        let category =
            VariantCategory::from_fics(category).ok_or_else(|| MoveError::UnsupportedCategory(category.to_string()))?;
        Ok(Self::new(start, category))
    }

    /// A classic game from the standard starting position.
    pub fn standard(category: VariantCategory) -> Self {
        Self::new(Position::standard(), category)
    }

    pub fn roster(&self, color: Color) -> &CastlingRoster {
        &self.rosters[color as usize]
    }
}

/// A move as the engine understood it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMove {
    pub piece: Piece,
    pub color: Color,
    /// Absent for drops.
    pub from: Option<Square>,
    pub to: Square,
    pub promotion: Option<Piece>,
    pub captured: Option<Piece>,
    pub captured_on: Option<Square>,
    pub kind: MoveKind,
    /// SAN with the engine's own `+`/`#` suffix.
    pub san: String,
}

impl NormalizedMove {
    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    /// Coordinate spelling ("e2e4", "e7e8q", "N@f3").
    pub fn coordinate(&self) -> String {
        match self.from {
            Some(from) => {
                let mut s = format!("{}{}", format_square(from), format_square(self.to));
                if let Some(promo) = self.promotion {
                    s.push(crate::converters::format_piece(promo));
                }
                s
            }
            None => format!(
                "{}@{}",
                crate::converters::format_piece_upper(self.piece),
                format_square(self.to)
            ),
        }
    }
}

/// Outcome of a successfully resolved move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    pub position: Position,
    pub mv: NormalizedMove,
    /// Updated holdings, when holdings were supplied.
    pub holdings: Option<HoldingsState>,
    /// Bughouse: the piece (and the color it drops as) that the partner board
    /// receives from this capture.
    pub partner_gain: Option<(Piece, Color)>,
}

/// Legal destination squares keyed by origin square.
pub type Destinations = HashMap<Square, SmallVec<[Square; 8]>>;

/// The engine, generic over the standard rules collaborator.
#[derive(Debug, Clone, Default)]
pub struct MoveEngine<R = CozyRules> {
    rules: R,
}

impl MoveEngine<CozyRules> {
    pub fn new() -> Self {
        Self { rules: CozyRules }
    }
}

impl<R: StandardRules> MoveEngine<R> {
    pub fn with_rules(rules: R) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// Apply `candidate` to `position`.
    ///
    /// A premove is made by the side *not* to move and is checked only for
    /// geometry and occupancy; callers must resolve it again once it is
    /// actually that side's turn.
    #[tracing::instrument(level = "debug", skip_all, fields(category = %setup.category, premove = premove))]
    pub fn resolve_move(
        &self,
        position: &Position,
        candidate: &CandidateMove,
        setup: &GameSetup,
        holdings: Option<&HoldingsState>,
        premove: bool,
    ) -> Result<MoveResult, MoveError> {
        let mover = if premove {
            !position.side_to_move
        } else {
            position.side_to_move
        };

        fast_reject(position, candidate, mover)?;

        let category = setup.category;
        if category.is_standard() && !premove {
            if candidate.is_drop() {
                return Err(IllegalMove::DropNotAllowed.into());
            }
            let (next, applied, legal) = self.play_standard(position, candidate, false)?;
            return self.finish(position, next, applied, &legal, setup, holdings, premove);
        }

        if let CandidateMove::Drop { piece, to } = *candidate {
            let (next, applied) = self.resolve_drop(position, piece, to, mover, category, holdings, premove)?;
            return self.finish(position, next, applied, &[], setup, holdings, premove);
        }

        if let Some(side) = castling::castle_intent(position, candidate, setup.roster(mover), mover) {
            if category.is_wild() || premove {
                let (next, applied) = self.resolve_castle(position, side, setup, mover, premove)?;
                return self.finish(position, next, applied, &[], setup, holdings, premove);
            }
        }

        if premove {
            let (next, applied) = premove::relocate(position, candidate, mover)?;
            return self.finish(position, next, applied, &[], setup, holdings, premove);
        }

        let (next, applied, legal) = self.play_standard(position, candidate, category.is_wild())?;
        self.finish(position, next, applied, &legal, setup, holdings, premove)
    }

    /// Every legal board move, keyed by origin square. Castling appears as
    /// the king's destination square; drops are not listed.
    pub fn legal_destinations(&self, position: &Position, setup: &GameSetup) -> Result<Destinations, MoveError> {
        let wild = setup.category.is_wild();
        let query = if wild { without_castling(position) } else { position.clone() };
        let mut destinations = Destinations::new();
        for mv in self.rules.legal_moves(&query).map_err(desync)? {
            let to = if is_castling_move(&query, mv) {
                crate::rules::apply_board_move(&query, mv).map_or(mv.to, |(_, applied)| applied.to)
            } else {
                mv.to
            };
            let entry = destinations.entry(mv.from).or_default();
            if !entry.contains(&to) {
                entry.push(to);
            }
        }

        if wild {
            let mover = position.side_to_move;
            for side in CastleSide::ALL {
                if let Ok((_, applied)) = self.resolve_castle(position, side, setup, mover, false) {
                    let roster = setup.roster(mover);
                    // A king that stays put castles by touching its rook.
                    let to = if applied.to == applied.from {
                        roster.rook(side).unwrap_or(applied.to)
                    } else {
                        applied.to
                    };
                    let entry = destinations.entry(applied.from).or_default();
                    if !entry.contains(&to) {
                        entry.push(to);
                    }
                }
            }
        }
        Ok(destinations)
    }

    /// Resolve a board move through the standard collaborator.
    ///
    /// With `strip_castling` the collaborator sees no castling rights, so it
    /// never castles on its own; rights are re-derived afterwards.
    fn play_standard(
        &self,
        position: &Position,
        candidate: &CandidateMove,
        strip_castling: bool,
    ) -> Result<(Position, Applied, Vec<Move>), MoveError> {
        let query = if strip_castling {
            without_castling(position)
        } else {
            position.clone()
        };
        let legal = self.rules.legal_moves(&query).map_err(desync)?;
        let mv = to_board_move(&query, candidate, &legal)?;
        let (next, applied) = self
            .rules
            .play(&query, mv)
            .map_err(desync)?
            .ok_or(IllegalMove::NoSuchMove)?;
        Ok((next, applied, legal))
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        before: &Position,
        mut next: Position,
        applied: Applied,
        legal: &[Move],
        setup: &GameSetup,
        holdings: Option<&HoldingsState>,
        premove: bool,
    ) -> Result<MoveResult, MoveError> {
        postprocess::reconcile(before, &mut next, setup);

        if next.placement() == before.placement() {
            tracing::warn!("Move {:?} left the placement of {} unchanged", applied, before);
            return Err(MoveError::Desync(format!(
                "placement unchanged after {}",
                before.placement()
            )));
        }

        let parts = SanParts {
            piece: applied.piece,
            from: (applied.kind != MoveKind::Drop).then_some(applied.from),
            to: applied.to,
            capture: applied.captured.is_some(),
            promotion: applied.promotion,
            castle: match applied.kind {
                MoveKind::Castle(side) => Some(side),
                _ => None,
            },
            drop: applied.kind == MoveKind::Drop,
        };
        let mut san = format_san(before, &parts, legal);
        if !premove {
            san.push_str(self.check_suffix(&next, setup.category, holdings));
        }

        let mv = NormalizedMove {
            piece: applied.piece,
            color: applied.color,
            from: parts.from,
            to: applied.to,
            promotion: applied.promotion,
            captured: applied.captured,
            captured_on: applied.captured_on,
            kind: applied.kind,
            san,
        };

        let mut partner_gain = None;
        let holdings = holdings.map(|held| {
            let mut held = *held;
            if setup.category.has_drops() && !premove {
                partner_gain = held.record(&mv, setup.category == VariantCategory::Bughouse);
            }
            held
        });

        tracing::debug!("Resolved {} -> {}", mv.san, next);
        Ok(MoveResult {
            position: next,
            mv,
            holdings,
            partner_gain,
        })
    }

    fn check_suffix(&self, next: &Position, category: VariantCategory, holdings: Option<&HoldingsState>) -> &'static str {
        if !self.rules.in_check(next) {
            return "";
        }
        let mated = self.rules.in_checkmate(next).unwrap_or_else(|e| {
            tracing::warn!("Could not decide checkmate: {}", e);
            false
        });
        if !mated {
            return "+";
        }
        if category == VariantCategory::Crazyhouse && drops::interposition_possible(next, holdings) {
            "+"
        } else {
            "#"
        }
    }
}

/// Reject moves whose piece cannot reach the target square even on an
/// empty board.
fn fast_reject(position: &Position, candidate: &CandidateMove, mover: Color) -> Result<(), MoveError> {
    if let CandidateMove::Coordinate { piece, from, to, .. } = *candidate {
        let piece = piece.or_else(|| position.piece_at(from).map(|(p, _)| p));
        if let Some(piece) = piece {
            if !reachable_on_empty_board(piece, mover, from, to) {
                return Err(IllegalMove::Unreachable.into());
            }
        }
    }
    Ok(())
}

fn without_castling(position: &Position) -> Position {
    let mut query = position.clone();
    query.castling = CastlingRights::NONE;
    query
}

/// Map a candidate onto the collaborator's legal move list.
fn to_board_move(position: &Position, candidate: &CandidateMove, legal: &[Move]) -> Result<Move, MoveError> {
    let mover = position.side_to_move;
    match *candidate {
        CandidateMove::Coordinate { from, to, promotion, .. } => {
            let Some((piece, color)) = position.piece_at(from) else {
                return Err(IllegalMove::NoPiece.into());
            };
            if color != mover {
                return Err(IllegalMove::WrongColor.into());
            }
            if piece == Piece::King && from.rank() == to.rank() && file_distance(from, to) >= 2 && !is_castling_move(position, Move { from, to, promotion: None }) {
                let rightward = to.file() as u8 > from.file() as u8;
                return legal
                    .iter()
                    .copied()
                    .find(|mv| {
                        mv.from == from
                            && is_castling_move(position, *mv)
                            && (mv.to.file() as u8 > from.file() as u8) == rightward
                    })
                    .ok_or_else(|| IllegalMove::NoCastlingRight.into());
            }
            let promotion = match promotion {
                None if piece == Piece::Pawn && to.rank() == promotion_rank(mover) => Some(Piece::Queen),
                other => other,
            };
            let mv = Move { from, to, promotion };
            if legal.contains(&mv) {
                Ok(mv)
            } else {
                Err(IllegalMove::NoSuchMove.into())
            }
        }
        CandidateMove::San(ref san) => match san_candidates(position, san, legal).as_slice() {
            [] => Err(IllegalMove::NoSuchMove.into()),
            [mv] => Ok(*mv),
            _ => Err(IllegalMove::Ambiguous.into()),
        },
        CandidateMove::Castle(side) => legal
            .iter()
            .copied()
            .find(|mv| {
                is_castling_move(position, *mv)
                    && (mv.to.file() as u8 > mv.from.file() as u8) == (side == CastleSide::Short)
            })
            .ok_or_else(|| IllegalMove::NoCastlingRight.into()),
        CandidateMove::Drop { .. } => Err(IllegalMove::DropNotAllowed.into()),
    }
}

fn file_distance(a: Square, b: Square) -> u8 {
    (a.file() as u8).abs_diff(b.file() as u8)
}

fn desync(e: RulesError) -> MoveError {
    MoveError::Desync(e.to_string())
}

/// Why a candidate move was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IllegalMove {
    #[error("piece cannot reach the target square")]
    Unreachable,
    #[error("no piece on the origin square")]
    NoPiece,
    #[error("piece on the origin square belongs to the other side")]
    WrongColor,
    #[error("target square holds a piece of the moving side")]
    OwnPieceOnTarget,
    #[error("no legal move matches")]
    NoSuchMove,
    #[error("move is ambiguous")]
    Ambiguous,
    #[error("move leaves the king in check")]
    SelfCheck,
    #[error("drops are not allowed in this category")]
    DropNotAllowed,
    #[error("pawns cannot be dropped on the first or eighth rank")]
    PawnOnBackRank,
    #[error("drop target is occupied")]
    DropOccupied,
    #[error("piece is not in hand")]
    NotInHand,
    #[error("castling right is not available")]
    NoCastlingRight,
    #[error("castling path is blocked")]
    CastlingBlocked,
    #[error("king would castle through an attacked square")]
    CastlingThroughCheck,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("Illegal move: {0}")]
    Illegal(#[from] IllegalMove),
    /// The local position no longer matches the server's; resynchronize.
    #[error("Position desynchronized: {0}")]
    Desync(String),
    #[error("Unsupported category: {0}")]
    UnsupportedCategory(String),
}

impl MoveError {
    pub fn is_desync(&self) -> bool {
        matches!(self, Self::Desync(_))
    }
}
