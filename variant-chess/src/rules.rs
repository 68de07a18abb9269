//! The standard-chess rules collaborator.
//!
//! Ordinary legality is delegated to cozy-chess. The engine only overrides
//! the cases variant rules change; everything else flows through
//! [`StandardRules`]. Boards cozy-chess refuses, such as drop-variant
//! positions with more material than a standard game allows, are handled by
//! a mailbox move generator.

use cozy_chess::{BitBoard, Board, Color, File, Move, Piece, Rank, Square};

use crate::attacks;
use crate::converters::{back_rank, promotion_rank};
use crate::position::{CastleSide, CastlingRights, Position};

/// How a board move was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum MoveKind {
    Normal,
    Castle(CastleSide),
    Drop,
    EnPassant,
}

/// What happened when a move was applied to a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub piece: Piece,
    pub color: Color,
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
    pub captured: Option<Piece>,
    /// Square the captured piece stood on (differs from `to` for en passant).
    pub captured_on: Option<Square>,
    pub kind: MoveKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    #[error("Position cannot be modeled by the standard rules: {0}")]
    Unsupported(String),
}

/// Standard-chess rule queries the engine consumes.
///
/// Moves use cozy-chess conventions: castling is spelled as the king
/// capturing its own rook.
pub trait StandardRules {
    /// Every legal board move for the side to move.
    fn legal_moves(&self, position: &Position) -> Result<Vec<Move>, RulesError>;

    /// Play `mv` if it is legal; `Ok(None)` if it is not.
    fn play(&self, position: &Position, mv: Move) -> Result<Option<(Position, Applied)>, RulesError> {
        if !self.legal_moves(position)?.contains(&mv) {
            return Ok(None);
        }
        Ok(apply_board_move(position, mv))
    }

    fn attacked(&self, position: &Position, square: Square, by: Color) -> bool {
        attacks::is_attacked(position, square, by)
    }

    fn in_check(&self, position: &Position) -> bool {
        attacks::in_check(position, position.side_to_move)
    }

    fn in_checkmate(&self, position: &Position) -> Result<bool, RulesError> {
        Ok(self.in_check(position) && self.legal_moves(position)?.is_empty())
    }

    fn in_stalemate(&self, position: &Position) -> Result<bool, RulesError> {
        Ok(!self.in_check(position) && self.legal_moves(position)?.is_empty())
    }
}

/// [`StandardRules`] backed by cozy-chess move generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CozyRules;

impl StandardRules for CozyRules {
    fn legal_moves(&self, position: &Position) -> Result<Vec<Move>, RulesError> {
        let board = match to_board(position) {
            Ok(board) => board,
            Err(e) => {
                tracing::debug!("Generating moves on the mailbox board: {}", e);
                return Ok(mailbox_legal_moves(position));
            }
        };
        let mut moves = Vec::new();
        board.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        Ok(moves)
    }
}

/// Legal moves for the side to move, generated directly on the mailbox
/// board. Castling uses the classic king and rook squares and the
/// cozy-chess spelling (king onto its own rook).
pub fn mailbox_legal_moves(position: &Position) -> Vec<Move> {
    let mover = position.side_to_move;
    let own = position.colors(mover);
    let occupied = position.occupied();

    let mut moves = Vec::new();
    for from in own {
        let Some((piece, _)) = position.piece_at(from) else {
            continue;
        };
        let targets = match piece {
            Piece::Pawn => pawn_targets(position, from, mover),
            Piece::Knight => cozy_chess::get_knight_moves(from),
            Piece::Bishop => cozy_chess::get_bishop_moves(from, occupied),
            Piece::Rook => cozy_chess::get_rook_moves(from, occupied),
            Piece::Queen => cozy_chess::get_bishop_moves(from, occupied) | cozy_chess::get_rook_moves(from, occupied),
            Piece::King => cozy_chess::get_king_moves(from),
        } & !own;

        for to in targets {
            if piece == Piece::Pawn && to.rank() == promotion_rank(mover) {
                for promotion in [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight] {
                    moves.push(Move {
                        from,
                        to,
                        promotion: Some(promotion),
                    });
                }
            } else {
                moves.push(Move { from, to, promotion: None });
            }
        }
    }
    moves.extend(castling_moves(position, mover));

    moves.retain(|&mv| apply_board_move(position, mv).is_some_and(|(next, _)| !attacks::in_check(&next, mover)));
    moves
}

fn pawn_targets(position: &Position, from: Square, color: Color) -> BitBoard {
    let occupied = position.occupied();
    let attacks = cozy_chess::get_pawn_attacks(from, color);
    let mut targets = attacks & position.colors(!color);
    if let Some(ep) = position.en_passant {
        if attacks.has(ep) {
            targets |= ep.bitboard();
        }
    }

    let (step, start) = match color {
        Color::White => (1, Rank::Second),
        Color::Black => (-1, Rank::Seventh),
    };
    if let Some(one) = from.try_offset(0, step) {
        if !occupied.has(one) {
            targets |= one.bitboard();
            if from.rank() == start {
                if let Some(two) = one.try_offset(0, step) {
                    if !occupied.has(two) {
                        targets |= two.bitboard();
                    }
                }
            }
        }
    }
    targets
}

fn castling_moves(position: &Position, color: Color) -> Vec<Move> {
    let rank = back_rank(color);
    let king = Square::new(File::E, rank);
    if position.piece_at(king) != Some((Piece::King, color)) || attacks::is_attacked(position, king, !color) {
        return Vec::new();
    }

    let mut moves = Vec::new();
    for side in CastleSide::ALL {
        let (rook_file, king_file) = match side {
            CastleSide::Short => (File::H, File::G),
            CastleSide::Long => (File::A, File::C),
        };
        let rook = Square::new(rook_file, rank);
        if !position.castling.has(color, side) || position.piece_at(rook) != Some((Piece::Rook, color)) {
            continue;
        }
        if !(cozy_chess::get_between_rays(king, rook) & position.occupied()).is_empty() {
            continue;
        }
        let king_to = Square::new(king_file, rank);
        let transit = cozy_chess::get_between_rays(king, king_to) | king_to.bitboard();
        if transit.into_iter().any(|sq| attacks::is_attacked(position, sq, !color)) {
            continue;
        }
        moves.push(Move {
            from: king,
            to: rook,
            promotion: None,
        });
    }
    moves
}

/// Castling rights whose king and rook still stand on the classic squares.
fn seated_castling(position: &Position) -> CastlingRights {
    let mut rights = position.castling;
    for color in Color::ALL {
        let rank = back_rank(color);
        let king_home = position.piece_at(Square::new(File::E, rank)) == Some((Piece::King, color));
        for side in CastleSide::ALL {
            let rook_file = match side {
                CastleSide::Short => File::H,
                CastleSide::Long => File::A,
            };
            let rook_home = position.piece_at(Square::new(rook_file, rank)) == Some((Piece::Rook, color));
            if !(king_home && rook_home) {
                rights.set(color, side, false);
            }
        }
    }
    rights
}

/// Convert to a cozy-chess board.
///
/// cozy-chess validates castling rights and the en passant square more
/// strictly than the server does, so progressively weaker forms are tried
/// before giving up: first rights without a seated king and rook are
/// dropped, then all rights, then the en passant square. Neither field changes which non-castling moves are legal
/// or whether a side is mated, except for en passant itself.
pub fn to_board(position: &Position) -> Result<Board, RulesError> {
    let placement = position.placement();
    let side = match position.side_to_move {
        Color::White => "w",
        Color::Black => "b",
    };
    let ep = position
        .en_passant
        .map(crate::converters::format_square)
        .unwrap_or_else(|| "-".to_string());
    let clock = position.halfmove_clock.min(100);
    let number = position.fullmove_number.clamp(1, u16::MAX as u32);
    let castling = position.castling.to_string();
    let seated = seated_castling(position).to_string();

    let mut attempts = vec![
        (castling.as_str(), ep.as_str()),
        (seated.as_str(), ep.as_str()),
        ("-", ep.as_str()),
        ("-", "-"),
    ];
    attempts.dedup();
    let mut last_err = String::new();
    for (i, (castling, ep)) in attempts.iter().enumerate() {
        let fen = format!("{placement} {side} {castling} {ep} {clock} {number}");
        match Board::from_fen(&fen, false) {
            Ok(board) => {
                if i > 0 {
                    tracing::debug!("Standard rules accepted {} only after relaxing it", position);
                }
                return Ok(board);
            }
            Err(e) => last_err = format!("{fen}: {e:?}"),
        }
    }
    tracing::debug!("Standard rules rejected position {}", position);
    Err(RulesError::Unsupported(last_err))
}

/// Whether `mv` is the cozy-chess spelling of castling (king onto own rook).
pub fn is_castling_move(position: &Position, mv: Move) -> bool {
    match (position.piece_at(mv.from), position.piece_at(mv.to)) {
        (Some((Piece::King, mover)), Some((Piece::Rook, owner))) => mover == owner,
        _ => false,
    }
}

/// Mechanically apply a board move, following standard chess conventions.
///
/// Legality is not checked, only that a piece of the side to move stands on
/// `from`. Castling (king onto its own rook) lands the king on the g/c file
/// and the rook on the f/d file. Castling rights are cleared for king moves
/// and for any move touching a corner square; the en passant square is set
/// after every double pawn push.
pub fn apply_board_move(position: &Position, mv: Move) -> Option<(Position, Applied)> {
    let (piece, color) = position.piece_at(mv.from)?;
    if color != position.side_to_move {
        return None;
    }

    let mut next = position.clone();
    let mut applied = Applied {
        piece,
        color,
        from: mv.from,
        to: mv.to,
        promotion: None,
        captured: None,
        captured_on: None,
        kind: MoveKind::Normal,
    };

    if is_castling_move(position, mv) {
        let side = if mv.to.file() as u8 > mv.from.file() as u8 {
            CastleSide::Short
        } else {
            CastleSide::Long
        };
        let (king_file, rook_file) = match side {
            CastleSide::Short => (File::G, File::F),
            CastleSide::Long => (File::C, File::D),
        };
        let rank = mv.from.rank();
        next.take(mv.from);
        next.take(mv.to);
        let king_to = Square::new(king_file, rank);
        next.set(king_to, Some((Piece::King, color)));
        next.set(Square::new(rook_file, rank), Some((Piece::Rook, color)));
        next.castling.clear_color(color);
        next.en_passant = None;
        next.finish_turn(false);
        applied.to = king_to;
        applied.kind = MoveKind::Castle(side);
        return Some((next, applied));
    }

    let mut reset_clock = piece == Piece::Pawn;
    if let Some(target) = position.piece_at(mv.to) {
        if target.1 == color {
            return None;
        }
        applied.captured = Some(target.0);
        applied.captured_on = Some(mv.to);
        reset_clock = true;
    } else if piece == Piece::Pawn && Some(mv.to) == position.en_passant && mv.from.file() != mv.to.file() {
        let victim = Square::new(mv.to.file(), mv.from.rank());
        next.take(victim);
        applied.captured = Some(Piece::Pawn);
        applied.captured_on = Some(victim);
        applied.kind = MoveKind::EnPassant;
    }

    next.take(mv.from);
    let landed = if piece == Piece::Pawn && mv.to.rank() == promotion_rank(color) {
        let promoted = mv.promotion.unwrap_or(Piece::Queen);
        applied.promotion = Some(promoted);
        promoted
    } else {
        piece
    };
    next.set(mv.to, Some((landed, color)));

    next.en_passant = None;
    if piece == Piece::Pawn && (mv.to.rank() as i32 - mv.from.rank() as i32).abs() == 2 {
        let middle = (mv.to.rank() as usize + mv.from.rank() as usize) / 2;
        next.en_passant = Some(Square::new(mv.from.file(), Rank::index(middle)));
    }

    if piece == Piece::King {
        next.castling.clear_color(color);
    }
    for sq in [mv.from, mv.to] {
        clear_corner_right(&mut next, sq);
    }

    next.finish_turn(reset_clock);
    Some((next, applied))
}

fn clear_corner_right(position: &mut Position, sq: Square) {
    for color in Color::ALL {
        if sq.rank() != back_rank(color) {
            continue;
        }
        match sq.file() {
            File::H => position.castling.set(color, CastleSide::Short, false),
            File::A => position.castling.set(color, CastleSide::Long, false),
            _ => {}
        }
    }
}
