//! Candidate move text (coordinate, SAN, drop, FICS verbose) and SAN output.

use std::str::FromStr;

use cozy_chess::{File, Move, Piece, Rank, Square};

use crate::converters::{format_file, format_piece_upper, format_square, parse_file, parse_rank, parse_square, piece_from_char};
use crate::position::{CastleSide, Position};
use crate::rules::is_castling_move;

/// A parsed SAN board move, before it is matched against legal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanMove {
    pub piece: Piece,
    pub from_file: Option<File>,
    pub from_rank: Option<Rank>,
    pub to: Square,
    pub promotion: Option<Piece>,
}

/// A move as submitted by a user or reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateMove {
    /// Both squares known; `piece` is set when the notation named it
    /// (FICS verbose form).
    Coordinate {
        piece: Option<Piece>,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    },
    San(SanMove),
    Drop { piece: Piece, to: Square },
    Castle(CastleSide),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("Unrecognized move notation: {0}")]
    Unrecognized(String),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),
}

impl CandidateMove {
    pub fn coordinate(from: Square, to: Square, promotion: Option<Piece>) -> Self {
        Self::Coordinate {
            piece: None,
            from,
            to,
            promotion,
        }
    }

    pub fn is_drop(&self) -> bool {
        matches!(self, Self::Drop { .. })
    }
}

impl FromStr for CandidateMove {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_move(s)
    }
}

/// Parse any supported move spelling.
pub fn parse_move(text: &str) -> Result<CandidateMove, NotationError> {
    let unrecognized = || NotationError::Unrecognized(text.to_string());
    let s = text.trim().trim_end_matches(|c: char| matches!(c, '+' | '#' | '!' | '?'));

    match s {
        "O-O" | "0-0" | "o-o" => return Ok(CandidateMove::Castle(CastleSide::Short)),
        "O-O-O" | "0-0-0" | "o-o-o" => return Ok(CandidateMove::Castle(CastleSide::Long)),
        _ => {}
    }

    if let Some((piece, rest)) = s.split_once('/') {
        return parse_verbose(piece, rest).ok_or_else(unrecognized);
    }

    if let Some((piece, to)) = s.split_once('@') {
        let mut letters = piece.chars();
        let piece = match (letters.next(), letters.next()) {
            (Some(c), None) => piece_from_char(c).ok_or_else(unrecognized)?,
            _ => return Err(unrecognized()),
        };
        if piece == Piece::King {
            return Err(unrecognized());
        }
        let to = parse_square(to).ok_or_else(unrecognized)?;
        return Ok(CandidateMove::Drop { piece, to });
    }

    if let Some(mv) = parse_coordinate(s)? {
        return Ok(mv);
    }

    parse_san(s).map(CandidateMove::San).ok_or_else(unrecognized)
}

/// "P/e2-e4", "P/e7-e8=Q", "P/@@-e4", "K/e1-g1".
fn parse_verbose(piece: &str, rest: &str) -> Option<CandidateMove> {
    let mut letters = piece.chars();
    let piece = piece_from_char(letters.next()?)?;
    if letters.next().is_some() {
        return None;
    }
    let (squares, promotion) = match rest.split_once('=') {
        Some((squares, promo)) => (squares, Some(single_piece(promo)?)),
        None => (rest, None),
    };
    let (from, to) = squares.split_once('-')?;
    let to = parse_square(to)?;
    if from == "@@" {
        return Some(CandidateMove::Drop { piece, to });
    }
    Some(CandidateMove::Coordinate {
        piece: Some(piece),
        from: parse_square(from)?,
        to,
        promotion,
    })
}

fn single_piece(s: &str) -> Option<Piece> {
    let mut chars = s.chars();
    let piece = piece_from_char(chars.next()?)?;
    chars.next().is_none().then_some(piece)
}

/// "e2e4", "e2-e4", "e7e8q", "e7e8=Q".
fn parse_coordinate(s: &str) -> Result<Option<CandidateMove>, NotationError> {
    let compact: String = s.chars().filter(|c| *c != '-').collect();
    if compact.len() < 4 || !compact.is_ascii() {
        return Ok(None);
    }
    let (Some(from), Some(to)) = (parse_square(&compact[0..2]), parse_square(&compact[2..4])) else {
        return Ok(None);
    };
    let promotion = match compact[4..].trim_start_matches('=') {
        "" => None,
        promo => Some(
            single_piece(promo)
                .filter(|p| !matches!(p, Piece::Pawn | Piece::King))
                .ok_or_else(|| NotationError::InvalidPromotion(s.to_string()))?,
        ),
    };
    Ok(Some(CandidateMove::coordinate(from, to, promotion)))
}

fn parse_san(s: &str) -> Option<SanMove> {
    let mut chars: Vec<char> = s.chars().filter(|c| *c != 'x' && *c != ':').collect();

    let suffix = match chars.as_slice() {
        [.., '=', p] => Some((piece_from_char(*p)?, 2)),
        [.., r, p] if p.is_ascii_uppercase() && r.is_ascii_digit() => Some((piece_from_char(*p)?, 1)),
        _ => None,
    };
    let promotion = suffix.map(|(piece, len)| {
        chars.truncate(chars.len() - len);
        piece
    });

    let piece = match chars.first().copied() {
        Some(c) if c.is_ascii_uppercase() => {
            let piece = piece_from_char(c)?;
            chars.remove(0);
            piece
        }
        _ => Piece::Pawn,
    };

    if chars.len() < 2 || chars.len() > 4 {
        return None;
    }
    let to_text: String = chars[chars.len() - 2..].iter().collect();
    let to = parse_square(&to_text)?;
    let mut from_file = None;
    let mut from_rank = None;
    for c in &chars[..chars.len() - 2] {
        if let Some(file) = parse_file(*c) {
            from_file = Some(file);
        } else if let Some(rank) = parse_rank(*c) {
            from_rank = Some(rank);
        } else {
            return None;
        }
    }
    if promotion.is_some() && piece != Piece::Pawn {
        return None;
    }
    Some(SanMove {
        piece,
        from_file,
        from_rank,
        to,
        promotion,
    })
}

/// Legal moves a SAN move could mean. cozy-chess castling moves are skipped.
pub fn san_candidates(position: &Position, san: &SanMove, legal: &[Move]) -> Vec<Move> {
    legal
        .iter()
        .copied()
        .filter(|mv| !is_castling_move(position, *mv))
        .filter(|mv| mv.to == san.to)
        .filter(|mv| position.piece_at(mv.from).map(|(p, _)| p) == Some(san.piece))
        .filter(|mv| san.from_file.map_or(true, |f| mv.from.file() == f))
        .filter(|mv| san.from_rank.map_or(true, |r| mv.from.rank() == r))
        .filter(|mv| match (san.promotion, mv.promotion) {
            (Some(wanted), Some(actual)) => wanted == actual,
            (None, Some(actual)) => actual == Piece::Queen,
            (None, None) => true,
            (Some(_), None) => false,
        })
        .collect()
}

/// Everything needed to spell a move in SAN.
#[derive(Debug, Clone, Copy)]
pub struct SanParts {
    pub piece: Piece,
    pub from: Option<Square>,
    pub to: Square,
    pub capture: bool,
    pub promotion: Option<Piece>,
    pub castle: Option<CastleSide>,
    pub drop: bool,
}

/// Format a move in SAN without a check suffix.
///
/// `legal` is the mover's legal move list, used for disambiguation; pass an
/// empty slice when it is not known.
pub fn format_san(position: &Position, parts: &SanParts, legal: &[Move]) -> String {
    if let Some(side) = parts.castle {
        return side.notation().to_string();
    }
    let mut san = String::new();
    if parts.drop {
        san.push(format_piece_upper(parts.piece));
        san.push('@');
        san.push_str(&format_square(parts.to));
        return san;
    }

    match parts.piece {
        Piece::Pawn => {
            if parts.capture {
                if let Some(from) = parts.from {
                    san.push(format_file(from.file()));
                }
            }
        }
        piece => {
            san.push(format_piece_upper(piece));
            if let Some(from) = parts.from {
                san.push_str(&disambiguation(position, piece, from, parts.to, legal));
            }
        }
    }

    if parts.capture {
        san.push('x');
    }
    san.push_str(&format_square(parts.to));

    if let Some(promo) = parts.promotion {
        san.push('=');
        san.push(format_piece_upper(promo));
    }
    san
}

fn disambiguation(position: &Position, piece: Piece, from: Square, to: Square, legal: &[Move]) -> String {
    let rivals: Vec<Square> = legal
        .iter()
        .filter(|mv| mv.to == to && mv.from != from && !is_castling_move(position, **mv))
        .filter(|mv| position.piece_at(mv.from).map(|(p, _)| p) == Some(piece))
        .map(|mv| mv.from)
        .collect();
    if rivals.is_empty() {
        return String::new();
    }
    let square = format_square(from);
    if rivals.iter().all(|sq| sq.file() != from.file()) {
        square[0..1].to_string()
    } else if rivals.iter().all(|sq| sq.rank() != from.rank()) {
        square[1..2].to_string()
    } else {
        square
    }
}
