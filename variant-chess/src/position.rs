//! The six-field position model and its FEN codec.
//!
//! `Position` is a plain mailbox board. It deliberately models more than a
//! legal chess position needs (any king placement, any castling flags) because
//! variant positions and premove previews are not always something a standard
//! rules library will accept. Standard legality is checked separately by
//! [`crate::rules::StandardRules`].

use std::fmt;
use std::str::FromStr;

use cozy_chess::{BitBoard, Color, File, Piece, Rank, Square};

use crate::converters::{
    colored_piece_from_char, format_colored_piece, format_square, parse_square,
};

/// FEN of the classic starting position.
pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Which castling right: short (`O-O`) or long (`O-O-O`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum CastleSide {
    Short,
    Long,
}

impl CastleSide {
    pub const ALL: [CastleSide; 2] = [CastleSide::Short, CastleSide::Long];

    pub fn other(self) -> Self {
        match self {
            Self::Short => Self::Long,
            Self::Long => Self::Short,
        }
    }

    pub fn notation(self) -> &'static str {
        match self {
            Self::Short => "O-O",
            Self::Long => "O-O-O",
        }
    }
}

/// Castling availability as the fourth FEN field (`KQkq`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights {
    rights: [[bool; 2]; 2],
}

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights {
        rights: [[false; 2]; 2],
    };

    pub const ALL: CastlingRights = CastlingRights {
        rights: [[true; 2]; 2],
    };

    /// Build from the four style12 flags, in wire order.
    pub fn from_flags(white_short: bool, white_long: bool, black_short: bool, black_long: bool) -> Self {
        Self {
            rights: [[white_short, white_long], [black_short, black_long]],
        }
    }

    pub fn has(&self, color: Color, side: CastleSide) -> bool {
        self.rights[color as usize][side as usize]
    }

    pub fn set(&mut self, color: Color, side: CastleSide, value: bool) {
        self.rights[color as usize][side as usize] = value;
    }

    pub fn clear_color(&mut self, color: Color) {
        self.rights[color as usize] = [false; 2];
    }

    pub fn any(&self, color: Color) -> bool {
        self.rights[color as usize].iter().any(|r| *r)
    }

    fn parse(field: &str) -> Result<Self, PositionError> {
        let mut rights = Self::NONE;
        if field == "-" {
            return Ok(rights);
        }
        for c in field.chars() {
            let (color, side) = match c {
                'K' => (Color::White, CastleSide::Short),
                'Q' => (Color::White, CastleSide::Long),
                'k' => (Color::Black, CastleSide::Short),
                'q' => (Color::Black, CastleSide::Long),
                _ => return Err(PositionError::InvalidCastling(field.to_string())),
            };
            rights.set(color, side, true);
        }
        Ok(rights)
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for (color, short, long) in [(Color::White, 'K', 'Q'), (Color::Black, 'k', 'q')] {
            if self.has(color, CastleSide::Short) {
                out.push(short);
            }
            if self.has(color, CastleSide::Long) {
                out.push(long);
            }
        }
        if out.is_empty() {
            out.push('-');
        }
        f.write_str(&out)
    }
}

/// A full six-field position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    squares: [Option<(Piece, Color)>; 64],
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self::standard()
    }
}

impl Position {
    /// The classic starting position.
    pub fn standard() -> Self {
        let mut position = Self::empty();
        let back = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];
        for (i, piece) in back.into_iter().enumerate() {
            let file = File::index(i);
            position.set(Square::new(file, Rank::First), Some((piece, Color::White)));
            position.set(Square::new(file, Rank::Second), Some((Piece::Pawn, Color::White)));
            position.set(Square::new(file, Rank::Seventh), Some((Piece::Pawn, Color::Black)));
            position.set(Square::new(file, Rank::Eighth), Some((piece, Color::Black)));
        }
        position.castling = CastlingRights::ALL;
        position
    }

    /// A board with no pieces, white to move.
    pub fn empty() -> Self {
        Self {
            squares: [None; 64],
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 || fields.len() > 6 {
            return Err(PositionError::InvalidFormat(fen.to_string()));
        }

        let mut position = Self::empty();
        position.set_placement(fields[0])?;

        position.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(PositionError::InvalidSideToMove(other.to_string())),
        };
        position.castling = CastlingRights::parse(fields[2])?;
        position.en_passant = match fields[3] {
            "-" => None,
            sq => Some(parse_square(sq).ok_or_else(|| PositionError::InvalidEnPassant(sq.to_string()))?),
        };
        if let Some(clock) = fields.get(4) {
            position.halfmove_clock = clock
                .parse()
                .map_err(|_| PositionError::InvalidCounter(clock.to_string()))?;
        }
        if let Some(number) = fields.get(5) {
            position.fullmove_number = number
                .parse()
                .map_err(|_| PositionError::InvalidCounter(number.to_string()))?;
        }
        Ok(position)
    }

    /// Replace the piece placement from the first FEN field.
    pub fn set_placement(&mut self, placement: &str) -> Result<(), PositionError> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(PositionError::InvalidPlacement(placement.to_string()));
        }

        let mut squares = [None; 64];
        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = Rank::index(7 - rank_idx);
            let mut file = 0usize;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                } else {
                    if file > 7 {
                        return Err(PositionError::InvalidPlacement(placement.to_string()));
                    }
                    let piece = colored_piece_from_char(c).ok_or(PositionError::InvalidPiece(c))?;
                    squares[Square::new(File::index(file), rank) as usize] = Some(piece);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(PositionError::InvalidPlacement(placement.to_string()));
            }
        }
        self.squares = squares;
        Ok(())
    }

    /// The first FEN field.
    pub fn placement(&self) -> String {
        let mut out = String::with_capacity(71);
        for rank_idx in (0..8).rev() {
            let mut empty = 0;
            for file_idx in 0..8 {
                let sq = Square::new(File::index(file_idx), Rank::index(rank_idx));
                match self.piece_at(sq) {
                    Some((piece, color)) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(format_colored_piece(piece, color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if rank_idx > 0 {
                out.push('/');
            }
        }
        out
    }

    pub fn to_fen(&self) -> String {
        self.to_string()
    }

    pub fn piece_at(&self, sq: Square) -> Option<(Piece, Color)> {
        self.squares[sq as usize]
    }

    pub fn set(&mut self, sq: Square, piece: Option<(Piece, Color)>) {
        self.squares[sq as usize] = piece;
    }

    /// Remove and return whatever stands on `sq`.
    pub fn take(&mut self, sq: Square) -> Option<(Piece, Color)> {
        self.squares[sq as usize].take()
    }

    pub fn is_empty(&self, sq: Square) -> bool {
        self.squares[sq as usize].is_none()
    }

    pub fn occupied(&self) -> BitBoard {
        self.squares_where(|_| true)
    }

    pub fn colors(&self, color: Color) -> BitBoard {
        self.squares_where(|(_, c)| c == color)
    }

    pub fn colored_pieces(&self, color: Color, piece: Piece) -> BitBoard {
        self.squares_where(|(p, c)| c == color && p == piece)
    }

    fn squares_where(&self, pred: impl Fn((Piece, Color)) -> bool) -> BitBoard {
        let mut bb = BitBoard::EMPTY;
        for sq in Square::ALL {
            if let Some(pc) = self.piece_at(sq) {
                if pred(pc) {
                    bb |= sq.bitboard();
                }
            }
        }
        bb
    }

    /// The square of `color`'s king, if exactly one is on the board.
    pub fn king(&self, color: Color) -> Option<Square> {
        let kings = self.colored_pieces(color, Piece::King);
        if kings.len() == 1 {
            kings.into_iter().next()
        } else {
            None
        }
    }

    pub fn count(&self, color: Color, piece: Piece) -> usize {
        self.colored_pieces(color, piece).len() as usize
    }

    /// Exactly one king per side and no pawns on the first or eighth rank.
    pub fn is_well_formed(&self) -> bool {
        if self.king(Color::White).is_none() || self.king(Color::Black).is_none() {
            return false;
        }
        Square::ALL.iter().all(|sq| match self.piece_at(*sq) {
            Some((Piece::Pawn, _)) => !matches!(sq.rank(), Rank::First | Rank::Eighth),
            _ => true,
        })
    }

    /// Advance the move counters and hand the turn to the other side.
    pub(crate) fn finish_turn(&mut self, reset_clock: bool) {
        if reset_clock {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if self.side_to_move == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = !self.side_to_move;
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        };
        let ep = self
            .en_passant
            .map(format_square)
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{} {} {} {} {} {}",
            self.placement(),
            side,
            self.castling,
            ep,
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

impl FromStr for Position {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("Invalid FEN format: {0}")]
    InvalidFormat(String),
    #[error("Invalid board layout: {0}")]
    InvalidPlacement(String),
    #[error("Invalid piece character: {0}")]
    InvalidPiece(char),
    #[error("Invalid side to move: {0}")]
    InvalidSideToMove(String),
    #[error("Invalid castling field: {0}")]
    InvalidCastling(String),
    #[error("Invalid en passant square: {0}")]
    InvalidEnPassant(String),
    #[error("Invalid move counter: {0}")]
    InvalidCounter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_matches_fen() {
        assert_eq!(Position::standard().to_fen(), STANDARD_START_FEN);
        assert_eq!(Position::from_fen(STANDARD_START_FEN).unwrap(), Position::standard());
    }

    #[test]
    fn test_fen_round_trip_with_ep_and_partial_castling() {
        let fen = "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w Kq c6 0 2";
        assert_eq!(Position::from_fen(fen).unwrap().to_fen(), fen);
    }

    #[test]
    fn test_four_field_fen_defaults_counters() {
        let position = Position::from_fen("8/8/8/8/8/8/8/K6k b - -").unwrap();
        assert_eq!(position.halfmove_clock, 0);
        assert_eq!(position.fullmove_number, 1);
        assert_eq!(position.side_to_move, Color::Black);
    }

    #[test]
    fn test_rejects_bad_placement() {
        assert!(matches!(
            Position::from_fen("rnbqkbnr/ppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(PositionError::InvalidPlacement(_))
        ));
        assert!(matches!(
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq - 0 1"),
            Err(PositionError::InvalidPiece('X'))
        ));
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 x - - 0 1").is_err());
    }

    #[test]
    fn test_well_formed() {
        assert!(Position::standard().is_well_formed());
        let no_black_king = Position::from_fen("8/8/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert!(!no_black_king.is_well_formed());
        let back_rank_pawn = Position::from_fen("P6k/8/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert!(!back_rank_pawn.is_well_formed());
    }

    #[test]
    fn test_castling_display() {
        assert_eq!(CastlingRights::NONE.to_string(), "-");
        assert_eq!(CastlingRights::from_flags(false, true, true, false).to_string(), "Qk");
    }
}
