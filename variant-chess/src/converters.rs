//! Conversions between cozy-chess types and their text forms.

use cozy_chess::{Color, File, Piece, Rank, Square};

/// Format a square as algebraic text ("e4").
pub fn format_square(sq: Square) -> String {
    format!("{}{}", format_file(sq.file()), format_rank(sq.rank()))
}

pub fn format_file(file: File) -> char {
    (b'a' + file as u8) as char
}

pub fn format_rank(rank: Rank) -> char {
    (b'1' + rank as u8) as char
}

/// Parse algebraic square text ("e4"). Returns `None` for anything else.
pub fn parse_square(s: &str) -> Option<Square> {
    let mut chars = s.chars();
    let file = parse_file(chars.next()?)?;
    let rank = parse_rank(chars.next()?)?;
    if chars.next().is_some() {
        return None;
    }
    Some(Square::new(file, rank))
}

pub fn parse_file(c: char) -> Option<File> {
    match c {
        'a'..='h' => Some(File::index(c as usize - 'a' as usize)),
        _ => None,
    }
}

pub fn parse_rank(c: char) -> Option<Rank> {
    match c {
        '1'..='8' => Some(Rank::index(c as usize - '1' as usize)),
        _ => None,
    }
}

/// Uppercase piece letter, as used in SAN ("N", "Q").
pub fn format_piece_upper(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

/// Lowercase piece letter, as used in coordinate promotions ("e7e8q").
pub fn format_piece(piece: Piece) -> char {
    format_piece_upper(piece).to_ascii_lowercase()
}

/// FEN letter for a colored piece: uppercase for white, lowercase for black.
pub fn format_colored_piece(piece: Piece, color: Color) -> char {
    match color {
        Color::White => format_piece_upper(piece),
        Color::Black => format_piece(piece),
    }
}

/// Case-insensitive piece letter.
pub fn piece_from_char(c: char) -> Option<Piece> {
    match c.to_ascii_lowercase() {
        'p' => Some(Piece::Pawn),
        'n' => Some(Piece::Knight),
        'b' => Some(Piece::Bishop),
        'r' => Some(Piece::Rook),
        'q' => Some(Piece::Queen),
        'k' => Some(Piece::King),
        _ => None,
    }
}

/// FEN piece letter with color from case.
pub fn colored_piece_from_char(c: char) -> Option<(Piece, Color)> {
    let piece = piece_from_char(c)?;
    let color = if c.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };
    Some((piece, color))
}

pub fn format_color(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

/// The rank a color's pieces start on.
pub fn back_rank(color: Color) -> Rank {
    match color {
        Color::White => Rank::First,
        Color::Black => Rank::Eighth,
    }
}

/// The rank a color's pawns promote on.
pub fn promotion_rank(color: Color) -> Rank {
    back_rank(!color)
}
