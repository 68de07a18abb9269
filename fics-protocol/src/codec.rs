//! The style12 position-update record and its FEN conversion.

use variant_chess::position::{CastlingRights, Position, PositionError};

/// Token that opens every style12 line.
pub const STYLE12_TAG: &str = "<12>";

/// Tokens in a style12 line, tag included. Newer servers append extra
/// fields, which are ignored.
const STYLE12_FIELDS: usize = 31;

/// The viewer's relation to the game, from the style12 relation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Relation {
    /// -3: isolated position, e.g. from "ref 3".
    IsolatedPosition,
    /// -2: observing an examined game.
    ObservingExamined,
    /// 2: examining the game.
    Examiner,
    /// -1: playing, opponent to move.
    OpponentToMove,
    /// 1: playing, our move.
    MyMove,
    /// 0: observing a played game.
    Observing,
}

impl Relation {
    pub fn from_code(code: i32) -> Option<Self> {
        let relation = match code {
            -3 => Self::IsolatedPosition,
            -2 => Self::ObservingExamined,
            2 => Self::Examiner,
            -1 => Self::OpponentToMove,
            1 => Self::MyMove,
            0 => Self::Observing,
            _ => return None,
        };
        Some(relation)
    }

    pub fn is_playing(self) -> bool {
        matches!(self, Self::MyMove | Self::OpponentToMove)
    }
}

/// One decoded position-update record.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Style12 {
    /// Rank strings from the eighth rank down, `-` for an empty square.
    pub ranks: [String; 8],
    pub white_to_move: bool,
    /// File (0 = a) of a pawn that just made a double push.
    pub double_push_file: Option<u8>,
    pub white_short: bool,
    pub white_long: bool,
    pub black_short: bool,
    pub black_long: bool,
    pub halfmove_clock: u32,
    pub game_id: u32,
    pub white: String,
    pub black: String,
    pub relation: Relation,
    pub initial_minutes: u32,
    pub increment_seconds: u32,
    pub white_strength: i32,
    pub black_strength: i32,
    /// Remaining clock time in milliseconds; negative once flagged.
    pub white_remaining_ms: i64,
    pub black_remaining_ms: i64,
    /// Number of the move about to be made.
    pub move_number: u32,
    /// Previous move in verbose form ("P/e2-e4", "o-o", "none").
    pub verbose_move: String,
    /// Time the previous move took, as "(m:ss.mmm)".
    pub elapsed: String,
    /// Previous move in short form ("e4", "none").
    pub san_move: String,
    pub flipped: bool,
}

impl Style12 {
    /// Decode a single style12 line.
    pub fn parse(line: &str) -> Result<Self, CodecError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.first() != Some(&STYLE12_TAG) {
            return Err(CodecError::NotStyle12);
        }
        if tokens.len() < STYLE12_FIELDS {
            return Err(CodecError::FieldCount(tokens.len()));
        }

        let mut ranks: [String; 8] = Default::default();
        for (rank, token) in ranks.iter_mut().zip(&tokens[1..9]) {
            if token.len() != 8 || !token.chars().all(|c| "rnbqkpRNBQKP-".contains(c)) {
                return Err(CodecError::InvalidRank(token.to_string()));
            }
            *rank = token.to_string();
        }

        let white_to_move = match tokens[9] {
            "W" => true,
            "B" => false,
            other => return Err(field("side to move", other)),
        };
        let double_push_file = match number::<i32>("double push file", tokens[10])? {
            -1 => None,
            f @ 0..=7 => Some(f as u8),
            _ => return Err(field("double push file", tokens[10])),
        };
        let relation_code = number::<i32>("relation", tokens[19])?;

        Ok(Self {
            ranks,
            white_to_move,
            double_push_file,
            white_short: flag("white short castle", tokens[11])?,
            white_long: flag("white long castle", tokens[12])?,
            black_short: flag("black short castle", tokens[13])?,
            black_long: flag("black long castle", tokens[14])?,
            halfmove_clock: number("halfmove clock", tokens[15])?,
            game_id: number("game id", tokens[16])?,
            white: tokens[17].to_string(),
            black: tokens[18].to_string(),
            relation: Relation::from_code(relation_code).ok_or_else(|| field("relation", tokens[19]))?,
            initial_minutes: number("initial time", tokens[20])?,
            increment_seconds: number("increment", tokens[21])?,
            white_strength: number("white strength", tokens[22])?,
            black_strength: number("black strength", tokens[23])?,
            white_remaining_ms: number("white time", tokens[24])?,
            black_remaining_ms: number("black time", tokens[25])?,
            move_number: number("move number", tokens[26])?,
            verbose_move: tokens[27].to_string(),
            elapsed: tokens[28].to_string(),
            san_move: tokens[29].to_string(),
            flipped: flag("flip", tokens[30])?,
        })
    }

    /// Piece placement in FEN form.
    pub fn placement(&self) -> String {
        placement_from_ranks(&self.ranks)
    }

    pub fn to_fen(&self) -> String {
        let side = if self.white_to_move { 'w' } else { 'b' };
        let castling = CastlingRights::from_flags(self.white_short, self.white_long, self.black_short, self.black_long);
        // The en passant target sits behind the pawn that just moved.
        let en_passant = match self.double_push_file {
            Some(file) => {
                let file = char::from(b'a' + file);
                let rank = if self.white_to_move { '6' } else { '3' };
                format!("{file}{rank}")
            }
            None => "-".to_string(),
        };
        format!(
            "{} {} {} {} {} {}",
            self.placement(),
            side,
            castling,
            en_passant,
            self.halfmove_clock,
            self.move_number
        )
    }

    pub fn position(&self) -> Result<Position, PositionError> {
        Position::from_fen(&self.to_fen())
    }

    /// Whether a previous move is recorded.
    pub fn has_previous_move(&self) -> bool {
        self.verbose_move != "none"
    }
}

/// Join style12 rank strings into a FEN placement, collapsing runs of empty
/// squares into digits.
pub fn placement_from_ranks(ranks: &[String; 8]) -> String {
    let mut placement = String::with_capacity(72);
    for (i, rank) in ranks.iter().enumerate() {
        if i > 0 {
            placement.push('/');
        }
        let mut empty = 0;
        for c in rank.chars() {
            if c == '-' {
                empty += 1;
            } else {
                if empty > 0 {
                    placement.push_str(&empty.to_string());
                    empty = 0;
                }
                placement.push(c);
            }
        }
        if empty > 0 {
            placement.push_str(&empty.to_string());
        }
    }
    placement
}

/// The eight style12 rank strings for a FEN (only the placement field is read).
pub fn ranks_from_fen(fen: &str) -> Result<[String; 8], CodecError> {
    let placement = fen.split_whitespace().next().unwrap_or_default();
    let rows: Vec<&str> = placement.split('/').collect();
    if rows.len() != 8 {
        return Err(CodecError::InvalidPlacement(placement.to_string()));
    }

    let mut ranks: [String; 8] = Default::default();
    for (rank, row) in ranks.iter_mut().zip(rows) {
        for c in row.chars() {
            match c.to_digit(10) {
                Some(n @ 1..=8) => rank.extend(std::iter::repeat('-').take(n as usize)),
                Some(_) => return Err(CodecError::InvalidPlacement(placement.to_string())),
                None if "rnbqkpRNBQKP".contains(c) => rank.push(c),
                None => return Err(CodecError::InvalidPlacement(placement.to_string())),
            }
        }
        if rank.len() != 8 {
            return Err(CodecError::InvalidPlacement(placement.to_string()));
        }
    }
    Ok(ranks)
}

fn number<T: std::str::FromStr>(name: &'static str, token: &str) -> Result<T, CodecError> {
    token.parse().map_err(|_| field(name, token))
}

fn flag(name: &'static str, token: &str) -> Result<bool, CodecError> {
    match token {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(field(name, other)),
    }
}

fn field(name: &'static str, value: &str) -> CodecError {
    CodecError::InvalidField {
        name,
        value: value.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Not a style12 line")]
    NotStyle12,
    #[error("Expected at least 31 style12 fields, found {0}")]
    FieldCount(usize),
    #[error("Invalid style12 rank: {0}")]
    InvalidRank(String),
    #[error("Invalid style12 {name}: {value}")]
    InvalidField { name: &'static str, value: String },
    #[error("Invalid FEN placement: {0}")]
    InvalidPlacement(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const AFTER_E4: &str = "<12> rnbqkbnr pppppppp -------- -------- ----P--- -------- PPPP-PPP RNBQKBNR B 4 1 1 1 1 0 7 GuestAbcd GuestEfgh -1 2 12 39 39 120000 120000 1 P/e2-e4 (0:00.000) e4 0 0 0";

    #[test]
    fn test_parse_after_e4() {
        let record = Style12::parse(AFTER_E4).unwrap();
        assert_eq!(record.game_id, 7);
        assert_eq!(record.white, "GuestAbcd");
        assert_eq!(record.relation, Relation::OpponentToMove);
        assert_eq!(record.double_push_file, Some(4));
        assert_eq!(record.white_remaining_ms, 120_000);
        assert_eq!(record.san_move, "e4");
        assert!(!record.flipped);
        assert_eq!(
            record.to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
        assert!(record.position().is_ok());
    }

    #[test]
    fn test_black_double_push_targets_sixth_rank() {
        let line = "<12> rnbqkbnr pppp-ppp -------- ----p--- ----P--- -------- PPPP-PPP RNBQKBNR W 4 1 1 1 1 0 7 GuestAbcd GuestEfgh 1 2 12 39 39 118000 119500 2 P/e7-e5 (0:01.500) e5 0";
        let record = Style12::parse(line).unwrap();
        assert_eq!(
            record.to_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2"
        );
    }

    #[test]
    fn test_short_line_rejected() {
        let err = Style12::parse("<12> rnbqkbnr pppppppp").unwrap_err();
        assert_eq!(err, CodecError::FieldCount(3));
    }

    #[test]
    fn test_bad_rank_rejected() {
        let line = AFTER_E4.replacen("rnbqkbnr", "rnbqkbnx", 1);
        assert!(matches!(Style12::parse(&line), Err(CodecError::InvalidRank(_))));
    }

    #[test]
    fn test_extra_fields_ignored() {
        let line = format!("{AFTER_E4} 1 0");
        assert!(Style12::parse(&line).is_ok());
    }

    #[test]
    fn test_ranks_from_fen() {
        let ranks = ranks_from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
        assert_eq!(ranks[4], "----P---");
        assert_eq!(ranks[6], "PPPP-PPP");
        assert_eq!(placement_from_ranks(&ranks), "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR");
        assert!(ranks_from_fen("8/8/8").is_err());
        assert!(ranks_from_fen("9/8/8/8/8/8/8/8").is_err());
    }
}
