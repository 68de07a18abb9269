//! Game categories and the rule overrides each one switches on.

use std::fmt;

/// The numbered "wild" seatings, plus Fischer-Random.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Wild {
    /// Mirrored seating: black king on d8.
    Zero,
    /// Random back ranks with kings on d/e files.
    One,
    Two,
    Three,
    Four,
    /// Upside-down seating.
    Five,
    /// Pawns start on the fourth rank.
    Eight,
    /// Pawns start on the fourth and fifth ranks.
    EightA,
    FischerRandom,
}

/// Variant selector for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum VariantCategory {
    Standard,
    Blitz,
    Lightning,
    Untimed,
    Nonstandard,
    Crazyhouse,
    Bughouse,
    Losers,
    Wild(Wild),
}

impl VariantCategory {
    /// Parse the server's game type string ("blitz", "wild/fr", ...).
    pub fn from_fics(s: &str) -> Option<Self> {
        let category = match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Self::Standard,
            "blitz" => Self::Blitz,
            "lightning" => Self::Lightning,
            "untimed" => Self::Untimed,
            "nonstandard" => Self::Nonstandard,
            "crazyhouse" | "zh" => Self::Crazyhouse,
            "bughouse" | "bug" => Self::Bughouse,
            "losers" => Self::Losers,
            "wild/0" | "w0" => Self::Wild(Wild::Zero),
            "wild/1" | "w1" => Self::Wild(Wild::One),
            "wild/2" | "w2" => Self::Wild(Wild::Two),
            "wild/3" | "w3" => Self::Wild(Wild::Three),
            "wild/4" | "w4" => Self::Wild(Wild::Four),
            "wild/5" | "w5" => Self::Wild(Wild::Five),
            "wild/8" | "w8" => Self::Wild(Wild::Eight),
            "wild/8a" | "w8a" => Self::Wild(Wild::EightA),
            "wild/fr" | "fr" => Self::Wild(Wild::FischerRandom),
            _ => return None,
        };
        Some(category)
    }

    pub fn as_fics(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Blitz => "blitz",
            Self::Lightning => "lightning",
            Self::Untimed => "untimed",
            Self::Nonstandard => "nonstandard",
            Self::Crazyhouse => "crazyhouse",
            Self::Bughouse => "bughouse",
            Self::Losers => "losers",
            Self::Wild(Wild::Zero) => "wild/0",
            Self::Wild(Wild::One) => "wild/1",
            Self::Wild(Wild::Two) => "wild/2",
            Self::Wild(Wild::Three) => "wild/3",
            Self::Wild(Wild::Four) => "wild/4",
            Self::Wild(Wild::Five) => "wild/5",
            Self::Wild(Wild::Eight) => "wild/8",
            Self::Wild(Wild::EightA) => "wild/8a",
            Self::Wild(Wild::FischerRandom) => "wild/fr",
        }
    }

    /// Categories fully handled by the standard rules collaborator.
    pub fn is_standard(self) -> bool {
        matches!(
            self,
            Self::Standard | Self::Blitz | Self::Lightning | Self::Untimed | Self::Nonstandard
        )
    }

    /// Crazyhouse and Bughouse: captured pieces can be dropped.
    pub fn has_drops(self) -> bool {
        matches!(self, Self::Crazyhouse | Self::Bughouse)
    }

    pub fn is_wild(self) -> bool {
        matches!(self, Self::Wild(_))
    }

    pub fn is_fischer_random(self) -> bool {
        matches!(self, Self::Wild(Wild::FischerRandom))
    }
}

impl fmt::Display for VariantCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_fics())
    }
}
