//! Typed records produced by the message parser.

use serde::Serialize;
use variant_chess::{Holdings, VariantCategory};

use crate::codec::Style12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    LoginPrompt,
    LoginResult(LoginResult),
    PositionUpdate(Box<Style12>),
    GameStarted(GameStart),
    GameEnded(GameEnd),
    Holdings {
        game_id: u32,
        white: Holdings,
        black: Holdings,
    },
    ChannelMessage {
        channel: u32,
        sender: String,
        titles: Vec<String>,
        text: String,
    },
    PrivateMessage {
        sender: String,
        titles: Vec<String>,
        text: String,
    },
    Kibitz {
        game_id: u32,
        sender: String,
        titles: Vec<String>,
        rating: Option<u32>,
        text: String,
        whisper: bool,
    },
    Offers {
        offers: Vec<Offer>,
    },
    Unclassified {
        text: String,
    },
}

impl ServerEvent {
    pub fn unclassified(text: impl Into<String>) -> Self {
        Self::Unclassified { text: text.into() }
    }
}

/// Outcome of a login attempt: a display name on success, otherwise the
/// reason it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResult {
    pub display_name: Option<String>,
    pub error: Option<String>,
}

impl LoginResult {
    pub fn success(name: impl Into<String>) -> Self {
        Self {
            display_name: Some(name.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            display_name: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.display_name.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameStart {
    pub game_id: u32,
    pub white: String,
    pub black: String,
    pub rated: bool,
    /// Category as the server names it ("blitz", "wild/fr").
    pub category: String,
    pub initial_minutes: Option<u32>,
    pub increment_seconds: Option<u32>,
    /// Resuming an adjourned game rather than starting a new one.
    pub continuing: bool,
}

impl GameStart {
    pub fn variant(&self) -> Option<VariantCategory> {
        VariantCategory::from_fics(&self.category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Score {
    WhiteWins,
    BlackWins,
    Draw,
    Unfinished,
}

impl Score {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "1-0" => Some(Self::WhiteWins),
            "0-1" => Some(Self::BlackWins),
            "1/2-1/2" => Some(Self::Draw),
            "*" => Some(Self::Unfinished),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Reason {
    Resign,
    Disconnect,
    Checkmate,
    TimeForfeit,
    Draw,
    Adjourn,
    Abort,
    Unknown,
}

impl Reason {
    /// Map the result phrase (with the acting player's name removed) to a
    /// reason. Unrecognized phrases are `Unknown`.
    pub fn from_phrase(phrase: &str) -> Self {
        const PREFIXES: &[(&str, Reason)] = &[
            ("resigns", Reason::Resign),
            ("checkmated", Reason::Checkmate),
            ("forfeits on time", Reason::TimeForfeit),
            ("forfeits by disconnection", Reason::Disconnect),
            ("lost connection and too few moves", Reason::Abort),
            ("lost connection", Reason::Adjourn),
            ("ran out of time and", Reason::Draw),
            ("Game drawn", Reason::Draw),
            ("Neither player has mating material", Reason::Draw),
            ("Game adjourned", Reason::Adjourn),
            ("Game aborted", Reason::Abort),
            ("Game courtesyaborted", Reason::Abort),
            ("Game courtesyadjourned", Reason::Adjourn),
        ];
        PREFIXES
            .iter()
            .find(|(prefix, _)| phrase.starts_with(prefix))
            .map_or(Reason::Unknown, |(_, reason)| *reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameEnd {
    pub game_id: u32,
    pub white: String,
    pub black: String,
    /// Player named at the start of the phrase, if any ("X resigns").
    pub actor: Option<String>,
    pub phrase: String,
    pub score: Option<Score>,
    pub winner: Option<String>,
    pub loser: Option<String>,
    pub reason: Reason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum Offer {
    /// `<s>` / `<sn>`.
    Seek(Seek),
    /// `<sr>`.
    SeeksRemoved { ids: Vec<u32> },
    /// `<sc>`.
    SeeksCleared,
    /// `<pt>` / `<pf>`.
    Pending(PendingOffer),
    /// `<pr>`.
    PendingRemoved { ids: Vec<u32> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Seek {
    pub id: u32,
    pub player: String,
    /// Title bit field (`ti=`), hexadecimal on the wire.
    pub titles: u32,
    pub rating: Option<u32>,
    pub initial_minutes: u32,
    pub increment_seconds: u32,
    pub rated: bool,
    pub category: String,
    /// 'W', 'B' or None when the seeker accepts either color.
    pub color: Option<char>,
    pub rating_range: (u32, u32),
    pub automatic: bool,
    pub formula: bool,
    /// Sent because the seek matches our formula (`<sn>`).
    pub notify: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    /// `<pt>`: an offer we made.
    Sent,
    /// `<pf>`: an offer made to us.
    Received,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingOffer {
    pub id: u32,
    pub direction: Direction,
    /// The other party.
    pub player: String,
    /// `t=`: match, partner, draw, abort, takeback, ...
    pub subtype: String,
    pub details: OfferDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape")]
pub enum OfferDetails {
    Match(MatchTerms),
    Other { params: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchTerms {
    pub challenger: String,
    pub challenger_rating: Option<u32>,
    /// Color the challenger asked for, if any.
    pub color: Option<String>,
    pub opponent: String,
    pub opponent_rating: Option<u32>,
    pub rated: bool,
    pub category: String,
    pub initial_minutes: u32,
    pub increment_seconds: u32,
}

/// Parse a rating token. Unrated and provisional-zero markers ("0P",
/// "----", "++++") mean no rating.
pub fn parse_rating(token: &str) -> Option<u32> {
    let digits = token.trim().trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == ' ');
    match digits.parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(rating) => Some(rating),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_sentinels() {
        assert_eq!(parse_rating("1500"), Some(1500));
        assert_eq!(parse_rating("1843P"), Some(1843));
        assert_eq!(parse_rating("2100E"), Some(2100));
        assert_eq!(parse_rating("0P"), None);
        assert_eq!(parse_rating("----"), None);
        assert_eq!(parse_rating("++++"), None);
    }

    #[test]
    fn test_reason_phrases() {
        assert_eq!(Reason::from_phrase("resigns"), Reason::Resign);
        assert_eq!(Reason::from_phrase("forfeits on time"), Reason::TimeForfeit);
        assert_eq!(Reason::from_phrase("lost connection; game adjourned"), Reason::Adjourn);
        assert_eq!(
            Reason::from_phrase("lost connection and too few moves; game aborted"),
            Reason::Abort
        );
        assert_eq!(Reason::from_phrase("Game drawn by repetition"), Reason::Draw);
        assert_eq!(Reason::from_phrase("wins by having fewer pieces"), Reason::Unknown);
    }

    #[test]
    fn test_events_serialize_with_type_tag() {
        let event = ServerEvent::unclassified("hello");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Unclassified");
        assert_eq!(json["text"], "hello");

        let event = ServerEvent::LoginResult(LoginResult::success("GuestQXYZ"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "LoginResult");
        assert_eq!(json["display_name"], "GuestQXYZ");
    }
}
