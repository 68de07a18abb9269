//! Content matchers for logged-in server output.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use variant_chess::Holdings;

use crate::codec::{Style12, STYLE12_TAG};
use crate::events::{parse_rating, GameEnd, GameStart, Reason, Score, ServerEvent};

/// A matcher looks at a message and claims it by returning an event.
pub(super) type Matcher = fn(&str) -> Option<ServerEvent>;

/// Matchers that claim a single physical line, so several can share a chunk.
pub(super) const LINE_MATCHERS: &[Matcher] = &[position_update, holdings];

/// Matchers for a block of ordinary lines, tried in order; the first hit wins.
pub(super) const BLOCK_MATCHERS: &[Matcher] = &[game_started, game_ended, channel_tell, private_tell, kibitz];

lazy_static! {
    static ref HOLDINGS_RE: Regex =
        Regex::new(r"^<b1> game (\d+) white \[([A-Za-z]*)\] black \[([A-Za-z]*)\]").unwrap();
    static ref GAME_BANNER_RE: Regex =
        Regex::new(r"\{Game (\d+) \((\w+) vs\. (\w+)\) (Creating|Continuing) (rated|unrated) (\S+) match\.\}")
            .unwrap();
    static ref CREATING_RE: Regex =
        Regex::new(r"Creating: (\w+) \([^)]*\) (\w+) \([^)]*\) (?:rated|unrated) \S+ (\d+) (\d+)").unwrap();
    static ref GAME_END_RE: Regex =
        Regex::new(r"\{Game (\d+) \((\w+) vs\. (\w+)\) ([^}]*)\} (1-0|0-1|1/2-1/2|\*)").unwrap();
    static ref CHANNEL_RE: Regex = Regex::new(r"(?s)^(\w+)((?:\([A-Z*]+\))*)\((\d+)\): (.*)$").unwrap();
    static ref PRIVATE_RE: Regex = Regex::new(r"(?s)^(\w+)((?:\([A-Z*]+\))*) tells you: (.*)$").unwrap();
    static ref KIBITZ_RE: Regex =
        Regex::new(r"(?s)^(\w+)((?:\([A-Z*]+\))*)\(([^)\[]+)\)\[(\d+)\] (kibitzes|whispers): (.*)$").unwrap();
    static ref TITLE_RE: Regex = Regex::new(r"\(([A-Z*]+)\)").unwrap();
}

fn position_update(line: &str) -> Option<ServerEvent> {
    if !line.starts_with(STYLE12_TAG) {
        return None;
    }
    match Style12::parse(line) {
        Ok(record) => Some(ServerEvent::PositionUpdate(Box::new(record))),
        Err(e) => {
            tracing::debug!("Unreadable style12 line: {}", e);
            None
        }
    }
}

fn holdings(text: &str) -> Option<ServerEvent> {
    let caps = HOLDINGS_RE.captures(text)?;
    Some(ServerEvent::Holdings {
        game_id: caps[1].parse().ok()?,
        white: Holdings::from_letters(&caps[2]),
        black: Holdings::from_letters(&caps[3]),
    })
}

fn game_started(text: &str) -> Option<ServerEvent> {
    let caps = GAME_BANNER_RE.captures(text)?;
    let white = caps[2].to_string();
    let black = caps[3].to_string();

    // The "Creating:" line carries the time control; it names the players
    // in the same order as the banner.
    let time_control: Option<(u32, u32)> = CREATING_RE
        .captures(text)
        .filter(|c| c[1] == white && c[2] == black)
        .and_then(|c| Some((c[3].parse().ok()?, c[4].parse().ok()?)));

    Some(ServerEvent::GameStarted(GameStart {
        game_id: caps[1].parse().ok()?,
        white,
        black,
        rated: &caps[5] == "rated",
        category: caps[6].to_string(),
        initial_minutes: time_control.map(|(initial, _)| initial),
        increment_seconds: time_control.map(|(_, increment)| increment),
        continuing: &caps[4] == "Continuing",
    }))
}

fn game_ended(text: &str) -> Option<ServerEvent> {
    let caps = GAME_END_RE.captures(text)?;
    let white = caps[2].to_string();
    let black = caps[3].to_string();
    let phrase = caps[4].trim().to_string();

    let (actor, rest) = match phrase.split_once(' ') {
        Some((first, rest)) if first == white || first == black => (Some(first.to_string()), rest),
        _ => (None, phrase.as_str()),
    };
    let reason = Reason::from_phrase(rest);

    let score = Score::from_token(&caps[5]);
    let (winner, loser) = match score {
        Some(Score::WhiteWins) => (Some(white.clone()), Some(black.clone())),
        Some(Score::BlackWins) => (Some(black.clone()), Some(white.clone())),
        _ => (None, None),
    };

    Some(ServerEvent::GameEnded(GameEnd {
        game_id: caps[1].parse().ok()?,
        white,
        black,
        actor,
        reason,
        phrase,
        score,
        winner,
        loser,
    }))
}

fn titles(caps: &Captures, group: usize) -> Vec<String> {
    caps.get(group)
        .map(|m| {
            TITLE_RE
                .captures_iter(m.as_str())
                .map(|t| t[1].to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn channel_tell(text: &str) -> Option<ServerEvent> {
    let caps = CHANNEL_RE.captures(text)?;
    Some(ServerEvent::ChannelMessage {
        channel: caps[3].parse().ok()?,
        sender: caps[1].to_string(),
        titles: titles(&caps, 2),
        text: caps[4].to_string(),
    })
}

fn private_tell(text: &str) -> Option<ServerEvent> {
    let caps = PRIVATE_RE.captures(text)?;
    Some(ServerEvent::PrivateMessage {
        sender: caps[1].to_string(),
        titles: titles(&caps, 2),
        text: caps[3].to_string(),
    })
}

fn kibitz(text: &str) -> Option<ServerEvent> {
    let caps = KIBITZ_RE.captures(text)?;
    Some(ServerEvent::Kibitz {
        game_id: caps[4].parse().ok()?,
        sender: caps[1].to_string(),
        titles: titles(&caps, 2),
        rating: parse_rating(&caps[3]),
        text: caps[6].to_string(),
        whisper: &caps[5] == "whispers",
    })
}
