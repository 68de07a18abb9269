//! Seek and pending-offer lines (`<s>`, `<sn>`, `<sc>`, `<sr>`, `<pt>`,
//! `<pf>`, `<pr>`), sent when the `seekinfo` and `pendinfo` variables are set.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::events::{parse_rating, Direction, MatchTerms, Offer, OfferDetails, PendingOffer, Seek};

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"^<(s|sn|sc|sr|pt|pf|pr)>(?:\s|$)").unwrap();
    static ref PENDING_RE: Regex = Regex::new(r"^<(pt|pf)> (\d+) w=(\S+) t=(\S+) p=(.*)$").unwrap();
    static ref MATCH_TERMS_RE: Regex = Regex::new(
        r"^(\w+) \(([^)]*)\)\s+(?:\[(\w+)\]\s+)?(\w+) \(([^)]*)\) (rated|unrated) (\S+) (\d+) (\d+)"
    )
    .unwrap();
}

pub(super) fn is_offer_line(line: &str) -> bool {
    TAG_RE.is_match(line)
}

pub(super) fn parse_offer(line: &str) -> Option<Offer> {
    let tag = TAG_RE.captures(line)?.get(1)?.as_str();
    let body = line.split_once('>').map_or("", |(_, rest)| rest).trim();
    match tag {
        "s" => seek(body, false).map(Offer::Seek),
        "sn" => seek(body, true).map(Offer::Seek),
        "sc" => Some(Offer::SeeksCleared),
        "sr" => ids(body).map(|ids| Offer::SeeksRemoved { ids }),
        "pr" => ids(body).map(|ids| Offer::PendingRemoved { ids }),
        "pt" | "pf" => pending(line).map(Offer::Pending),
        _ => None,
    }
}

fn ids(body: &str) -> Option<Vec<u32>> {
    body.split_whitespace().map(|id| id.parse().ok()).collect()
}

/// `8 w=visar ti=02 rt=2194  t=4 i=0 r=r tp=suicide c=? rr=0-9999 a=t f=f`
fn seek(body: &str, notify: bool) -> Option<Seek> {
    let mut tokens = body.split_whitespace();
    let id = tokens.next()?.parse().ok()?;
    let fields: HashMap<&str, &str> = tokens.filter_map(|t| t.split_once('=')).collect();
    let get = |key: &str| fields.get(key).copied();

    let (low, high) = get("rr")?.split_once('-')?;
    Some(Seek {
        id,
        player: get("w")?.to_string(),
        titles: u32::from_str_radix(get("ti")?, 16).ok()?,
        rating: parse_rating(get("rt")?),
        initial_minutes: get("t")?.parse().ok()?,
        increment_seconds: get("i")?.parse().ok()?,
        rated: get("r")? == "r",
        category: get("tp")?.to_string(),
        color: match get("c")? {
            "W" => Some('W'),
            "B" => Some('B'),
            _ => None,
        },
        rating_range: (low.parse().ok()?, high.parse().ok()?),
        automatic: get("a")? == "t",
        formula: get("f")? == "t",
        notify,
    })
}

fn pending(line: &str) -> Option<PendingOffer> {
    let caps = PENDING_RE.captures(line)?;
    let subtype = caps[4].to_string();
    let params = caps[5].trim().to_string();
    let details = if subtype == "match" {
        match_terms(&params).map_or(OfferDetails::Other { params }, OfferDetails::Match)
    } else {
        OfferDetails::Other { params }
    };
    Some(PendingOffer {
        id: caps[2].parse().ok()?,
        direction: if &caps[1] == "pt" {
            Direction::Sent
        } else {
            Direction::Received
        },
        player: caps[3].to_string(),
        subtype,
        details,
    })
}

/// `GuestAbcd (----) [white] GuestEfgh (1500) unrated blitz 2 12`
fn match_terms(params: &str) -> Option<MatchTerms> {
    let caps = MATCH_TERMS_RE.captures(params)?;
    Some(MatchTerms {
        challenger: caps[1].to_string(),
        challenger_rating: parse_rating(&caps[2]),
        color: caps.get(3).map(|m| m.as_str().to_string()),
        opponent: caps[4].to_string(),
        opponent_rating: parse_rating(&caps[5]),
        rated: &caps[6] == "rated",
        category: caps[7].to_string(),
        initial_minutes: caps[8].parse().ok()?,
        increment_seconds: caps[9].parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_line() {
        let offer = parse_offer("<s> 8 w=visar ti=02 rt=2194  t=4 i=0 r=r tp=suicide c=? rr=0-9999 a=t f=f").unwrap();
        let Offer::Seek(seek) = offer else {
            panic!("expected seek");
        };
        assert_eq!(seek.id, 8);
        assert_eq!(seek.player, "visar");
        assert_eq!(seek.titles, 2);
        assert_eq!(seek.rating, Some(2194));
        assert_eq!(seek.initial_minutes, 4);
        assert!(seek.rated);
        assert_eq!(seek.category, "suicide");
        assert_eq!(seek.color, None);
        assert_eq!(seek.rating_range, (0, 9999));
        assert!(seek.automatic);
        assert!(!seek.formula);
        assert!(!seek.notify);
    }

    #[test]
    fn test_unrated_seeker_has_no_rating() {
        let offer = parse_offer("<sn> 21 w=GuestQrst ti=01 rt=0P t=3 i=0 r=u tp=blitz c=W rr=0-9999 a=t f=f").unwrap();
        let Offer::Seek(seek) = offer else {
            panic!("expected seek");
        };
        assert_eq!(seek.rating, None);
        assert!(!seek.rated);
        assert_eq!(seek.color, Some('W'));
        assert!(seek.notify);
    }

    #[test]
    fn test_removals_and_clear() {
        assert_eq!(
            parse_offer("<sr> 8 12 40"),
            Some(Offer::SeeksRemoved { ids: vec![8, 12, 40] })
        );
        assert_eq!(parse_offer("<pr> 3"), Some(Offer::PendingRemoved { ids: vec![3] }));
        assert_eq!(parse_offer("<sc>"), Some(Offer::SeeksCleared));
        assert_eq!(parse_offer("<sr> 8 x"), None);
    }

    #[test]
    fn test_match_offer_received() {
        let offer =
            parse_offer("<pf> 24 w=GuestAbcd t=match p=GuestAbcd (----) [black] GuestEfgh ( 1500) rated blitz 5 2")
                .unwrap();
        let Offer::Pending(pending) = offer else {
            panic!("expected pending offer");
        };
        assert_eq!(pending.id, 24);
        assert_eq!(pending.direction, Direction::Received);
        let OfferDetails::Match(terms) = pending.details else {
            panic!("expected match terms");
        };
        assert_eq!(terms.challenger_rating, None);
        assert_eq!(terms.color.as_deref(), Some("black"));
        assert_eq!(terms.opponent_rating, Some(1500));
        assert!(terms.rated);
        assert_eq!((terms.initial_minutes, terms.increment_seconds), (5, 2));
    }

    #[test]
    fn test_other_offer_keeps_params() {
        let offer = parse_offer("<pt> 9 w=Partner t=partner p=#").unwrap();
        let Offer::Pending(pending) = offer else {
            panic!("expected pending offer");
        };
        assert_eq!(pending.direction, Direction::Sent);
        assert_eq!(pending.subtype, "partner");
        assert_eq!(pending.details, OfferDetails::Other { params: "#".to_string() });
    }

    #[test]
    fn test_tag_detection() {
        assert!(is_offer_line("<sc>"));
        assert!(is_offer_line("<s> 1 w=a"));
        assert!(!is_offer_line("<12> rnbqkbnr"));
        assert!(!is_offer_line("<sx> 1"));
    }
}
