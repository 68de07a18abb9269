//! Stateful classifier for server output.
//!
//! Before login the parser drives the login dialogue: it queues the replies
//! owed to each prompt and reports the outcome. Once the session has started
//! every chunk is split on the server prompt and each message is matched
//! against the typed matchers in priority order.

mod matchers;
mod offers;

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::ParserConfig;
use crate::events::{LoginResult, Offer, ServerEvent};

/// Prompt the server prints after each message once logged in.
pub const PROMPT: &str = "fics% ";

/// Continuation marker the server inserts when it wraps a long line.
const WRAP_MARKER: &str = "\n\\   ";

lazy_static! {
    static ref SESSION_RE: Regex =
        Regex::new(r"\*\*\*\* Starting FICS session as (\w+)(?:\([^)]*\))* \*\*\*\*").unwrap();
    static ref GUEST_PROMPT_RE: Regex = Regex::new(r#"Press return to enter the server as "(\w+)":"#).unwrap();
}

const INVALID_PASSWORD: &str = "**** Invalid password! ****";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    AwaitingLogin,
    AwaitingPassword,
    LoggedIn,
}

/// Turns raw server text into [`ServerEvent`]s.
///
/// Chunks must be fed in arrival order; login transitions depend on it.
#[derive(Debug)]
pub struct Parser {
    config: ParserConfig,
    state: LoginState,
    replies: Vec<String>,
}

impl Parser {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            state: LoginState::AwaitingLogin,
            replies: Vec::new(),
        }
    }

    /// A parser for a session that is already past the login dialogue.
    pub fn logged_in(config: ParserConfig) -> Self {
        Self {
            state: LoginState::LoggedIn,
            ..Self::new(config)
        }
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Lines the login dialogue wants sent to the server, oldest first.
    pub fn take_replies(&mut self) -> Vec<String> {
        std::mem::take(&mut self.replies)
    }

    /// Classify one chunk of server output. Never fails: text no matcher
    /// claims comes back as [`ServerEvent::Unclassified`].
    pub fn parse(&mut self, raw: &str) -> Vec<ServerEvent> {
        let text = clean(raw);
        tracing::trace!("FICS << {:?}", text);
        match self.state {
            LoginState::LoggedIn => parse_messages(&text),
            _ => self.parse_login(&text),
        }
    }

    fn parse_login(&mut self, text: &str) -> Vec<ServerEvent> {
        if let Some(caps) = SESSION_RE.captures(text) {
            let name = caps[1].to_string();
            let rest = &text[caps.get(0).map_or(0, |m| m.end())..];
            self.transition(LoginState::LoggedIn);
            let mut events = vec![ServerEvent::LoginResult(LoginResult::success(name))];
            events.extend(parse_messages(rest));
            return events;
        }

        if text.contains(INVALID_PASSWORD) {
            self.transition(LoginState::AwaitingPassword);
            return vec![ServerEvent::LoginResult(LoginResult::failure("Invalid password"))];
        }

        if let Some(caps) = GUEST_PROMPT_RE.captures(text) {
            tracing::debug!("Entering as guest {}", &caps[1]);
            self.replies.push(String::new());
            return vec![ServerEvent::unclassified(text.trim())];
        }

        let trimmed = text.trim_end();
        if trimmed.ends_with("password:") {
            self.transition(LoginState::AwaitingPassword);
            return match &self.config.password {
                Some(password) => {
                    self.replies.push(password.clone());
                    Vec::new()
                }
                None => vec![ServerEvent::LoginResult(LoginResult::failure("password required"))],
            };
        }

        if let Some(preface) = trimmed.strip_suffix("login:") {
            let mut events = Vec::new();
            if !preface.trim().is_empty() {
                events.push(ServerEvent::unclassified(preface.trim()));
            }
            // After a rejected password the name is not resent; the caller
            // decides what to do next.
            if self.state == LoginState::AwaitingLogin {
                self.replies.push(self.config.username.clone());
            }
            events.push(ServerEvent::LoginPrompt);
            return events;
        }

        match text.trim() {
            "" => Vec::new(),
            other => vec![ServerEvent::unclassified(other)],
        }
    }

    fn transition(&mut self, next: LoginState) {
        if self.state != next {
            tracing::debug!("Login state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

/// Strip carriage returns and control characters, and rejoin lines the
/// server wrapped.
pub fn clean(raw: &str) -> String {
    raw.replace('\r', "")
        .replace(WRAP_MARKER, " ")
        .chars()
        .filter(|&c| !c.is_control() || c == '\n' || c == '\t')
        .collect()
}

/// Split logged-in output on the prompt and classify each message.
fn parse_messages(text: &str) -> Vec<ServerEvent> {
    text.split(PROMPT)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .flat_map(classify)
        .collect()
}

/// Classify one message. Line-level records (position updates, holdings,
/// offers) are pulled out in order; the ordinary lines between them form
/// blocks that go through the block matchers.
fn classify(message: &str) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    let mut pending_offers: Vec<Offer> = Vec::new();

    for line in message.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(event) = matchers::LINE_MATCHERS.iter().find_map(|m| m(line)) {
            flush_block(&mut block, &mut events);
            flush_offers(&mut pending_offers, &mut events);
            events.push(event);
            continue;
        }
        if offers::is_offer_line(line) {
            if let Some(offer) = offers::parse_offer(line) {
                flush_block(&mut block, &mut events);
                pending_offers.push(offer);
                continue;
            }
            tracing::debug!("Malformed offer line: {}", line);
        }
        flush_offers(&mut pending_offers, &mut events);
        block.push(line);
    }

    flush_block(&mut block, &mut events);
    flush_offers(&mut pending_offers, &mut events);
    events
}

fn flush_block(block: &mut Vec<&str>, events: &mut Vec<ServerEvent>) {
    if block.is_empty() {
        return;
    }
    let text = block.join("\n");
    block.clear();
    let event = matchers::BLOCK_MATCHERS
        .iter()
        .find_map(|m| m(&text))
        .unwrap_or_else(|| ServerEvent::unclassified(text));
    events.push(event);
}

fn flush_offers(pending: &mut Vec<Offer>, events: &mut Vec<ServerEvent>) {
    if !pending.is_empty() {
        events.push(ServerEvent::Offers {
            offers: std::mem::take(pending),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AFTER_E4: &str = "<12> rnbqkbnr pppppppp -------- -------- ----P--- -------- PPPP-PPP RNBQKBNR B 4 1 1 1 1 0 7 GuestAbcd GuestEfgh -1 2 12 39 39 120000 120000 1 P/e2-e4 (0:00.000) e4 0 0 0";

    fn guest_parser() -> Parser {
        Parser::new(ParserConfig::default())
    }

    fn registered_parser(password: Option<&str>) -> Parser {
        Parser::new(ParserConfig::new("someone", password.map(str::to_string)))
    }

    #[test]
    fn test_clean_strips_controls_and_wraps() {
        assert_eq!(clean("a\r\nb\u{7}c"), "a\nbc");
        assert_eq!(clean("long line\n\\   continued"), "long line continued");
    }

    #[test]
    fn test_guest_login_flow() {
        let mut parser = guest_parser();

        let events = parser.parse("Welcome to FICS\n\nlogin: ");
        assert_eq!(
            events,
            vec![ServerEvent::unclassified("Welcome to FICS"), ServerEvent::LoginPrompt]
        );
        assert_eq!(parser.take_replies(), vec!["guest".to_string()]);

        parser.parse("Logging you in as \"GuestQXYZ\"\n\nPress return to enter the server as \"GuestQXYZ\":");
        assert_eq!(parser.take_replies(), vec![String::new()]);
        assert_eq!(parser.state(), LoginState::AwaitingLogin);

        let events = parser.parse("**** Starting FICS session as GuestQXYZ(U) ****\n");
        assert_eq!(
            events,
            vec![ServerEvent::LoginResult(LoginResult::success("GuestQXYZ"))]
        );
        assert_eq!(parser.state(), LoginState::LoggedIn);
    }

    #[test]
    fn test_session_banner_remainder_is_parsed() {
        let mut parser = guest_parser();
        let events = parser.parse(&format!(
            "**** Starting FICS session as GuestQXYZ(U) ****\n{AFTER_E4}\n{PROMPT}"
        ));
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], ServerEvent::PositionUpdate(_)));
    }

    #[test]
    fn test_password_sent_when_configured() {
        let mut parser = registered_parser(Some("secret"));
        parser.parse("login: ");
        assert_eq!(parser.take_replies(), vec!["someone".to_string()]);

        let events = parser.parse("\"someone\" is a registered name.\n\npassword: ");
        assert!(events.is_empty());
        assert_eq!(parser.state(), LoginState::AwaitingPassword);
        assert_eq!(parser.take_replies(), vec!["secret".to_string()]);
    }

    #[test]
    fn test_missing_password_reported() {
        let mut parser = registered_parser(None);
        let events = parser.parse("password: ");
        assert_eq!(
            events,
            vec![ServerEvent::LoginResult(LoginResult::failure("password required"))]
        );
        assert!(parser.take_replies().is_empty());
        assert_eq!(parser.state(), LoginState::AwaitingPassword);
    }

    #[test]
    fn test_invalid_password_stays_awaiting() {
        let mut parser = registered_parser(Some("wrong"));
        parser.parse("password: ");
        parser.take_replies();

        let events = parser.parse("\n**** Invalid password! ****\n\nlogin: ");
        assert_eq!(
            events,
            vec![ServerEvent::LoginResult(LoginResult::failure("Invalid password"))]
        );
        assert_eq!(parser.state(), LoginState::AwaitingPassword);

        // A fresh prompt is surfaced but not answered.
        let events = parser.parse("login: ");
        assert_eq!(events, vec![ServerEvent::LoginPrompt]);
        assert!(parser.take_replies().is_empty());
    }

    #[test]
    fn test_prompt_splits_messages() {
        let mut parser = Parser::logged_in(ParserConfig::default());
        let chunk = format!("Someone(53): hi\n{PROMPT}Friend tells you: yo\n{PROMPT}");
        let events = parser.parse(&chunk);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ServerEvent::ChannelMessage { channel: 53, .. }));
        assert!(matches!(events[1], ServerEvent::PrivateMessage { .. }));
    }

    #[test]
    fn test_game_banner_then_position_keeps_order() {
        let mut parser = Parser::logged_in(ParserConfig::default());
        let chunk = format!(
            "Creating: GuestAbcd (++++) GuestEfgh (++++) unrated blitz 2 12\n\
             {{Game 7 (GuestAbcd vs. GuestEfgh) Creating unrated blitz match.}}\n\n\
             {AFTER_E4}\n"
        );
        let events = parser.parse(&chunk);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ServerEvent::GameStarted(_)));
        assert!(matches!(events[1], ServerEvent::PositionUpdate(_)));
    }

    #[test]
    fn test_offer_lines_grouped() {
        let mut parser = Parser::logged_in(ParserConfig::default());
        let chunk = "<sc>\n<s> 8 w=visar ti=02 rt=2194 t=4 i=0 r=r tp=suicide c=? rr=0-9999 a=t f=f\n<sr> 3 4\n";
        let events = parser.parse(chunk);
        let [ServerEvent::Offers { offers }] = events.as_slice() else {
            panic!("expected a single offers event, got {events:?}");
        };
        assert_eq!(offers.len(), 3);
        assert_eq!(offers[0], Offer::SeeksCleared);
    }

    #[test]
    fn test_text_around_offers_stays_separate() {
        let mut parser = Parser::logged_in(ParserConfig::default());
        let events = parser.parse("Your seek has been posted with index 8.\n<sr> 3\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ServerEvent::unclassified("Your seek has been posted with index 8."));
        assert!(matches!(events[1], ServerEvent::Offers { .. }));
    }

    #[test]
    fn test_bad_style12_falls_back() {
        let mut parser = Parser::logged_in(ParserConfig::default());
        let events = parser.parse("<12> rnbqkbnr pppppppp");
        assert_eq!(events, vec![ServerEvent::unclassified("<12> rnbqkbnr pppppppp")]);
    }

    #[test]
    fn test_blank_chunk_yields_nothing() {
        let mut parser = Parser::logged_in(ParserConfig::default());
        assert!(parser.parse(&format!("\n{PROMPT}\n")).is_empty());
    }
}
