//! Client-side FICS protocol: timeseal framing, the style12 position
//! record, and the stateful parser that turns server output into events.

pub mod codec;
pub mod config;
pub mod events;
pub mod parser;
pub mod wire;

pub use codec::{CodecError, Relation, Style12};
pub use config::ParserConfig;
pub use events::{GameEnd, GameStart, LoginResult, Offer, Reason, Score, ServerEvent};
pub use parser::{LoginState, Parser, PROMPT};
pub use wire::{encode, encode_ack, InboundDecoder};
