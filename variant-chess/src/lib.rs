pub mod attacks;
pub mod category;
pub mod chess960;
pub mod converters;
pub mod engine;
pub mod holdings;
pub mod notation;
pub mod position;
pub mod roster;
pub mod rules;

pub use category::{VariantCategory, Wild};
pub use converters::*;
pub use engine::{Destinations, GameSetup, IllegalMove, MoveEngine, MoveError, MoveResult, NormalizedMove};
pub use holdings::{Holdings, HoldingsState, PromotedSet};
pub use notation::{parse_move, CandidateMove, NotationError, SanMove};
pub use position::{CastleSide, CastlingRights, Position, PositionError, STANDARD_START_FEN};
pub use roster::{resolve_roster, resolve_rosters, CastlingRoster};
pub use rules::{CozyRules, MoveKind, RulesError, StandardRules};
