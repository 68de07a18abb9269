//! ficsctl - developer tool for the FICS client core.
//!
//! Drives the protocol and variant libraries from the command line:
//! replays captured server output through the message parser, frames
//! commands for the wire, and runs the move engine on a position. Output is
//! JSON on stdout; logs go to stderr (see [`config`] for the filter).

use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use serde_json::{json, Value};

use fics_protocol::wire::{self, InboundDecoder};
use fics_protocol::{Parser, ParserConfig};
use variant_chess::chess960;
use variant_chess::{
    format_colored_piece, format_piece_upper, format_square, parse_move, GameSetup, Holdings, HoldingsState,
    MoveEngine, MoveResult, Position, STANDARD_START_FEN,
};

mod config;

#[derive(ClapParser)]
#[command(name = "ficsctl", about = "Inspect FICS protocol traffic and variant move handling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse captured server output and print one JSON event per line.
    Parse {
        /// Transcript file; reads stdin when omitted.
        input: Option<PathBuf>,
        /// Treat the transcript as starting after login.
        #[arg(long)]
        logged_in: bool,
        /// Feed the transcript in chunks separated by this marker.
        #[arg(long)]
        split: Option<String>,
        /// Login name (overrides `FICS_USERNAME`).
        #[arg(long)]
        username: Option<String>,
        /// Password (overrides `FICS_PASSWORD`).
        #[arg(long)]
        password: Option<String>,
    },
    /// Print the timeseal frame for a command as hex.
    Frame {
        /// Command text; ignored with `--ack`.
        #[arg(default_value = "")]
        command: String,
        /// Timestamp to salt with; defaults to the current clock.
        #[arg(long)]
        timestamp: Option<u32>,
        /// Frame the acknowledgement reply instead of a command.
        #[arg(long)]
        ack: bool,
    },
    /// Print a Chess960 starting position.
    Chess960 {
        /// Scharnagl index (0-959); random when omitted.
        idn: Option<u32>,
    },
    /// Resolve a move and print the resulting position.
    Resolve {
        /// Move in coordinate, SAN, verbose or drop notation.
        #[arg(value_name = "MOVE")]
        mv: String,
        #[command(flatten)]
        game: GameArgs,
        /// Validate as a premove for the side not to move.
        #[arg(long)]
        premove: bool,
        /// White's pieces in hand, as letters ("PPN").
        #[arg(long, default_value = "")]
        white_holdings: String,
        /// Black's pieces in hand.
        #[arg(long, default_value = "")]
        black_holdings: String,
    },
    /// List legal destination squares for the side to move.
    Destinations {
        #[command(flatten)]
        game: GameArgs,
    },
}

#[derive(clap::Args)]
struct GameArgs {
    /// Current position; the starting position when omitted.
    #[arg(long)]
    fen: Option<String>,
    /// Game category as the server names it.
    #[arg(long, default_value = "blitz")]
    category: String,
    /// Starting position of the game, used to resolve castling rooks.
    #[arg(long, default_value = STANDARD_START_FEN)]
    start: String,
}

impl GameArgs {
    fn setup(&self) -> Result<(GameSetup, Position)> {
        let start = Position::from_fen(&self.start).context("invalid --start FEN")?;
        let position = match &self.fen {
            Some(fen) => Position::from_fen(fen).context("invalid --fen")?,
            None => start.clone(),
        };
        let setup = GameSetup::from_fics(&self.category, start)?;
        Ok((setup, position))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(config::get_log_filter()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Parse {
            input,
            logged_in,
            split,
            username,
            password,
        } => {
            let parser_config = ParserConfig::new(
                username.unwrap_or_else(config::get_username),
                password.or_else(config::get_password),
            );
            parse_transcript(input, parser_config, logged_in, split.as_deref())
        }
        Commands::Frame { command, timestamp, ack } => {
            let timestamp = timestamp.unwrap_or_else(wire::timestamp_now);
            let frame = if ack {
                wire::encode_ack(timestamp)
            } else {
                wire::encode(&command, timestamp)
            };
            let hex: Vec<String> = frame.iter().map(|b| format!("{b:02x}")).collect();
            println!("{}", hex.join(" "));
            Ok(())
        }
        Commands::Chess960 { idn } => {
            println!("{}", chess960::generate(idn).to_fen());
            Ok(())
        }
        Commands::Resolve {
            mv,
            game,
            premove,
            white_holdings,
            black_holdings,
        } => {
            let (setup, position) = game.setup()?;
            let candidate = parse_move(&mv)?;
            let holdings = setup.category.has_drops().then(|| {
                let mut state = HoldingsState::default();
                state.apply_server_counts(
                    Holdings::from_letters(&white_holdings),
                    Holdings::from_letters(&black_holdings),
                );
                state
            });

            let result = MoveEngine::new().resolve_move(&position, &candidate, &setup, holdings.as_ref(), premove);
            match result {
                Ok(result) => print_json(&move_json(&result)),
                Err(e) if e.is_desync() => {
                    tracing::warn!("Engine desynchronized: {}", e);
                    bail!("position out of sync: {e}")
                }
                Err(e) => Err(e).with_context(|| format!("cannot play {mv}")),
            }
        }
        Commands::Destinations { game } => {
            let (setup, position) = game.setup()?;
            let destinations = MoveEngine::new().legal_destinations(&position, &setup)?;
            let listing: BTreeMap<String, Vec<String>> = destinations
                .into_iter()
                .map(|(from, targets)| {
                    let mut targets: Vec<String> = targets.into_iter().map(format_square).collect();
                    targets.sort();
                    (format_square(from), targets)
                })
                .collect();
            print_json(&json!(listing))
        }
    }
}

fn parse_transcript(input: Option<PathBuf>, config: ParserConfig, logged_in: bool, split: Option<&str>) -> Result<()> {
    let bytes = match &input {
        Some(path) => std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .context("failed to read stdin")?;
            bytes
        }
    };

    let inbound = InboundDecoder::new().decode(&bytes);
    if inbound.acks > 0 {
        tracing::info!("Transcript contained {} acknowledgement request(s)", inbound.acks);
    }

    let mut parser = if logged_in {
        Parser::logged_in(config)
    } else {
        Parser::new(config)
    };
    let chunks: Vec<&str> = match split {
        Some(marker) => inbound.text.split(marker).collect(),
        None => vec![inbound.text.as_str()],
    };

    for chunk in chunks {
        for event in parser.parse(chunk) {
            println!("{}", serde_json::to_string(&event)?);
        }
        for reply in parser.take_replies() {
            tracing::info!("Login reply owed: {:?}", reply);
        }
    }
    tracing::debug!("Parser finished in state {:?}", parser.state());
    Ok(())
}

fn move_json(result: &MoveResult) -> Value {
    let mv = &result.mv;
    json!({
        "fen": result.position.to_fen(),
        "san": mv.san,
        "coordinate": mv.coordinate(),
        "piece": format_piece_upper(mv.piece).to_string(),
        "from": mv.from.map(format_square),
        "to": format_square(mv.to),
        "kind": mv.kind,
        "captured": mv.captured.map(|p| format_piece_upper(p).to_string()),
        "holdings": result.holdings.map(|h| json!({ "white": h.white, "black": h.black })),
        "partner_gain": result
            .partner_gain
            .map(|(piece, color)| format_colored_piece(piece, color).to_string()),
    })
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
