//! Deterministic UCI engine for integration tests.
//!
//! Plays the lexicographically first legal move, or a mate in one when it
//! sees one. Knows a fixed set of options and complains about any other,
//! the way Stockfish does.

use clap::Parser;
use engine_match::rules::{ChessRules, StandardRules, STARTING_FEN};
use shakmaty::{CastlingMode, Chess, Position};
use uci::{stdio_engine, GoOptions, GuiCommand, InfoBuilder, UciError};

const KNOWN_OPTIONS: [(&str, &str); 12] = [
    ("Ponder", "type check default false"),
    ("Write Debug Log", "type check default false"),
    ("Contempt", "type spin default 0 min -100 max 100"),
    ("Min Split Depth", "type spin default 0 min 0 max 12"),
    ("Threads", "type spin default 1 min 1 max 512"),
    ("Hash", "type spin default 16 min 1 max 33554432"),
    ("MultiPV", "type spin default 1 min 1 max 500"),
    ("Skill Level", "type spin default 20 min 0 max 20"),
    ("Move Overhead", "type spin default 30 min 0 max 5000"),
    ("Minimum Thinking Time", "type spin default 20 min 0 max 5000"),
    ("Slow Mover", "type spin default 80 min 10 max 1000"),
    ("UCI_Chess960", "type check default false"),
];

/// Mock UCI engine
#[derive(Parser)]
#[command(name = "mock-engine")]
struct Args {
    /// Never answer `isready`
    #[arg(long)]
    hang_on_ready: bool,

    /// Exit as soon as a search is requested
    #[arg(long)]
    exit_on_go: bool,
}

fn uci_of(m: &shakmaty::Move) -> String {
    m.to_uci(CastlingMode::Standard).to_string()
}

/// Legal moves in `pos`, sorted, optionally restricted to `only`.
fn candidates(pos: &Chess, only: &[String]) -> Vec<String> {
    let mut moves: Vec<String> = pos
        .legal_moves()
        .iter()
        .map(uci_of)
        .filter(|m| only.is_empty() || only.contains(m))
        .collect();
    moves.sort();
    moves
}

fn position_after(pos: &Chess, mv: &str) -> Option<Chess> {
    StandardRules.apply_move(pos, mv).ok()
}

fn search(
    engine: &mut uci::UciEngine<std::io::BufReader<std::io::Stdin>, std::io::Stdout>,
    pos: &Chess,
    opts: &GoOptions,
    multipv: u32,
) -> Result<(), UciError> {
    let moves = candidates(pos, &opts.searchmoves);
    if moves.is_empty() {
        let score = if pos.is_checkmate() {
            InfoBuilder::new().depth(0).score_mate(0)
        } else {
            InfoBuilder::new().depth(0).score_cp(0)
        };
        engine.send_info(score.build())?;
        return engine.send_bestmove(uci::NO_MOVE, None);
    }

    let depth = opts.depth.unwrap_or(1).max(1);
    let ranks = (multipv as usize).min(moves.len());
    for d in 1..=depth {
        for (k, mv) in moves.iter().take(ranks).enumerate() {
            let info = InfoBuilder::new()
                .depth(d)
                .multipv(k as u32 + 1)
                .score_cp(0)
                .nodes(u64::from(d) * 20)
                .pv(vec![mv.clone()])
                .build();
            engine.send_info(info)?;
        }
    }

    let mating = moves.iter().find(|mv| {
        position_after(pos, mv)
            .map(|next| next.is_checkmate())
            .unwrap_or(false)
    });
    if let Some(mv) = mating {
        let info = InfoBuilder::new()
            .depth(depth)
            .score_mate(1)
            .pv(vec![mv.clone()])
            .build();
        engine.send_info(info)?;
        return engine.send_bestmove(mv, None);
    }

    let best = &moves[0];
    let ponder =
        position_after(pos, best).and_then(|next| candidates(&next, &[]).into_iter().next());
    engine.send_bestmove(best, ponder.as_deref())
}

fn main() -> Result<(), UciError> {
    let args = Args::parse();
    let mut engine = stdio_engine();
    let mut position = Chess::default();
    let mut multipv = 1u32;

    loop {
        let cmd = match engine.read_command() {
            Ok(Some(cmd)) => cmd,
            Ok(None) => break,
            Err(UciError::IoError(e)) => return Err(e.into()),
            Err(e) => {
                eprintln!("Error reading command: {}", e);
                continue;
            }
        };

        match cmd {
            GuiCommand::Uci => {
                engine.send_id("MockEngine 1.0", "engine-match")?;
                for (name, spec) in KNOWN_OPTIONS {
                    engine.send_raw(&format!("option name {} {}", name, spec))?;
                }
                engine.send_uciok()?;
            }

            GuiCommand::IsReady => {
                if !args.hang_on_ready {
                    engine.send_readyok()?;
                }
            }

            GuiCommand::SetOption { name, value } => {
                if !KNOWN_OPTIONS.iter().any(|(known, _)| *known == name) {
                    engine.send_raw(&format!("No such option: {}", name))?;
                } else if name == "MultiPV" {
                    multipv = value.and_then(|v| v.parse().ok()).unwrap_or(1);
                }
            }

            GuiCommand::UciNewGame => position = Chess::default(),

            GuiCommand::Position { fen, moves } => {
                let fen = fen.unwrap_or_else(|| STARTING_FEN.to_string());
                position = match StandardRules.parse_fen(&fen) {
                    Ok(pos) => pos,
                    Err(e) => {
                        engine.send_raw(&format!("info string {}", e))?;
                        Chess::default()
                    }
                };
                for mv in moves {
                    match position_after(&position, &mv) {
                        Some(next) => position = next,
                        None => {
                            engine.send_raw(&format!("info string illegal move {}", mv))?;
                            break;
                        }
                    }
                }
            }

            GuiCommand::Go(opts) => {
                if args.exit_on_go {
                    break;
                }
                search(&mut engine, &position, &opts, multipv)?;
            }

            GuiCommand::Quit => break,

            GuiCommand::Stop | GuiCommand::Unknown(_) => {}
        }
    }

    Ok(())
}
