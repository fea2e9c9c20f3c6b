//! UCI (Universal Chess Interface) protocol vocabulary.
//!
//! This crate provides types, parsing and encoding for both directions of
//! the UCI protocol: commands a GUI sends to an engine ([`GuiCommand`]) and
//! messages an engine sends back ([`EngineMessage`]).
//!
//! # Commands
//!
//! - `uci` - Initialize engine, get id and options
//! - `isready` / `readyok` - Synchronization
//! - `ucinewgame` - Start of a new game
//! - `setoption name <name> [value <value>]` - Configure the engine
//! - `position fen <fen> [moves <move>...]` - Set position
//! - `go [depth <d>] [movetime <ms>] [searchmoves <move>...]` - Start search
//! - `stop` - Stop search
//! - `quit` - Exit engine

mod command;
mod info;

pub use command::{GoOptions, GuiCommand};
pub use info::{EngineInfo, InfoBuilder, Score};

use std::io::{BufRead, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UciError {
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Placeholder engines print when they have no move or no ponder move.
pub const NO_MOVE: &str = "(none)";

/// Messages sent from engine to GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Engine identification.
    Id { name: Option<String>, author: Option<String> },
    /// UCI initialization complete.
    UciOk,
    /// Engine is ready.
    ReadyOk,
    /// Search information.
    Info(EngineInfo),
    /// Best move found. `ponder` is `None` when the engine offered no reply to ponder on.
    BestMove { mv: String, ponder: Option<String> },
    /// Anything else: option declarations, banners, diagnostics.
    Other(String),
}

impl EngineMessage {
    /// Parse a single line of engine output.
    ///
    /// Never fails: lines that are not part of the vocabulary come back
    /// as [`EngineMessage::Other`] so callers can still inspect them.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let mut parts = line.split_whitespace();

        match parts.next() {
            Some("uciok") if line == "uciok" => EngineMessage::UciOk,
            Some("readyok") if line == "readyok" => EngineMessage::ReadyOk,
            Some("id") => match parts.next() {
                Some("name") => EngineMessage::Id {
                    name: Some(parts.collect::<Vec<_>>().join(" ")),
                    author: None,
                },
                Some("author") => EngineMessage::Id {
                    name: None,
                    author: Some(parts.collect::<Vec<_>>().join(" ")),
                },
                _ => EngineMessage::Other(line.to_string()),
            },
            Some("info") => match EngineInfo::parse(line) {
                Some(info) => EngineMessage::Info(info),
                None => EngineMessage::Other(line.to_string()),
            },
            Some("bestmove") => {
                let rest: Vec<&str> = parts.collect();
                let mv = rest.first().copied().unwrap_or(NO_MOVE).to_string();
                // "bestmove <mv> ponder <reply>": a reply needs two tokens after the move.
                let ponder = match rest.get(1..3) {
                    Some(["ponder", reply]) if *reply != NO_MOVE => Some(reply.to_string()),
                    _ => None,
                };
                EngineMessage::BestMove { mv, ponder }
            }
            _ => EngineMessage::Other(line.to_string()),
        }
    }

    /// Format message for output.
    pub fn to_uci(&self) -> String {
        match self {
            EngineMessage::Id { name, author } => {
                let mut parts = Vec::new();
                if let Some(n) = name {
                    parts.push(format!("id name {}", n));
                }
                if let Some(a) = author {
                    parts.push(format!("id author {}", a));
                }
                parts.join("\n")
            }
            EngineMessage::UciOk => "uciok".to_string(),
            EngineMessage::ReadyOk => "readyok".to_string(),
            EngineMessage::Info(info) => info.to_uci(),
            EngineMessage::BestMove { mv, ponder } => match ponder {
                Some(p) => format!("bestmove {} ponder {}", mv, p),
                None => format!("bestmove {}", mv),
            },
            EngineMessage::Other(raw) => raw.clone(),
        }
    }
}

/// Simple UCI engine wrapper for writing engines.
pub struct UciEngine<R: BufRead, W: Write> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> UciEngine<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Read and parse the next command from GUI.
    ///
    /// Returns `Ok(None)` once the GUI closes its end of the pipe.
    pub fn read_command(&mut self) -> Result<Option<GuiCommand>, UciError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        GuiCommand::parse(&line).map(Some)
    }

    /// Send a message to the GUI.
    pub fn send(&mut self, msg: &EngineMessage) -> Result<(), UciError> {
        writeln!(self.writer, "{}", msg.to_uci())?;
        self.writer.flush()?;
        Ok(())
    }

    /// Send a raw line, e.g. a diagnostic outside the vocabulary.
    pub fn send_raw(&mut self, line: &str) -> Result<(), UciError> {
        self.send(&EngineMessage::Other(line.to_string()))
    }

    /// Send engine identification.
    pub fn send_id(&mut self, name: &str, author: &str) -> Result<(), UciError> {
        self.send(&EngineMessage::Id {
            name: Some(name.to_string()),
            author: Some(author.to_string()),
        })
    }

    /// Send uciok.
    pub fn send_uciok(&mut self) -> Result<(), UciError> {
        self.send(&EngineMessage::UciOk)
    }

    /// Send readyok.
    pub fn send_readyok(&mut self) -> Result<(), UciError> {
        self.send(&EngineMessage::ReadyOk)
    }

    /// Send best move.
    pub fn send_bestmove(&mut self, mv: &str, ponder: Option<&str>) -> Result<(), UciError> {
        self.send(&EngineMessage::BestMove {
            mv: mv.to_string(),
            ponder: ponder.map(str::to_string),
        })
    }

    /// Send search info.
    pub fn send_info(&mut self, info: EngineInfo) -> Result<(), UciError> {
        self.send(&EngineMessage::Info(info))
    }
}

/// Create a UCI engine using stdin/stdout.
pub fn stdio_engine() -> UciEngine<std::io::BufReader<std::io::Stdin>, std::io::Stdout> {
    UciEngine::new(
        std::io::BufReader::new(std::io::stdin()),
        std::io::stdout(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_readyok_is_exact() {
        assert_eq!(EngineMessage::parse("readyok\n"), EngineMessage::ReadyOk);
        assert_eq!(
            EngineMessage::parse("readyok now"),
            EngineMessage::Other("readyok now".to_string())
        );
    }

    #[test]
    fn parse_id_name_with_spaces() {
        assert_eq!(
            EngineMessage::parse("id name Stockfish 16.1"),
            EngineMessage::Id {
                name: Some("Stockfish 16.1".to_string()),
                author: None
            }
        );
    }

    #[test]
    fn parse_bestmove_with_ponder() {
        assert_eq!(
            EngineMessage::parse("bestmove e2e4 ponder e7e5"),
            EngineMessage::BestMove {
                mv: "e2e4".to_string(),
                ponder: Some("e7e5".to_string())
            }
        );
    }

    #[test]
    fn parse_bestmove_without_ponder() {
        assert_eq!(
            EngineMessage::parse("bestmove h5f7"),
            EngineMessage::BestMove {
                mv: "h5f7".to_string(),
                ponder: None
            }
        );
    }

    #[test]
    fn parse_bestmove_with_dangling_ponder_keyword() {
        assert_eq!(
            EngineMessage::parse("bestmove h5f7 ponder"),
            EngineMessage::BestMove {
                mv: "h5f7".to_string(),
                ponder: None
            }
        );
    }

    #[test]
    fn parse_bestmove_none() {
        assert_eq!(
            EngineMessage::parse("bestmove (none)"),
            EngineMessage::BestMove {
                mv: NO_MOVE.to_string(),
                ponder: None
            }
        );
    }

    #[test]
    fn unknown_lines_are_kept_verbatim() {
        assert_eq!(
            EngineMessage::parse("No such option: Skill Leveel"),
            EngineMessage::Other("No such option: Skill Leveel".to_string())
        );
    }

    #[test]
    fn engine_wrapper_reads_until_eof() {
        let input = b"uci\nisready\n" as &[u8];
        let mut out = Vec::new();
        let mut engine = UciEngine::new(input, &mut out);

        assert_eq!(engine.read_command().unwrap(), Some(GuiCommand::Uci));
        assert_eq!(engine.read_command().unwrap(), Some(GuiCommand::IsReady));
        assert_eq!(engine.read_command().unwrap(), None);

        engine.send_bestmove("e2e4", Some("e7e5")).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "bestmove e2e4 ponder e7e5\n");
    }
}
