//! In-memory stand-ins for the engine process and the rules library.

use crate::channel::{ChannelError, Transport};
use crate::rules::{ChessRules, RulesError};
use std::collections::VecDeque;
use std::time::Duration;
use uci::GuiCommand;

/// Search output used when a test did not queue one.
pub(crate) const DEFAULT_GO_REPLY: [&str; 2] = [
    "info depth 1 score cp 0 nodes 20 pv e2e4 e7e5",
    "bestmove e2e4 ponder e7e5",
];

/// A fake engine that answers commands the way a compliant UCI engine
/// would, from canned replies.
pub(crate) struct ScriptedTransport {
    /// Every line the client wrote, in order.
    pub sent: Vec<String>,
    pending: VecDeque<String>,
    go_replies: VecDeque<Vec<String>>,
    rejected_options: Vec<String>,
    answer_ready: bool,
}

impl ScriptedTransport {
    pub fn compliant() -> Self {
        Self {
            sent: Vec::new(),
            pending: VecDeque::new(),
            go_replies: VecDeque::new(),
            rejected_options: Vec::new(),
            answer_ready: true,
        }
    }

    /// Answer `setoption` for `name` with a "No such option" diagnostic.
    pub fn rejecting(mut self, name: &str) -> Self {
        self.rejected_options.push(name.to_string());
        self
    }

    /// Never answer `isready`.
    pub fn silent_on_ready(mut self) -> Self {
        self.answer_ready = false;
        self
    }

    /// Queue the output of the next `go`.
    pub fn on_go(mut self, lines: &[&str]) -> Self {
        self.queue_go(lines);
        self
    }

    pub fn queue_go(&mut self, lines: &[&str]) {
        self.go_replies
            .push_back(lines.iter().map(|l| l.to_string()).collect());
    }

    /// Sent lines starting with `prefix`.
    pub fn sent_starting_with(&self, prefix: &str) -> Vec<&str> {
        self.sent
            .iter()
            .filter(|l| l.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    fn reply(&mut self, line: &str) {
        let replies: Vec<String> = match GuiCommand::parse(line) {
            Ok(GuiCommand::Uci) => vec![
                "id name Scripted 1.0".to_string(),
                "option name Hash type spin default 16 min 1 max 33554432".to_string(),
                "uciok".to_string(),
            ],
            Ok(GuiCommand::IsReady) if self.answer_ready => vec!["readyok".to_string()],
            Ok(GuiCommand::SetOption { name, .. }) if self.rejected_options.contains(&name) => {
                vec![format!("No such option: {}", name)]
            }
            Ok(GuiCommand::Go(_)) => self
                .go_replies
                .pop_front()
                .unwrap_or_else(|| DEFAULT_GO_REPLY.iter().map(|l| l.to_string()).collect()),
            _ => Vec::new(),
        };
        self.pending.extend(replies);
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, line: &str) -> Result<(), ChannelError> {
        self.sent.push(line.to_string());
        self.reply(line);
        Ok(())
    }

    fn read_line(&mut self, timeout: Duration) -> Result<String, ChannelError> {
        self.pending
            .pop_front()
            .ok_or(ChannelError::ProcessTimeout(timeout))
    }
}

/// Board for [`FakeRules`]: the FEN it started from plus the moves played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeBoard {
    pub fen: String,
    pub moves: Vec<String>,
}

/// Accepts any well-formed move except the ones it was told to refuse.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeRules {
    illegal: Vec<String>,
}

impl FakeRules {
    pub fn refusing(moves: &[&str]) -> Self {
        Self {
            illegal: moves.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl ChessRules for FakeRules {
    type Position = FakeBoard;

    fn parse_fen(&self, fen: &str) -> Result<FakeBoard, RulesError> {
        if fen.split_whitespace().count() != 6 {
            return Err(RulesError::InvalidFen {
                fen: fen.to_string(),
                reason: "expected 6 fields".to_string(),
            });
        }
        Ok(FakeBoard {
            fen: fen.to_string(),
            moves: Vec::new(),
        })
    }

    fn is_legal(&self, _pos: &FakeBoard, mv: &str) -> bool {
        (mv.len() == 4 || mv.len() == 5) && !self.illegal.iter().any(|m| m == mv)
    }

    fn to_san(&self, pos: &FakeBoard, mv: &str) -> Result<String, RulesError> {
        if !self.is_legal(pos, mv) {
            return Err(RulesError::IllegalMove(mv.to_string()));
        }
        Ok(mv[2..4].to_string())
    }

    fn apply_move(&self, pos: &FakeBoard, mv: &str) -> Result<FakeBoard, RulesError> {
        if !self.is_legal(pos, mv) {
            return Err(RulesError::IllegalMove(mv.to_string()));
        }
        let mut next = pos.clone();
        next.moves.push(mv.to_string());
        Ok(next)
    }

    fn fen_of(&self, pos: &FakeBoard) -> String {
        if pos.moves.is_empty() {
            pos.fen.clone()
        } else {
            format!("{} +{}", pos.fen, pos.moves.join(","))
        }
    }
}
