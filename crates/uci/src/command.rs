//! UCI command parsing and encoding.

use crate::UciError;

/// Commands sent from GUI to engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GuiCommand {
    /// Initialize UCI mode.
    Uci,
    /// Check if engine is ready.
    IsReady,
    /// The next position belongs to a different game.
    UciNewGame,
    /// Change an engine option. `value` is absent for button options.
    SetOption { name: String, value: Option<String> },
    /// Set up position.
    Position {
        fen: Option<String>,
        moves: Vec<String>,
    },
    /// Start calculating.
    Go(GoOptions),
    /// Stop calculating.
    Stop,
    /// Quit the engine.
    Quit,
    /// Unknown command (for forward compatibility).
    Unknown(String),
}

/// Options for the `go` command.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GoOptions {
    /// Search to this depth.
    pub depth: Option<u32>,
    /// Search for exactly this time in milliseconds.
    pub movetime: Option<u64>,
    /// Restrict the search to these moves. Always encoded last.
    pub searchmoves: Vec<String>,
}

impl GoOptions {
    /// Fixed-depth search with a per-move time budget.
    pub fn depth_and_movetime(depth: u32, movetime: u64) -> Self {
        Self {
            depth: Some(depth),
            movetime: Some(movetime),
            ..Self::default()
        }
    }

    /// Format the arguments following `go`.
    fn to_args(&self) -> Vec<String> {
        let mut parts = Vec::new();
        if let Some(d) = self.depth {
            parts.push(format!("depth {}", d));
        }
        if let Some(t) = self.movetime {
            parts.push(format!("movetime {}", t));
        }
        if !self.searchmoves.is_empty() {
            parts.push(format!("searchmoves {}", self.searchmoves.join(" ")));
        }
        parts
    }
}

impl GuiCommand {
    /// Parse a UCI command string.
    pub fn parse(input: &str) -> Result<Self, UciError> {
        let input = input.trim();
        let mut parts = input.split_whitespace();

        let cmd = parts.next().unwrap_or("");

        match cmd {
            "uci" => Ok(GuiCommand::Uci),
            "isready" => Ok(GuiCommand::IsReady),
            "ucinewgame" => Ok(GuiCommand::UciNewGame),
            "stop" => Ok(GuiCommand::Stop),
            "quit" => Ok(GuiCommand::Quit),
            "setoption" => Self::parse_setoption(parts),
            "position" => Self::parse_position(parts),
            "go" => Self::parse_go(parts),
            "" => Ok(GuiCommand::Unknown(String::new())),
            _ => Ok(GuiCommand::Unknown(input.to_string())),
        }
    }

    /// Format the command as a single protocol line (no trailing newline).
    pub fn to_uci(&self) -> String {
        match self {
            GuiCommand::Uci => "uci".to_string(),
            GuiCommand::IsReady => "isready".to_string(),
            GuiCommand::UciNewGame => "ucinewgame".to_string(),
            GuiCommand::SetOption { name, value } => match value {
                Some(v) => format!("setoption name {} value {}", name, v),
                None => format!("setoption name {}", name),
            },
            GuiCommand::Position { fen, moves } => {
                let mut line = match fen {
                    Some(f) => format!("position fen {}", f),
                    None => "position startpos".to_string(),
                };
                if !moves.is_empty() {
                    line.push_str(" moves ");
                    line.push_str(&moves.join(" "));
                }
                line
            }
            GuiCommand::Go(opts) => {
                let args = opts.to_args();
                if args.is_empty() {
                    "go".to_string()
                } else {
                    format!("go {}", args.join(" "))
                }
            }
            GuiCommand::Stop => "stop".to_string(),
            GuiCommand::Quit => "quit".to_string(),
            GuiCommand::Unknown(raw) => raw.clone(),
        }
    }

    fn parse_setoption<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Self, UciError> {
        let parts: Vec<&str> = parts.collect();
        if parts.first() != Some(&"name") {
            return Err(UciError::ParseError(
                "Expected 'name' after 'setoption'".to_string(),
            ));
        }

        // Option names may contain spaces ("Skill Level"), so split on the keyword.
        let rest = &parts[1..];
        let value_idx = rest.iter().position(|&s| s == "value");
        let (name_parts, value) = match value_idx {
            Some(idx) => (&rest[..idx], Some(rest[idx + 1..].join(" "))),
            None => (rest, None),
        };

        if name_parts.is_empty() {
            return Err(UciError::ParseError("Empty option name".to_string()));
        }

        Ok(GuiCommand::SetOption {
            name: name_parts.join(" "),
            value,
        })
    }

    fn parse_position<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Self, UciError> {
        let mut fen = None;
        let mut moves = Vec::new();

        match parts.next() {
            Some("startpos") => {}
            Some("fen") => {
                let mut fen_parts = Vec::new();
                for part in parts.by_ref() {
                    if part == "moves" {
                        break;
                    }
                    fen_parts.push(part);
                }
                if !fen_parts.is_empty() {
                    fen = Some(fen_parts.join(" "));
                }
            }
            Some(other) => {
                return Err(UciError::ParseError(format!(
                    "Expected 'startpos' or 'fen', got '{}'",
                    other
                )));
            }
            None => {
                return Err(UciError::ParseError(
                    "Expected 'startpos' or 'fen'".to_string(),
                ));
            }
        }

        // For startpos we still have to skip past "moves"; for fen the loop above consumed it.
        let remaining: Vec<&str> = parts.collect();
        let moves_start = remaining.iter().position(|&s| s == "moves");

        if let Some(idx) = moves_start {
            moves = remaining[idx + 1..].iter().map(|s| s.to_string()).collect();
        } else if fen.is_some() {
            moves = remaining.iter().map(|s| s.to_string()).collect();
        }

        Ok(GuiCommand::Position { fen, moves })
    }

    fn parse_go<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Self, UciError> {
        let mut opts = GoOptions::default();
        let parts: Vec<&str> = parts.collect();
        let mut i = 0;

        while i < parts.len() {
            match parts[i] {
                "movetime" => {
                    i += 1;
                    if i < parts.len() {
                        opts.movetime = parts[i].parse().ok();
                    }
                }
                "depth" => {
                    i += 1;
                    if i < parts.len() {
                        opts.depth = parts[i].parse().ok();
                    }
                }
                "searchmoves" => {
                    i += 1;
                    while i < parts.len() && !is_go_keyword(parts[i]) {
                        opts.searchmoves.push(parts[i].to_string());
                        i += 1;
                    }
                    continue;
                }
                _ => {}
            }
            i += 1;
        }

        Ok(GuiCommand::Go(opts))
    }
}

fn is_go_keyword(s: &str) -> bool {
    matches!(
        s,
        "depth" | "movetime" | "wtime" | "btime" | "winc" | "binc" | "movestogo" | "infinite"
            | "ponder" | "nodes" | "mate"
    )
}
