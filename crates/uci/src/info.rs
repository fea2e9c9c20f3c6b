//! UCI info line types.

use serde::{Deserialize, Serialize};

/// Score in centipawns or mate distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Score {
    /// Centipawn score (100 = 1 pawn advantage).
    Cp(i32),
    /// Mate in N moves (positive = engine winning, negative = engine losing).
    Mate(i32),
}

/// Search information from engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineInfo {
    /// Search depth in plies.
    pub depth: Option<u32>,
    /// Selective search depth.
    pub seldepth: Option<u32>,
    /// Principal variation rank, 1-based. Only present with MultiPV output.
    pub multipv: Option<u32>,
    /// Score evaluation.
    pub score: Option<Score>,
    /// Nodes searched.
    pub nodes: Option<u64>,
    /// Nodes per second.
    pub nps: Option<u64>,
    /// Time spent in milliseconds.
    pub time: Option<u64>,
    /// Principal variation (best line found).
    pub pv: Vec<String>,
    /// Current move being searched.
    pub currmove: Option<String>,
    /// Current move number.
    pub currmovenumber: Option<u32>,
    /// Hash table usage (per mille).
    pub hashfull: Option<u32>,
    /// Arbitrary string info.
    pub string: Option<String>,
}

impl EngineInfo {
    /// Create a new empty info.
    pub fn new() -> Self {
        Self::default()
    }

    /// First move of the principal variation.
    pub fn pv_head(&self) -> Option<&str> {
        self.pv.first().map(String::as_str)
    }

    /// Format as UCI info string.
    pub fn to_uci(&self) -> String {
        let mut parts = vec!["info".to_string()];

        if let Some(d) = self.depth {
            parts.push(format!("depth {}", d));
        }
        if let Some(d) = self.seldepth {
            parts.push(format!("seldepth {}", d));
        }
        if let Some(k) = self.multipv {
            parts.push(format!("multipv {}", k));
        }
        if let Some(ref s) = self.score {
            match s {
                Score::Cp(cp) => parts.push(format!("score cp {}", cp)),
                Score::Mate(m) => parts.push(format!("score mate {}", m)),
            }
        }
        if let Some(n) = self.nodes {
            parts.push(format!("nodes {}", n));
        }
        if let Some(n) = self.nps {
            parts.push(format!("nps {}", n));
        }
        if let Some(t) = self.time {
            parts.push(format!("time {}", t));
        }
        if !self.pv.is_empty() {
            parts.push(format!("pv {}", self.pv.join(" ")));
        }
        if let Some(ref m) = self.currmove {
            parts.push(format!("currmove {}", m));
        }
        if let Some(n) = self.currmovenumber {
            parts.push(format!("currmovenumber {}", n));
        }
        if let Some(h) = self.hashfull {
            parts.push(format!("hashfull {}", h));
        }
        if let Some(ref s) = self.string {
            parts.push(format!("string {}", s));
        }

        parts.join(" ")
    }

    /// Parse UCI info line.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let mut parts = line.split_whitespace();
        if parts.next() != Some("info") {
            return None;
        }

        let mut info = EngineInfo::new();
        let parts: Vec<&str> = parts.collect();
        let mut i = 0;

        while i < parts.len() {
            match parts[i] {
                "depth" => {
                    i += 1;
                    if i < parts.len() {
                        info.depth = parts[i].parse().ok();
                    }
                }
                "seldepth" => {
                    i += 1;
                    if i < parts.len() {
                        info.seldepth = parts[i].parse().ok();
                    }
                }
                "multipv" => {
                    i += 1;
                    if i < parts.len() {
                        info.multipv = parts[i].parse().ok();
                    }
                }
                "score" => {
                    i += 1;
                    if i < parts.len() {
                        match parts[i] {
                            "cp" => {
                                i += 1;
                                if i < parts.len() {
                                    if let Ok(cp) = parts[i].parse() {
                                        info.score = Some(Score::Cp(cp));
                                    }
                                }
                            }
                            "mate" => {
                                i += 1;
                                if i < parts.len() {
                                    if let Ok(m) = parts[i].parse() {
                                        info.score = Some(Score::Mate(m));
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                }
                "nodes" => {
                    i += 1;
                    if i < parts.len() {
                        info.nodes = parts[i].parse().ok();
                    }
                }
                "nps" => {
                    i += 1;
                    if i < parts.len() {
                        info.nps = parts[i].parse().ok();
                    }
                }
                "time" => {
                    i += 1;
                    if i < parts.len() {
                        info.time = parts[i].parse().ok();
                    }
                }
                "pv" => {
                    i += 1;
                    while i < parts.len() && !is_info_keyword(parts[i]) {
                        info.pv.push(parts[i].to_string());
                        i += 1;
                    }
                    continue;
                }
                "currmove" => {
                    i += 1;
                    if i < parts.len() {
                        info.currmove = Some(parts[i].to_string());
                    }
                }
                "currmovenumber" => {
                    i += 1;
                    if i < parts.len() {
                        info.currmovenumber = parts[i].parse().ok();
                    }
                }
                "hashfull" => {
                    i += 1;
                    if i < parts.len() {
                        info.hashfull = parts[i].parse().ok();
                    }
                }
                "string" => {
                    // String consumes rest of line
                    info.string = Some(parts[i + 1..].join(" "));
                    break;
                }
                _ => {}
            }
            i += 1;
        }

        Some(info)
    }
}

fn is_info_keyword(s: &str) -> bool {
    matches!(
        s,
        "depth"
            | "seldepth"
            | "multipv"
            | "score"
            | "nodes"
            | "nps"
            | "time"
            | "pv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "string"
            | "tbhits"
    )
}

/// Builder for constructing EngineInfo.
#[derive(Default)]
pub struct InfoBuilder {
    info: EngineInfo,
}

impl InfoBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(mut self, d: u32) -> Self {
        self.info.depth = Some(d);
        self
    }

    pub fn seldepth(mut self, d: u32) -> Self {
        self.info.seldepth = Some(d);
        self
    }

    pub fn multipv(mut self, k: u32) -> Self {
        self.info.multipv = Some(k);
        self
    }

    pub fn score_cp(mut self, cp: i32) -> Self {
        self.info.score = Some(Score::Cp(cp));
        self
    }

    pub fn score_mate(mut self, moves: i32) -> Self {
        self.info.score = Some(Score::Mate(moves));
        self
    }

    pub fn nodes(mut self, n: u64) -> Self {
        self.info.nodes = Some(n);
        self
    }

    pub fn time(mut self, ms: u64) -> Self {
        self.info.time = Some(ms);
        self
    }

    pub fn pv(mut self, moves: Vec<String>) -> Self {
        self.info.pv = moves;
        self
    }

    pub fn string(mut self, s: &str) -> Self {
        self.info.string = Some(s.to_string());
        self
    }

    pub fn build(self) -> EngineInfo {
        self.info
    }
}
