//! UCI (Universal Chess Interface) client for communicating with chess engines.
//!
//! [`UciClient`] drives one engine through strict request/response steps:
//! every command that can make the engine chatter is followed by an
//! `isready`/`readyok` handshake, so by the time a method returns the client
//! and the engine agree on options and position.
//!
//! # Example
//!
//! ```no_run
//! use engine_match::config::EngineConfig;
//! use engine_match::uci_client::UciClient;
//! use std::time::Duration;
//!
//! let mut client = UciClient::spawn(EngineConfig::default(), Duration::from_secs(30))?;
//! client.initialize(&mut rand::thread_rng())?;
//! client.set_position(&["e2e4".to_string()])?;
//! let result = client.find_best_move(&[])?;
//! println!("Best move: {} (ponder {})", result.best_move, result.ponder_or_none());
//! # Ok::<(), engine_match::uci_client::UciError>(())
//! ```

use crate::channel::{ChannelError, ProcessChannel, Transport};
use crate::config::EngineConfig;
use crate::options::{baseline_options, EngineOptions, OptionValue};
use crate::rules::{ChessRules, RulesError, StandardRules, STARTING_FEN};
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uci::{EngineMessage, GoOptions, GuiCommand, NO_MOVE};

/// Substring engines print when `setoption` names an option they lack.
const UNKNOWN_OPTION_MARKER: &str = "No such option";

/// Errors that can occur when driving a UCI engine.
#[derive(Error, Debug)]
pub enum UciError {
    /// Spawning, reading or writing the engine process failed.
    #[error("Engine transport failed: {0}")]
    Channel(#[from] ChannelError),
    /// A move in a `set_position` batch is illegal. Nothing was sent.
    #[error("Illegal move {mv} at index {index}")]
    IllegalMove { index: usize, mv: String },
    /// The rules collaborator rejected a FEN.
    #[error(transparent)]
    Rules(#[from] RulesError),
    /// Randomized contempt was requested with an empty range.
    #[error("Invalid random contempt range {min}..={max}")]
    InvalidRandomRange { min: i64, max: i64 },
}

impl UciError {
    /// Whether the engine process itself failed, leaving the client unusable.
    pub fn is_transport(&self) -> bool {
        matches!(self, UciError::Channel(_))
    }
}

/// What the client has told the engine about the board: a FEN and the
/// moves played from it, in the order they were sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedPosition {
    pub fen: String,
    pub moves: Vec<String>,
}

impl TrackedPosition {
    fn from_fen(fen: &str) -> Self {
        Self {
            fen: fen.to_string(),
            moves: Vec::new(),
        }
    }
}

/// Outcome of a single `go` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// The chosen move, or `(none)` when the engine has nothing to play.
    pub best_move: String,
    /// The line the engine printed right before `bestmove`.
    pub info: String,
    /// The expected reply, if the engine offered one.
    pub ponder: Option<String>,
}

impl SearchResult {
    /// The ponder move, or `(none)`.
    pub fn ponder_or_none(&self) -> &str {
        self.ponder.as_deref().unwrap_or(NO_MOVE)
    }
}

/// Result of a `setoption` round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionStatus {
    /// No rejection was reported. This is not proof the engine uses the value.
    Applied,
    /// The engine reported the option as unknown.
    Rejected { diagnostic: String },
}

/// A client for one UCI engine.
///
/// Owns the transport (normally a [`ProcessChannel`]) and a rules
/// collaborator used to keep an authoritative board in sync with the
/// positions sent to the engine.
///
/// # Lifecycle
///
/// 1. Spawn the engine with [`UciClient::spawn`]
/// 2. Configure it with [`UciClient::initialize`]
/// 3. [`new_game`](Self::new_game), [`set_position`](Self::set_position) and
///    [`find_best_move`](Self::find_best_move) as often as needed
/// 4. Drop the client (or call [`quit`](UciClient::quit)) to stop the engine
pub struct UciClient<T = ProcessChannel, R = StandardRules>
where
    R: ChessRules,
{
    channel: T,
    rules: R,
    config: EngineConfig,
    read_timeout: Duration,
    options: EngineOptions,
    position: TrackedPosition,
    base_board: R::Position,
    board: R::Position,
    san_moves: Vec<String>,
    name: String,
}

impl UciClient<ProcessChannel, StandardRules> {
    /// Spawns the engine named by `config` without talking to it yet.
    ///
    /// # Errors
    ///
    /// Returns [`UciError::Channel`] wrapping
    /// [`ChannelError::SpawnFailure`] if the executable cannot be started.
    pub fn spawn(config: EngineConfig, read_timeout: Duration) -> Result<Self, UciError> {
        let channel = ProcessChannel::spawn(config.executable_path(), &config.args)?;
        Self::with_transport(channel, StandardRules, config, read_timeout)
    }

    /// Shuts the engine process down. Further commands fail with `ProcessExited`.
    pub fn quit(&mut self) {
        self.channel.shutdown();
    }
}

impl<T: Transport, R: ChessRules> UciClient<T, R> {
    /// Builds a client over an existing transport and rules collaborator.
    ///
    /// # Arguments
    ///
    /// * `channel` - Transport already connected to the engine
    /// * `rules` - Rules used to validate and track moves
    /// * `config` - Engine settings, including search depth and option overrides
    /// * `read_timeout` - How long to wait for any single line from the engine
    ///
    /// # Errors
    ///
    /// [`UciError::Rules`] if `rules` cannot parse the standard starting position.
    pub fn with_transport(
        channel: T,
        rules: R,
        config: EngineConfig,
        read_timeout: Duration,
    ) -> Result<Self, UciError> {
        let board = rules.parse_fen(STARTING_FEN)?;
        Ok(Self {
            channel,
            rules,
            config,
            read_timeout,
            options: EngineOptions::new(),
            position: TrackedPosition::from_fen(STARTING_FEN),
            base_board: board.clone(),
            board,
            san_moves: Vec::new(),
            name: String::new(),
        })
    }

    /// The engine's name as reported by `id name`, empty before initialization.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Options the engine accepted.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// The position last communicated to the engine.
    pub fn position(&self) -> &TrackedPosition {
        &self.position
    }

    /// FEN of the authoritative board after the tracked moves.
    pub fn fen(&self) -> String {
        self.rules.fen_of(&self.board)
    }

    /// SAN of the tracked moves, as computed when they were sent.
    pub fn san_history(&self) -> &[String] {
        &self.san_moves
    }

    pub fn channel(&self) -> &T {
        &self.channel
    }

    /// Sends `uci`, waits for `uciok`, then applies the option set.
    ///
    /// Unless pondering is enabled in the config, `Ponder` is switched off
    /// first. The baseline options are then merged with the configured
    /// overrides (overrides win) and sent one by one. With randomization on,
    /// `Contempt` and `Contempt Factor` are drawn from `rng` before the
    /// merge. Rejected options are logged and left out of
    /// [`options`](Self::options). The tracked position is reset to the
    /// starting position.
    ///
    /// # Errors
    ///
    /// [`UciError::InvalidRandomRange`] before anything is sent if
    /// randomization is on and `rand_min > rand_max`; transport errors
    /// otherwise.
    pub fn initialize<G: Rng + ?Sized>(&mut self, rng: &mut G) -> Result<(), UciError> {
        let (min, max) = (self.config.rand_min, self.config.rand_max);
        if self.config.randomize && min > max {
            return Err(UciError::InvalidRandomRange { min, max });
        }

        self.send(&GuiCommand::Uci)?;
        loop {
            let line = self.read_line()?;
            match EngineMessage::parse(&line) {
                EngineMessage::Id {
                    name: Some(name), ..
                } => self.name = name,
                EngineMessage::UciOk => break,
                _ => {}
            }
        }
        self.wait_until_ready()?;

        if !self.config.ponder {
            self.set_option("Ponder", false)?;
        }

        let mut merged = baseline_options();
        if self.config.randomize {
            for name in ["Contempt", "Contempt Factor"] {
                merged.insert(name.to_string(), OptionValue::Int(rng.gen_range(min..=max)));
            }
        }
        merged.extend(self.config.options.clone());

        for (name, value) in merged {
            self.set_option(&name, value)?;
        }

        self.reset_position(STARTING_FEN)?;
        info!(
            "Initialized engine '{}' with {} accepted options",
            self.name,
            self.options.len()
        );
        Ok(())
    }

    /// Sends `ucinewgame` and resets the tracked position to the start.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the engine cannot be reached or never
    /// answers `readyok`.
    pub fn new_game(&mut self) -> Result<(), UciError> {
        self.send(&GuiCommand::UciNewGame)?;
        self.wait_until_ready()?;
        self.reset_position(STARTING_FEN)
    }

    /// Sets one engine option and records it unless the engine rejects it.
    ///
    /// Rejection is detected by looking for "No such option" in the last
    /// line the engine printed before `readyok`. A rejection is reported
    /// through the returned [`OptionStatus`], never as an error.
    ///
    /// # Arguments
    ///
    /// * `name` - Option name as the engine lists it, e.g. `Skill Level`
    /// * `value` - Anything convertible to an [`OptionValue`]
    ///
    /// # Errors
    ///
    /// Only transport errors.
    pub fn set_option(
        &mut self,
        name: &str,
        value: impl Into<OptionValue>,
    ) -> Result<OptionStatus, UciError> {
        let value = value.into();
        self.send(&GuiCommand::SetOption {
            name: name.to_string(),
            value: Some(value.to_string()),
        })?;

        let last = self.wait_until_ready()?;
        if last.contains(UNKNOWN_OPTION_MARKER) {
            warn!("Engine '{}' was unable to set option {}: {}", self.name, name, last);
            return Ok(OptionStatus::Rejected { diagnostic: last });
        }

        debug!("Option {} = {}", name, value);
        self.options.record(name, value);
        Ok(OptionStatus::Applied)
    }

    /// Sends `position fen <fen> moves <moves...>` relative to the current base FEN.
    ///
    /// The whole batch is checked against the rules collaborator before
    /// anything is sent, so an illegal move leaves both the engine and the
    /// tracked position untouched.
    ///
    /// # Errors
    ///
    /// [`UciError::IllegalMove`] naming the first offending move and its
    /// index; transport errors from the handshake.
    pub fn set_position(&mut self, moves: &[String]) -> Result<(), UciError> {
        let mut board = self.base_board.clone();
        let mut san_moves = Vec::with_capacity(moves.len());
        for (index, mv) in moves.iter().enumerate() {
            let illegal = || UciError::IllegalMove {
                index,
                mv: mv.clone(),
            };
            if !self.rules.is_legal(&board, mv) {
                return Err(illegal());
            }
            san_moves.push(self.rules.to_san(&board, mv).map_err(|_| illegal())?);
            board = self.rules.apply_move(&board, mv).map_err(|_| illegal())?;
        }

        self.send(&GuiCommand::Position {
            fen: Some(self.position.fen.clone()),
            moves: moves.to_vec(),
        })?;
        self.position.moves = moves.to_vec();
        self.board = board;
        self.san_moves = san_moves;
        self.wait_until_ready()?;
        Ok(())
    }

    /// Plays one more move on top of the tracked position.
    ///
    /// # Errors
    ///
    /// [`UciError::IllegalMove`] if `mv` is not legal after the tracked moves.
    pub fn push_move(&mut self, mv: &str) -> Result<(), UciError> {
        let mut moves = self.position.moves.clone();
        moves.push(mv.to_string());
        self.set_position(&moves)
    }

    /// Sends `position fen <fen>` and makes `fen` the new base position.
    ///
    /// # Errors
    ///
    /// [`UciError::Rules`] if the rules collaborator cannot parse `fen`, in
    /// which case nothing is sent. Transport errors otherwise.
    pub fn set_position_from_fen(&mut self, fen: &str) -> Result<(), UciError> {
        let board = self.rules.parse_fen(fen)?;
        self.send(&GuiCommand::Position {
            fen: Some(fen.to_string()),
            moves: Vec::new(),
        })?;
        self.position = TrackedPosition::from_fen(fen);
        self.base_board = board.clone();
        self.board = board;
        self.san_moves.clear();
        self.wait_until_ready()?;
        Ok(())
    }

    /// Searches the current position and returns the engine's choice.
    ///
    /// `restrict_to` limits the search via `searchmoves`; pass an empty
    /// slice for no restriction. An engine with no legal move answers
    /// `bestmove (none)`, which is returned like any other result.
    ///
    /// # Errors
    ///
    /// Transport errors, including [`ChannelError::ProcessTimeout`] when the
    /// search outlasts the read timeout.
    pub fn find_best_move(&mut self, restrict_to: &[String]) -> Result<SearchResult, UciError> {
        self.go(restrict_to)?;

        let mut last_line = String::new();
        loop {
            let line = self.read_line()?;
            if let EngineMessage::BestMove { mv, ponder } = EngineMessage::parse(&line) {
                debug!("Engine '{}' chose {} (ponder {:?})", self.name, mv, ponder);
                return Ok(SearchResult {
                    best_move: mv,
                    info: last_line,
                    ponder,
                });
            }
            last_line = line;
        }
    }

    /// Collects the best move of each principal variation at the configured depth.
    ///
    /// For ranks 1 to the accepted MultiPV value, takes the first move of
    /// the first `info` line reporting that rank at exactly the configured
    /// depth. Lines without a `multipv` field count as rank 1. Stops early
    /// if `bestmove` arrives first, so the result can be shorter than
    /// MultiPV. Remaining search output is read up to `bestmove` before
    /// returning.
    ///
    /// # Errors
    ///
    /// Transport errors only. An engine that ignores MultiPV yields a
    /// single candidate.
    pub fn find_best_move_candidates(
        &mut self,
        restrict_to: &[String],
    ) -> Result<Vec<String>, UciError> {
        self.go(restrict_to)?;

        let ranks = self.options.multipv() as usize;
        let depth = self.config.depth;
        let mut moves: Vec<String> = Vec::with_capacity(ranks);

        while moves.len() < ranks {
            let line = self.read_line()?;
            match EngineMessage::parse(&line) {
                EngineMessage::Info(info) => {
                    let rank = info.multipv.unwrap_or(1) as usize;
                    if rank == moves.len() + 1 && info.depth == Some(depth) {
                        if let Some(mv) = info.pv_head() {
                            moves.push(mv.to_string());
                        }
                    }
                }
                EngineMessage::BestMove { .. } => return Ok(moves),
                _ => {}
            }
        }

        loop {
            let line = self.read_line()?;
            if let EngineMessage::BestMove { .. } = EngineMessage::parse(&line) {
                return Ok(moves);
            }
        }
    }

    /// Sends `isready` and discards output until `readyok`.
    ///
    /// Returns the last line discarded, which is where engines put
    /// diagnostics such as "No such option". Empty if `readyok` came first.
    ///
    /// # Errors
    ///
    /// [`ChannelError::ProcessTimeout`] if `readyok` does not arrive in time,
    /// [`ChannelError::ProcessExited`] if the engine is gone.
    pub fn wait_until_ready(&mut self) -> Result<String, UciError> {
        self.send(&GuiCommand::IsReady)?;
        let mut last_line = String::new();
        loop {
            let line = self.read_line()?;
            if let EngineMessage::ReadyOk = EngineMessage::parse(&line) {
                return Ok(last_line);
            }
            last_line = line;
        }
    }

    fn go(&mut self, restrict_to: &[String]) -> Result<(), UciError> {
        let mut opts = GoOptions::depth_and_movetime(self.config.depth, self.config.move_time);
        opts.searchmoves = restrict_to.to_vec();
        self.send(&GuiCommand::Go(opts))
    }

    fn reset_position(&mut self, fen: &str) -> Result<(), UciError> {
        let board = self.rules.parse_fen(fen)?;
        self.position = TrackedPosition::from_fen(fen);
        self.base_board = board.clone();
        self.board = board;
        self.san_moves.clear();
        Ok(())
    }

    fn send(&mut self, cmd: &GuiCommand) -> Result<(), UciError> {
        self.channel.send(&cmd.to_uci())?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, UciError> {
        Ok(self.channel.read_line(self.read_timeout)?)
    }
}
