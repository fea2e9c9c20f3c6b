//! Match execution between two UCI chess engines.
//!
//! A [`Match`] owns two [`UciClient`]s and alternates their turns. Each
//! turn the active engine receives the whole move history and is asked for
//! its best move. The game ends when an engine stops offering a ponder
//! move: the last `info` line then decides between a mate and a draw.

use crate::channel::{ProcessChannel, Transport};
use crate::rules::{ChessRules, StandardRules};
use crate::uci_client::{UciClient, UciError};
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

/// A match is drawn once more than this many moves have been played.
pub const MAX_MOVES: usize = 200;

/// Errors that end a match run.
#[derive(Error, Debug)]
pub enum MatchError {
    /// An engine failed, or answered with a move the rules reject.
    #[error("Engine '{player}' failed: {source}")]
    Uci {
        player: String,
        #[source]
        source: UciError,
    },
}

/// Final result of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Name of the winning player.
    Winner(String),
    Draw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchStatus {
    InProgress,
    Finished(MatchOutcome),
}

/// An engine taking part in a match, under the name results refer to.
pub struct Player<T = ProcessChannel, R = StandardRules>
where
    R: ChessRules,
{
    pub name: String,
    pub client: UciClient<T, R>,
}

impl<T, R: ChessRules> Player<T, R> {
    pub fn new(name: impl Into<String>, client: UciClient<T, R>) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }
}

/// Two engines, a move history and the state of the game between them.
///
/// # Example
///
/// ```no_run
/// use engine_match::config::EngineConfig;
/// use engine_match::match_runner::{Match, Player};
/// use engine_match::uci_client::UciClient;
/// use std::time::Duration;
///
/// let mut rng = rand::thread_rng();
/// let mut a = UciClient::spawn(EngineConfig::default(), Duration::from_secs(30))?;
/// let mut b = UciClient::spawn(EngineConfig::default(), Duration::from_secs(30))?;
/// a.initialize(&mut rng)?;
/// b.initialize(&mut rng)?;
///
/// let mut game = Match::new(Player::new("a", a), Player::new("b", b), &mut rng)?;
/// println!("{:?}", game.run()?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Match<T = ProcessChannel, R = StandardRules>
where
    R: ChessRules,
{
    /// `players[0]` moves first.
    players: [Player<T, R>; 2],
    moves: Vec<String>,
    status: MatchStatus,
    max_moves: usize,
}

impl<T: Transport, R: ChessRules> Match<T, R> {
    /// Starts a match, choosing the first mover uniformly at random.
    ///
    /// Both clients receive `ucinewgame`. They should already be initialized.
    pub fn new<G: Rng + ?Sized>(
        a: Player<T, R>,
        b: Player<T, R>,
        rng: &mut G,
    ) -> Result<Self, MatchError> {
        let mut players = if rng.gen::<bool>() { [b, a] } else { [a, b] };
        for player in players.iter_mut() {
            player
                .client
                .new_game()
                .map_err(|e| Self::player_error(player, e))?;
        }
        info!(
            "New match: {} (first) vs {} (second)",
            players[0].name, players[1].name
        );

        Ok(Self {
            players,
            moves: Vec::new(),
            status: MatchStatus::InProgress,
            max_moves: MAX_MOVES,
        })
    }

    /// Overrides the move ceiling.
    pub fn with_max_moves(mut self, max_moves: usize) -> Self {
        self.max_moves = max_moves;
        self
    }

    /// Plays one move, returning whether the game continues.
    ///
    /// Does nothing once the match is finished.
    pub fn step(&mut self) -> Result<bool, MatchError> {
        if self.status != MatchStatus::InProgress {
            return Ok(false);
        }
        if self.moves.len() > self.max_moves {
            info!("Move limit of {} exceeded, declaring a draw", self.max_moves);
            self.status = MatchStatus::Finished(MatchOutcome::Draw);
            return Ok(false);
        }

        let active = self.moves.len() % 2;
        let player = &mut self.players[active];
        let result = player
            .client
            .set_position(&self.moves)
            .and_then(|_| player.client.find_best_move(&[]))
            .map_err(|e| Self::player_error(player, e))?;

        info!(
            "{}. {} plays {}",
            self.moves.len() / 2 + 1,
            player.name,
            result.best_move
        );
        self.moves.push(result.best_move);

        if result.ponder.is_some() {
            return Ok(true);
        }

        let outcome = match mate_distance(&result.info) {
            Some(distance) if distance > 0 => {
                MatchOutcome::Winner(self.players[active].name.clone())
            }
            Some(_) => MatchOutcome::Winner(self.players[1 - active].name.clone()),
            None => MatchOutcome::Draw,
        };
        info!("Match finished: {:?} after {} moves", outcome, self.moves.len());
        self.status = MatchStatus::Finished(outcome);
        Ok(false)
    }

    /// Steps until the game ends and returns the outcome.
    pub fn run(&mut self) -> Result<MatchOutcome, MatchError> {
        loop {
            if self.step()? {
                continue;
            }
            if let MatchStatus::Finished(outcome) = &self.status {
                return Ok(outcome.clone());
            }
        }
    }

    /// Moves played so far, in long algebraic notation.
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    pub fn status(&self) -> &MatchStatus {
        &self.status
    }

    /// Name of the player that moved first.
    pub fn first(&self) -> &str {
        &self.players[0].name
    }

    pub fn second(&self) -> &str {
        &self.players[1].name
    }

    fn player_error(player: &Player<T, R>, source: UciError) -> MatchError {
        MatchError::Uci {
            player: player.name.clone(),
            source,
        }
    }
}

/// Signed mate distance from an `info` line, if it reports one.
///
/// Looks for the `mate` token and parses the token after it. `mate 0`
/// means the side to move is already mated.
pub fn mate_distance(info: &str) -> Option<i32> {
    let mut tokens = info.split_whitespace();
    tokens.find(|t| *t == "mate")?;
    tokens.next()?.parse().ok()
}
