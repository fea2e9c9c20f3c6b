//! Chess rules collaborator.
//!
//! The protocol client never decides legality itself. It asks a
//! [`ChessRules`] implementation to parse FENs, check and apply moves in
//! long algebraic notation, and render SAN for logs. [`StandardRules`]
//! delegates all of it to `shakmaty`.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::Uci;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Position};
use thiserror::Error;

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Rejections reported by the rules collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    #[error("invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },
    #[error("illegal move {0}")]
    IllegalMove(String),
}

/// Legality, notation and board mutation for long-algebraic moves.
pub trait ChessRules {
    /// Board state. Cloned freely, so keep it cheap.
    type Position: Clone;

    fn parse_fen(&self, fen: &str) -> Result<Self::Position, RulesError>;

    fn is_legal(&self, pos: &Self::Position, mv: &str) -> bool;

    fn to_san(&self, pos: &Self::Position, mv: &str) -> Result<String, RulesError>;

    fn apply_move(&self, pos: &Self::Position, mv: &str) -> Result<Self::Position, RulesError>;

    fn fen_of(&self, pos: &Self::Position) -> String;
}

/// Standard chess backed by `shakmaty`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

impl StandardRules {
    fn resolve(pos: &Chess, mv: &str) -> Result<Move, RulesError> {
        let uci: Uci = mv
            .parse()
            .map_err(|_| RulesError::IllegalMove(mv.to_string()))?;
        uci.to_move(pos)
            .map_err(|_| RulesError::IllegalMove(mv.to_string()))
    }
}

impl ChessRules for StandardRules {
    type Position = Chess;

    fn parse_fen(&self, fen: &str) -> Result<Chess, RulesError> {
        let invalid = |reason: String| RulesError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };
        let setup = Fen::from_ascii(fen.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        setup
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(e.to_string()))
    }

    fn is_legal(&self, pos: &Chess, mv: &str) -> bool {
        Self::resolve(pos, mv).is_ok()
    }

    fn to_san(&self, pos: &Chess, mv: &str) -> Result<String, RulesError> {
        let m = Self::resolve(pos, mv)?;
        Ok(San::from_move(pos, &m).to_string())
    }

    fn apply_move(&self, pos: &Chess, mv: &str) -> Result<Chess, RulesError> {
        let m = Self::resolve(pos, mv)?;
        let mut next = pos.clone();
        next.play_unchecked(&m);
        Ok(next)
    }

    fn fen_of(&self, pos: &Chess) -> String {
        Fen::from_position(pos.clone(), EnPassantMode::Legal).to_string()
    }
}
