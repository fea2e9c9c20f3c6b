//! Engine Match - drive UCI chess engines and play them against each other.
//!
//! This crate provides a synchronous UCI client that keeps an engine and a
//! locally tracked board in lock-step, and a match orchestrator that
//! alternates two such clients until one wins or the game is drawn.
//!
//! # Modules
//!
//! - [`channel`] - Child process transport with timed line reads
//! - [`uci_client`] - UCI protocol client for communicating with chess engines
//! - [`match_runner`] - Game execution between two engines
//! - [`rules`] - Chess rules collaborator used to validate positions
//! - [`options`] - Engine option values and the baseline option set
//! - [`config`] - TOML configuration for engines and matches

pub mod channel;
pub mod config;
pub mod match_runner;
pub mod options;
pub mod rules;
pub mod uci_client;

#[cfg(test)]
mod testing;
