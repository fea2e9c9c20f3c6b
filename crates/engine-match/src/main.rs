use anyhow::Context;
use clap::Parser;
use engine_match::config::{ArenaConfig, EngineConfig};
use engine_match::match_runner::{Match, MatchOutcome, Player};
use engine_match::options::EngineOptions;
use engine_match::uci_client::UciClient;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "engine-match")]
#[command(about = "Play one game between two UCI chess engines")]
struct Cli {
    /// Engine name from the config, or an executable to run directly
    first: String,
    /// Engine name from the config, or an executable to run directly
    second: String,
    /// Configuration file (defaults to arena.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Seed for first-mover choice and randomized contempt
    #[arg(short, long)]
    seed: Option<u64>,
    /// Declare a draw once more than this many moves were played
    #[arg(long)]
    max_moves: Option<usize>,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct MatchSummary {
    first: String,
    second: String,
    outcome: MatchOutcome,
    moves: Vec<String>,
    /// Options each engine accepted, keyed by player name.
    options: BTreeMap<String, BTreeMap<String, String>>,
}

fn accepted_options(options: &EngineOptions) -> BTreeMap<String, String> {
    options
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Engines missing from the config are run as executables with default settings.
fn engine_config(config: &ArenaConfig, name: &str) -> EngineConfig {
    config.get_engine(name).cloned().unwrap_or_else(|_| {
        tracing::info!("Engine '{}' not in config, running it as an executable", name);
        EngineConfig {
            executable: name.to_string(),
            ..EngineConfig::default()
        }
    })
}

fn start_player<G: Rng + ?Sized>(
    config: &ArenaConfig,
    name: &str,
    rng: &mut G,
) -> anyhow::Result<Player> {
    let engine = engine_config(config, name);
    let mut client = UciClient::spawn(engine, config.read_timeout())
        .with_context(|| format!("Failed to start engine '{}'", name))?;
    client.initialize(rng).with_context(|| {
        format!(
            "Failed to initialize engine '{}' ({})",
            name,
            client.channel().program().display()
        )
    })?;
    tracing::info!(
        "Engine '{}' is {}: depth {}, movetime {}ms",
        name,
        client.name(),
        client.config().depth,
        client.config().move_time
    );
    Ok(Player::new(name, client))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ArenaConfig::load_from(path)?,
        None => ArenaConfig::load()?,
    };
    let mut rng = match cli.seed.or(config.seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let first = start_player(&config, &cli.first, &mut rng)?;
    let second = start_player(&config, &cli.second, &mut rng)?;
    let options = [&first, &second]
        .into_iter()
        .map(|p| (p.name.clone(), accepted_options(p.client.options())))
        .collect();

    let mut game = Match::new(first, second, &mut rng)?
        .with_max_moves(cli.max_moves.unwrap_or(config.max_moves));
    let outcome = game.run()?;

    let summary = MatchSummary {
        first: game.first().to_string(),
        second: game.second().to_string(),
        outcome,
        moves: game.moves().to_vec(),
        options,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{} (white) vs {} (black)", summary.first, summary.second);
        println!("Moves: {}", summary.moves.join(" "));
        match &summary.outcome {
            MatchOutcome::Winner(name) => println!("Result: {} wins", name),
            MatchOutcome::Draw => println!("Result: draw"),
        }
        for (player, options) in &summary.options {
            let listed: Vec<String> = options.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            println!("{} options: {}", player, listed.join(", "));
        }
    }

    Ok(())
}
