//! FairPlay CLI
//!
//! Verify revealed games, simulate return-to-player and run crash rounds locally.

use clap::{Parser, Subcommand};
use fairplay::{
    config::{generate_sample_config, ConfigLoader},
    games::{GameOutcome, GameParams, GameType, ReelCount, RiskLevel, ServerSeed},
    simulate, FairPlayConfig, FairPlayError, FairPlayResult, InMemoryWallet, RoundEvent, RoundRunner,
    SimulatedGame, ValidationError, Verifier,
};
use rust_decimal::Decimal;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fairplay")]
#[command(about = "Provably fair game outcome engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompute a finished game from its revealed seeds
    Verify {
        #[arg(long)]
        server_seed: String,

        /// Published SHA-256 of the server seed
        #[arg(long)]
        commitment: String,

        #[arg(long)]
        client_seed: String,

        #[arg(long)]
        nonce: u64,

        /// Claimed outcome as JSON, or @path to read it from a file
        #[arg(long)]
        outcome: String,

        /// Parameters published before play, as JSON (not used for crash rounds)
        #[arg(long)]
        params: Option<String>,
    },

    /// Estimate return-to-player over many unit-stake games
    Simulate {
        #[arg(short, long)]
        game: GameType,

        #[arg(short, long, default_value = "100000")]
        spins: u64,

        #[arg(long, default_value = "fairplay-simulation")]
        seed: String,

        /// Mines: number of mines
        #[arg(long, default_value = "3")]
        mines: u8,

        /// Mines: cells opened before cashing out
        #[arg(long, default_value = "1")]
        reveals: u8,

        /// Plinko: peg rows
        #[arg(long, default_value = "16")]
        rows: u8,

        /// Plinko: risk tier
        #[arg(long, default_value = "medium")]
        risk: RiskLevel,

        /// Dice: guessed face
        #[arg(long, default_value = "6")]
        guess: u8,

        /// Slots: 3 or 5 reels
        #[arg(long, default_value = "3")]
        reels: u8,

        /// Crash: cashout target
        #[arg(long, default_value = "2")]
        cashout_at: Decimal,
    },

    /// Run crash rounds against an in-memory wallet and print their events
    Crash {
        #[arg(short, long, default_value = "3")]
        rounds: u64,

        /// Also print every tick
        #[arg(long)]
        ticks: bool,
    },

    /// Write a sample configuration file
    Config {
        #[arg(short, long, default_value = "fairplay.toml")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "fairplay=debug" } else { "fairplay=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .init();

    if let Commands::Config { output } = &cli.command {
        generate_sample_config(output)?;
        println!("Wrote sample configuration to {}", output);
        return Ok(());
    }

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_path(path);
    }
    let config = loader.load()?;

    match cli.command {
        Commands::Verify {
            server_seed,
            commitment,
            client_seed,
            nonce,
            outcome,
            params,
        } => run_verify(
            &config,
            server_seed,
            &commitment,
            &client_seed,
            nonce,
            &outcome,
            params.as_deref(),
        )?,
        Commands::Simulate {
            game,
            spins,
            seed,
            mines,
            reveals,
            rows,
            risk,
            guess,
            reels,
            cashout_at,
        } => {
            let game = match game {
                GameType::Mines => SimulatedGame::Mines {
                    mine_count: mines,
                    reveals,
                },
                GameType::Plinko => SimulatedGame::Instant {
                    params: GameParams::Plinko { rows, risk },
                },
                GameType::Dice => SimulatedGame::Instant {
                    params: GameParams::Dice { guess },
                },
                GameType::Slots => SimulatedGame::Instant {
                    params: GameParams::Slots {
                        reels: ReelCount::try_from(reels)?,
                    },
                },
                GameType::Crash => SimulatedGame::Crash { cashout_at },
            };
            let report = simulate(&game, spins, &seed, &config.crash)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Crash { rounds, ticks } => run_crash(config, rounds, ticks).await?,
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn run_verify(
    config: &FairPlayConfig,
    server_seed: String,
    commitment: &str,
    client_seed: &str,
    nonce: u64,
    outcome: &str,
    params: Option<&str>,
) -> FairPlayResult<()> {
    let claimed: GameOutcome = serde_json::from_str(&read_json_arg(outcome)?)
        .map_err(|e| ValidationError::Other(format!("Outcome is not valid JSON: {}", e)))?;
    let params: Option<GameParams> = params
        .map(|p| -> FairPlayResult<GameParams> {
            serde_json::from_str(&read_json_arg(p)?)
                .map_err(|e| ValidationError::Other(format!("Params are not valid JSON: {}", e)).into())
        })
        .transpose()?;

    let verifier = Verifier::new(config.crash.clone());
    verifier.verify_strict(
        &ServerSeed::new(server_seed),
        commitment,
        client_seed,
        nonce,
        params.as_ref(),
        &claimed,
    )?;
    println!("✅ {} outcome verified (nonce {})", claimed.game_type(), nonce);
    Ok(())
}

fn read_json_arg(arg: &str) -> FairPlayResult<String> {
    match arg.strip_prefix('@') {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => Ok(arg.to_string()),
    }
}

async fn run_crash(config: FairPlayConfig, rounds: u64, ticks: bool) -> FairPlayResult<()> {
    let verifier = Verifier::new(config.crash.clone());
    let runner = RoundRunner::new(config, Arc::new(InMemoryWallet::new()));
    let crashed = follow_rounds(runner, &verifier, rounds, ticks).await?;
    tracing::info!("{} of {} rounds crashed and verified", crashed, rounds);
    Ok(())
}

/// Print runner events until `rounds` rounds crash or the runner exits
async fn follow_rounds(
    runner: Arc<RoundRunner>,
    verifier: &Verifier,
    rounds: u64,
    ticks: bool,
) -> FairPlayResult<u64> {
    let mut events = runner.subscribe();
    let mut worker = {
        let runner = runner.clone();
        tokio::spawn(async move { runner.run(Some(rounds)).await })
    };

    let mut crashed = 0;
    let mut worker_done = false;
    while crashed < rounds {
        let event = tokio::select! {
            biased;
            event = events.recv() => event,
            joined = &mut worker => {
                joined.map_err(worker_failed)?;
                worker_done = true;
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping round runner");
                runner.stop();
                break;
            }
        };
        match event {
            Ok(event) => crashed += print_event(verifier, event, ticks)?,
            Err(RecvError::Lagged(skipped)) => tracing::warn!("Skipped {} round events", skipped),
            Err(RecvError::Closed) => break,
        }
    }

    if !worker_done {
        worker.await.map_err(worker_failed)?;
    }
    // events published while the worker wound down
    while let Ok(event) = events.try_recv() {
        crashed += print_event(verifier, event, ticks)?;
    }
    Ok(crashed)
}

/// Returns 1 for a verified crash
fn print_event(verifier: &Verifier, event: RoundEvent, ticks: bool) -> FairPlayResult<u64> {
    if matches!(event, RoundEvent::Tick { .. }) && !ticks {
        return Ok(0);
    }
    let crashed = match &event {
        RoundEvent::Crashed { reveal, .. } => {
            verifier.verify_round(reveal)?;
            1
        }
        _ => 0,
    };
    println!("{}", serde_json::to_string(&event)?);
    Ok(crashed)
}

fn worker_failed(e: tokio::task::JoinError) -> FairPlayError {
    FairPlayError::illegal_state(format!("Round runner task failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert()
    }

    #[tokio::test]
    async fn follow_rounds_returns_when_runner_exits_early() {
        let config = fairplay::config::ConfigBuilder::new()
            .crash(fairplay::config::CrashConfig {
                waiting_duration_ms: 60_000,
                ..Default::default()
            })
            .build();
        let verifier = Verifier::new(config.crash.clone());
        let runner = RoundRunner::new(config, Arc::new(InMemoryWallet::new()));
        runner.stop();

        let crashed = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            follow_rounds(runner, &verifier, 3, false),
        )
        .await
        .expect("follower exits with the runner")
        .unwrap();
        assert_eq!(crashed, 0);
    }
}
