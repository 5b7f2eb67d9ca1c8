//! Deterministic return-to-player simulation.
//!
//! Spin `i` uses the seed triple `(seed, "simulation", i)`, so a report is fully
//! reproducible from its inputs.

use crate::config::CrashConfig;
use crate::errors::{FairPlayResult, ValidationError};
use crate::games::payout::{derive_outcome, PayoutRule};
use crate::games::seed::{SeedTriple, ServerSeed};
use crate::games::types::{GameParams, GameType, MinesOutcome};
use crate::games::{crash, mines};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const CLIENT_SEED: &str = "simulation";

/// A game plus the player strategy where one is needed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SimulatedGame {
    /// Dice, Plinko or Slots
    Instant { params: GameParams },
    /// Open `reveals` cells in grid order, then cash out
    Mines { mine_count: u8, reveals: u8 },
    /// Cash out once the curve reaches `cashout_at`
    Crash { cashout_at: Decimal },
}

impl SimulatedGame {
    pub fn game_type(&self) -> GameType {
        match self {
            SimulatedGame::Instant { params } => params.game_type(),
            SimulatedGame::Mines { .. } => GameType::Mines,
            SimulatedGame::Crash { .. } => GameType::Crash,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            SimulatedGame::Instant { params } if params.is_instant() => params.validate(),
            SimulatedGame::Instant { params } => Err(ValidationError::Other(format!(
                "{} is not an instant game",
                params.game_type()
            ))),
            SimulatedGame::Mines { mine_count, reveals } => {
                mines::validate_mine_count(mine_count)?;
                if reveals == 0 || reveals > mines::TOTAL_CELLS - mine_count {
                    return Err(ValidationError::Other(format!(
                        "Reveals must be between 1 and {} with {} mines",
                        mines::TOTAL_CELLS - mine_count,
                        mine_count
                    )));
                }
                Ok(())
            }
            SimulatedGame::Crash { cashout_at } if cashout_at > Decimal::ONE => Ok(()),
            SimulatedGame::Crash { cashout_at } => Err(ValidationError::Other(format!(
                "Crash cashout target must exceed 1.00, got {}",
                cashout_at
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimulationReport {
    pub game: SimulatedGame,
    pub spins: u64,
    /// Unit stake per spin
    pub total_staked: Decimal,
    pub total_returned: Decimal,
    pub rtp: Decimal,
    pub hits: u64,
    pub hit_rate: Decimal,
    pub max_multiplier: Decimal,
}

/// Play `spins` unit-stake rounds of `game`
pub fn simulate(
    game: &SimulatedGame,
    spins: u64,
    seed: &str,
    crash_config: &CrashConfig,
) -> FairPlayResult<SimulationReport> {
    game.validate()?;
    if spins == 0 {
        return Err(ValidationError::Other("At least one spin is required".to_string()).into());
    }

    let server_seed = ServerSeed::new(seed);
    let mut total_returned = Decimal::ZERO;
    let mut hits = 0u64;
    let mut max_multiplier = Decimal::ZERO;

    for nonce in 0..spins {
        let seeds = SeedTriple::new(server_seed.clone(), CLIENT_SEED, nonce);
        let multiplier = spin_multiplier(game, &seeds, crash_config)?;
        if multiplier > Decimal::ZERO {
            hits += 1;
        }
        max_multiplier = max_multiplier.max(multiplier);
        total_returned += multiplier;
    }

    let total_staked = Decimal::from(spins);
    tracing::debug!(
        "Simulated {} spins of {}: returned {}",
        spins,
        game.game_type(),
        total_returned
    );

    Ok(SimulationReport {
        game: *game,
        spins,
        total_staked,
        total_returned,
        rtp: (total_returned / total_staked).round_dp(4),
        hits,
        hit_rate: (Decimal::from(hits) / total_staked).round_dp(4),
        max_multiplier,
    })
}

fn spin_multiplier(game: &SimulatedGame, seeds: &SeedTriple, crash_config: &CrashConfig) -> FairPlayResult<Decimal> {
    Ok(match *game {
        SimulatedGame::Instant { params } => derive_outcome(seeds, &params)?.resolve().0,
        SimulatedGame::Mines { mine_count, reveals } => {
            let mut board = MinesOutcome::deal(seeds, mine_count)?;
            for cell in 0..reveals {
                let (row, col) = mines::cell_coords(cell);
                if matches!(board.reveal(row, col)?, mines::CellReveal::Mine { .. }) {
                    break;
                }
            }
            board.multiplier
        }
        SimulatedGame::Crash { cashout_at } => {
            if crash::crash_point(seeds, crash_config) >= cashout_at {
                cashout_at
            } else {
                Decimal::ZERO
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::{ReelCount, RiskLevel};
    use rust_decimal_macros::dec;

    fn run(game: SimulatedGame, spins: u64) -> SimulationReport {
        simulate(&game, spins, "rtp-check", &CrashConfig::default()).unwrap()
    }

    #[test]
    fn test_dice_rtp_near_97() {
        let report = run(SimulatedGame::Instant { params: GameParams::Dice { guess: 4 } }, 20_000);
        assert!(report.rtp > dec!(0.89) && report.rtp < dec!(1.05), "rtp {}", report.rtp);
        assert!(report.hit_rate > dec!(0.14) && report.hit_rate < dec!(0.19));
    }

    #[test]
    fn test_plinko_low_rtp() {
        let report = run(
            SimulatedGame::Instant {
                params: GameParams::Plinko { rows: 12, risk: RiskLevel::Low },
            },
            20_000,
        );
        assert!(report.rtp > dec!(0.93) && report.rtp < dec!(1.01), "rtp {}", report.rtp);
        assert_eq!(report.hits, 20_000);
    }

    #[test]
    fn test_mines_single_reveal() {
        // 1 safe reveal with 3 mines: p = 22/25, pays 1.14
        let report = run(SimulatedGame::Mines { mine_count: 3, reveals: 1 }, 10_000);
        assert!(report.hit_rate > dec!(0.85) && report.hit_rate < dec!(0.91));
        assert_eq!(report.max_multiplier, dec!(1.14));
    }

    #[test]
    fn test_crash_target_hit_rate() {
        // P(crash >= 2) = P(u <= 100 / 194) = 0.5155
        let report = run(SimulatedGame::Crash { cashout_at: dec!(2) }, 20_000);
        assert!(report.hit_rate > dec!(0.49) && report.hit_rate < dec!(0.54), "{}", report.hit_rate);
    }

    #[test]
    fn test_reports_are_reproducible() {
        let game = SimulatedGame::Instant {
            params: GameParams::Slots { reels: ReelCount::Three },
        };
        assert_eq!(run(game, 500), run(game, 500));
    }

    #[test]
    fn test_rejects_bad_strategies() {
        let config = CrashConfig::default();
        assert!(simulate(&SimulatedGame::Mines { mine_count: 20, reveals: 6 }, 10, "s", &config).is_err());
        assert!(simulate(&SimulatedGame::Crash { cashout_at: dec!(1) }, 10, "s", &config).is_err());
        assert!(simulate(
            &SimulatedGame::Instant { params: GameParams::Mines { mine_count: 3 } },
            10,
            "s",
            &config
        )
        .is_err());
        assert!(simulate(&SimulatedGame::Instant { params: GameParams::Dice { guess: 1 } }, 0, "s", &config).is_err());
    }
}
