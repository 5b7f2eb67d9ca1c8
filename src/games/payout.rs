//! Outcome derivation and payout resolution across all game variants.

use crate::config::CrashConfig;
use crate::errors::FairPlayResult;
use crate::games::seed::SeedTriple;
use crate::games::types::{
    payout_amount, CrashOutcome, DiceOutcome, GameOutcome, GameParams, MinesOutcome, PlinkoOutcome,
    SlotsOutcome,
};
use crate::games::{dice, mines, plinko, slots};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maps revealed state to a multiplier and a human-readable description
pub trait PayoutRule {
    fn resolve(&self) -> (Decimal, String);
}

impl PayoutRule for MinesOutcome {
    fn resolve(&self) -> (Decimal, String) {
        match self.hit_mine {
            Some(cell) => {
                let (row, col) = mines::cell_coords(cell);
                (Decimal::ZERO, format!("Hit a mine at ({}, {})", row, col))
            }
            None => (
                self.multiplier,
                format!(
                    "{} safe cells with {} mines: {}x",
                    self.opened.len(),
                    self.mine_count,
                    self.multiplier
                ),
            ),
        }
    }
}

impl PayoutRule for PlinkoOutcome {
    fn resolve(&self) -> (Decimal, String) {
        (
            self.multiplier,
            format!(
                "Bucket {} of {} ({} risk): {}x",
                self.bucket, self.rows, self.risk, self.multiplier
            ),
        )
    }
}

impl PayoutRule for DiceOutcome {
    fn resolve(&self) -> (Decimal, String) {
        let verdict = if self.won { "win" } else { "loss" };
        (
            self.multiplier,
            format!("Guessed {}, rolled {}: {}", self.guess, self.roll, verdict),
        )
    }
}

impl PayoutRule for SlotsOutcome {
    fn resolve(&self) -> (Decimal, String) {
        let reels: Vec<String> = self.reels.iter().map(|s| s.to_string()).collect();
        let description = match &self.win {
            Some(win) => format!("{} | {}: {}x", reels.join(" "), win, self.multiplier),
            None => format!("{} | no win", reels.join(" ")),
        };
        (self.multiplier, description)
    }
}

impl PayoutRule for CrashOutcome {
    fn resolve(&self) -> (Decimal, String) {
        (self.crash_point, format!("Crashed at {}x", self.crash_point))
    }
}

impl PayoutRule for GameOutcome {
    fn resolve(&self) -> (Decimal, String) {
        match self {
            GameOutcome::Mines(o) => o.resolve(),
            GameOutcome::Plinko(o) => o.resolve(),
            GameOutcome::Dice(o) => o.resolve(),
            GameOutcome::Slots(o) => o.resolve(),
            GameOutcome::Crash(o) => o.resolve(),
        }
    }
}

/// Money side of a finalized game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub stake: Decimal,
    pub multiplier: Decimal,
    pub payout: Decimal,
    pub description: String,
}

impl Settlement {
    pub fn net(&self) -> Decimal {
        self.payout - self.stake
    }

    pub fn is_win(&self) -> bool {
        self.payout > Decimal::ZERO
    }
}

pub fn settle(stake: Decimal, outcome: &GameOutcome) -> Settlement {
    let (multiplier, description) = outcome.resolve();
    Settlement {
        stake,
        multiplier,
        payout: payout_amount(stake, multiplier),
        description,
    }
}

/// Initial outcome for a seed triple. Mines boards start with nothing opened.
pub fn derive_outcome(seeds: &SeedTriple, params: &GameParams) -> FairPlayResult<GameOutcome> {
    params.validate()?;
    Ok(match *params {
        GameParams::Mines { mine_count } => GameOutcome::Mines(MinesOutcome::deal(seeds, mine_count)?),
        GameParams::Plinko { rows, risk } => GameOutcome::Plinko(plinko::play(seeds, rows, risk)?),
        GameParams::Dice { guess } => GameOutcome::Dice(dice::play(seeds, guess)?),
        GameParams::Slots { reels } => GameOutcome::Slots(slots::play(seeds, reels)),
    })
}

pub fn derive_crash(seeds: &SeedTriple, config: &CrashConfig) -> GameOutcome {
    GameOutcome::Crash(crate::games::crash::outcome(seeds, config))
}
