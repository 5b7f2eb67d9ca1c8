//! Mines: a 5x5 grid with `mine_count` hidden mines.
//!
//! Mine layout is the first `mine_count` cells of a Fisher–Yates shuffle of all 25
//! cells. The multiplier after `k` safe reveals is
//! `prod_{i<k} (25 - i) / (25 - mine_count - i)`, shown at two decimals.

use crate::errors::{FairPlayError, FairPlayResult, ValidationError};
use crate::games::seed::SeedTriple;
use crate::games::selector;
use crate::games::types::{round_multiplier, MinesOutcome};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const GRID_SIZE: u8 = 5;
pub const TOTAL_CELLS: u8 = GRID_SIZE * GRID_SIZE;
pub const MIN_MINES: u8 = 3;
pub const MAX_MINES: u8 = 20;

const STREAM_LABEL: &str = "mines";

pub fn validate_mine_count(mine_count: u8) -> Result<(), ValidationError> {
    if (MIN_MINES..=MAX_MINES).contains(&mine_count) {
        Ok(())
    } else {
        Err(ValidationError::MineCount(mine_count))
    }
}

/// Cell index for `(row, col)`
pub fn cell_index(row: u8, col: u8) -> Result<u8, ValidationError> {
    if row >= GRID_SIZE || col >= GRID_SIZE {
        return Err(ValidationError::CellOutOfGrid { row, col });
    }
    Ok(row * GRID_SIZE + col)
}

pub fn cell_coords(index: u8) -> (u8, u8) {
    (index / GRID_SIZE, index % GRID_SIZE)
}

/// Mine cell indices for a seed triple, in shuffle order
pub fn generate_mines(seeds: &SeedTriple, mine_count: u8) -> FairPlayResult<Vec<u8>> {
    validate_mine_count(mine_count)?;
    let mut stream = seeds.stream(STREAM_LABEL);
    Ok(selector::select_subset(&mut stream, TOTAL_CELLS as usize, mine_count as usize)
        .into_iter()
        .map(|i| i as u8)
        .collect())
}

/// Multiplier after `opened` safe reveals. Callers validate `mine_count`.
pub fn multiplier(mine_count: u8, opened: usize) -> Decimal {
    let total = TOTAL_CELLS as u128;
    let mines = mine_count as u128;
    let opened = (opened as u128).min(total - mines);

    let mut numerator: u128 = 1;
    let mut denominator: u128 = 1;
    for i in 0..opened {
        numerator *= total - i;
        denominator *= total - mines - i;
    }
    // reduced terms are bounded by C(25, k) and fit in u64
    let g = gcd(numerator, denominator);
    let numerator = (numerator / g) as u64;
    let denominator = (denominator / g) as u64;

    round_multiplier(Decimal::from(numerator) / Decimal::from(denominator))
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Result of opening one cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum CellReveal {
    Safe {
        cell: u8,
        multiplier: Decimal,
        safe_remaining: u8,
    },
    Mine {
        cell: u8,
    },
}

impl MinesOutcome {
    /// Fresh board for a seed triple
    pub fn deal(seeds: &SeedTriple, mine_count: u8) -> FairPlayResult<Self> {
        let mines = generate_mines(seeds, mine_count)?;
        Ok(Self {
            mine_count,
            mines,
            opened: Vec::new(),
            hit_mine: None,
            multiplier: Decimal::ONE,
        })
    }

    pub fn is_busted(&self) -> bool {
        self.hit_mine.is_some()
    }

    pub fn safe_remaining(&self) -> u8 {
        TOTAL_CELLS - self.mine_count - self.opened.len() as u8
    }

    /// Open the cell at `(row, col)`
    pub fn reveal(&mut self, row: u8, col: u8) -> FairPlayResult<CellReveal> {
        if self.is_busted() {
            return Err(FairPlayError::illegal_state("Mine already hit; board is closed"));
        }
        let cell = cell_index(row, col)?;
        if self.opened.contains(&cell) {
            return Err(ValidationError::CellAlreadyOpened { row, col }.into());
        }

        if self.mines.contains(&cell) {
            self.hit_mine = Some(cell);
            self.multiplier = Decimal::ZERO;
            return Ok(CellReveal::Mine { cell });
        }

        self.opened.push(cell);
        self.multiplier = multiplier(self.mine_count, self.opened.len());
        Ok(CellReveal::Safe {
            cell,
            multiplier: self.multiplier,
            safe_remaining: self.safe_remaining(),
        })
    }
}
