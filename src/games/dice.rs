//! Dice: guess one face of a six-sided die.

use crate::errors::{FairPlayResult, ValidationError};
use crate::games::seed::SeedTriple;
use crate::games::selector;
use crate::games::types::DiceOutcome;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const FACES: u8 = 6;

/// Six times 0.97: fair odds less a 3% edge
pub const WIN_MULTIPLIER: Decimal = dec!(5.82);

const STREAM_LABEL: &str = "dice";

pub fn validate_guess(guess: u8) -> Result<(), ValidationError> {
    if (1..=FACES).contains(&guess) {
        Ok(())
    } else {
        Err(ValidationError::DiceFace(guess))
    }
}

/// Face in 1..=6 for a seed triple
pub fn roll(seeds: &SeedTriple) -> u8 {
    let mut stream = seeds.stream(STREAM_LABEL);
    selector::uniform_below(&mut stream, FACES as u32) as u8 + 1
}

pub fn multiplier(won: bool) -> Decimal {
    if won {
        WIN_MULTIPLIER
    } else {
        Decimal::ZERO
    }
}

pub fn play(seeds: &SeedTriple, guess: u8) -> FairPlayResult<DiceOutcome> {
    validate_guess(guess)?;
    let roll = roll(seeds);
    let won = roll == guess;
    Ok(DiceOutcome {
        guess,
        roll,
        won,
        multiplier: multiplier(won),
    })
}
