//! Plinko: a ball falls through `rows` pegs, one stream bit per peg.
//!
//! The landing bucket is the number of right bounces. Payout tables are symmetric,
//! so each is stored as its half from the outer edge to the centre, in tenths.

use crate::errors::{FairPlayResult, ValidationError};
use crate::games::seed::SeedTriple;
use crate::games::selector;
use crate::games::types::{Direction, PlinkoOutcome, RiskLevel};
use rust_decimal::Decimal;

pub const MIN_ROWS: u8 = 12;
pub const MAX_ROWS: u8 = 16;

const STREAM_LABEL: &str = "plinko";

const LOW: [&[u32]; 5] = [
    &[100, 29, 15, 13, 11, 10, 5],
    &[81, 38, 29, 18, 11, 9, 7],
    &[71, 38, 18, 13, 12, 11, 10, 5],
    &[150, 76, 29, 19, 14, 11, 10, 7],
    &[160, 86, 19, 13, 13, 11, 11, 10, 5],
];

const MEDIUM: [&[u32]; 5] = [
    &[330, 110, 38, 19, 11, 6, 3],
    &[430, 130, 58, 29, 13, 7, 4],
    &[580, 140, 68, 39, 18, 10, 5, 2],
    &[880, 170, 110, 48, 29, 13, 5, 3],
    &[1100, 400, 97, 48, 29, 14, 10, 5, 3],
];

const HIGH: [&[u32]; 5] = [
    &[1700, 230, 79, 19, 7, 2, 2],
    &[2600, 350, 110, 38, 10, 2, 2],
    &[4200, 540, 180, 49, 18, 3, 2, 2],
    &[6200, 810, 260, 79, 29, 5, 2, 2],
    &[1700, 1330, 270, 92, 41, 21, 2, 2, 1],
];

pub fn validate_rows(rows: u8) -> Result<(), ValidationError> {
    if (MIN_ROWS..=MAX_ROWS).contains(&rows) {
        Ok(())
    } else {
        Err(ValidationError::RowCount(rows))
    }
}

fn half_table(risk: RiskLevel, rows: u8) -> &'static [u32] {
    let idx = (rows - MIN_ROWS) as usize;
    match risk {
        RiskLevel::Low => LOW[idx],
        RiskLevel::Medium => MEDIUM[idx],
        RiskLevel::High => HIGH[idx],
    }
}

/// Multiplier for landing in `bucket` (0..=rows)
pub fn multiplier(risk: RiskLevel, rows: u8, bucket: u8) -> FairPlayResult<Decimal> {
    validate_rows(rows)?;
    if bucket > rows {
        return Err(ValidationError::Other(format!(
            "Bucket {} outside 0..={} for {} rows",
            bucket, rows, rows
        ))
        .into());
    }
    let distance = bucket.min(rows - bucket) as usize;
    Ok(Decimal::new(half_table(risk, rows)[distance] as i64, 1))
}

/// Full table for `(risk, rows)`, bucket 0 first
pub fn table(risk: RiskLevel, rows: u8) -> FairPlayResult<Vec<Decimal>> {
    (0..=rows).map(|bucket| multiplier(risk, rows, bucket)).collect()
}

/// Bounce path for a seed triple
pub fn drop_ball(seeds: &SeedTriple, rows: u8) -> FairPlayResult<Vec<Direction>> {
    validate_rows(rows)?;
    let mut stream = seeds.stream(STREAM_LABEL);
    Ok(selector::directions(&mut stream, rows as usize))
}

pub fn bucket_of(path: &[Direction]) -> u8 {
    path.iter().filter(|d| **d == Direction::Right).count() as u8
}

pub fn play(seeds: &SeedTriple, rows: u8, risk: RiskLevel) -> FairPlayResult<PlinkoOutcome> {
    let path = drop_ball(seeds, rows)?;
    let bucket = bucket_of(&path);
    Ok(PlinkoOutcome {
        rows,
        risk,
        multiplier: multiplier(risk, rows, bucket)?,
        path,
        bucket,
    })
}

/// Exact return-to-player of a table under a fair binomial drop
pub fn rtp(risk: RiskLevel, rows: u8) -> FairPlayResult<Decimal> {
    let table = table(risk, rows)?;
    let mut weighted = Decimal::ZERO;
    let mut ways: u64 = 1;
    for (k, mult) in table.iter().enumerate() {
        if k > 0 {
            ways = ways * (rows as u64 - k as u64 + 1) / k as u64;
        }
        weighted += Decimal::from(ways) * *mult;
    }
    Ok(weighted / Decimal::from(1u64 << rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::seed::ServerSeed;
    use rust_decimal_macros::dec;

    const RISKS: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    #[test]
    fn test_high_sixteen_edges_and_centre() {
        assert_eq!(multiplier(RiskLevel::High, 16, 0).unwrap(), dec!(170.0));
        assert_eq!(multiplier(RiskLevel::High, 16, 16).unwrap(), dec!(170.0));
        assert_eq!(multiplier(RiskLevel::High, 16, 8).unwrap(), dec!(0.1));
    }

    #[test]
    fn test_tables_are_symmetric() {
        for risk in RISKS {
            for rows in MIN_ROWS..=MAX_ROWS {
                let t = table(risk, rows).unwrap();
                assert_eq!(t.len(), rows as usize + 1);
                let reversed: Vec<_> = t.iter().rev().cloned().collect();
                assert_eq!(t, reversed, "{} / {}", risk, rows);
            }
        }
    }

    #[test]
    fn test_every_table_returns_about_97_percent() {
        for risk in RISKS {
            for rows in MIN_ROWS..=MAX_ROWS {
                let rtp = rtp(risk, rows).unwrap();
                assert!(
                    rtp > dec!(0.95) && rtp < dec!(0.99),
                    "{} / {} rtp {}",
                    risk,
                    rows,
                    rtp
                );
            }
        }
    }

    #[test]
    fn test_row_bounds() {
        assert!(validate_rows(11).is_err());
        assert!(validate_rows(17).is_err());
        assert!(multiplier(RiskLevel::Low, 12, 13).is_err());
    }

    #[test]
    fn test_play_bucket_matches_path() {
        let seeds = SeedTriple::new(ServerSeed::new("abc123"), "def456", 4);
        let outcome = play(&seeds, 14, RiskLevel::Medium).unwrap();

        assert_eq!(outcome.path.len(), 14);
        assert_eq!(outcome.bucket, bucket_of(&outcome.path));
        assert_eq!(
            outcome.multiplier,
            multiplier(RiskLevel::Medium, 14, outcome.bucket).unwrap()
        );
        assert_eq!(play(&seeds, 14, RiskLevel::Medium).unwrap(), outcome);
    }
}
