//! Crash point derivation and the live multiplier curve.
//!
//! The first 8 stream bytes give `x`, read as `u = (x + 1) / 2^64` in `(0, 1]`.
//! The crash point is `(100 / (100 - house_edge)) / u`, floored at 1.00, capped at the
//! configured maximum and truncated to two decimals.

use crate::config::CrashConfig;
use crate::games::seed::{ByteSource, SeedTriple};
use crate::games::types::{truncate_multiplier, CrashOutcome};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;

const STREAM_LABEL: &str = "crash";

fn two_pow_64() -> Decimal {
    Decimal::from(u64::MAX) + Decimal::ONE
}

/// Crash point for a raw 64-bit draw
pub fn crash_point_for_draw(x: u64, house_edge_percent: Decimal, max_crash_point: Decimal) -> Decimal {
    let scale = dec!(100) / (dec!(100) - house_edge_percent);
    let inverse_u = two_pow_64() / (Decimal::from(x) + Decimal::ONE);
    let point = (scale * inverse_u).max(Decimal::ONE).min(max_crash_point);
    truncate_multiplier(point)
}

pub fn crash_point(seeds: &SeedTriple, config: &CrashConfig) -> Decimal {
    let x = seeds.stream(STREAM_LABEL).next_u64();
    crash_point_for_draw(x, config.house_edge_percent, config.max_crash_point)
}

pub fn outcome(seeds: &SeedTriple, config: &CrashConfig) -> CrashOutcome {
    CrashOutcome {
        crash_point: crash_point(seeds, config),
    }
}

/// Live multiplier after `elapsed` of activity, never above the crash point
pub fn multiplier_at(elapsed: Duration, crash_point: Decimal, growth_rate_per_sec: Decimal) -> Decimal {
    let secs = Decimal::from(elapsed.as_millis() as u64) / dec!(1000);
    let live = Decimal::ONE + growth_rate_per_sec * secs;
    truncate_multiplier(live.min(crash_point))
}

/// Activity time after which the curve reaches `crash_point`
pub fn time_to_crash(crash_point: Decimal, growth_rate_per_sec: Decimal) -> Duration {
    if growth_rate_per_sec <= Decimal::ZERO || crash_point <= Decimal::ONE {
        return Duration::ZERO;
    }
    let millis = ((crash_point - Decimal::ONE) / growth_rate_per_sec * dec!(1000)).ceil();
    Duration::from_millis(millis.to_u64().unwrap_or(u64::MAX))
}
