//! Slots: three or five reels of uniformly drawn symbols.
//!
//! Three reels pay only on three of a kind. Five reels check five of a kind first and
//! fall back to "first three identical" only when that fails; a spin never pays twice.

use crate::games::seed::SeedTriple;
use crate::games::selector;
use crate::games::types::{ReelCount, SlotSymbol, SlotWin, SlotsOutcome};
use rust_decimal::Decimal;

const STREAM_LABEL: &str = "slots";

/// Three-reel three-of-a-kind payout
pub fn three_of_a_kind(symbol: SlotSymbol) -> Decimal {
    Decimal::from(match symbol {
        SlotSymbol::Cherry => 10,
        SlotSymbol::Lemon => 15,
        SlotSymbol::Orange => 25,
        SlotSymbol::Star => 35,
        SlotSymbol::Bell => 50,
        SlotSymbol::Seven => 75,
    })
}

/// Five-reel five-of-a-kind payout
pub fn five_of_a_kind(symbol: SlotSymbol) -> Decimal {
    Decimal::from(match symbol {
        SlotSymbol::Cherry => 5,
        SlotSymbol::Lemon => 10,
        SlotSymbol::Orange => 15,
        SlotSymbol::Star => 50,
        SlotSymbol::Bell => 25,
        SlotSymbol::Seven => 100,
    })
}

/// Five-reel payout when only the first three reels match. Lesser symbols pay nothing.
pub fn first_three(symbol: SlotSymbol) -> Option<Decimal> {
    match symbol {
        SlotSymbol::Seven => Some(Decimal::from(20)),
        SlotSymbol::Star => Some(Decimal::from(10)),
        SlotSymbol::Bell => Some(Decimal::from(5)),
        _ => None,
    }
}

pub fn spin(seeds: &SeedTriple, reels: ReelCount) -> Vec<SlotSymbol> {
    let mut stream = seeds.stream(STREAM_LABEL);
    (0..reels.count())
        .map(|_| SlotSymbol::ALL[selector::uniform_below(&mut stream, SlotSymbol::ALL.len() as u32) as usize])
        .collect()
}

fn all_same(reels: &[SlotSymbol]) -> Option<SlotSymbol> {
    let first = *reels.first()?;
    reels.iter().all(|s| *s == first).then_some(first)
}

/// Winning rule and multiplier for a set of reels
pub fn evaluate(reels: &[SlotSymbol]) -> (Option<SlotWin>, Decimal) {
    match reels.len() {
        3 => match all_same(reels) {
            Some(symbol) => (Some(SlotWin::ThreeOfAKind(symbol)), three_of_a_kind(symbol)),
            None => (None, Decimal::ZERO),
        },
        5 => {
            if let Some(symbol) = all_same(reels) {
                return (Some(SlotWin::FiveOfAKind(symbol)), five_of_a_kind(symbol));
            }
            match all_same(&reels[..3]).and_then(|s| first_three(s).map(|m| (s, m))) {
                Some((symbol, mult)) => (Some(SlotWin::FirstThree(symbol)), mult),
                None => (None, Decimal::ZERO),
            }
        }
        _ => (None, Decimal::ZERO),
    }
}

pub fn play(seeds: &SeedTriple, reels: ReelCount) -> SlotsOutcome {
    let symbols = spin(seeds, reels);
    let (win, multiplier) = evaluate(&symbols);
    SlotsOutcome {
        reels: symbols,
        win,
        multiplier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::seed::ServerSeed;
    use rust_decimal_macros::dec;
    use SlotSymbol::*;

    #[test]
    fn test_three_reel_table() {
        assert_eq!(evaluate(&[Seven, Seven, Seven]), (Some(SlotWin::ThreeOfAKind(Seven)), dec!(75)));
        assert_eq!(evaluate(&[Cherry, Cherry, Cherry]).1, dec!(10));
        assert_eq!(evaluate(&[Cherry, Cherry, Lemon]), (None, dec!(0)));
    }

    #[test]
    fn test_three_reel_rtp() {
        let total: Decimal = SlotSymbol::ALL.iter().map(|s| three_of_a_kind(*s)).sum();
        assert_eq!(total, dec!(210));
    }

    #[test]
    fn test_five_of_a_kind_takes_priority() {
        assert_eq!(
            evaluate(&[Seven, Seven, Seven, Seven, Seven]),
            (Some(SlotWin::FiveOfAKind(Seven)), dec!(100))
        );
        assert_eq!(
            evaluate(&[Seven, Seven, Seven, Bell, Star]),
            (Some(SlotWin::FirstThree(Seven)), dec!(20))
        );
    }

    #[test]
    fn test_first_three_excludes_low_symbols() {
        assert_eq!(evaluate(&[Cherry, Cherry, Cherry, Star, Bell]), (None, dec!(0)));
        assert_eq!(evaluate(&[Orange, Orange, Orange, Seven, Seven]), (None, dec!(0)));
        assert_eq!(evaluate(&[Bell, Bell, Bell, Cherry, Lemon]).1, dec!(5));
        assert_eq!(evaluate(&[Star, Seven, Star, Star, Star]), (None, dec!(0)));
    }

    #[test]
    fn test_spin_is_deterministic() {
        let seeds = SeedTriple::new(ServerSeed::new("abc123"), "def456", 9);
        let a = play(&seeds, ReelCount::Five);
        assert_eq!(a.reels.len(), 5);
        assert_eq!(play(&seeds, ReelCount::Five), a);
        assert_eq!(play(&seeds, ReelCount::Three).reels.len(), 3);
    }
}
