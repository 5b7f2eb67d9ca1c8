//! Unbiased selection driven by a [`ByteSource`].
//!
//! Integers in `[0, bound)` come from big-endian u32 draws with rejection sampling:
//! draws at or above the largest multiple of `bound` below 2^32 are discarded and
//! redrawn, so every residue is equally likely.

use crate::games::seed::ByteSource;
use crate::games::types::Direction;

const RANGE: u64 = 1 << 32;

/// Uniform integer in `[0, bound)`. `bound` must be non-zero.
pub fn uniform_below<S: ByteSource + ?Sized>(source: &mut S, bound: u32) -> u32 {
    debug_assert!(bound > 0, "bound must be positive");
    if bound <= 1 {
        return 0;
    }
    let bound = bound as u64;
    let limit = RANGE - (RANGE % bound);
    loop {
        let draw = source.next_u32() as u64;
        if draw < limit {
            return (draw % bound) as u32;
        }
    }
}

/// In-place Fisher–Yates shuffle, top index down to 1
pub fn shuffle<T, S: ByteSource + ?Sized>(source: &mut S, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = uniform_below(source, (i + 1) as u32) as usize;
        items.swap(i, j);
    }
}

/// First `subset_size` entries of a shuffled `0..population_size`
pub fn select_subset<S: ByteSource + ?Sized>(
    source: &mut S,
    population_size: usize,
    subset_size: usize,
) -> Vec<usize> {
    let mut population: Vec<usize> = (0..population_size).collect();
    shuffle(source, &mut population);
    population.truncate(subset_size.min(population_size));
    population
}

/// Independent left/right choices, most significant bit of each byte first
pub fn directions<S: ByteSource + ?Sized>(source: &mut S, count: usize) -> Vec<Direction> {
    let mut out = Vec::with_capacity(count);
    let mut byte = 0u8;
    for i in 0..count {
        if i % 8 == 0 {
            byte = source.next_byte();
        }
        let bit = byte & (0x80 >> (i % 8));
        out.push(if bit == 0 { Direction::Left } else { Direction::Right });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::seed::{SeedTriple, ServerSeed};
    use std::collections::{HashSet, VecDeque};

    /// Replays a fixed byte script
    struct Script(VecDeque<u8>);

    impl Script {
        fn new(bytes: &[u8]) -> Self {
            Self(bytes.iter().copied().collect())
        }
    }

    impl ByteSource for Script {
        fn next_byte(&mut self) -> u8 {
            self.0.pop_front().expect("script exhausted")
        }
    }

    #[test]
    fn test_rejection_redraws_biased_values() {
        // bound 3: limit = 2^32 - (2^32 % 3) = 0xFFFF_FFFF, so 0xFFFF_FFFF is rejected
        let mut script = Script::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x05]);
        assert_eq!(uniform_below(&mut script, 3), 2);
        assert!(script.0.is_empty());
    }

    #[test]
    fn test_power_of_two_bound_never_rejects() {
        let mut script = Script::new(&[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(uniform_below(&mut script, 16), 15);
    }

    #[test]
    fn test_bound_one_consumes_nothing() {
        let mut script = Script::new(&[]);
        assert_eq!(uniform_below(&mut script, 1), 0);
    }

    #[test]
    fn test_subset_is_distinct_and_in_range() {
        let seeds = SeedTriple::new(ServerSeed::new("server"), "client", 3);
        let subset = select_subset(&mut seeds.stream("mines"), 25, 20);

        assert_eq!(subset.len(), 20);
        assert!(subset.iter().all(|&i| i < 25));
        assert_eq!(subset.iter().collect::<HashSet<_>>().len(), 20);
    }

    #[test]
    fn test_shuffle_is_deterministic_permutation() {
        let seeds = SeedTriple::new(ServerSeed::new("server"), "client", 3);
        let mut a: Vec<u32> = (0..52).collect();
        let mut b = a.clone();
        shuffle(&mut seeds.stream("deck"), &mut a);
        shuffle(&mut seeds.stream("deck"), &mut b);

        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..52).collect::<Vec<_>>());
    }

    #[test]
    fn test_directions_read_msb_first() {
        let mut script = Script::new(&[0b1010_0000, 0b1000_0000]);
        let path = directions(&mut script, 9);
        assert_eq!(path[0], Direction::Right);
        assert_eq!(path[1], Direction::Left);
        assert_eq!(path[2], Direction::Right);
        assert!(path[3..8].iter().all(|d| *d == Direction::Left));
        assert_eq!(path[8], Direction::Right);
    }
}
