//! Independent re-computation of finished games from their revealed seeds.
//!
//! Checking happens in a fixed order: the commitment first, then every outcome field
//! in declaration order. `verify_strict` reports the first field that diverges.

use crate::config::CrashConfig;
use crate::errors::{FairPlayError, FairPlayResult};
use crate::games::payout::Settlement;
use crate::games::round::RoundReveal;
use crate::games::seed::{hash_seed, SeedCommitment, SeedTriple, ServerSeed};
use crate::games::types::{CrashOutcome, GameOutcome, GameParams, MinesOutcome, ReelCount};
use crate::games::{crash, dice, mines, plinko, slots};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use uuid::Uuid;

/// Pre-play disclosure: everything a player may see before the outcome exists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameInfo {
    pub game_id: Uuid,
    pub player: String,
    pub params: GameParams,
    #[serde(flatten)]
    pub seeds: SeedCommitment,
    pub created_at: DateTime<Utc>,
}

/// Post-play disclosure for a finalized game
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationReport {
    pub game_id: Uuid,
    pub params: GameParams,
    pub server_seed: ServerSeed,
    pub server_seed_hash: String,
    /// SHA-256 of the revealed seed, computed now
    pub recomputed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
    pub outcome: GameOutcome,
    pub settlement: Settlement,
    pub valid: bool,
}

/// Recomputes outcomes from revealed seeds
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    crash: CrashConfig,
}

impl Verifier {
    /// Crash outcomes depend on the house edge and cap in effect when they were made
    pub fn new(crash: CrashConfig) -> Self {
        Self { crash }
    }

    pub fn verify(
        &self,
        server_seed: &ServerSeed,
        commitment: &str,
        client_seed: &str,
        nonce: u64,
        params: Option<&GameParams>,
        claimed: &GameOutcome,
    ) -> bool {
        self.verify_strict(server_seed, commitment, client_seed, nonce, params, claimed)
            .is_ok()
    }

    /// `params` are the parameters published before play; Crash outcomes take none.
    /// The first diverging field is reported as a `VerificationMismatch`.
    pub fn verify_strict(
        &self,
        server_seed: &ServerSeed,
        commitment: &str,
        client_seed: &str,
        nonce: u64,
        params: Option<&GameParams>,
        claimed: &GameOutcome,
    ) -> FairPlayResult<()> {
        let result = self.check(server_seed, commitment, client_seed, nonce, params, claimed);
        if let Err(ref e) = result {
            tracing::warn!(
                game = %claimed.game_type(),
                nonce,
                commitment = %short(commitment),
                "Verification failed: {}",
                e
            );
        }
        result
    }

    fn check(
        &self,
        server_seed: &ServerSeed,
        commitment: &str,
        client_seed: &str,
        nonce: u64,
        params: Option<&GameParams>,
        claimed: &GameOutcome,
    ) -> FairPlayResult<()> {
        field("server_seed_hash", &hash_seed(server_seed.as_str()), &commitment.to_string())?;
        check_params(params, claimed)?;

        let seeds = SeedTriple::new(server_seed.clone(), client_seed, nonce);
        match claimed {
            GameOutcome::Mines(claimed) => check_mines(&seeds, claimed),
            GameOutcome::Crash(claimed) => {
                let expected = crash::outcome(&seeds, &self.crash);
                field("crash_point", &expected.crash_point, &claimed.crash_point)
            }
            GameOutcome::Plinko(claimed) => {
                let expected = plinko::play(&seeds, claimed.rows, claimed.risk)?;
                field("path", &expected.path, &claimed.path)?;
                field("bucket", &expected.bucket, &claimed.bucket)?;
                field("multiplier", &expected.multiplier, &claimed.multiplier)
            }
            GameOutcome::Dice(claimed) => {
                let expected = dice::play(&seeds, claimed.guess)?;
                field("roll", &expected.roll, &claimed.roll)?;
                field("won", &expected.won, &claimed.won)?;
                field("multiplier", &expected.multiplier, &claimed.multiplier)
            }
            GameOutcome::Slots(claimed) => {
                let reels = ReelCount::try_from(claimed.reels.len() as u8)
                    .map_err(|_| FairPlayError::mismatch("reels", "3 or 5 reels", claimed.reels.len()))?;
                let expected = slots::play(&seeds, reels);
                field("reels", &expected.reels, &claimed.reels)?;
                field("win", &expected.win, &claimed.win)?;
                field("multiplier", &expected.multiplier, &claimed.multiplier)
            }
        }
    }

    /// Check a crashed round's revealed data
    pub fn verify_round(&self, reveal: &RoundReveal) -> FairPlayResult<()> {
        self.verify_strict(
            &reveal.server_seed,
            &reveal.server_seed_hash,
            &reveal.client_seed,
            reveal.nonce,
            None,
            &GameOutcome::Crash(CrashOutcome {
                crash_point: reveal.crash_point,
            }),
        )
    }
}

/// Player inputs echoed in the outcome must be the ones committed before play
fn check_params(params: Option<&GameParams>, claimed: &GameOutcome) -> FairPlayResult<()> {
    match (params.copied(), claimed) {
        (None, GameOutcome::Crash(_)) => Ok(()),
        (None, other) => Err(FairPlayError::mismatch(
            "params",
            format!("committed {} parameters", other.game_type()),
            "none",
        )),
        (Some(GameParams::Mines { mine_count }), GameOutcome::Mines(c)) => {
            field("mine_count", &mine_count, &c.mine_count)
        }
        (Some(GameParams::Plinko { rows, risk }), GameOutcome::Plinko(c)) => {
            field("rows", &rows, &c.rows)?;
            field("risk", &risk, &c.risk)
        }
        (Some(GameParams::Dice { guess }), GameOutcome::Dice(c)) => field("guess", &guess, &c.guess),
        (Some(GameParams::Slots { reels }), GameOutcome::Slots(c)) => {
            field("reel_count", &reels.count(), &c.reels.len())
        }
        (Some(p), other) => Err(FairPlayError::mismatch("game", p.game_type(), other.game_type())),
    }
}

/// Replays the claimed reveal order against the recomputed board
fn check_mines(seeds: &SeedTriple, claimed: &MinesOutcome) -> FairPlayResult<()> {
    let mut board = MinesOutcome::deal(seeds, claimed.mine_count)?;
    field("mines", &board.mines, &claimed.mines)?;

    for &cell in &claimed.opened {
        let (row, col) = mines::cell_coords(cell);
        let safe = cell < mines::TOTAL_CELLS
            && matches!(board.reveal(row, col), Ok(mines::CellReveal::Safe { .. }));
        if !safe {
            return Err(FairPlayError::mismatch("opened", "safe unopened cell", cell));
        }
    }
    if let Some(cell) = claimed.hit_mine {
        let (row, col) = mines::cell_coords(cell);
        if cell >= mines::TOTAL_CELLS || !board.mines.contains(&cell) {
            return Err(FairPlayError::mismatch("hit_mine", "a mine cell", cell));
        }
        board.reveal(row, col)?;
    }

    field("hit_mine", &board.hit_mine, &claimed.hit_mine)?;
    field("multiplier", &board.multiplier, &claimed.multiplier)
}

fn field<T: PartialEq + Debug>(name: &str, expected: &T, claimed: &T) -> FairPlayResult<()> {
    if expected == claimed {
        Ok(())
    } else {
        Err(FairPlayError::mismatch(name, expected, claimed))
    }
}

pub(crate) fn short(hash: &str) -> &str {
    hash.get(..16).unwrap_or(hash)
}

/// Verify with the default crash configuration
pub fn verify(
    server_seed: &ServerSeed,
    commitment: &str,
    client_seed: &str,
    nonce: u64,
    params: Option<&GameParams>,
    claimed: &GameOutcome,
) -> bool {
    Verifier::default().verify(server_seed, commitment, client_seed, nonce, params, claimed)
}

pub fn verify_strict(
    server_seed: &ServerSeed,
    commitment: &str,
    client_seed: &str,
    nonce: u64,
    params: Option<&GameParams>,
    claimed: &GameOutcome,
) -> FairPlayResult<()> {
    Verifier::default().verify_strict(server_seed, commitment, client_seed, nonce, params, claimed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::payout::{derive_crash, derive_outcome};
    use crate::games::types::{DiceOutcome, PlinkoOutcome, RiskLevel, SlotSymbol};
    use rust_decimal_macros::dec;

    fn seeds() -> SeedTriple {
        SeedTriple::new(ServerSeed::new("abc123"), "def456", 2)
    }

    fn mismatch_field(result: FairPlayResult<()>) -> String {
        match result {
            Err(FairPlayError::VerificationMismatch { field, .. }) => field,
            other => panic!("expected mismatch, got {:?}", other),
        }
    }

    fn check(s: &SeedTriple, params: &GameParams, claimed: &GameOutcome) -> FairPlayResult<()> {
        verify_strict(s.reveal(), s.server_seed_hash(), s.client_seed(), s.nonce(), Some(params), claimed)
    }

    #[test]
    fn test_honest_outcomes_verify() {
        let s = seeds();
        for params in [
            GameParams::Dice { guess: 3 },
            GameParams::Plinko { rows: 12, risk: RiskLevel::Low },
            GameParams::Slots { reels: ReelCount::Five },
            GameParams::Mines { mine_count: 7 },
        ] {
            let outcome = derive_outcome(&s, &params).unwrap();
            assert!(verify(
                s.reveal(),
                s.server_seed_hash(),
                s.client_seed(),
                s.nonce(),
                Some(&params),
                &outcome
            ));
        }
    }

    #[test]
    fn test_wrong_commitment_is_first_mismatch() {
        let s = seeds();
        let params = GameParams::Dice { guess: 3 };
        let outcome = derive_outcome(&s, &params).unwrap();
        let result = verify_strict(s.reveal(), &"0".repeat(64), s.client_seed(), s.nonce(), Some(&params), &outcome);
        assert_eq!(mismatch_field(result), "server_seed_hash");
    }

    #[test]
    fn test_tampered_dice_roll() {
        let s = seeds();
        let params = GameParams::Dice { guess: 3 };
        let GameOutcome::Dice(honest) = derive_outcome(&s, &params).unwrap() else {
            panic!("dice expected");
        };
        let forged = GameOutcome::Dice(DiceOutcome {
            roll: honest.roll % 6 + 1,
            ..honest
        });
        assert_eq!(mismatch_field(check(&s, &params, &forged)), "roll");
    }

    #[test]
    fn test_changed_dice_guess_is_rejected() {
        // every guess except the roll loses with multiplier 0, so only the
        // committed guess can tell them apart
        for nonce in 0..12 {
            let s = SeedTriple::new(ServerSeed::new("abc123"), "def456", nonce);
            let roll = dice::roll(&s);
            let guess = roll % 6 + 1;
            let params = GameParams::Dice { guess };
            let GameOutcome::Dice(honest) = derive_outcome(&s, &params).unwrap() else {
                panic!("dice expected");
            };
            assert!(!honest.won);

            let forged = GameOutcome::Dice(DiceOutcome {
                guess: guess % 6 + 1,
                ..honest
            });
            assert_eq!(mismatch_field(check(&s, &params, &forged)), "guess");
        }
    }

    #[test]
    fn test_changed_plinko_inputs_are_rejected() {
        let s = seeds();
        let params = GameParams::Plinko { rows: 12, risk: RiskLevel::Low };
        let GameOutcome::Plinko(honest) = derive_outcome(&s, &params).unwrap() else {
            panic!("plinko expected");
        };

        // the forged outcome is internally consistent for Medium risk
        let medium = plinko::play(&s, 12, RiskLevel::Medium).unwrap();
        let forged = GameOutcome::Plinko(PlinkoOutcome {
            risk: RiskLevel::Medium,
            multiplier: medium.multiplier,
            ..honest.clone()
        });
        assert!(verify(
            s.reveal(),
            s.server_seed_hash(),
            s.client_seed(),
            s.nonce(),
            Some(&GameParams::Plinko { rows: 12, risk: RiskLevel::Medium }),
            &forged
        ));
        assert_eq!(mismatch_field(check(&s, &params, &forged)), "risk");

        let more_rows = GameOutcome::Plinko(PlinkoOutcome { rows: 13, ..honest });
        assert_eq!(mismatch_field(check(&s, &params, &more_rows)), "rows");
    }

    #[test]
    fn test_params_must_match_game() {
        let s = seeds();
        let params = GameParams::Mines { mine_count: 5 };
        let outcome = derive_outcome(&s, &params).unwrap();

        let result = verify_strict(s.reveal(), s.server_seed_hash(), s.client_seed(), s.nonce(), None, &outcome);
        assert_eq!(mismatch_field(result), "params");
        assert_eq!(
            mismatch_field(check(&s, &GameParams::Mines { mine_count: 6 }, &outcome)),
            "mine_count"
        );
        assert_eq!(mismatch_field(check(&s, &GameParams::Dice { guess: 1 }, &outcome)), "game");
    }

    #[test]
    fn test_tampered_slots_reels() {
        let s = seeds();
        let params = GameParams::Slots { reels: ReelCount::Three };
        let GameOutcome::Slots(mut forged) = derive_outcome(&s, &params).unwrap() else {
            panic!("slots expected");
        };
        forged.reels[1] = if forged.reels[1] == SlotSymbol::Seven {
            SlotSymbol::Cherry
        } else {
            SlotSymbol::Seven
        };
        assert_eq!(mismatch_field(check(&s, &params, &GameOutcome::Slots(forged))), "reels");
    }

    #[test]
    fn test_mines_replay_checks_reveals() {
        let s = seeds();
        let params = GameParams::Mines { mine_count: 5 };
        let mut board = MinesOutcome::deal(&s, 5).unwrap();
        let safe: Vec<u8> = (0..25).filter(|c| !board.mines.contains(c)).take(2).collect();
        for &cell in &safe {
            let (r, c) = mines::cell_coords(cell);
            board.reveal(r, c).unwrap();
        }
        assert!(check(&s, &params, &GameOutcome::Mines(board.clone())).is_ok());

        let mut inflated = board.clone();
        inflated.multiplier = dec!(9.99);
        assert_eq!(mismatch_field(check(&s, &params, &GameOutcome::Mines(inflated))), "multiplier");

        let mut impossible = board;
        impossible.opened.push(impossible.mines[0]);
        assert_eq!(mismatch_field(check(&s, &params, &GameOutcome::Mines(impossible))), "opened");
    }

    #[test]
    fn test_crash_round_reveal_verifies() {
        let config = CrashConfig::default();
        let s = seeds();
        let GameOutcome::Crash(outcome) = derive_crash(&s, &config) else {
            panic!("crash expected");
        };
        let reveal = RoundReveal {
            round_id: Uuid::new_v4(),
            server_seed: s.reveal().clone(),
            server_seed_hash: s.server_seed_hash().to_string(),
            client_seed: s.client_seed().to_string(),
            nonce: s.nonce(),
            crash_point: outcome.crash_point,
        };
        let verifier = Verifier::new(config);
        assert!(verifier.verify_round(&reveal).is_ok());

        let forged = RoundReveal {
            crash_point: outcome.crash_point + dec!(0.01),
            ..reveal
        };
        assert_eq!(mismatch_field(verifier.verify_round(&forged)), "crash_point");
    }
}
