//! Game sessions: stake reservation, seed creation, reveals and settlement.

use crate::config::FairPlayConfig;
use crate::errors::{FairPlayError, FairPlayResult, ValidationError};
use crate::games::mines::CellReveal;
use crate::games::payout::{derive_outcome, settle, Settlement};
use crate::games::seed::{hash_seed, SeedCommitment, SeedTriple, ServerSeed};
use crate::games::types::{GameOutcome, GameParams};
use crate::store::{GameRecord, GameStatus, GameStore};
use crate::verification::{short, GameInfo, VerificationReport, Verifier};
use crate::wallet::Wallet;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How a game is brought to its end
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Pay the current multiplier
    Cashout,
    /// End the game as lost regardless of its state
    ForcedLoss,
}

/// Final state of a game, with the server seed revealed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameResolution {
    pub game_id: Uuid,
    pub params: GameParams,
    pub final_multiplier: Decimal,
    pub payout: Decimal,
    pub server_seed: ServerSeed,
    pub seeds: SeedCommitment,
    pub outcome: GameOutcome,
    pub settlement: Settlement,
}

/// Result of opening one Mines cell
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevealStep {
    pub game_id: Uuid,
    pub reveal: CellReveal,
    pub multiplier: Decimal,
    /// Present once the reveal ended the game (mine hit or board cleared)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resolution: Option<GameResolution>,
}

struct GameSession {
    player: String,
    params: GameParams,
    stake: Decimal,
    seeds: SeedTriple,
    outcome: GameOutcome,
    created_at: DateTime<Utc>,
}

/// Runs games against a wallet and a record store
pub struct GameProcessor {
    config: FairPlayConfig,
    wallet: Arc<dyn Wallet>,
    store: Arc<dyn GameStore>,
    verifier: Verifier,
    sessions: DashMap<Uuid, GameSession>,
    /// Games started per player; the next game's nonce
    nonces: DashMap<String, u64>,
}

impl GameProcessor {
    pub fn new(config: FairPlayConfig, wallet: Arc<dyn Wallet>, store: Arc<dyn GameStore>) -> Self {
        let verifier = Verifier::new(config.crash.clone());
        Self {
            config,
            wallet,
            store,
            verifier,
            sessions: DashMap::new(),
            nonces: DashMap::new(),
        }
    }

    pub fn config(&self) -> &FairPlayConfig {
        &self.config
    }

    /// Number of games awaiting player input
    pub fn active_games(&self) -> usize {
        self.sessions.len()
    }

    /// Reserve the stake and commit to a fresh seed triple
    pub fn begin_game(
        &self,
        player: &str,
        params: GameParams,
        stake: Decimal,
        client_seed: Option<String>,
    ) -> FairPlayResult<GameInfo> {
        params.validate()?;
        let limits = self.config.limits.for_game(params.game_type());
        if !limits.contains(stake) {
            return Err(ValidationError::BetOutOfRange {
                amount: stake,
                min: limits.min,
                max: limits.max,
            }
            .into());
        }

        self.wallet.reserve(player, stake)?;

        let nonce = {
            let mut counter = self.nonces.entry(player.to_string()).or_insert(0);
            let nonce = *counter;
            *counter += 1;
            nonce
        };
        let seeds = SeedTriple::generate(
            self.config.seeds.server_seed_bytes,
            client_seed,
            self.config.seeds.client_seed_bytes,
            nonce,
        );

        let outcome = match derive_outcome(&seeds, &params) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.wallet.credit(player, stake)?;
                return Err(e);
            }
        };

        let game_id = Uuid::new_v4();
        let session = GameSession {
            player: player.to_string(),
            params,
            stake,
            seeds,
            outcome,
            created_at: Utc::now(),
        };
        let info = session.info(game_id);
        if let Err(e) = self.store.save(&session.record(game_id, GameStatus::InProgress, None)) {
            warn!("Game {} could not be stored, refunding {} to {}: {}", game_id, stake, player, e);
            self.wallet.credit(player, stake)?;
            return Err(e);
        }
        self.sessions.insert(game_id, session);

        info!(
            "Game {} started: player={}, game={}, stake={}, nonce={}, commitment={}",
            game_id,
            player,
            params.game_type(),
            stake,
            nonce,
            short(&info.seeds.server_seed_hash)
        );
        Ok(info)
    }

    /// Open one Mines cell
    pub fn reveal_step(&self, game_id: Uuid, row: u8, col: u8) -> FairPlayResult<RevealStep> {
        let (reveal, multiplier, finished) = {
            let mut session = self
                .sessions
                .get_mut(&game_id)
                .ok_or_else(|| self.missing(game_id))?;
            let GameOutcome::Mines(board) = &mut session.outcome else {
                return Err(FairPlayError::illegal_state(format!(
                    "Game {} has no cells to reveal",
                    game_id
                )));
            };
            let reveal = board.reveal(row, col)?;
            let finished = board.is_busted() || board.safe_remaining() == 0;
            (reveal, board.multiplier, finished)
        };
        debug!("Game {} revealed ({}, {}): {:?}", game_id, row, col, reveal);

        let resolution = if finished {
            Some(self.resolve(game_id, Resolution::Cashout)?)
        } else {
            None
        };

        Ok(RevealStep {
            game_id,
            reveal,
            multiplier,
            resolution,
        })
    }

    /// Finalize a game, reveal its seed and credit any winnings
    pub fn resolve(&self, game_id: Uuid, resolution: Resolution) -> FairPlayResult<GameResolution> {
        let (_, session) = self
            .sessions
            .remove(&game_id)
            .ok_or_else(|| self.missing(game_id))?;

        let settlement = match resolution {
            Resolution::Cashout => settle(session.stake, &session.outcome),
            Resolution::ForcedLoss => Settlement {
                stake: session.stake,
                multiplier: Decimal::ZERO,
                payout: Decimal::ZERO,
                description: "Forfeited".to_string(),
            },
        };
        let status = if settlement.is_win() {
            GameStatus::Won
        } else {
            GameStatus::Lost
        };

        // the session stays resolvable until its final record is stored
        if let Err(e) = self
            .store
            .save(&session.record(game_id, status, Some(settlement.clone())))
        {
            warn!("Game {} could not be finalized: {}", game_id, e);
            self.sessions.insert(game_id, session);
            return Err(e);
        }
        if settlement.payout > Decimal::ZERO {
            self.wallet.credit(&session.player, settlement.payout)?;
        }

        info!(
            "Game {} finished: player={}, multiplier={}, payout={}, {}",
            game_id, session.player, settlement.multiplier, settlement.payout, settlement.description
        );

        Ok(GameResolution {
            game_id,
            params: session.params,
            final_multiplier: settlement.multiplier,
            payout: settlement.payout,
            server_seed: session.seeds.reveal().clone(),
            seeds: session.seeds.public(),
            outcome: session.outcome,
            settlement,
        })
    }

    /// One-shot game: begin and cash out immediately
    pub fn play(
        &self,
        player: &str,
        params: GameParams,
        stake: Decimal,
        client_seed: Option<String>,
    ) -> FairPlayResult<GameResolution> {
        if !params.is_instant() {
            return Err(FairPlayError::illegal_state(format!(
                "{} needs player input; use begin_game",
                params.game_type()
            )));
        }
        let started = self.begin_game(player, params, stake, client_seed)?;
        self.resolve(started.game_id, Resolution::Cashout)
    }

    pub fn verify(
        &self,
        commitment: &str,
        server_seed: &ServerSeed,
        client_seed: &str,
        nonce: u64,
        params: Option<&GameParams>,
        claimed: &GameOutcome,
    ) -> bool {
        self.verifier
            .verify(server_seed, commitment, client_seed, nonce, params, claimed)
    }

    /// Public commitment of a game, in progress or finished
    pub fn game_info(&self, game_id: Uuid) -> FairPlayResult<GameInfo> {
        if let Some(session) = self.sessions.get(&game_id) {
            return Ok(session.info(game_id));
        }
        let record = self
            .store
            .load(game_id)?
            .ok_or_else(|| FairPlayError::NotFound(format!("Game {}", game_id)))?;
        Ok(GameInfo {
            game_id,
            player: record.player,
            params: record.params,
            seeds: record.seeds,
            created_at: record.created_at,
        })
    }

    /// Revealed data of a finished game, re-verified now
    pub fn verification_report(&self, game_id: Uuid) -> FairPlayResult<VerificationReport> {
        let record = self
            .store
            .load(game_id)?
            .ok_or_else(|| FairPlayError::NotFound(format!("Game {}", game_id)))?;
        if !record.status.is_finished() {
            return Err(FairPlayError::illegal_state(format!(
                "Game {} is still in progress",
                game_id
            )));
        }
        let (Some(server_seed), Some(outcome), Some(settlement)) =
            (record.server_seed, record.outcome, record.settlement)
        else {
            return Err(FairPlayError::illegal_state(format!(
                "Game {} record lacks revealed data",
                game_id
            )));
        };

        let valid = self.verifier.verify(
            &server_seed,
            &record.seeds.server_seed_hash,
            &record.seeds.client_seed,
            record.seeds.nonce,
            Some(&record.params),
            &outcome,
        );

        Ok(VerificationReport {
            game_id,
            params: record.params,
            recomputed_hash: hash_seed(server_seed.as_str()),
            server_seed,
            server_seed_hash: record.seeds.server_seed_hash,
            client_seed: record.seeds.client_seed,
            nonce: record.seeds.nonce,
            outcome,
            settlement,
            valid,
        })
    }

    pub fn history(&self, player: &str, limit: usize) -> FairPlayResult<Vec<GameRecord>> {
        self.store.history(player, limit)
    }

    fn missing(&self, game_id: Uuid) -> FairPlayError {
        match self.store.load(game_id) {
            Ok(Some(record)) if record.status.is_finished() => {
                FairPlayError::illegal_state(format!("Game {} is already finished", game_id))
            }
            _ => FairPlayError::NotFound(format!("Game {}", game_id)),
        }
    }
}

impl GameSession {
    fn info(&self, game_id: Uuid) -> GameInfo {
        GameInfo {
            game_id,
            player: self.player.clone(),
            params: self.params,
            seeds: self.seeds.public(),
            created_at: self.created_at,
        }
    }

    fn record(&self, game_id: Uuid, status: GameStatus, settlement: Option<Settlement>) -> GameRecord {
        let finished = status.is_finished();
        GameRecord {
            game_id,
            player: self.player.clone(),
            params: self.params,
            stake: self.stake,
            seeds: self.seeds.public(),
            status,
            server_seed: finished.then(|| self.seeds.reveal().clone()),
            outcome: finished.then(|| self.outcome.clone()),
            settlement,
            created_at: self.created_at,
            finished_at: finished.then(Utc::now),
        }
    }
}
