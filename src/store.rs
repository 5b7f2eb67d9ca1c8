//! Game records and the persistence collaborator.
//!
//! Records are kept as JSON documents. Anything that could reveal an unfinished
//! game's outcome is stripped before a record is written.

use crate::errors::{FairPlayError, FairPlayResult};
use crate::games::payout::Settlement;
use crate::games::seed::{SeedCommitment, ServerSeed};
use crate::games::types::{GameOutcome, GameParams, GameType};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Won,
    Lost,
}

impl GameStatus {
    pub fn is_finished(self) -> bool {
        self != GameStatus::InProgress
    }
}

/// One game instance as persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameRecord {
    pub game_id: Uuid,
    pub player: String,
    pub params: GameParams,
    pub stake: Decimal,
    pub seeds: SeedCommitment,
    pub status: GameStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub server_seed: Option<ServerSeed>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub outcome: Option<GameOutcome>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub settlement: Option<Settlement>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl GameRecord {
    pub fn game_type(&self) -> GameType {
        self.params.game_type()
    }

    /// Copy safe to persist or show: unfinished games keep neither secret nor outcome
    pub fn redacted(&self) -> Self {
        if self.status.is_finished() {
            return self.clone();
        }
        Self {
            server_seed: None,
            outcome: None,
            settlement: None,
            ..self.clone()
        }
    }
}

/// Persistence collaborator for game records
pub trait GameStore: Send + Sync {
    /// Insert or replace a record
    fn save(&self, record: &GameRecord) -> FairPlayResult<()>;

    /// Load a record by id
    fn load(&self, game_id: Uuid) -> FairPlayResult<Option<GameRecord>>;

    /// Most recent games of a player, newest first
    fn history(&self, player: &str, limit: usize) -> FairPlayResult<Vec<GameRecord>>;
}

/// In-memory store holding serialized records
#[derive(Clone, Default)]
pub struct InMemoryGameStore {
    records: Arc<DashMap<Uuid, Vec<u8>>>,
    by_player: Arc<DashMap<String, Vec<Uuid>>>,
}

impl InMemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl GameStore for InMemoryGameStore {
    fn save(&self, record: &GameRecord) -> FairPlayResult<()> {
        let bytes = serde_json::to_vec(&record.redacted())?;
        let is_new = self.records.insert(record.game_id, bytes).is_none();
        if is_new {
            self.by_player
                .entry(record.player.clone())
                .or_default()
                .push(record.game_id);
        }
        Ok(())
    }

    fn load(&self, game_id: Uuid) -> FairPlayResult<Option<GameRecord>> {
        let Some(bytes) = self.records.get(&game_id) else {
            return Ok(None);
        };
        let record = serde_json::from_slice(&bytes).map_err(|e| {
            FairPlayError::illegal_state(format!("Corrupted record for game {}: {}", game_id, e))
        })?;
        Ok(Some(record))
    }

    fn history(&self, player: &str, limit: usize) -> FairPlayResult<Vec<GameRecord>> {
        let ids: Vec<Uuid> = match self.by_player.get(player) {
            Some(ids) => ids.iter().rev().take(limit).copied().collect(),
            None => return Ok(Vec::new()),
        };
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.load(id)? {
                records.push(record);
            }
        }
        Ok(records)
    }
}
