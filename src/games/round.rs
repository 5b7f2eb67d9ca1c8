//! Crash round lifecycle: Waiting -> Active -> Crashed.
//!
//! A round is a pure state machine. The host decides when to activate it and feeds it
//! the time spent active; the round derives the live multiplier, settles
//! auto-cashouts and crashes once the curve reaches the crash point. Money movement
//! stays with the caller: the round only reports what each bet is owed.

use crate::config::{BetLimits, CrashConfig};
use crate::errors::{FairPlayError, FairPlayResult, ValidationError};
use crate::games::crash;
use crate::games::seed::{SeedCommitment, SeedTriple, ServerSeed};
use crate::games::types::payout_amount;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RoundState {
    Waiting,
    Active,
    Crashed,
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundState::Waiting => write!(f, "waiting"),
            RoundState::Active => write!(f, "active"),
            RoundState::Crashed => write!(f, "crashed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BetStatus {
    Active,
    CashedOut { multiplier: Decimal, payout: Decimal },
    Lost,
    /// Round abandoned before it crashed; the stake goes back
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrashBet {
    pub id: Uuid,
    pub player: String,
    pub stake: Decimal,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub auto_cashout: Option<Decimal>,
    #[serde(flatten)]
    pub status: BetStatus,
    pub placed_at: DateTime<Utc>,
}

impl CrashBet {
    pub fn is_active(&self) -> bool {
        self.status == BetStatus::Active
    }
}

/// A bet leaving the round with winnings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CashoutRecord {
    pub bet_id: Uuid,
    pub player: String,
    pub stake: Decimal,
    pub multiplier: Decimal,
    pub payout: Decimal,
    pub automatic: bool,
}

/// What one tick changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub multiplier: Decimal,
    pub cashouts: Vec<CashoutRecord>,
    /// Bets lost to a crash during this tick
    pub lost: Vec<Uuid>,
    pub crashed: bool,
}

/// Public view of a round. The crash point only appears once the round has crashed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundInfo {
    pub round_id: Uuid,
    pub state: RoundState,
    pub seeds: SeedCommitment,
    pub current_multiplier: Decimal,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub crash_point: Option<Decimal>,
    pub bet_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to verify a finished round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundReveal {
    pub round_id: Uuid,
    pub server_seed: ServerSeed,
    pub server_seed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
    pub crash_point: Decimal,
}

#[derive(Debug, Clone)]
pub struct CrashRound {
    id: Uuid,
    seeds: SeedTriple,
    crash_point: Decimal,
    state: RoundState,
    config: CrashConfig,
    limits: BetLimits,
    bets: Vec<CrashBet>,
    current_multiplier: Decimal,
    created_at: DateTime<Utc>,
    activated_at: Option<DateTime<Utc>>,
    crashed_at: Option<DateTime<Utc>>,
}

impl CrashRound {
    pub fn new(seeds: SeedTriple, config: CrashConfig, limits: BetLimits) -> Self {
        let crash_point = crash::crash_point(&seeds, &config);
        Self {
            id: Uuid::new_v4(),
            seeds,
            crash_point,
            state: RoundState::Waiting,
            config,
            limits,
            bets: Vec::new(),
            current_multiplier: Decimal::ONE,
            created_at: Utc::now(),
            activated_at: None,
            crashed_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn current_multiplier(&self) -> Decimal {
        self.current_multiplier
    }

    pub fn nonce(&self) -> u64 {
        self.seeds.nonce()
    }

    pub fn bets(&self) -> &[CrashBet] {
        &self.bets
    }

    pub fn activated_at(&self) -> Option<DateTime<Utc>> {
        self.activated_at
    }

    pub fn crashed_at(&self) -> Option<DateTime<Utc>> {
        self.crashed_at
    }

    /// Crash point, once it is public
    pub fn revealed_crash_point(&self) -> Option<Decimal> {
        (self.state == RoundState::Crashed).then_some(self.crash_point)
    }

    pub fn info(&self) -> RoundInfo {
        RoundInfo {
            round_id: self.id,
            state: self.state,
            seeds: self.seeds.public(),
            current_multiplier: self.current_multiplier,
            crash_point: self.revealed_crash_point(),
            bet_count: self.bets.len(),
            created_at: self.created_at,
        }
    }

    pub fn place_bet(
        &mut self,
        player: &str,
        stake: Decimal,
        auto_cashout: Option<Decimal>,
    ) -> FairPlayResult<Uuid> {
        if self.state == RoundState::Crashed {
            return Err(FairPlayError::illegal_state(format!(
                "Round {} has already crashed",
                self.id
            )));
        }
        // joining after the curve left 1.00 would allow a risk-free cashout
        if self.state == RoundState::Active && self.current_multiplier > Decimal::ONE {
            return Err(FairPlayError::illegal_state(format!(
                "Round {} is already at {}x",
                self.id, self.current_multiplier
            )));
        }
        if !self.limits.contains(stake) {
            return Err(ValidationError::BetOutOfRange {
                amount: stake,
                min: self.limits.min,
                max: self.limits.max,
            }
            .into());
        }
        if let Some(target) = auto_cashout {
            if target < self.config.min_auto_cashout {
                return Err(ValidationError::AutoCashoutTarget {
                    target,
                    min: self.config.min_auto_cashout,
                }
                .into());
            }
        }
        let open_bets = self
            .bets
            .iter()
            .filter(|b| b.player == player && b.is_active())
            .count();
        if open_bets >= self.config.max_bets_per_player {
            return Err(ValidationError::Other(format!(
                "At most {} active bets per round",
                self.config.max_bets_per_player
            ))
            .into());
        }

        let id = Uuid::new_v4();
        self.bets.push(CrashBet {
            id,
            player: player.to_string(),
            stake,
            auto_cashout,
            status: BetStatus::Active,
            placed_at: Utc::now(),
        });
        Ok(id)
    }

    pub fn activate(&mut self) -> FairPlayResult<()> {
        if self.state != RoundState::Waiting {
            return Err(FairPlayError::illegal_state(format!(
                "Cannot activate a {} round",
                self.state
            )));
        }
        self.state = RoundState::Active;
        self.activated_at = Some(Utc::now());
        Ok(())
    }

    /// Advance an active round to `active_elapsed` since activation.
    ///
    /// Auto-cashouts at or below the new multiplier are paid at their target before
    /// the crash check, so a target equal to the crash point still pays.
    pub fn tick(&mut self, active_elapsed: Duration) -> FairPlayResult<TickReport> {
        if self.state != RoundState::Active {
            return Err(FairPlayError::illegal_state(format!(
                "Cannot tick a {} round",
                self.state
            )));
        }

        let multiplier = crash::multiplier_at(
            active_elapsed,
            self.crash_point,
            self.config.growth_rate_per_sec,
        )
        .max(self.current_multiplier);
        self.current_multiplier = multiplier;

        let mut report = TickReport {
            multiplier,
            ..TickReport::default()
        };

        for bet in self.bets.iter_mut().filter(|b| b.is_active()) {
            if let Some(target) = bet.auto_cashout.filter(|t| *t <= multiplier) {
                report.cashouts.push(close_bet(bet, target, true));
            }
        }

        if multiplier >= self.crash_point {
            report.lost = self.crash();
            report.crashed = true;
        }

        Ok(report)
    }

    /// Manual cashout at the current multiplier
    pub fn cashout(&mut self, bet_id: Uuid, player: &str) -> FairPlayResult<CashoutRecord> {
        if self.state != RoundState::Active {
            return Err(FairPlayError::illegal_state(format!(
                "Cashout requires an active round, round is {}",
                self.state
            )));
        }
        let multiplier = self.current_multiplier;
        let bet = self
            .bets
            .iter_mut()
            .find(|b| b.id == bet_id && b.player == player)
            .ok_or_else(|| FairPlayError::NotFound(format!("Bet {}", bet_id)))?;
        if !bet.is_active() {
            return Err(FairPlayError::illegal_state(format!("Bet {} is already settled", bet_id)));
        }
        Ok(close_bet(bet, multiplier, false))
    }

    fn crash(&mut self) -> Vec<Uuid> {
        self.state = RoundState::Crashed;
        self.current_multiplier = self.crash_point;
        self.crashed_at = Some(Utc::now());

        self.bets
            .iter_mut()
            .filter(|b| b.is_active())
            .map(|bet| {
                bet.status = BetStatus::Lost;
                bet.id
            })
            .collect()
    }

    /// Close every still-active bet as refunded and return them. Used when a
    /// round is abandoned before it crashes.
    pub fn refund_open_bets(&mut self) -> Vec<CrashBet> {
        self.bets
            .iter_mut()
            .filter(|b| b.is_active())
            .map(|bet| {
                bet.status = BetStatus::Refunded;
                bet.clone()
            })
            .collect()
    }

    pub fn reveal(&self) -> FairPlayResult<RoundReveal> {
        if self.state != RoundState::Crashed {
            return Err(FairPlayError::illegal_state(format!(
                "Round {} has not crashed yet",
                self.id
            )));
        }
        Ok(RoundReveal {
            round_id: self.id,
            server_seed: self.seeds.reveal().clone(),
            server_seed_hash: self.seeds.server_seed_hash().to_string(),
            client_seed: self.seeds.client_seed().to_string(),
            nonce: self.seeds.nonce(),
            crash_point: self.crash_point,
        })
    }

    /// Time the curve needs to reach this round's crash point
    pub(crate) fn active_duration(&self) -> Duration {
        crash::time_to_crash(self.crash_point, self.config.growth_rate_per_sec)
    }
}

fn close_bet(bet: &mut CrashBet, multiplier: Decimal, automatic: bool) -> CashoutRecord {
    let payout = payout_amount(bet.stake, multiplier);
    bet.status = BetStatus::CashedOut { multiplier, payout };
    CashoutRecord {
        bet_id: bet.id,
        player: bet.player.clone(),
        stake: bet.stake,
        multiplier,
        payout,
        automatic,
    }
}
