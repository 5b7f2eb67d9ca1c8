//! Crash round scheduler.
//!
//! Drives one round at a time on a tokio task: wait, activate, tick until the crash,
//! settle cashouts through the wallet, archive the reveal and start the next round.
//! Every transition is broadcast as a [`RoundEvent`].

use crate::config::FairPlayConfig;
use crate::errors::{FairPlayError, FairPlayResult};
use crate::games::round::{BetStatus, CashoutRecord, CrashRound, RoundInfo, RoundReveal, TickReport};
use crate::games::seed::SeedTriple;
use crate::games::types::GameType;
use crate::verification::short;
use crate::wallet::Wallet;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::time::Instant;
use tokio::sync::{broadcast, Mutex, Notify};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Emitted on every round transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoundEvent {
    Created { round: RoundInfo },
    Activated { round_id: Uuid },
    Tick { round_id: Uuid, multiplier: Decimal },
    CashedOut { round_id: Uuid, cashout: CashoutRecord },
    Crashed { reveal: RoundReveal, lost_bets: usize },
    /// Runner stopped before the round crashed; open stakes were returned
    Abandoned { round_id: Uuid, refunded: Vec<Uuid> },
}

pub struct RoundRunner {
    config: FairPlayConfig,
    wallet: Arc<dyn Wallet>,
    current: Mutex<CrashRound>,
    history: Mutex<VecDeque<RoundReveal>>,
    events: broadcast::Sender<RoundEvent>,
    next_nonce: AtomicU64,
    running: AtomicBool,
    shutdown: Notify,
}

impl RoundRunner {
    pub fn new(config: FairPlayConfig, wallet: Arc<dyn Wallet>) -> Arc<Self> {
        let (events, _) = broadcast::channel(1_024);
        let first = new_round(&config, 0);
        Arc::new(Self {
            config,
            wallet,
            current: Mutex::new(first),
            history: Mutex::new(VecDeque::new()),
            events,
            next_nonce: AtomicU64::new(1),
            running: AtomicBool::new(true),
            shutdown: Notify::new(),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoundEvent> {
        self.events.subscribe()
    }

    /// Run rounds on a background task until stopped
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let runner = self.clone();
        tokio::spawn(async move {
            runner.run(None).await;
        })
    }

    /// Run rounds until stopped or `max_rounds` rounds have crashed
    pub async fn run(&self, max_rounds: Option<u64>) {
        let mut completed = 0u64;
        while !self.stopped() {
            if max_rounds.is_some_and(|max| completed >= max) {
                break;
            }
            if !self.run_round().await {
                break;
            }
            completed += 1;
        }
        self.running.store(false, Ordering::SeqCst);
        self.abandon_current().await;
        tracing::info!("Round runner exiting after {} rounds", completed);
    }

    /// Refund every bet still open in the current round
    async fn abandon_current(&self) {
        let (round_id, refunded) = {
            let mut round = self.current.lock().await;
            (round.id(), round.refund_open_bets())
        };
        if refunded.is_empty() {
            return;
        }
        for bet in &refunded {
            tracing::info!("Refunding bet {} in round {}: player={}, stake={}", bet.id, round_id, bet.player, bet.stake);
            if let Err(e) = self.wallet.credit(&bet.player, bet.stake) {
                tracing::warn!("Failed to refund bet {} for {}: {}", bet.id, bet.player, e);
            }
        }
        self.publish(RoundEvent::Abandoned {
            round_id,
            refunded: refunded.iter().map(|b| b.id).collect(),
        });
    }

    fn stopped(&self) -> bool {
        !self.running.load(Ordering::SeqCst)
    }

    /// Returns false when interrupted by `stop`
    async fn run_round(&self) -> bool {
        let round_info = self.current.lock().await.info();
        tracing::info!(
            "Round {} waiting: nonce={}, commitment={}",
            round_info.round_id,
            round_info.seeds.nonce,
            short(&round_info.seeds.server_seed_hash)
        );
        self.publish(RoundEvent::Created { round: round_info.clone() });

        tokio::select! {
            _ = tokio::time::sleep(self.config.crash.waiting_duration()) => {}
            _ = self.shutdown.notified() => return false,
        }
        if self.stopped() {
            return false;
        }

        if let Err(e) = self.current.lock().await.activate() {
            tracing::warn!("Round {} failed to activate: {}", round_info.round_id, e);
            return false;
        }
        tracing::info!("Round {} active", round_info.round_id);
        self.publish(RoundEvent::Activated { round_id: round_info.round_id });

        let started = Instant::now();
        let mut tick = tokio::time::interval(self.config.crash.tick_interval());
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.notified() => return false,
                _ = tick.tick() => {}
            }
            // notify_waiters keeps no permit, so a stop between polls shows up here
            if self.stopped() {
                return false;
            }

            let report = match self.current.lock().await.tick(started.elapsed()) {
                Ok(report) => report,
                Err(e) => {
                    tracing::warn!("Round {} tick failed: {}", round_info.round_id, e);
                    return false;
                }
            };
            if self.settle_tick(round_info.round_id, report) {
                break;
            }
        }

        self.finish_round().await;
        true
    }

    /// Credit auto-cashouts and publish the tick. Returns true once the round crashed.
    fn settle_tick(&self, round_id: Uuid, report: TickReport) -> bool {
        for cashout in report.cashouts {
            self.credit(&cashout);
            self.publish(RoundEvent::CashedOut { round_id, cashout });
        }
        if !report.crashed {
            self.publish(RoundEvent::Tick {
                round_id,
                multiplier: report.multiplier,
            });
        }
        report.crashed
    }

    async fn finish_round(&self) {
        let nonce = self.next_nonce.fetch_add(1, Ordering::SeqCst);
        let next = new_round(&self.config, nonce);

        let (reveal, lost_bets) = {
            let mut current = self.current.lock().await;
            let lost = current
                .bets()
                .iter()
                .filter(|b| b.status == BetStatus::Lost)
                .count();
            let reveal = current.reveal();
            *current = next;
            (reveal, lost)
        };

        match reveal {
            Ok(reveal) => {
                tracing::info!(
                    "Round {} crashed at {}x, {} bets lost",
                    reveal.round_id,
                    reveal.crash_point,
                    lost_bets
                );
                {
                    let mut history = self.history.lock().await;
                    history.push_front(reveal.clone());
                    history.truncate(self.config.crash.history_size);
                }
                self.publish(RoundEvent::Crashed { reveal, lost_bets });
            }
            Err(e) => tracing::warn!("Crashed round could not be revealed: {}", e),
        }
    }

    /// Reserve the stake and join the current round
    pub async fn place_bet(
        &self,
        player: &str,
        stake: Decimal,
        auto_cashout: Option<Decimal>,
    ) -> FairPlayResult<Uuid> {
        let mut round = self.current.lock().await;
        if self.stopped() {
            return Err(FairPlayError::illegal_state("Round runner is stopped"));
        }
        self.wallet.reserve(player, stake)?;
        match round.place_bet(player, stake, auto_cashout) {
            Ok(bet_id) => {
                tracing::debug!("Bet {} placed in round {}: player={}, stake={}", bet_id, round.id(), player, stake);
                Ok(bet_id)
            }
            Err(e) => {
                self.wallet.credit(player, stake)?;
                Err(e)
            }
        }
    }

    /// Cash out at the current multiplier
    pub async fn cashout(&self, bet_id: Uuid, player: &str) -> FairPlayResult<CashoutRecord> {
        let mut round = self.current.lock().await;
        let record = round.cashout(bet_id, player)?;
        let round_id = round.id();
        drop(round);

        self.wallet.credit(player, record.payout)?;
        self.publish(RoundEvent::CashedOut {
            round_id,
            cashout: record.clone(),
        });
        Ok(record)
    }

    pub async fn current_round(&self) -> RoundInfo {
        self.current.lock().await.info()
    }

    /// Crashed rounds, newest first
    pub async fn history(&self) -> Vec<RoundReveal> {
        self.history.lock().await.iter().cloned().collect()
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }

    fn credit(&self, cashout: &CashoutRecord) {
        if let Err(e) = self.wallet.credit(&cashout.player, cashout.payout) {
            tracing::warn!("Failed to credit cashout {} for {}: {}", cashout.bet_id, cashout.player, e);
        }
    }

    fn publish(&self, event: RoundEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

fn new_round(config: &FairPlayConfig, nonce: u64) -> CrashRound {
    let seeds = SeedTriple::generate(
        config.seeds.server_seed_bytes,
        None,
        config.seeds.client_seed_bytes,
        nonce,
    );
    CrashRound::new(
        seeds,
        config.crash.clone(),
        *config.limits.for_game(GameType::Crash),
    )
}
