//! Wallet collaborator interface
//!
//! The engine never moves money itself. Stakes are reserved before an outcome exists
//! and winnings are credited only after the game is final.

use crate::errors::{FairPlayError, FairPlayResult, ValidationError};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Balance owner for players
pub trait Wallet: Send + Sync {
    /// Deduct `amount` atomically, or fail with `InsufficientFunds` leaving the balance untouched
    fn reserve(&self, player: &str, amount: Decimal) -> FairPlayResult<()>;

    /// Add `amount` to the player's balance
    fn credit(&self, player: &str, amount: Decimal) -> FairPlayResult<()>;

    /// Current balance; unknown players hold zero
    fn balance(&self, player: &str) -> Decimal;
}

/// Thread-safe in-memory wallet backed by a concurrent map
#[derive(Clone, Default)]
pub struct InMemoryWallet {
    balances: Arc<DashMap<String, Decimal>>,
}

impl InMemoryWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wallet with one funded player
    pub fn with_balance(player: &str, amount: Decimal) -> Self {
        let wallet = Self::new();
        wallet.balances.insert(player.to_string(), amount);
        wallet
    }

    pub fn deposit(&self, player: &str, amount: Decimal) -> FairPlayResult<()> {
        self.credit(player, amount)
    }

    pub fn player_count(&self) -> usize {
        self.balances.len()
    }
}

impl Wallet for InMemoryWallet {
    fn reserve(&self, player: &str, amount: Decimal) -> FairPlayResult<()> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::Other(format!("Reserve amount must be positive, got {}", amount)).into());
        }
        // entry() holds the shard lock, so check and deduct are one step
        let mut balance = self.balances.entry(player.to_string()).or_insert(Decimal::ZERO);
        if *balance < amount {
            return Err(FairPlayError::InsufficientFunds {
                balance: *balance,
                required: amount,
            });
        }
        *balance -= amount;
        Ok(())
    }

    fn credit(&self, player: &str, amount: Decimal) -> FairPlayResult<()> {
        if amount < Decimal::ZERO {
            return Err(ValidationError::Other(format!("Credit amount cannot be negative, got {}", amount)).into());
        }
        *self.balances.entry(player.to_string()).or_insert(Decimal::ZERO) += amount;
        Ok(())
    }

    fn balance(&self, player: &str) -> Decimal {
        self.balances
            .get(player)
            .map(|b| *b)
            .unwrap_or(Decimal::ZERO)
    }
}
