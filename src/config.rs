//! Configuration management with validation and defaults
//!
//! Loads from TOML, applies `FAIRPLAY_*` environment overrides, then validates.

use crate::errors::{ConfigurationError, FairPlayResult};
use crate::games::types::GameType;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Engine configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FairPlayConfig {
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub crash: CrashConfig,
    #[serde(default)]
    pub seeds: SeedConfig,
}

/// Inclusive stake bounds for one game
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BetLimits {
    pub min: Decimal,
    pub max: Decimal,
}

impl BetLimits {
    pub const fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min && amount <= self.max
    }
}

/// Per-game stake limits
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LimitsConfig {
    pub mines: BetLimits,
    pub plinko: BetLimits,
    pub dice: BetLimits,
    pub slots: BetLimits,
    pub crash: BetLimits,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            mines: BetLimits::new(dec!(0.01), dec!(999999.99)),
            plinko: BetLimits::new(dec!(0.01), dec!(999999.99)),
            dice: BetLimits::new(dec!(0.01), dec!(10000.00)),
            slots: BetLimits::new(dec!(0.01), dec!(10000.00)),
            crash: BetLimits::new(dec!(0.01), dec!(1000.00)),
        }
    }
}

impl LimitsConfig {
    pub fn for_game(&self, game_type: GameType) -> &BetLimits {
        match game_type {
            GameType::Mines => &self.mines,
            GameType::Plinko => &self.plinko,
            GameType::Dice => &self.dice,
            GameType::Slots => &self.slots,
            GameType::Crash => &self.crash,
        }
    }
}

/// Crash round parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CrashConfig {
    /// House edge in percent
    pub house_edge_percent: Decimal,
    pub max_crash_point: Decimal,
    /// Multiplier gained per second of activity
    pub growth_rate_per_sec: Decimal,
    pub waiting_duration_ms: u64,
    pub tick_interval_ms: u64,
    pub max_bets_per_player: usize,
    pub min_auto_cashout: Decimal,
    /// Number of crashed rounds kept by the runner
    pub history_size: usize,
}

impl Default for CrashConfig {
    fn default() -> Self {
        Self {
            house_edge_percent: dec!(3.00),
            max_crash_point: dec!(10000.00),
            growth_rate_per_sec: dec!(0.10),
            waiting_duration_ms: 8_000,
            tick_interval_ms: 100,
            max_bets_per_player: 5,
            min_auto_cashout: dec!(1.01),
            history_size: 50,
        }
    }
}

impl CrashConfig {
    pub fn waiting_duration(&self) -> Duration {
        Duration::from_millis(self.waiting_duration_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Seed generation sizes in bytes (hex-encoded seeds are twice as long)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SeedConfig {
    pub server_seed_bytes: usize,
    pub client_seed_bytes: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            server_seed_bytes: 32,
            client_seed_bytes: 16,
        }
    }
}

/// Configuration loader with environment variable support
#[derive(Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> FairPlayResult<FairPlayConfig> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            FairPlayConfig::default()
        };

        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> FairPlayResult<FairPlayConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
    }

    fn apply_env_overrides(&self, config: &mut FairPlayConfig) -> FairPlayResult<()> {
        if let Some(edge) = env_parse::<Decimal>("FAIRPLAY_CRASH_HOUSE_EDGE", "Invalid decimal")? {
            config.crash.house_edge_percent = edge;
        }
        if let Some(max) = env_parse::<Decimal>("FAIRPLAY_CRASH_MAX_POINT", "Invalid decimal")? {
            config.crash.max_crash_point = max;
        }
        if let Some(rate) = env_parse::<Decimal>("FAIRPLAY_CRASH_GROWTH_RATE", "Invalid decimal")? {
            config.crash.growth_rate_per_sec = rate;
        }
        if let Some(ms) = env_parse::<u64>("FAIRPLAY_CRASH_WAITING_MS", "Invalid duration")? {
            config.crash.waiting_duration_ms = ms;
        }
        if let Some(ms) = env_parse::<u64>("FAIRPLAY_CRASH_TICK_MS", "Invalid duration")? {
            config.crash.tick_interval_ms = ms;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self, config: &FairPlayConfig) -> FairPlayResult<()> {
        let limits = &config.limits;
        for (name, bounds) in [
            ("limits.mines", &limits.mines),
            ("limits.plinko", &limits.plinko),
            ("limits.dice", &limits.dice),
            ("limits.slots", &limits.slots),
            ("limits.crash", &limits.crash),
        ] {
            if bounds.min <= Decimal::ZERO || bounds.min > bounds.max {
                return Err(invalid(
                    name,
                    format!("{}..{}", bounds.min, bounds.max),
                    "Minimum must be positive and not above maximum",
                ));
            }
        }

        let crash = &config.crash;
        if crash.house_edge_percent < Decimal::ZERO || crash.house_edge_percent >= dec!(100) {
            return Err(invalid(
                "crash.house_edge_percent",
                crash.house_edge_percent,
                "House edge must be in [0, 100)",
            ));
        }
        if crash.max_crash_point < Decimal::ONE {
            return Err(invalid(
                "crash.max_crash_point",
                crash.max_crash_point,
                "Maximum crash point cannot be below 1.00",
            ));
        }
        if crash.growth_rate_per_sec <= Decimal::ZERO {
            return Err(invalid(
                "crash.growth_rate_per_sec",
                crash.growth_rate_per_sec,
                "Growth rate must be positive",
            ));
        }
        if crash.tick_interval_ms == 0 {
            return Err(invalid("crash.tick_interval_ms", 0, "Tick interval cannot be zero"));
        }
        if crash.max_bets_per_player == 0 {
            return Err(invalid(
                "crash.max_bets_per_player",
                0,
                "At least one bet per round is required",
            ));
        }
        if crash.min_auto_cashout <= Decimal::ONE {
            return Err(invalid(
                "crash.min_auto_cashout",
                crash.min_auto_cashout,
                "Auto-cashout minimum must exceed 1.00",
            ));
        }

        if config.seeds.server_seed_bytes < 16 {
            return Err(invalid(
                "seeds.server_seed_bytes",
                config.seeds.server_seed_bytes,
                "Server seed needs at least 16 bytes",
            ));
        }
        if config.seeds.client_seed_bytes == 0 {
            return Err(ConfigurationError::MissingRequired("seeds.client_seed_bytes".to_string()).into());
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, config: &FairPlayConfig, path: &str) -> FairPlayResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into())
    }
}

fn env_parse<T: FromStr>(key: &str, reason: &str) -> FairPlayResult<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(key, raw, reason)),
        Err(_) => Ok(None),
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> crate::errors::FairPlayError {
    ConfigurationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// Builder pattern for creating configurations
pub struct ConfigBuilder {
    config: FairPlayConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: FairPlayConfig::default(),
        }
    }

    pub fn limits(mut self, limits: LimitsConfig) -> Self {
        self.config.limits = limits;
        self
    }

    pub fn crash(mut self, crash: CrashConfig) -> Self {
        self.config.crash = crash;
        self
    }

    pub fn seeds(mut self, seeds: SeedConfig) -> Self {
        self.config.seeds = seeds;
        self
    }

    pub fn build(self) -> FairPlayConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a sample configuration file
pub fn generate_sample_config(path: &str) -> FairPlayResult<()> {
    ConfigLoader::new().save(&FairPlayConfig::default(), path)
}
