//! FairPlay - provably fair game outcome engine
//!
//! Every outcome is a pure function of a committed server seed, a client seed and a
//! nonce. The server publishes SHA-256(server seed) before play and reveals the seed
//! afterwards, so any finished game can be recomputed independently.
//!
//! Games: Mines, Plinko, Dice, Slots and multiplayer Crash rounds.

pub mod config;
pub mod errors;
pub mod games;
pub mod processor;
pub mod round_runner;
pub mod simulation;
pub mod store;
pub mod verification;
pub mod wallet;

pub use config::{ConfigBuilder, ConfigLoader, FairPlayConfig};
pub use errors::{FairPlayError, FairPlayResult, ValidationError};
pub use games::{GameOutcome, GameParams, GameType, SeedTriple, ServerSeed};
pub use processor::{GameProcessor, GameResolution, Resolution, RevealStep};
pub use round_runner::{RoundEvent, RoundRunner};
pub use simulation::{simulate, SimulatedGame, SimulationReport};
pub use store::{GameRecord, GameStatus, GameStore, InMemoryGameStore};
pub use verification::{verify, verify_strict, GameInfo, VerificationReport, Verifier};
pub use wallet::{InMemoryWallet, Wallet};
