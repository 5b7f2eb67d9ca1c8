pub mod crash;
pub mod dice;
pub mod mines;
pub mod payout;
pub mod plinko;
pub mod round;
pub mod seed;
pub mod selector;
pub mod slots;
pub mod types;

pub use payout::{derive_crash, derive_outcome, settle, PayoutRule, Settlement};
pub use round::{CrashRound, RoundInfo, RoundReveal, RoundState};
pub use seed::{RandomStream, SeedCommitment, SeedTriple, ServerSeed};
pub use types::*;
