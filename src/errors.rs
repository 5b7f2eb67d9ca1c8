//! Error types for the fairplay engine
//!
//! Every failure here is local to a single game or round and is never retried.

use rust_decimal::Decimal;
use thiserror::Error;

/// Root error type for all fairplay operations
#[derive(Debug, Error)]
pub enum FairPlayError {
    /// Malformed or out-of-range parameters
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The wallet refused to reserve the stake
    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Decimal, required: Decimal },

    /// Operation requested in the wrong lifecycle state
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// Recomputed outcome diverges from the claimed one
    #[error("Verification mismatch on field '{field}': expected {expected}, claimed {claimed}")]
    VerificationMismatch {
        field: String,
        expected: String,
        claimed: String,
    },

    /// Unknown game, round or bet identifier
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Parameter validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Bet amount {amount} outside [{min}, {max}]")]
    BetOutOfRange {
        amount: Decimal,
        min: Decimal,
        max: Decimal,
    },

    #[error("Mine count must be between 3 and 20, got {0}")]
    MineCount(u8),

    #[error("Row count must be between 12 and 16, got {0}")]
    RowCount(u8),

    #[error("Dice guess must be between 1 and 6, got {0}")]
    DiceFace(u8),

    #[error("Reel count must be 3 or 5, got {0}")]
    ReelCount(u8),

    #[error("Cell ({row}, {col}) is outside the 5x5 grid")]
    CellOutOfGrid { row: u8, col: u8 },

    #[error("Cell ({row}, {col}) already opened")]
    CellAlreadyOpened { row: u8, col: u8 },

    #[error("Auto-cashout target {target} below minimum {min}")]
    AutoCashoutTarget { target: Decimal, min: Decimal },

    #[error("Unknown {kind}: '{value}'")]
    Unknown { kind: &'static str, value: String },

    #[error("{0}")]
    Other(String),
}

/// Configuration and validation errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Missing required field: {0}")]
    MissingRequired(String),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),
}

impl FairPlayError {
    pub fn illegal_state(msg: impl Into<String>) -> Self {
        FairPlayError::IllegalState(msg.into())
    }

    pub fn mismatch(
        field: impl Into<String>,
        expected: impl std::fmt::Debug,
        claimed: impl std::fmt::Debug,
    ) -> Self {
        FairPlayError::VerificationMismatch {
            field: field.into(),
            expected: format!("{:?}", expected),
            claimed: format!("{:?}", claimed),
        }
    }
}

impl From<toml::de::Error> for FairPlayError {
    fn from(e: toml::de::Error) -> Self {
        FairPlayError::Configuration(ConfigurationError::LoadFailed(e.to_string()))
    }
}

impl From<std::io::Error> for FairPlayError {
    fn from(e: std::io::Error) -> Self {
        FairPlayError::Configuration(ConfigurationError::LoadFailed(e.to_string()))
    }
}

impl From<serde_json::Error> for FairPlayError {
    fn from(e: serde_json::Error) -> Self {
        FairPlayError::Validation(ValidationError::Other(format!("Invalid JSON: {}", e)))
    }
}

/// Convenience type alias for Results
pub type FairPlayResult<T> = Result<T, FairPlayError>;
