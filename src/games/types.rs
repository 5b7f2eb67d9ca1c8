use crate::errors::ValidationError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported game types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Mines,
    Plinko,
    Dice,
    Slots,
    Crash,
}

impl GameType {
    pub const ALL: [GameType; 5] = [
        GameType::Mines,
        GameType::Plinko,
        GameType::Dice,
        GameType::Slots,
        GameType::Crash,
    ];
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::Mines => write!(f, "mines"),
            GameType::Plinko => write!(f, "plinko"),
            GameType::Dice => write!(f, "dice"),
            GameType::Slots => write!(f, "slots"),
            GameType::Crash => write!(f, "crash"),
        }
    }
}

impl FromStr for GameType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameType::ALL
            .into_iter()
            .find(|g| g.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::Unknown {
                kind: "game type",
                value: s.to_string(),
            })
    }
}

/// Plinko risk tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

impl FromStr for RiskLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(ValidationError::Unknown {
                kind: "risk level",
                value: s.to_string(),
            }),
        }
    }
}

/// Reel symbols, ordered from lowest to highest value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SlotSymbol {
    Cherry,
    Lemon,
    Orange,
    Star,
    Bell,
    Seven,
}

impl SlotSymbol {
    pub const ALL: [SlotSymbol; 6] = [
        SlotSymbol::Cherry,
        SlotSymbol::Lemon,
        SlotSymbol::Orange,
        SlotSymbol::Star,
        SlotSymbol::Bell,
        SlotSymbol::Seven,
    ];

    pub fn emoji(&self) -> &'static str {
        match self {
            SlotSymbol::Cherry => "🍒",
            SlotSymbol::Lemon => "🍋",
            SlotSymbol::Orange => "🍊",
            SlotSymbol::Star => "⭐",
            SlotSymbol::Bell => "🔔",
            SlotSymbol::Seven => "7️⃣",
        }
    }
}

impl fmt::Display for SlotSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.emoji())
    }
}

impl FromStr for SlotSymbol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SlotSymbol::ALL
            .into_iter()
            .find(|sym| {
                sym.emoji() == s || format!("{:?}", sym).eq_ignore_ascii_case(s) || (s == "7" && *sym == SlotSymbol::Seven)
            })
            .ok_or_else(|| ValidationError::Unknown {
                kind: "slot symbol",
                value: s.to_string(),
            })
    }
}

/// Number of reels in a slots spin
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub enum ReelCount {
    Three,
    Five,
}

impl ReelCount {
    pub fn count(self) -> usize {
        match self {
            ReelCount::Three => 3,
            ReelCount::Five => 5,
        }
    }
}

impl TryFrom<u8> for ReelCount {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(ReelCount::Three),
            5 => Ok(ReelCount::Five),
            other => Err(ValidationError::ReelCount(other)),
        }
    }
}

impl From<ReelCount> for u8 {
    fn from(value: ReelCount) -> Self {
        value.count() as u8
    }
}

/// One Plinko peg decision
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

/// Player-chosen parameters for a single game instance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum GameParams {
    Mines { mine_count: u8 },
    Plinko { rows: u8, risk: RiskLevel },
    Dice { guess: u8 },
    Slots { reels: ReelCount },
}

impl GameParams {
    pub fn game_type(&self) -> GameType {
        match self {
            GameParams::Mines { .. } => GameType::Mines,
            GameParams::Plinko { .. } => GameType::Plinko,
            GameParams::Dice { .. } => GameType::Dice,
            GameParams::Slots { .. } => GameType::Slots,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            GameParams::Mines { mine_count } => crate::games::mines::validate_mine_count(mine_count),
            GameParams::Plinko { rows, .. } => crate::games::plinko::validate_rows(rows),
            GameParams::Dice { guess } => crate::games::dice::validate_guess(guess),
            GameParams::Slots { .. } => Ok(()),
        }
    }

    /// Single-shot games settle without intermediate player input
    pub fn is_instant(&self) -> bool {
        !matches!(self, GameParams::Mines { .. })
    }
}

/// Mines board state: fixed mine layout plus the player's progress
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MinesOutcome {
    pub mine_count: u8,
    /// Mine cell indices (row * 5 + col) in shuffle order
    pub mines: Vec<u8>,
    /// Safe cells opened so far, in reveal order
    pub opened: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hit_mine: Option<u8>,
    pub multiplier: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlinkoOutcome {
    pub rows: u8,
    pub risk: RiskLevel,
    pub path: Vec<Direction>,
    pub bucket: u8,
    pub multiplier: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiceOutcome {
    pub guess: u8,
    pub roll: u8,
    pub won: bool,
    pub multiplier: Decimal,
}

/// Which slots rule paid out
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "rule", content = "symbol", rename_all = "snake_case")]
pub enum SlotWin {
    ThreeOfAKind(SlotSymbol),
    FiveOfAKind(SlotSymbol),
    FirstThree(SlotSymbol),
}

impl fmt::Display for SlotWin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotWin::ThreeOfAKind(s) => write!(f, "3x {}", s),
            SlotWin::FiveOfAKind(s) => write!(f, "5x {}", s),
            SlotWin::FirstThree(s) => write!(f, "3x {} on the first reels", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotsOutcome {
    pub reels: Vec<SlotSymbol>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub win: Option<SlotWin>,
    pub multiplier: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrashOutcome {
    pub crash_point: Decimal,
}

/// Revealed state of one game instance (discriminated union)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum GameOutcome {
    Mines(MinesOutcome),
    Plinko(PlinkoOutcome),
    Dice(DiceOutcome),
    Slots(SlotsOutcome),
    Crash(CrashOutcome),
}

impl GameOutcome {
    pub fn game_type(&self) -> GameType {
        match self {
            GameOutcome::Mines(_) => GameType::Mines,
            GameOutcome::Plinko(_) => GameType::Plinko,
            GameOutcome::Dice(_) => GameType::Dice,
            GameOutcome::Slots(_) => GameType::Slots,
            GameOutcome::Crash(_) => GameType::Crash,
        }
    }
}

/// Round a multiplier to display precision (two decimals, banker's rounding)
pub fn round_multiplier(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Truncate towards zero at two decimals; used where rounding up would overpay
pub fn truncate_multiplier(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

/// Stake times multiplier at currency precision
pub fn payout_amount(stake: Decimal, multiplier: Decimal) -> Decimal {
    (stake * multiplier).round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}
