use crate::errors::{CasinoError, CasinoResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported game types, serialized with the names used in the ledger files
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GameType {
    #[serde(rename = "dados")]
    Dice,
    #[serde(rename = "ruleta")]
    Roulette,
    #[serde(rename = "carreras")]
    HorseRace,
    #[serde(rename = "tragamonedas")]
    Slots,
}

impl GameType {
    pub const ALL: [GameType; 4] = [
        GameType::Dice,
        GameType::Roulette,
        GameType::HorseRace,
        GameType::Slots,
    ];

    /// Ledger name of the game
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::Dice => "dados",
            GameType::Roulette => "ruleta",
            GameType::HorseRace => "carreras",
            GameType::Slots => "tragamonedas",
        }
    }

    /// Case-insensitive lookup accepting ledger names and English aliases
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "dados" | "dice" => Some(GameType::Dice),
            "ruleta" | "roulette" => Some(GameType::Roulette),
            "carreras" | "horse_race" | "horses" => Some(GameType::HorseRace),
            "tragamonedas" | "slots" => Some(GameType::Slots),
            _ => None,
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a recorded round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RoundResult {
    #[serde(rename = "gano")]
    Won,
    #[serde(rename = "perdio")]
    Lost,
}

impl RoundResult {
    pub fn from_won(won: bool) -> Self {
        if won {
            RoundResult::Won
        } else {
            RoundResult::Lost
        }
    }
}

/// Dice bet: an exact face or one half of the die
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiceBet {
    Face(u8),
    Low,
    High,
}

impl DiceBet {
    pub fn parse(choice: &str) -> CasinoResult<Self> {
        let choice = choice.trim().to_lowercase();
        match choice.as_str() {
            "bajo" | "low" => Ok(DiceBet::Low),
            "alto" | "high" => Ok(DiceBet::High),
            other => match other.parse::<u8>() {
                Ok(face) if (1..=6).contains(&face) => Ok(DiceBet::Face(face)),
                _ => Err(CasinoError::InvalidChoice(format!(
                    "dice choice must be a face 1-6, 'bajo' or 'alto', got '{}'",
                    other
                ))),
            },
        }
    }

    pub fn covers(&self, face: u8) -> bool {
        match self {
            DiceBet::Face(chosen) => *chosen == face,
            DiceBet::Low => (1..=3).contains(&face),
            DiceBet::High => (4..=6).contains(&face),
        }
    }
}

/// Standard single-zero wheel red pockets
pub const RED_POCKETS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

pub const MAX_POCKET: u8 = 36;

/// Roulette bet classes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RouletteBet {
    Straight(u8),
    Even,
    Odd,
    Red,
    Black,
}

impl RouletteBet {
    /// Parse the bet type code ("1" number, "2" even, "3" odd) or its name
    pub fn parse(bet_type: &str, number: Option<i64>) -> CasinoResult<Self> {
        match bet_type.trim().to_lowercase().as_str() {
            "1" | "pleno" | "numero" | "number" => match number {
                Some(n) if (0..=MAX_POCKET as i64).contains(&n) => Ok(RouletteBet::Straight(n as u8)),
                Some(n) => Err(CasinoError::InvalidChoice(format!(
                    "roulette number must be between 0 and 36, got {}",
                    n
                ))),
                None => Err(CasinoError::InvalidChoice(
                    "a number between 0 and 36 is required for a straight bet".to_string(),
                )),
            },
            "2" | "pares" | "even" => Ok(RouletteBet::Even),
            "3" | "impares" | "odd" => Ok(RouletteBet::Odd),
            "rojo" | "red" => Ok(RouletteBet::Red),
            "negro" | "black" => Ok(RouletteBet::Black),
            other => Err(CasinoError::InvalidChoice(format!(
                "unknown roulette bet type '{}'",
                other
            ))),
        }
    }

    /// Zero only matches a straight bet on zero
    pub fn covers(&self, pocket: u8) -> bool {
        match self {
            RouletteBet::Straight(n) => *n == pocket,
            _ if pocket == 0 => false,
            RouletteBet::Even => pocket % 2 == 0,
            RouletteBet::Odd => pocket % 2 == 1,
            RouletteBet::Red => RED_POCKETS.contains(&pocket),
            RouletteBet::Black => !RED_POCKETS.contains(&pocket),
        }
    }
}

impl fmt::Display for RouletteBet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouletteBet::Straight(n) => write!(f, "numero {}", n),
            RouletteBet::Even => write!(f, "pares"),
            RouletteBet::Odd => write!(f, "impares"),
            RouletteBet::Red => write!(f, "rojo"),
            RouletteBet::Black => write!(f, "negro"),
        }
    }
}

/// A validated player choice for one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bet {
    Dice(DiceBet),
    Roulette(RouletteBet),
    /// Index into the configured horse list
    HorseRace { horse: usize },
    Slots,
}

impl Bet {
    pub fn game(&self) -> GameType {
        match self {
            Bet::Dice(_) => GameType::Dice,
            Bet::Roulette(_) => GameType::Roulette,
            Bet::HorseRace { .. } => GameType::HorseRace,
            Bet::Slots => GameType::Slots,
        }
    }
}

/// A player's choice as received, before it is checked against the tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BetChoice {
    Dice(String),
    HorseRace(String),
    Roulette { bet_type: String, number: Option<i64> },
    Slots,
    /// Already validated
    Resolved(Bet),
}

impl BetChoice {
    pub fn game(&self) -> GameType {
        match self {
            BetChoice::Dice(_) => GameType::Dice,
            BetChoice::HorseRace(_) => GameType::HorseRace,
            BetChoice::Roulette { .. } => GameType::Roulette,
            BetChoice::Slots => GameType::Slots,
            BetChoice::Resolved(bet) => bet.game(),
        }
    }
}

impl From<Bet> for BetChoice {
    fn from(bet: Bet) -> Self {
        BetChoice::Resolved(bet)
    }
}

/// Outcome of a single round as produced by a randomizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum Outcome {
    Dice { face: u8 },
    Roulette { pocket: u8 },
    HorseRace { winner: usize },
    Slots { reels: Vec<String> },
}

impl Outcome {
    pub fn game(&self) -> GameType {
        match self {
            Outcome::Dice { .. } => GameType::Dice,
            Outcome::Roulette { .. } => GameType::Roulette,
            Outcome::HorseRace { .. } => GameType::HorseRace,
            Outcome::Slots { .. } => GameType::Slots,
        }
    }
}

/// Win/lose decision and the payout ratio applied to the stake on a win
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub won: bool,
    pub multiplier: u64,
}

impl Evaluation {
    pub fn win(multiplier: u64) -> Self {
        Self {
            won: true,
            multiplier,
        }
    }

    pub fn loss() -> Self {
        Self {
            won: false,
            multiplier: 0,
        }
    }
}
