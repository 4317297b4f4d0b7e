//! Persisted ledger records
//!
//! Field names follow the on-disk JSON format (`users.json`,
//! `historial.json`) so existing ledgers load unchanged.

use crate::games::types::{GameType, RoundResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type UserId = String;

/// Map of user id to account
pub type UserLedger = BTreeMap<UserId, User>;

/// Map of user id to that user's rounds
pub type HistoryLedger = BTreeMap<UserId, UserHistory>;

/// Round counters; `partidas_totales` is always the sum of the per-game counts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserStats {
    pub partidas_totales: u64,
    #[serde(flatten)]
    pub per_game: BTreeMap<String, u64>,
}

impl UserStats {
    pub fn new() -> Self {
        Self {
            partidas_totales: 0,
            per_game: GameType::ALL
                .iter()
                .map(|game| (game.as_str().to_string(), 0))
                .collect(),
        }
    }

    pub fn count(&self, game: GameType) -> u64 {
        self.per_game.get(game.as_str()).copied().unwrap_or(0)
    }

    pub fn is_consistent(&self) -> bool {
        self.per_game.values().sum::<u64>() == self.partidas_totales
    }
}

impl Default for UserStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Player account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Key of the persisted map, restored on load
    #[serde(skip)]
    pub id: UserId,
    pub nombre: String,
    pub contrasena: String,
    pub fichas: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_nacimiento: Option<String>,
    #[serde(default)]
    pub fecha_registro: String,
    #[serde(default)]
    pub stats: UserStats,
}

impl User {
    pub fn new(id: UserId, nombre: String, contrasena: String, fichas: u64) -> Self {
        Self {
            id,
            nombre,
            contrasena,
            fichas,
            fecha_nacimiento: None,
            fecha_registro: Utc::now().format("%a %b %e %H:%M:%S %Y").to_string(),
            stats: UserStats::new(),
        }
    }

    pub fn password_matches(&self, candidate: &str) -> bool {
        self.contrasena == candidate
    }
}

/// Immutable record of one round or bank operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameRound {
    #[serde(rename = "usuario")]
    pub user_id: UserId,
    #[serde(rename = "juego")]
    pub game: String,
    #[serde(rename = "apuesta")]
    pub stake: u64,
    #[serde(rename = "detalles")]
    pub details: String,
    #[serde(rename = "resultado")]
    pub result: RoundResult,
    #[serde(rename = "ganancia")]
    pub payout: u64,
    #[serde(rename = "fichas_antes")]
    pub balance_before: u64,
    #[serde(rename = "fichas_despues")]
    pub balance_after: u64,
    #[serde(rename = "fecha", default)]
    pub timestamp: DateTime<Utc>,
}

impl GameRound {
    pub fn is_game(&self, name: &str) -> bool {
        self.game.eq_ignore_ascii_case(name)
    }
}

/// A user's rounds, newest first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UserHistory {
    pub usuario: String,
    pub partidas: Vec<GameRound>,
}

/// Restore map keys into the `id` field after deserialization
pub fn attach_ids(users: &mut UserLedger) {
    for (id, user) in users.iter_mut() {
        user.id = id.clone();
    }
}
