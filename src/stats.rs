//! Statistics aggregation over a user's round history
//!
//! Everything here is a pure scan over a borrowed slice of rounds (newest
//! first). Callers clone the history out of the ledger and aggregate without
//! holding any lock.

use crate::games::types::RoundResult;
use crate::ledger::history;
use crate::ledger::types::GameRound;
use serde::{Serialize, Serializer};
use std::fmt;

/// Number of most recent rounds inspected for the streak
pub const STREAK_WINDOW: usize = 5;

/// Label used when there is no round to pick a favorite from
pub const NO_FAVORITE: &str = "none";

/// Which rounds to consider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Case-insensitive game name filter
    pub game: Option<String>,
    /// Keep only the first `limit` matches; `limit <= 0` keeps all
    pub limit: i64,
}

impl HistoryQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_game(game: impl Into<String>) -> Self {
        Self {
            game: Some(game.into()),
            limit: 0,
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    fn matches(&self, round: &GameRound) -> bool {
        self.game.as_deref().map_or(true, |game| round.is_game(game))
    }
}

/// Result pattern of the most recent rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Streak {
    None,
    Winning(usize),
    Losing(usize),
    Mixed,
}

impl Streak {
    /// Classify the first [`STREAK_WINDOW`] rounds of `rounds`
    pub fn of(rounds: &[GameRound]) -> Self {
        let window = &rounds[..rounds.len().min(STREAK_WINDOW)];
        if window.is_empty() {
            return Streak::None;
        }

        if window.iter().all(|r| r.result == RoundResult::Won) {
            Streak::Winning(window.len())
        } else if window.iter().all(|r| r.result == RoundResult::Lost) {
            Streak::Losing(window.len())
        } else {
            Streak::Mixed
        }
    }
}

impl fmt::Display for Streak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Streak::None => f.write_str("none"),
            Streak::Winning(k) => write!(f, "winning streak of {}", k),
            Streak::Losing(k) => write!(f, "losing streak of {}", k),
            Streak::Mixed => f.write_str("mixed"),
        }
    }
}

impl Serialize for Streak {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Aggregate figures for a set of rounds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    #[serde(rename = "total_partidas")]
    pub total_rounds: usize,
    #[serde(rename = "partidas_ganadas")]
    pub won: usize,
    #[serde(rename = "partidas_perdidas")]
    pub lost: usize,
    #[serde(rename = "tasa_victoria")]
    pub win_rate: f64,
    #[serde(rename = "total_ganado")]
    pub total_won: u64,
    #[serde(rename = "total_perdido")]
    pub total_lost: u64,
    #[serde(rename = "balance_total")]
    pub balance: i64,
    #[serde(rename = "juego_favorito")]
    pub favorite_game: String,
    #[serde(rename = "racha_actual")]
    pub streak: Streak,
}

/// The filtered, truncated page of rounds described by `query`
pub fn select(rounds: &[GameRound], query: &HistoryQuery) -> Vec<GameRound> {
    let filtered: Vec<GameRound> = rounds.iter().filter(|r| query.matches(r)).cloned().collect();
    history::recent(&filtered, query.limit).to_vec()
}

/// Aggregate the rounds selected by `query`.
///
/// The favorite game is always computed over the whole of `rounds`; every
/// other figure only covers the selected page.
pub fn aggregate(rounds: &[GameRound], query: &HistoryQuery) -> Stats {
    let considered = select(rounds, query);

    let mut won = 0usize;
    let mut lost = 0usize;
    let mut total_won = 0u64;
    let mut total_lost = 0u64;

    for round in &considered {
        match round.result {
            RoundResult::Won => {
                won += 1;
                total_won = total_won.saturating_add(round.payout);
            }
            RoundResult::Lost => {
                lost += 1;
                total_lost = total_lost.saturating_add(round.stake);
            }
        }
    }

    let win_rate = if considered.is_empty() {
        0.0
    } else {
        round_to_cents(won as f64 / considered.len() as f64 * 100.0)
    };

    Stats {
        total_rounds: considered.len(),
        won,
        lost,
        win_rate,
        total_won,
        total_lost,
        balance: signed(total_won).saturating_sub(signed(total_lost)),
        favorite_game: favorite_game(rounds),
        streak: Streak::of(&considered),
    }
}

/// Most played game; ties go to the game seen first in scan order
pub fn favorite_game(rounds: &[GameRound]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for round in rounds {
        match counts.iter_mut().find(|(game, _)| *game == round.game) {
            Some((_, n)) => *n += 1,
            None => counts.push((round.game.as_str(), 1)),
        }
    }

    let mut favorite: Option<(&str, usize)> = None;
    for (game, n) in counts {
        if favorite.map_or(true, |(_, best)| n > best) {
            favorite = Some((game, n));
        }
    }

    favorite
        .map(|(game, _)| game.to_string())
        .unwrap_or_else(|| NO_FAVORITE.to_string())
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
