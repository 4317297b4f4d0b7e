//! Settlement engine
//!
//! The only place a user's balance and round counters change. Every function
//! here computes the new values into locals with checked arithmetic and
//! assigns them to the user only once nothing can fail, so an error leaves
//! the account exactly as it was.

use crate::errors::{CasinoError, CasinoResult};
use crate::games::types::{Evaluation, GameType};
use crate::ledger::types::User;
use serde::{Deserialize, Serialize};

/// How a stake is accounted for when a round settles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMode {
    /// Debit the stake, then credit `stake * multiplier` on a win
    #[default]
    DebitThenCredit,
    /// Credit `stake * multiplier` on a win, leave the balance alone on a loss
    AdditiveCredit,
}

impl SettlementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementMode::DebitThenCredit => "debit_then_credit",
            SettlementMode::AdditiveCredit => "additive_credit",
        }
    }
}

impl std::str::FromStr for SettlementMode {
    type Err = CasinoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "debit_then_credit" => Ok(SettlementMode::DebitThenCredit),
            "additive_credit" | "additive" => Ok(SettlementMode::AdditiveCredit),
            other => Err(CasinoError::Configuration(format!(
                "unknown settlement mode '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for SettlementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Balance movement produced by one settled round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub balance_before: u64,
    pub balance_after: u64,
    /// Chips credited on a win, 0 on a loss
    pub payout: u64,
}

/// Settle one round of `game` for `user`.
///
/// Fails with `Validation` for a zero stake and `InsufficientFunds` when the
/// stake exceeds the balance; in both cases nothing is changed.
pub fn settle(
    user: &mut User,
    game: GameType,
    stake: u64,
    evaluation: &Evaluation,
    mode: SettlementMode,
) -> CasinoResult<Settlement> {
    if stake == 0 {
        return Err(CasinoError::Validation("stake must be positive".to_string()));
    }

    let balance_before = user.fichas;
    if stake > balance_before {
        return Err(CasinoError::InsufficientFunds {
            requested: stake,
            available: balance_before,
        });
    }

    let payout = if evaluation.won {
        stake
            .checked_mul(evaluation.multiplier)
            .ok_or_else(|| overflow("payout"))?
    } else {
        0
    };

    let after_debit = match mode {
        SettlementMode::DebitThenCredit => balance_before - stake,
        SettlementMode::AdditiveCredit => balance_before,
    };
    let balance_after = after_debit
        .checked_add(payout)
        .ok_or_else(|| overflow("balance"))?;

    let game_count = user
        .stats
        .count(game)
        .checked_add(1)
        .ok_or_else(|| overflow("round counter"))?;
    let total = user
        .stats
        .partidas_totales
        .checked_add(1)
        .ok_or_else(|| overflow("round counter"))?;

    user.fichas = balance_after;
    user.stats.per_game.insert(game.as_str().to_string(), game_count);
    user.stats.partidas_totales = total;

    Ok(Settlement {
        balance_before,
        balance_after,
        payout,
    })
}

/// Bank top-up: add `amount` chips without touching round counters
pub fn credit_deposit(user: &mut User, amount: u64) -> CasinoResult<Settlement> {
    if amount == 0 {
        return Err(CasinoError::Validation("amount must be positive".to_string()));
    }

    let balance_before = user.fichas;
    let balance_after = balance_before
        .checked_add(amount)
        .ok_or_else(|| overflow("balance"))?;
    user.fichas = balance_after;

    Ok(Settlement {
        balance_before,
        balance_after,
        payout: amount,
    })
}

fn overflow(what: &str) -> CasinoError {
    CasinoError::Validation(format!("{} overflow", what))
}
