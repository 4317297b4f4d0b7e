//! Payout rules
//!
//! Maps a validated bet and a round outcome onto a win/lose decision and a
//! multiplier. All ratios come from [`PayoutTable`] so they can be tuned in the
//! configuration file and exercised in isolation.

use crate::errors::{CasinoError, CasinoResult};
use crate::games::types::{Bet, DiceBet, Evaluation, Outcome, RouletteBet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiceTable {
    pub face_multiplier: u64,
    pub range_multiplier: u64,
}

impl Default for DiceTable {
    fn default() -> Self {
        Self {
            face_multiplier: 2,
            range_multiplier: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouletteTable {
    pub straight_multiplier: u64,
    pub even_money_multiplier: u64,
}

impl Default for RouletteTable {
    fn default() -> Self {
        Self {
            straight_multiplier: 36,
            even_money_multiplier: 2,
        }
    }
}

/// A competitor in the horse race; every horse has the same chance to win
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HorseConfig {
    pub name: String,
    pub odds: u64,
}

impl HorseConfig {
    fn new(name: &str, odds: u64) -> Self {
        Self {
            name: name.to_string(),
            odds,
        }
    }
}

/// Multiplier granted when the leading run covers at least `run` reels
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotTier {
    pub run: usize,
    pub multiplier: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotTable {
    pub symbols: Vec<String>,
    pub reels: usize,
    pub jackpot_symbol: String,
    pub jackpot_multiplier: u64,
    pub tiers: Vec<SlotTier>,
}

impl Default for SlotTable {
    fn default() -> Self {
        Self {
            symbols: ["🍒", "🍋", "🔔", "⭐", "7"].iter().map(|s| s.to_string()).collect(),
            reels: 3,
            jackpot_symbol: "7".to_string(),
            jackpot_multiplier: 10,
            tiers: vec![
                SlotTier { run: 2, multiplier: 2 },
                SlotTier { run: 3, multiplier: 5 },
            ],
        }
    }
}

/// Complete payout configuration for every game
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayoutTable {
    pub dice: DiceTable,
    pub roulette: RouletteTable,
    pub horses: Vec<HorseConfig>,
    pub slots: SlotTable,
}

impl Default for PayoutTable {
    fn default() -> Self {
        Self {
            dice: DiceTable::default(),
            roulette: RouletteTable::default(),
            horses: vec![
                HorseConfig::new("Tamamo Cross", 3),
                HorseConfig::new("Oguri Cap", 2),
                HorseConfig::new("Special Week", 2),
                HorseConfig::new("Silence Suzuka", 3),
                HorseConfig::new("Gold Ship", 3),
            ],
            slots: SlotTable::default(),
        }
    }
}

impl PayoutTable {
    /// Find a horse by its 1-based key or by name (case-insensitive)
    pub fn find_horse(&self, choice: &str) -> Option<usize> {
        let choice = choice.trim();
        if let Ok(key) = choice.parse::<usize>() {
            return (1..=self.horses.len()).contains(&key).then(|| key - 1);
        }
        self.horses
            .iter()
            .position(|horse| horse.name.eq_ignore_ascii_case(choice))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.horses.len() < 2 {
            return Err("at least two horses are required".to_string());
        }
        if let Some(horse) = self.horses.iter().find(|h| h.odds < 2) {
            return Err(format!("horse '{}' must pay at least 2x", horse.name));
        }
        if self.slots.symbols.len() < 2 {
            return Err("slot machine needs at least two symbols".to_string());
        }
        if self.slots.reels < 2 {
            return Err("slot machine needs at least two reels".to_string());
        }
        if self.slots.tiers.iter().any(|t| t.run < 2 || t.run > self.slots.reels) {
            return Err("slot tiers must cover between 2 and `reels` symbols".to_string());
        }
        if self.roulette.straight_multiplier < 2 || self.roulette.even_money_multiplier < 2 {
            return Err("roulette multipliers must be at least 2".to_string());
        }
        if self.dice.face_multiplier < 2 || self.dice.range_multiplier < 2 {
            return Err("dice multipliers must be at least 2".to_string());
        }
        Ok(())
    }
}

/// Decide the round for `bet` given `outcome`
pub fn evaluate(bet: &Bet, outcome: &Outcome, table: &PayoutTable) -> CasinoResult<Evaluation> {
    let evaluation = match (bet, outcome) {
        (Bet::Dice(choice), Outcome::Dice { face }) => {
            if choice.covers(*face) {
                let multiplier = match choice {
                    DiceBet::Face(_) => table.dice.face_multiplier,
                    _ => table.dice.range_multiplier,
                };
                Evaluation::win(multiplier)
            } else {
                Evaluation::loss()
            }
        }
        (Bet::Roulette(choice), Outcome::Roulette { pocket }) => {
            if choice.covers(*pocket) {
                let multiplier = match choice {
                    RouletteBet::Straight(_) => table.roulette.straight_multiplier,
                    _ => table.roulette.even_money_multiplier,
                };
                Evaluation::win(multiplier)
            } else {
                Evaluation::loss()
            }
        }
        (Bet::HorseRace { horse }, Outcome::HorseRace { winner }) => {
            let config = table.horses.get(*horse).ok_or_else(|| {
                CasinoError::InvalidChoice(format!("no horse with index {}", horse))
            })?;
            if horse == winner {
                Evaluation::win(config.odds)
            } else {
                Evaluation::loss()
            }
        }
        (Bet::Slots, Outcome::Slots { reels }) => evaluate_reels(reels, &table.slots),
        (bet, outcome) => {
            return Err(CasinoError::InvalidChoice(format!(
                "{} bet cannot be settled against a {} outcome",
                bet.game(),
                outcome.game()
            )))
        }
    };

    Ok(evaluation)
}

/// Length of the run of identical symbols starting at the first reel
pub fn leading_run(reels: &[String]) -> usize {
    match reels.first() {
        Some(first) => reels.iter().take_while(|symbol| *symbol == first).count(),
        None => 0,
    }
}

fn evaluate_reels(reels: &[String], table: &SlotTable) -> Evaluation {
    let run = leading_run(reels);

    if run == reels.len() && reels.first() == Some(&table.jackpot_symbol) {
        return Evaluation::win(table.jackpot_multiplier);
    }

    table
        .tiers
        .iter()
        .filter(|tier| tier.run <= run)
        .max_by_key(|tier| tier.run)
        .map(|tier| Evaluation::win(tier.multiplier))
        .unwrap_or_else(Evaluation::loss)
}
