use crate::errors::{CasinoError, CasinoResult};
use crate::games::payout::{evaluate, PayoutTable};
use crate::games::randomizer::Randomizer;
use crate::games::types::{Bet, BetChoice, DiceBet, Evaluation, Outcome, RouletteBet};
use tracing::debug;

/// Everything known about a round once its outcome is decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResolution {
    pub bet: Bet,
    pub outcome: Outcome,
    pub evaluation: Evaluation,
    pub details: String,
}

/// Validates player choices and resolves rounds against the payout table
pub struct GameProcessor {
    table: PayoutTable,
}

impl GameProcessor {
    pub fn new(table: PayoutTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PayoutTable {
        &self.table
    }

    pub fn dice_bet(&self, choice: &str) -> CasinoResult<Bet> {
        DiceBet::parse(choice).map(Bet::Dice)
    }

    pub fn roulette_bet(&self, bet_type: &str, number: Option<i64>) -> CasinoResult<Bet> {
        RouletteBet::parse(bet_type, number).map(Bet::Roulette)
    }

    pub fn horse_bet(&self, choice: &str) -> CasinoResult<Bet> {
        self.table
            .find_horse(choice)
            .map(|horse| Bet::HorseRace { horse })
            .ok_or_else(|| {
                CasinoError::InvalidChoice(format!("horse '{}' is not running today", choice.trim()))
            })
    }

    pub fn slots_bet(&self) -> Bet {
        Bet::Slots
    }

    /// Validate a raw choice into a playable bet
    pub fn resolve(&self, choice: BetChoice) -> CasinoResult<Bet> {
        match choice {
            BetChoice::Dice(choice) => self.dice_bet(&choice),
            BetChoice::HorseRace(choice) => self.horse_bet(&choice),
            BetChoice::Roulette { bet_type, number } => self.roulette_bet(&bet_type, number),
            BetChoice::Slots => Ok(self.slots_bet()),
            BetChoice::Resolved(bet) => Ok(bet),
        }
    }

    /// Roll and evaluate one round
    pub fn play(&self, bet: &Bet, randomizer: &mut dyn Randomizer) -> CasinoResult<RoundResolution> {
        let outcome = randomizer.roll(bet.game(), &self.table);
        let evaluation = evaluate(bet, &outcome, &self.table)?;
        debug!("{} round: {:?} -> {:?}", bet.game(), outcome, evaluation);

        Ok(RoundResolution {
            details: self.describe(bet, &outcome),
            bet: bet.clone(),
            outcome,
            evaluation,
        })
    }

    /// Human-readable description stored in the round history
    pub fn describe(&self, bet: &Bet, outcome: &Outcome) -> String {
        match (bet, outcome) {
            (Bet::Dice(choice), Outcome::Dice { face }) => {
                let chosen = match choice {
                    DiceBet::Face(n) => n.to_string(),
                    DiceBet::Low => "bajo (1-3)".to_string(),
                    DiceBet::High => "alto (4-6)".to_string(),
                };
                format!("Eleccion: {} | Dado: {}", chosen, face)
            }
            (Bet::Roulette(choice), Outcome::Roulette { pocket }) => {
                format!("Apuesta: {} | Salio: {}", choice, pocket)
            }
            (Bet::HorseRace { horse }, Outcome::HorseRace { winner }) => {
                format!(
                    "Caballo: {} | Ganador: {}",
                    self.horse_name(*horse),
                    self.horse_name(*winner)
                )
            }
            (_, Outcome::Slots { reels }) => format!("Rodillos: [{}]", reels.join(" | ")),
            (bet, outcome) => format!("{:?} / {:?}", bet, outcome),
        }
    }

    fn horse_name(&self, index: usize) -> &str {
        self.table
            .horses
            .get(index)
            .map(|h| h.name.as_str())
            .unwrap_or("?")
    }
}
