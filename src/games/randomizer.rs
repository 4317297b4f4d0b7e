//! Round outcome generation from a uniform random source

use crate::games::payout::PayoutTable;
use crate::games::types::{GameType, Outcome, MAX_POCKET};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::VecDeque;

/// Produces the outcome of a single round
pub trait Randomizer: Send {
    fn roll(&mut self, game: GameType, table: &PayoutTable) -> Outcome;
}

/// Draw an outcome for `game` from any RNG
pub fn roll_with<R: Rng + ?Sized>(rng: &mut R, game: GameType, table: &PayoutTable) -> Outcome {
    match game {
        GameType::Dice => Outcome::Dice {
            face: rng.gen_range(1..=6),
        },
        GameType::Roulette => Outcome::Roulette {
            pocket: rng.gen_range(0..=MAX_POCKET),
        },
        GameType::HorseRace => Outcome::HorseRace {
            winner: rng.gen_range(0..table.horses.len()),
        },
        GameType::Slots => Outcome::Slots {
            reels: (0..table.slots.reels)
                .map(|_| table.slots.symbols[rng.gen_range(0..table.slots.symbols.len())].clone())
                .collect(),
        },
    }
}

/// Production randomizer backed by the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandomizer;

impl Randomizer for ThreadRandomizer {
    fn roll(&mut self, game: GameType, table: &PayoutTable) -> Outcome {
        roll_with(&mut rand::thread_rng(), game, table)
    }
}

/// Reproducible randomizer for simulations and tests
pub struct SeededRandomizer {
    rng: StdRng,
}

impl SeededRandomizer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Randomizer for SeededRandomizer {
    fn roll(&mut self, game: GameType, table: &PayoutTable) -> Outcome {
        roll_with(&mut self.rng, game, table)
    }
}

/// Replays queued outcomes; falls back to a seeded RNG once the queue is
/// exhausted or when the next queued outcome belongs to another game.
pub struct ScriptedRandomizer {
    queued: VecDeque<Outcome>,
    fallback: SeededRandomizer,
}

impl ScriptedRandomizer {
    pub fn new(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        Self {
            queued: outcomes.into_iter().collect(),
            fallback: SeededRandomizer::new(0),
        }
    }
}

impl Randomizer for ScriptedRandomizer {
    fn roll(&mut self, game: GameType, table: &PayoutTable) -> Outcome {
        match self.queued.front() {
            Some(next) if next.game() == game => match self.queued.pop_front() {
                Some(outcome) => outcome,
                None => self.fallback.roll(game, table),
            },
            _ => self.fallback.roll(game, table),
        }
    }
}
