pub mod types;
pub mod payout;
pub mod randomizer;
pub mod processor;

pub use types::*;
pub use payout::{evaluate, PayoutTable};
pub use randomizer::{Randomizer, ScriptedRandomizer, SeededRandomizer, ThreadRandomizer};
pub use processor::{GameProcessor, RoundResolution};
