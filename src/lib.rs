//! CancinHub - virtual casino service
//!
//! Chip accounts, four betting games (dice, roulette, horse race, slots),
//! a bank top-up, and per-user round history with aggregate statistics.
//! Every bet settles atomically against a single-writer ledger that is
//! persisted as JSON after each mutation.

pub mod api;
pub mod casino;
pub mod config;
pub mod errors;
pub mod games;
pub mod ledger;
pub mod settlement;
pub mod stats;

pub use casino::Casino;
pub use config::{CasinoConfig, ConfigLoader};
pub use errors::{CasinoError, CasinoResult, StorageError};
pub use ledger::{JsonFileStore, Ledger, LedgerStore, MemoryStore};
pub use settlement::SettlementMode;
