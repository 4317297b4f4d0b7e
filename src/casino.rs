//! Casino service
//!
//! Orchestrates one request against the ledger: credential check, funds
//! check, round resolution, settlement and history, all inside a single
//! ledger transaction so the round is applied and persisted as a unit.

use crate::api::monitoring::MetricsRegistry;
use crate::config::{AccountConfig, CasinoConfig};
use crate::errors::{CasinoError, CasinoResult};
use crate::games::{BetChoice, GameProcessor, GameType, Randomizer, RoundResult, ThreadRandomizer};
use crate::ledger::{history, GameRound, JsonFileStore, Ledger, LedgerStore, User, UserStats};
use crate::settlement::{self, SettlementMode};
use crate::stats::{self, HistoryQuery, Stats};
use chrono::{Datelike, NaiveDate, Utc};
use rand::Rng;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Game name recorded for bank top-ups
pub const BANK_GAME: &str = "banco";

/// Format accepted for birth dates
pub const BIRTH_DATE_FORMAT: &str = "%d/%m/%Y";

const MIN_USER_ID: u32 = 1000;
const MAX_USER_ID: u32 = 9999;

/// Outcome of a settled bet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BetReceipt {
    #[serde(rename = "juego")]
    pub game: GameType,
    #[serde(rename = "apuesta")]
    pub stake: u64,
    #[serde(rename = "ganado")]
    pub won: bool,
    #[serde(rename = "multiplicador")]
    pub multiplier: u64,
    #[serde(rename = "ganancia")]
    pub payout: u64,
    #[serde(rename = "fichas_antes")]
    pub balance_before: u64,
    #[serde(rename = "fichas_despues")]
    pub balance_after: u64,
    #[serde(rename = "detalles")]
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositReceipt {
    pub user_id: String,
    pub nombre: String,
    pub fichas_antes: u64,
    pub fichas_agregadas: u64,
    pub fichas_despues: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredUser {
    pub id: String,
    pub nombre: String,
    pub edad: u32,
    pub fichas: u64,
    pub fecha_nacimiento: String,
    pub fecha_registro: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub nombre: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub user_id: String,
    pub nombre: String,
    pub fichas: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    pub user_id: String,
    pub nombre: String,
    pub fichas: u64,
    pub fecha_nacimiento: String,
    pub fecha_registro: String,
    pub stats: UserStats,
}

/// One page of a user's history with figures for that page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPage {
    pub usuario: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub juego: Option<String>,
    pub total_partidas: usize,
    pub estadisticas: Stats,
    pub partidas: Vec<GameRound>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub usuario: String,
    pub fichas_actuales: u64,
    pub estadisticas: Stats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HorseEntry {
    pub clave: usize,
    pub nombre: String,
    pub cuota: u64,
}

pub struct Casino {
    ledger: Ledger,
    processor: GameProcessor,
    randomizer: Mutex<Box<dyn Randomizer>>,
    mode: SettlementMode,
    accounts: AccountConfig,
    metrics: MetricsRegistry,
}

impl Casino {
    pub fn new(ledger: Ledger, config: &CasinoConfig, metrics: MetricsRegistry) -> Self {
        Self {
            ledger,
            processor: GameProcessor::new(config.games.clone()),
            randomizer: Mutex::new(Box::new(ThreadRandomizer)),
            mode: config.settlement.mode,
            accounts: config.accounts.clone(),
            metrics,
        }
    }

    /// Open the JSON ledgers under `config.storage.data_dir`
    pub async fn open(config: &CasinoConfig, metrics: MetricsRegistry) -> CasinoResult<Self> {
        let store: Arc<dyn LedgerStore> = Arc::new(JsonFileStore::new(&config.storage.data_dir));
        let ledger = Ledger::open(store).await?;
        Ok(Self::new(ledger, config, metrics))
    }

    /// Replace the source of randomness
    pub fn with_randomizer(mut self, randomizer: Box<dyn Randomizer>) -> Self {
        self.randomizer = Mutex::new(randomizer);
        self
    }

    pub fn processor(&self) -> &GameProcessor {
        &self.processor
    }

    pub fn settlement_mode(&self) -> SettlementMode {
        self.mode
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Play one round of `choice` for `user_id` staking `stake` chips.
    ///
    /// Checks run in order: account exists, password, stake is positive,
    /// funds cover the stake, then the choice itself.
    pub async fn place_bet(
        &self,
        user_id: &str,
        password: &str,
        stake: i64,
        choice: impl Into<BetChoice>,
    ) -> CasinoResult<BetReceipt> {
        let choice = choice.into();
        let game = choice.game();
        let result = self.settle_bet(user_id, password, stake, choice).await;

        match &result {
            Ok(receipt) => {
                self.metrics
                    .record_round(game, receipt.stake, receipt.won, receipt.payout);
                info!(
                    "User {} {} {} chips on {} ({} -> {})",
                    user_id,
                    if receipt.won { "won" } else { "lost" },
                    stake,
                    game,
                    receipt.balance_before,
                    receipt.balance_after
                );
            }
            Err(CasinoError::Storage(e)) => {
                self.metrics.record_rollback();
                warn!("Bet by {} on {} rolled back: {}", user_id, game, e);
            }
            Err(e) => {
                self.metrics.record_rejected_bet();
                warn!("Bet by {} on {} rejected: {}", user_id, game, e);
            }
        }

        result
    }

    async fn settle_bet(
        &self,
        user_id: &str,
        password: &str,
        stake: i64,
        choice: BetChoice,
    ) -> CasinoResult<BetReceipt> {
        let game = choice.game();

        self.ledger
            .transact(user_id, move |user, ledger_history| {
                if !user.password_matches(password) {
                    return Err(CasinoError::Unauthorized(user.id.clone()));
                }
                let stake = positive_amount(stake, "stake")?;
                if stake > user.fichas {
                    return Err(CasinoError::InsufficientFunds {
                        requested: stake,
                        available: user.fichas,
                    });
                }
                let bet = self.processor.resolve(choice)?;

                let resolution = {
                    let mut randomizer = self.randomizer.lock().unwrap_or_else(|e| e.into_inner());
                    self.processor.play(&bet, randomizer.as_mut())?
                };
                let settled =
                    settlement::settle(user, game, stake, &resolution.evaluation, self.mode)?;

                let round = GameRound {
                    user_id: user.id.clone(),
                    game: game.as_str().to_string(),
                    stake,
                    details: resolution.details.clone(),
                    result: RoundResult::from_won(resolution.evaluation.won),
                    payout: settled.payout,
                    balance_before: settled.balance_before,
                    balance_after: settled.balance_after,
                    timestamp: Utc::now(),
                };
                history::record(ledger_history, user, round);

                Ok(BetReceipt {
                    game,
                    stake,
                    won: resolution.evaluation.won,
                    multiplier: resolution.evaluation.multiplier,
                    payout: settled.payout,
                    balance_before: settled.balance_before,
                    balance_after: settled.balance_after,
                    details: resolution.details,
                })
            })
            .await
    }

    /// Bank top-up, recorded in the history as a won `banco` round
    pub async fn deposit(
        &self,
        user_id: &str,
        password: &str,
        amount: i64,
    ) -> CasinoResult<DepositReceipt> {
        let receipt = self
            .ledger
            .transact(user_id, move |user, ledger_history| {
                if !user.password_matches(password) {
                    return Err(CasinoError::Unauthorized(user.id.clone()));
                }
                let amount = positive_amount(amount, "amount")?;
                let settled = settlement::credit_deposit(user, amount)?;

                let round = GameRound {
                    user_id: user.id.clone(),
                    game: BANK_GAME.to_string(),
                    stake: 0,
                    details: "Deposito de fondos bancarios".to_string(),
                    result: RoundResult::Won,
                    payout: amount,
                    balance_before: settled.balance_before,
                    balance_after: settled.balance_after,
                    timestamp: Utc::now(),
                };
                history::record(ledger_history, user, round);

                Ok(DepositReceipt {
                    user_id: user.id.clone(),
                    nombre: user.nombre.clone(),
                    fichas_antes: settled.balance_before,
                    fichas_agregadas: amount,
                    fichas_despues: settled.balance_after,
                })
            })
            .await;

        match &receipt {
            Ok(r) => {
                self.metrics.record_deposit(r.fichas_agregadas);
                info!("User {} deposited {} chips", user_id, r.fichas_agregadas);
            }
            Err(CasinoError::Storage(_)) => self.metrics.record_rollback(),
            Err(_) => {}
        }

        receipt
    }

    /// Create an account with the configured starting chips and a fresh id
    pub async fn register(
        &self,
        nombre: &str,
        contrasena: &str,
        fecha_nacimiento: &str,
    ) -> CasinoResult<RegisteredUser> {
        let today = Utc::now().date_naive();
        let (nombre, edad) =
            validate_registration(&self.accounts, nombre, contrasena, fecha_nacimiento, today)?;
        let starting_chips = self.accounts.starting_chips;
        let contrasena = contrasena.to_string();
        let fecha_nacimiento = fecha_nacimiento.trim().to_string();

        let user = self
            .ledger
            .insert_user(move |users| {
                let capacity = (MAX_USER_ID - MIN_USER_ID + 1) as usize;
                if users.len() >= capacity {
                    return Err(CasinoError::Validation("no user ids left".to_string()));
                }

                let mut rng = rand::thread_rng();
                let id = loop {
                    let candidate = rng.gen_range(MIN_USER_ID..=MAX_USER_ID).to_string();
                    if !users.contains_key(&candidate) {
                        break candidate;
                    }
                };

                let mut user = User::new(id, nombre, contrasena, starting_chips);
                user.fecha_nacimiento = Some(fecha_nacimiento);
                Ok(user)
            })
            .await?;

        self.metrics.record_registration();
        info!("Registered user {} ({})", user.id, user.nombre);

        Ok(RegisteredUser {
            id: user.id,
            nombre: user.nombre,
            edad,
            fichas: user.fichas,
            fecha_nacimiento: user.fecha_nacimiento.unwrap_or_default(),
            fecha_registro: user.fecha_registro,
        })
    }

    /// Look up `user_id` and check its password
    pub async fn authenticate(&self, user_id: &str, password: &str) -> CasinoResult<User> {
        let user = self
            .ledger
            .user(user_id)
            .await
            .ok_or_else(|| CasinoError::NotFound(user_id.to_string()))?;

        if !user.password_matches(password) {
            return Err(CasinoError::Unauthorized(user_id.to_string()));
        }
        Ok(user)
    }

    pub async fn balance(&self, user_id: &str, password: &str) -> CasinoResult<Balance> {
        let user = self.authenticate(user_id, password).await?;
        Ok(Balance {
            user_id: user.id,
            nombre: user.nombre,
            fichas: user.fichas,
        })
    }

    pub async fn account_info(&self, user_id: &str, password: &str) -> CasinoResult<AccountInfo> {
        let user = self.authenticate(user_id, password).await?;
        Ok(AccountInfo {
            user_id: user.id,
            nombre: user.nombre,
            fichas: user.fichas,
            fecha_nacimiento: user.fecha_nacimiento.unwrap_or_default(),
            fecha_registro: user.fecha_registro,
            stats: user.stats,
        })
    }

    /// Ids and names of every account
    pub async fn list_users(&self) -> Vec<UserSummary> {
        self.ledger
            .read(|state| {
                state
                    .users
                    .iter()
                    .map(|(id, user)| UserSummary {
                        id: id.clone(),
                        nombre: user.nombre.clone(),
                    })
                    .collect()
            })
            .await
    }

    /// The page of rounds selected by `query`, newest first
    pub async fn history(
        &self,
        user_id: &str,
        password: &str,
        query: &HistoryQuery,
    ) -> CasinoResult<HistoryPage> {
        self.authenticate(user_id, password).await?;
        let entry = self.ledger.history_of(user_id).await.unwrap_or_default();

        let matching = stats::select(&entry.partidas, &HistoryQuery {
            game: query.game.clone(),
            limit: 0,
        })
        .len();

        Ok(HistoryPage {
            usuario: entry.usuario,
            juego: query.game.clone(),
            total_partidas: matching,
            estadisticas: stats::aggregate(&entry.partidas, query),
            partidas: stats::select(&entry.partidas, query),
        })
    }

    /// Lifetime statistics over every recorded round
    pub async fn statistics(&self, user_id: &str, password: &str) -> CasinoResult<StatisticsReport> {
        let user = self.authenticate(user_id, password).await?;
        let entry = self.ledger.history_of(user_id).await.unwrap_or_default();

        Ok(StatisticsReport {
            usuario: user.nombre,
            fichas_actuales: user.fichas,
            estadisticas: stats::aggregate(&entry.partidas, &HistoryQuery::all()),
        })
    }

    pub fn horses(&self) -> Vec<HorseEntry> {
        self.processor
            .table()
            .horses
            .iter()
            .enumerate()
            .map(|(i, horse)| HorseEntry {
                clave: i + 1,
                nombre: horse.name.clone(),
                cuota: horse.odds,
            })
            .collect()
    }
}

fn positive_amount(value: i64, what: &str) -> CasinoResult<u64> {
    u64::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| CasinoError::Validation(format!("{} must be greater than 0", what)))
}

/// Check registration fields; returns the trimmed name and the age in years
pub fn validate_registration(
    rules: &AccountConfig,
    nombre: &str,
    contrasena: &str,
    fecha_nacimiento: &str,
    today: NaiveDate,
) -> CasinoResult<(String, u32)> {
    let nombre = nombre.trim();
    if nombre.chars().count() < rules.min_name_len {
        return Err(CasinoError::Validation(format!(
            "name must have at least {} characters",
            rules.min_name_len
        )));
    }

    if contrasena.chars().count() < rules.min_password_len {
        return Err(CasinoError::Validation(format!(
            "password must have at least {} characters",
            rules.min_password_len
        )));
    }

    let birth = NaiveDate::parse_from_str(fecha_nacimiento.trim(), BIRTH_DATE_FORMAT)
        .map_err(|_| CasinoError::Validation("invalid birth date, use DD/MM/YYYY".to_string()))?;
    let age = age_on(birth, today)
        .ok_or_else(|| CasinoError::Validation("birth date is in the future".to_string()))?;

    if age < rules.min_age_years {
        return Err(CasinoError::Validation(format!(
            "access denied: {} years old, must be at least {}",
            age, rules.min_age_years
        )));
    }

    Ok((nombre.to_string(), age))
}

/// Whole years between `birth` and `today`, `None` if `birth` is later
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    if birth > today {
        return None;
    }
    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}
