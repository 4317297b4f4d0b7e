//! Ledger: the authoritative user and history snapshot
//!
//! All mutations go through a single writer. A mutation holds the write lock
//! while it changes the in-memory snapshot and persists it through the
//! [`LedgerStore`]; if any step fails the touched user and history entry are
//! restored, so a round is either fully applied and persisted or not at all.
//! Readers clone what they need under the read lock.

pub mod history;
pub mod store;
pub mod types;

pub use store::{JsonFileStore, LedgerStore, MemoryStore};
pub use types::{GameRound, HistoryLedger, User, UserHistory, UserId, UserLedger, UserStats};

use crate::errors::{CasinoError, CasinoResult};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// In-memory copy of both ledgers
#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    pub users: UserLedger,
    pub history: HistoryLedger,
}

pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    state: RwLock<LedgerState>,
}

/// What was persisted before a save failed
enum PersistFailure {
    History(CasinoError),
    Users(CasinoError),
}

impl Ledger {
    /// Load both ledgers from `store`
    pub async fn open(store: Arc<dyn LedgerStore>) -> CasinoResult<Self> {
        let users = store.load_users().await?;
        let history = store.load_history().await?;

        let inconsistent = users.values().filter(|u| !u.stats.is_consistent()).count();
        if inconsistent > 0 {
            warn!("{} user(s) have round counters that do not add up", inconsistent);
        }
        info!(
            "Ledger loaded: {} users, {} histories",
            users.len(),
            history.len()
        );

        Ok(Self {
            store,
            state: RwLock::new(LedgerState { users, history }),
        })
    }

    pub async fn user(&self, user_id: &str) -> Option<User> {
        self.state.read().await.users.get(user_id).cloned()
    }

    pub async fn history_of(&self, user_id: &str) -> Option<UserHistory> {
        self.state.read().await.history.get(user_id).cloned()
    }

    /// Run `f` against the current snapshot under the read lock
    pub async fn read<T>(&self, f: impl FnOnce(&LedgerState) -> T) -> T {
        let state = self.state.read().await;
        f(&state)
    }

    /// Apply `f` to one user's account and the history ledger, then persist.
    ///
    /// `f` may only prepend rounds to the history of `user_id`; rollback
    /// relies on it.
    pub async fn transact<T, F>(&self, user_id: &str, f: F) -> CasinoResult<T>
    where
        T: Send,
        F: FnOnce(&mut User, &mut HistoryLedger) -> CasinoResult<T> + Send,
    {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let backup = state
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| CasinoError::NotFound(user_id.to_string()))?;
        let rounds_before = state.history.get(user_id).map(|h| h.partidas.len());

        let applied = match state.users.get_mut(user_id) {
            Some(user) => f(user, &mut state.history),
            None => Err(CasinoError::NotFound(user_id.to_string())),
        };

        let value = match applied {
            Ok(value) => value,
            Err(e) => {
                restore(state, backup, rounds_before);
                return Err(e);
            }
        };

        match self.persist(state).await {
            Ok(()) => Ok(value),
            Err(failure) => {
                restore(state, backup, rounds_before);
                let e = match failure {
                    PersistFailure::History(e) => e,
                    PersistFailure::Users(e) => {
                        // The history file already holds the rolled-back round
                        if let Err(rewrite) = self.store.save_history(&state.history).await {
                            error!(
                                "History for {} could not be restored after failed save: {}",
                                user_id, rewrite
                            );
                        }
                        e
                    }
                };
                warn!("Rolled back mutation for user {}: {}", user_id, e);
                Err(e)
            }
        }
    }

    /// Insert a new account built by `make` from the current user ledger
    pub async fn insert_user<F>(&self, make: F) -> CasinoResult<User>
    where
        F: FnOnce(&UserLedger) -> CasinoResult<User> + Send,
    {
        let mut state = self.state.write().await;
        let user = make(&state.users)?;

        if state.users.contains_key(&user.id) {
            return Err(CasinoError::Validation(format!("user id {} already exists", user.id)));
        }

        state.users.insert(user.id.clone(), user.clone());
        if let Err(e) = self.store.save_users(&state.users).await {
            state.users.remove(&user.id);
            return Err(e);
        }

        Ok(user)
    }

    async fn persist(&self, state: &LedgerState) -> Result<(), PersistFailure> {
        self.store
            .save_history(&state.history)
            .await
            .map_err(PersistFailure::History)?;
        self.store
            .save_users(&state.users)
            .await
            .map_err(PersistFailure::Users)
    }
}

fn restore(state: &mut LedgerState, backup: User, rounds_before: Option<usize>) {
    let user_id = backup.id.clone();
    match rounds_before {
        Some(len) => {
            if let Some(entry) = state.history.get_mut(&user_id) {
                let added = entry.partidas.len().saturating_sub(len);
                entry.partidas.drain(..added);
            }
        }
        None => {
            state.history.remove(&user_id);
        }
    }
    state.users.insert(user_id, backup);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::RoundResult;

    fn seeded_store() -> Arc<MemoryStore> {
        let mut users = UserLedger::new();
        let user = User::new("1000".to_string(), "Zack".to_string(), "Zeta123".to_string(), 100);
        users.insert(user.id.clone(), user);
        Arc::new(MemoryStore::with_users(users))
    }

    fn round_for(user: &User, stake: u64) -> GameRound {
        GameRound {
            user_id: user.id.clone(),
            game: "dados".to_string(),
            stake,
            details: String::new(),
            result: RoundResult::Lost,
            payout: 0,
            balance_before: user.fichas + stake,
            balance_after: user.fichas,
            timestamp: Default::default(),
        }
    }

    fn lose_ten(user: &mut User, rounds: &mut HistoryLedger) -> CasinoResult<u64> {
        user.fichas -= 10;
        let round = round_for(user, 10);
        history::record(rounds, user, round);
        Ok(user.fichas)
    }

    #[tokio::test]
    async fn test_open_restores_ids() {
        let ledger = Ledger::open(seeded_store()).await.unwrap();
        let user = ledger.user("1000").await.unwrap();
        assert_eq!(user.id, "1000");
    }

    #[tokio::test]
    async fn test_transact_persists() {
        let store = seeded_store();
        let ledger = Ledger::open(store.clone()).await.unwrap();

        let balance = ledger.transact("1000", lose_ten).await.unwrap();

        assert_eq!(balance, 90);
        assert_eq!(store.users_snapshot()["1000"].fichas, 90);
        assert_eq!(store.history_snapshot()["1000"].partidas.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let ledger = Ledger::open(seeded_store()).await.unwrap();
        let result = ledger.transact("9999", lose_ten).await;
        assert!(matches!(result, Err(CasinoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_failed_user_write_rolls_back() {
        let store = seeded_store();
        let ledger = Ledger::open(store.clone()).await.unwrap();
        ledger.transact("1000", lose_ten).await.unwrap();

        store.fail_user_writes(true);
        let result = ledger.transact("1000", lose_ten).await;
        assert!(matches!(result, Err(CasinoError::Storage(_))));

        let user = ledger.user("1000").await.unwrap();
        assert_eq!(user.fichas, 90);
        assert_eq!(ledger.history_of("1000").await.unwrap().partidas.len(), 1);
        // History file rewritten back to the pre-round state
        assert_eq!(store.history_snapshot()["1000"].partidas.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_first_history_write_removes_entry() {
        let store = seeded_store();
        let ledger = Ledger::open(store.clone()).await.unwrap();

        store.fail_history_writes(true);
        assert!(ledger.transact("1000", lose_ten).await.is_err());

        assert!(ledger.history_of("1000").await.is_none());
        assert_eq!(ledger.user("1000").await.unwrap().fichas, 100);
    }

    #[tokio::test]
    async fn test_closure_error_restores_partial_changes() {
        let ledger = Ledger::open(seeded_store()).await.unwrap();

        let result: CasinoResult<()> = ledger
            .transact("1000", |user, _| {
                user.fichas = 0;
                Err(CasinoError::Validation("nope".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(ledger.user("1000").await.unwrap().fichas, 100);
    }

    #[tokio::test]
    async fn test_insert_user_rejects_duplicates() {
        let ledger = Ledger::open(seeded_store()).await.unwrap();

        let duplicate = ledger
            .insert_user(|_| {
                Ok(User::new("1000".to_string(), "Otro".to_string(), "secreto1".to_string(), 100))
            })
            .await;
        assert!(matches!(duplicate, Err(CasinoError::Validation(_))));

        let created = ledger
            .insert_user(|_| {
                Ok(User::new("2000".to_string(), "Ana".to_string(), "secreto1".to_string(), 100))
            })
            .await
            .unwrap();
        assert_eq!(ledger.user(&created.id).await.unwrap().nombre, "Ana");
    }

    #[tokio::test]
    async fn test_concurrent_mutations_are_serialized() {
        let store = seeded_store();
        let ledger = Arc::new(Ledger::open(store.clone()).await.unwrap());

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.transact("1000", lose_ten).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(ledger.user("1000").await.unwrap().fichas, 0);
        assert_eq!(store.users_snapshot()["1000"].fichas, 0);
        assert_eq!(store.history_snapshot()["1000"].partidas.len(), 10);
    }
}
