//! Ledger persistence backends
//!
//! Stores have full-replace semantics: every save rewrites the whole map.

use crate::errors::{CasinoError, CasinoResult, StorageError};
use crate::ledger::types::{attach_ids, HistoryLedger, UserLedger};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Mutex,
    },
};
use tracing::debug;

pub const USERS_FILE: &str = "users.json";
pub const HISTORY_FILE: &str = "historial.json";

/// Generic storage interface for the user and history ledgers
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn load_users(&self) -> CasinoResult<UserLedger>;

    async fn save_users(&self, users: &UserLedger) -> CasinoResult<()>;

    async fn load_history(&self) -> CasinoResult<HistoryLedger>;

    async fn save_history(&self, history: &HistoryLedger) -> CasinoResult<()>;
}

/// Pretty-printed JSON files replaced atomically on every save
pub struct JsonFileStore {
    users_path: PathBuf,
    history_path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(data_directory: P) -> Self {
        let dir = data_directory.as_ref();
        Self {
            users_path: dir.join(USERS_FILE),
            history_path: dir.join(HISTORY_FILE),
        }
    }

    pub fn users_path(&self) -> &Path {
        &self.users_path
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    async fn read_map<T: DeserializeOwned + Default>(path: &Path) -> CasinoResult<T> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist yet, starting empty", path.display());
                return Ok(T::default());
            }
            Err(e) => {
                return Err(StorageError::ReadFailed(format!("{}: {}", path.display(), e)).into())
            }
        };

        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(T::default());
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            StorageError::CorruptedData(format!("{}: {}", path.display(), e)).into()
        })
    }

    async fn write_map<T: Serialize>(path: &Path, value: &T) -> CasinoResult<()> {
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| StorageError::WriteFailed(format!("serialize {}: {}", path.display(), e)))?;
        let path = path.to_path_buf();

        tokio::task::spawn_blocking(move || replace_file(&path, &bytes))
            .await
            .map_err(|e| StorageError::WriteFailed(format!("writer task failed: {}", e)))?
    }
}

/// Write to a temp file in the target directory, then rename over the target
fn replace_file(path: &Path, bytes: &[u8]) -> CasinoResult<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::WriteFailed(format!("{}: {}", dir.display(), e)))?;

    let mut temp = tempfile::NamedTempFile::new_in(&dir)
        .map_err(|e| StorageError::WriteFailed(format!("{}: {}", dir.display(), e)))?;
    temp.write_all(bytes)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| StorageError::WriteFailed(format!("{}: {}", path.display(), e)))?;
    temp.persist(path)
        .map_err(|e| StorageError::WriteFailed(format!("{}: {}", path.display(), e.error)))?;

    Ok(())
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    async fn load_users(&self) -> CasinoResult<UserLedger> {
        let mut users: UserLedger = Self::read_map(&self.users_path).await?;
        attach_ids(&mut users);
        Ok(users)
    }

    async fn save_users(&self, users: &UserLedger) -> CasinoResult<()> {
        Self::write_map(&self.users_path, users).await
    }

    async fn load_history(&self) -> CasinoResult<HistoryLedger> {
        Self::read_map(&self.history_path).await
    }

    async fn save_history(&self, history: &HistoryLedger) -> CasinoResult<()> {
        Self::write_map(&self.history_path, history).await
    }
}

/// In-memory store with write-failure injection
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<UserLedger>,
    history: Mutex<HistoryLedger>,
    fail_user_writes: AtomicBool,
    fail_history_writes: AtomicBool,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: UserLedger) -> Self {
        let store = Self::default();
        if let Ok(mut guard) = store.users.lock() {
            *guard = users;
        }
        store
    }

    /// Make subsequent `save_users` calls fail
    pub fn fail_user_writes(&self, fail: bool) {
        self.fail_user_writes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `save_history` calls fail
    pub fn fail_history_writes(&self, fail: bool) {
        self.fail_history_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn users_snapshot(&self) -> UserLedger {
        self.users.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn history_snapshot(&self) -> HistoryLedger {
        self.history.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

fn poisoned(what: &str) -> CasinoError {
    StorageError::CorruptedData(format!("{} lock poisoned", what)).into()
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn load_users(&self) -> CasinoResult<UserLedger> {
        let mut users = self.users.lock().map_err(|_| poisoned("users"))?.clone();
        attach_ids(&mut users);
        Ok(users)
    }

    async fn save_users(&self, users: &UserLedger) -> CasinoResult<()> {
        if self.fail_user_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteFailed("injected user write failure".to_string()).into());
        }
        *self.users.lock().map_err(|_| poisoned("users"))? = users.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_history(&self) -> CasinoResult<HistoryLedger> {
        Ok(self.history.lock().map_err(|_| poisoned("history"))?.clone())
    }

    async fn save_history(&self, history: &HistoryLedger) -> CasinoResult<()> {
        if self.fail_history_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteFailed("injected history write failure".to_string()).into());
        }
        *self.history.lock().map_err(|_| poisoned("history"))? = history.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::{User, UserHistory};

    #[tokio::test]
    async fn test_missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested"));

        assert!(store.load_users().await.unwrap().is_empty());
        assert!(store.load_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load_users() -> CasinoResult<()> {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        let mut users = UserLedger::new();
        let user = User::new("1234".to_string(), "Zack".to_string(), "Zeta123".to_string(), 100);
        users.insert(user.id.clone(), user.clone());
        store.save_users(&users).await?;

        let loaded = store.load_users().await?;
        assert_eq!(loaded.get("1234"), Some(&user));

        let raw = std::fs::read_to_string(store.users_path())?;
        assert!(raw.contains("\"fichas\": 100"));
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupted_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(HISTORY_FILE), "{ broken").unwrap();
        let store = JsonFileStore::new(dir.path());

        let result = store.load_history().await;
        assert!(matches!(
            result,
            Err(CasinoError::Storage(StorageError::CorruptedData(_)))
        ));
    }

    #[tokio::test]
    async fn test_memory_store_failure_injection() {
        let store = MemoryStore::new();
        let mut history = HistoryLedger::new();
        history.insert("1".to_string(), UserHistory::default());

        store.fail_history_writes(true);
        assert!(store.save_history(&history).await.is_err());
        assert!(store.history_snapshot().is_empty());

        store.fail_history_writes(false);
        store.save_history(&history).await.unwrap();
        assert_eq!(store.history_snapshot().len(), 1);
        assert_eq!(store.write_count(), 1);
    }
}
