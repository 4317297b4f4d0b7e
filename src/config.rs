//! Configuration management with validation and defaults
//!
//! Settings come from an optional TOML file, then `CANCINHUB_*` environment
//! variables, then validation. Every section has defaults, so a config file
//! only needs the keys it changes.

use crate::errors::{CasinoError, CasinoResult};
use crate::games::payout::PayoutTable;
use crate::settlement::SettlementMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete service configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CasinoConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub settlement: SettlementConfig,
    pub accounts: AccountConfig,
    pub games: PayoutTable,
    pub monitoring: MonitoringConfig,
}

/// HTTP server settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            request_timeout_secs: 30,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// Where the ledgers live
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./base_data"),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SettlementConfig {
    pub mode: SettlementMode,
}

/// Registration rules
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AccountConfig {
    pub starting_chips: u64,
    pub min_age_years: u32,
    pub min_name_len: usize,
    pub min_password_len: usize,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            starting_chips: 100,
            min_age_years: 18,
            min_name_len: 3,
            min_password_len: 6,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enable_metrics: bool,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
            log_filter: "cancinhub=info,tower_http=info".to_string(),
        }
    }
}

impl CasinoConfig {
    /// Configuration for tests: ephemeral port, debug logging, no CORS limits
    pub fn testing() -> Self {
        Self {
            server: ServerConfig {
                port: 0,
                request_timeout_secs: 5,
                ..Default::default()
            },
            monitoring: MonitoringConfig {
                log_filter: "cancinhub=debug".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Check values for logical consistency
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired("server.host".to_string()));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "server.request_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigValidationError::MissingRequired("storage.data_dir".to_string()));
        }

        if self.accounts.min_password_len == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "accounts.min_password_len must be > 0".to_string(),
            ));
        }

        self.games
            .validate()
            .map_err(ConfigValidationError::LogicalInconsistency)?;

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    InvalidValue(String),
    LogicalInconsistency(String),
    MissingRequired(String),
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValidationError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
            ConfigValidationError::LogicalInconsistency(msg) => write!(f, "Configuration logical inconsistency: {}", msg),
            ConfigValidationError::MissingRequired(msg) => write!(f, "Missing required configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

impl From<ConfigValidationError> for CasinoError {
    fn from(e: ConfigValidationError) -> Self {
        CasinoError::Configuration(e.to_string())
    }
}

/// Configuration loader with environment variable support
#[derive(Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load from file (if any), apply process environment overrides, validate
    pub fn load(&self) -> CasinoResult<CasinoConfig> {
        self.load_with_env(|key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an explicit variable lookup
    pub fn load_with_env<F>(&self, lookup: F) -> CasinoResult<CasinoConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match &self.config_path {
            Some(path) => Self::load_from_file(path)?,
            None => CasinoConfig::default(),
        };

        apply_env_overrides(&mut config, lookup)?;
        config.validate()?;

        Ok(config)
    }

    fn load_from_file(path: &Path) -> CasinoResult<CasinoConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CasinoError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| CasinoError::Configuration(format!("Failed to parse TOML: {}", e)))
    }

    /// Save configuration to file
    pub fn save(&self, config: &CasinoConfig, path: &Path) -> CasinoResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| CasinoError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string).map_err(|e| {
            CasinoError::Configuration(format!("Failed to write to {}: {}", path.display(), e))
        })
    }
}

fn apply_env_overrides<F>(config: &mut CasinoConfig, lookup: F) -> CasinoResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("CANCINHUB_HOST") {
        config.server.host = host;
    }
    if let Some(port) = lookup("CANCINHUB_PORT") {
        config.server.port = port.parse().map_err(|_| {
            CasinoError::Configuration(format!("CANCINHUB_PORT: invalid port number '{}'", port))
        })?;
    }
    if let Some(dir) = lookup("CANCINHUB_DATA_DIR") {
        config.storage.data_dir = PathBuf::from(dir);
    }
    if let Some(mode) = lookup("CANCINHUB_SETTLEMENT_MODE") {
        config.settlement.mode = mode.parse()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(CasinoConfig::default().validate().is_ok());
        assert!(CasinoConfig::testing().validate().is_ok());
    }

    #[test]
    fn test_invalid_config_validation() {
        let mut config = CasinoConfig::default();
        config.server.request_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidValue(_))));

        let mut config = CasinoConfig::default();
        config.games.horses.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::LogicalInconsistency(_))
        ));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9100\n\n[settlement]\nmode = \"additive_credit\"\n\n[games.dice]\nface_multiplier = 5\nrange_multiplier = 2"
        )
        .unwrap();

        let config = ConfigLoader::new().with_path(file.path()).load_with_env(no_env).unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.settlement.mode, SettlementMode::AdditiveCredit);
        assert_eq!(config.games.dice.face_multiplier, 5);
        assert_eq!(config.games.roulette.straight_multiplier, 36);
        assert_eq!(config.accounts.starting_chips, 100);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CANCINHUB_PORT", "8181"),
            ("CANCINHUB_DATA_DIR", "/tmp/casino"),
            ("CANCINHUB_SETTLEMENT_MODE", "additive_credit"),
        ]
        .into_iter()
        .collect();

        let config = ConfigLoader::new()
            .load_with_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 8181);
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/casino"));
        assert_eq!(config.settlement.mode, SettlementMode::AdditiveCredit);
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        let result = ConfigLoader::new().load_with_env(|key| {
            (key == "CANCINHUB_PORT").then(|| "eighty".to_string())
        });
        assert!(matches!(result, Err(CasinoError::Configuration(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cancinhub.toml");
        let mut config = CasinoConfig::default();
        config.server.port = 9200;

        let loader = ConfigLoader::new();
        loader.save(&config, &path).unwrap();
        let reloaded = ConfigLoader::new().with_path(&path).load_with_env(no_env).unwrap();

        assert_eq!(reloaded, config);
    }
}
