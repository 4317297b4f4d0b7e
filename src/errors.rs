//! Error types for the CancinHub casino core
//!
//! Every failure the core can signal is a typed variant; the HTTP layer maps
//! them onto status codes without inspecting messages.

/// Root error type for all casino operations
#[derive(Debug, thiserror::Error)]
pub enum CasinoError {
    /// Unknown user id
    #[error("User not found: {0}")]
    NotFound(String),

    /// Credential mismatch
    #[error("Incorrect password for user {0}")]
    Unauthorized(String),

    /// Stake exceeds the current balance
    #[error("Insufficient chips: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },

    /// Bet type, number, face or competitor outside the valid domain
    #[error("Invalid choice: {0}")]
    InvalidChoice(String),

    /// Malformed input such as a non-positive stake
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Persistence failures, fatal to the request
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Storage system errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Corrupted data: {0}")]
    CorruptedData(String),
}

impl From<std::io::Error> for CasinoError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                CasinoError::Storage(StorageError::WriteFailed(e.to_string()))
            }
            _ => CasinoError::Storage(StorageError::ReadFailed(e.to_string())),
        }
    }
}

impl From<serde_json::Error> for CasinoError {
    fn from(e: serde_json::Error) -> Self {
        CasinoError::Storage(StorageError::CorruptedData(e.to_string()))
    }
}

impl CasinoError {
    /// Stable machine-readable code used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            CasinoError::NotFound(_) => "NOT_FOUND",
            CasinoError::Unauthorized(_) => "UNAUTHORIZED",
            CasinoError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            CasinoError::InvalidChoice(_) => "INVALID_CHOICE",
            CasinoError::Validation(_) => "VALIDATION_ERROR",
            CasinoError::Storage(_) => "STORAGE_ERROR",
            CasinoError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

// Convenience type alias for Results
pub type CasinoResult<T> = Result<T, CasinoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = CasinoError::InsufficientFunds {
            requested: 150,
            available: 100,
        };

        assert!(err.to_string().contains("requested 150"));
        assert!(err.to_string().contains("available 100"));
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");
    }

    #[test]
    fn test_storage_error_conversion() {
        let storage_error = StorageError::WriteFailed("disk full".to_string());
        let casino_error: CasinoError = storage_error.into();

        match casino_error {
            CasinoError::Storage(StorageError::WriteFailed(_)) => {}
            _ => panic!("Expected storage error"),
        }
    }

    #[test]
    fn test_json_error_is_corrupted_data() {
        let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let casino_error: CasinoError = json_error.into();

        assert!(matches!(
            casino_error,
            CasinoError::Storage(StorageError::CorruptedData(_))
        ));
        assert!(casino_error.source().is_some());
    }
}
