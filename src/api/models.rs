//! API Request and Response Models

use serde::{Deserialize, Serialize};

/// Success envelope wrapping every response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub settlement_mode: String,
}

fn default_choice() -> String {
    "1".to_string()
}

/// Body for dice, horse race and slot machine rounds
#[derive(Debug, Clone, Deserialize)]
pub struct BetRequest {
    pub user_id: String,
    pub contrasena: String,
    pub monto: i64,
    #[serde(default = "default_choice")]
    pub eleccion: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouletteBetRequest {
    pub user_id: String,
    pub contrasena: String,
    pub monto: i64,
    /// "1"/"pleno", "2"/"pares", "3"/"impares", "rojo", "negro"
    pub tipo_apuesta: String,
    #[serde(default)]
    pub numero: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub nombre: String,
    pub contrasena: String,
    /// DD/MM/YYYY
    pub fecha_nacimiento: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepositRequest {
    pub user_id: String,
    pub contrasena: String,
    pub cantidad: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialQuery {
    pub contrasena: String,
}

pub const DEFAULT_HISTORY_LIMIT: i64 = 10;

fn default_history_limit() -> i64 {
    DEFAULT_HISTORY_LIMIT
}

/// `?contrasena=&limite=`; `limite <= 0` returns every round
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryParams {
    pub contrasena: String,
    #[serde(default = "default_history_limit")]
    pub limite: i64,
}
