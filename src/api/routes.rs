//! Route Definitions
//!
//! Maps URLs to handlers with type-safe routing.

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        // Games
        .route("/jugar/dados", post(dice_handler))
        .route("/jugar/carreras", post(horse_race_handler))
        .route("/jugar/ruleta", post(roulette_handler))
        .route("/jugar/tragamonedas", post(slots_handler))
        .route("/api/juegos/caballos", get(horses_handler))
        // Accounts
        .route("/api/usuarios", post(register_handler).get(list_users_handler))
        .route("/api/usuarios/:id/saldo", get(balance_handler))
        .route("/api/usuarios/:id/info", get(account_info_handler))
        .route("/api/banco/agregar-fichas", post(deposit_handler))
        // History
        .route("/api/historial/:id", get(history_handler))
        .route("/api/historial/:id/juego/:juego", get(game_history_handler))
        .route("/api/historial/:id/estadisticas", get(statistics_handler))
        .fallback(fallback_handler)
        .with_state(state)
}
