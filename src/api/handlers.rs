//! Request Handlers
//!
//! Thin adapters between HTTP and the [`Casino`] service: extract, call,
//! wrap the result in the response envelope.

use super::{errors::ApiError, middleware::RequestId, models::*};
use crate::{
    casino::{
        AccountInfo, Balance, BetReceipt, Casino, DepositReceipt, HistoryPage, HorseEntry,
        RegisteredUser, StatisticsReport, UserSummary,
    },
    errors::CasinoError,
    games::{BetChoice, GameType},
    stats::HistoryQuery,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub casino: Arc<Casino>,
    pub version: String,
    pub metrics_enabled: bool,
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn casino_error(request_id: &RequestId) -> impl FnOnce(CasinoError) -> ApiError + '_ {
    move |e| ApiError::from_casino(request_id.0.clone(), e)
}

fn body<T>(request_id: &RequestId, payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ApiError::bad_request(request_id.0.clone(), e.body_text()))
}

fn query<T>(request_id: &RequestId, params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(value)| value)
        .map_err(|e| ApiError::bad_request(request_id.0.clone(), e.body_text()))
}

/// Health check handler
/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: state.version.clone(),
        settlement_mode: state.casino.settlement_mode().to_string(),
    })
}

/// Prometheus scrape endpoint
/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if !state.metrics_enabled {
        return (StatusCode::NOT_FOUND, "metrics disabled\n".to_string()).into_response();
    }
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.casino.metrics().to_prometheus_format(),
    )
        .into_response()
}

async fn play(
    state: &AppState,
    request_id: &RequestId,
    user_id: &str,
    password: &str,
    stake: i64,
    choice: BetChoice,
) -> ApiResult<BetReceipt> {
    let receipt = state
        .casino
        .place_bet(user_id, password, stake, choice)
        .await
        .map_err(casino_error(request_id))?;

    let message = if receipt.won { "Ganaste" } else { "Perdiste" };
    Ok(Json(ApiResponse::ok(message, receipt)))
}

/// POST /jugar/dados
pub async fn dice_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BetRequest>, JsonRejection>,
) -> ApiResult<BetReceipt> {
    let req = body(&request_id, payload)?;
    let choice = BetChoice::Dice(req.eleccion);
    play(&state, &request_id, &req.user_id, &req.contrasena, req.monto, choice).await
}

/// POST /jugar/carreras
pub async fn horse_race_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BetRequest>, JsonRejection>,
) -> ApiResult<BetReceipt> {
    let req = body(&request_id, payload)?;
    let choice = BetChoice::HorseRace(req.eleccion);
    play(&state, &request_id, &req.user_id, &req.contrasena, req.monto, choice).await
}

/// POST /jugar/ruleta
pub async fn roulette_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RouletteBetRequest>, JsonRejection>,
) -> ApiResult<BetReceipt> {
    let req = body(&request_id, payload)?;
    let choice = BetChoice::Roulette {
        bet_type: req.tipo_apuesta,
        number: req.numero,
    };
    play(&state, &request_id, &req.user_id, &req.contrasena, req.monto, choice).await
}

/// POST /jugar/tragamonedas
pub async fn slots_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BetRequest>, JsonRejection>,
) -> ApiResult<BetReceipt> {
    let req = body(&request_id, payload)?;
    play(&state, &request_id, &req.user_id, &req.contrasena, req.monto, BetChoice::Slots).await
}

/// POST /api/usuarios
pub async fn register_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<RegisteredUser>>), ApiError> {
    let req = body(&request_id, payload)?;
    let user = state
        .casino
        .register(&req.nombre, &req.contrasena, &req.fecha_nacimiento)
        .await
        .map_err(casino_error(&request_id))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Usuario creado exitosamente", user)),
    ))
}

/// GET /api/usuarios
pub async fn list_users_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<UserSummary>>> {
    let users = state.casino.list_users().await;
    Json(ApiResponse::ok(format!("{} usuarios", users.len()), users))
}

/// GET /api/usuarios/:id/saldo
pub async fn balance_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    params: Result<Query<CredentialQuery>, QueryRejection>,
) -> ApiResult<Balance> {
    let params = query(&request_id, params)?;
    let balance = state
        .casino
        .balance(&user_id, &params.contrasena)
        .await
        .map_err(casino_error(&request_id))?;
    Ok(Json(ApiResponse::ok("Saldo obtenido exitosamente", balance)))
}

/// GET /api/usuarios/:id/info
pub async fn account_info_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    params: Result<Query<CredentialQuery>, QueryRejection>,
) -> ApiResult<AccountInfo> {
    let params = query(&request_id, params)?;
    let info = state
        .casino
        .account_info(&user_id, &params.contrasena)
        .await
        .map_err(casino_error(&request_id))?;
    Ok(Json(ApiResponse::ok("Informacion obtenida exitosamente", info)))
}

/// POST /api/banco/agregar-fichas
pub async fn deposit_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DepositRequest>, JsonRejection>,
) -> ApiResult<DepositReceipt> {
    let req = body(&request_id, payload)?;
    let receipt = state
        .casino
        .deposit(&req.user_id, &req.contrasena, req.cantidad)
        .await
        .map_err(casino_error(&request_id))?;

    let message = format!("Operacion exitosa. Ahora tienes {} fichas", receipt.fichas_despues);
    Ok(Json(ApiResponse::ok(message, receipt)))
}

/// GET /api/historial/:id
pub async fn history_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> ApiResult<HistoryPage> {
    let params = query(&request_id, params)?;
    let page = state
        .casino
        .history(&user_id, &params.contrasena, &HistoryQuery::all().with_limit(params.limite))
        .await
        .map_err(casino_error(&request_id))?;
    Ok(Json(ApiResponse::ok("Historial obtenido", page)))
}

/// GET /api/historial/:id/juego/:juego
pub async fn game_history_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path((user_id, game)): Path<(String, String)>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> ApiResult<HistoryPage> {
    let params = query(&request_id, params)?;
    let game = GameType::from_name(&game)
        .map(|g| g.as_str().to_string())
        .unwrap_or(game);
    let history_query = HistoryQuery::for_game(game.clone()).with_limit(params.limite);
    let page = state
        .casino
        .history(&user_id, &params.contrasena, &history_query)
        .await
        .map_err(casino_error(&request_id))?;
    Ok(Json(ApiResponse::ok(format!("Historial de {} obtenido", game), page)))
}

/// GET /api/historial/:id/estadisticas
pub async fn statistics_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    params: Result<Query<CredentialQuery>, QueryRejection>,
) -> ApiResult<StatisticsReport> {
    let params = query(&request_id, params)?;
    let report = state
        .casino
        .statistics(&user_id, &params.contrasena)
        .await
        .map_err(casino_error(&request_id))?;
    Ok(Json(ApiResponse::ok("Estadisticas obtenidas", report)))
}

/// GET /api/juegos/caballos
pub async fn horses_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<HorseEntry>>> {
    Json(ApiResponse::ok("Caballos en carrera", state.casino.horses()))
}

/// Unknown routes
pub async fn fallback_handler(Extension(request_id): Extension<RequestId>) -> ApiError {
    ApiError::not_found(request_id.0, "route not found".to_string())
}
