//! End-to-end HTTP flows through the full middleware stack

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use cancinhub::{
    api::{create_app, monitoring::MetricsRegistry},
    games::{Outcome, ScriptedRandomizer},
    CasinoConfig, Casino, Ledger, MemoryStore,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn app_with(outcomes: Vec<Outcome>) -> Router {
    let config = CasinoConfig::testing();
    let ledger = Ledger::open(Arc::new(MemoryStore::new()))
        .await
        .expect("empty ledger opens");
    let casino = Casino::new(ledger, &config, MetricsRegistry::new())
        .with_randomizer(Box::new(ScriptedRandomizer::new(outcomes)));
    create_app(Arc::new(casino), &config)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("router never fails");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn register(app: &Router, name: &str) -> String {
    let (status, body) = send(
        app,
        post(
            "/api/usuarios",
            json!({"nombre": name, "contrasena": "Zeta123", "fecha_nacimiento": "01/01/1990"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["fichas"], 100);
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_horse_race_round_trip() {
    let app = app_with(vec![Outcome::HorseRace { winner: 0 }]).await;
    let id = register(&app, "Zack").await;

    let (status, body) = send(
        &app,
        post(
            "/jugar/carreras",
            json!({"user_id": id, "contrasena": "Zeta123", "monto": 50, "eleccion": "1"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["juego"], "carreras");
    assert_eq!(body["data"]["ganado"], true);
    assert_eq!(body["data"]["multiplicador"], 3);
    assert_eq!(body["data"]["fichas_antes"], 100);
    assert_eq!(body["data"]["fichas_despues"], 200);

    let (_, info) = send(&app, get(&format!("/api/usuarios/{}/info?contrasena=Zeta123", id))).await;
    assert_eq!(info["data"]["fichas"], 200);
    assert_eq!(info["data"]["stats"]["carreras"], 1);
    assert_eq!(info["data"]["stats"]["partidas_totales"], 1);

    let (_, history) = send(&app, get(&format!("/api/historial/{}?contrasena=Zeta123", id))).await;
    let rounds = history["data"]["partidas"].as_array().unwrap();
    assert_eq!(rounds.len(), 1);
    assert_eq!(rounds[0]["resultado"], "gano");
    assert_eq!(rounds[0]["ganancia"], 150);
}

#[tokio::test]
async fn test_roulette_zero_and_statistics() {
    let app = app_with(vec![
        Outcome::Roulette { pocket: 0 },
        Outcome::Roulette { pocket: 0 },
    ])
    .await;
    let id = register(&app, "Ana").await;

    let (_, straight) = send(
        &app,
        post(
            "/jugar/ruleta",
            json!({"user_id": id, "contrasena": "Zeta123", "monto": 1, "tipo_apuesta": "1", "numero": 0}),
        ),
    )
    .await;
    assert_eq!(straight["data"]["ganado"], true);

    let (_, even) = send(
        &app,
        post(
            "/jugar/ruleta",
            json!({"user_id": id, "contrasena": "Zeta123", "monto": 10, "tipo_apuesta": "pares"}),
        ),
    )
    .await;
    assert_eq!(even["data"]["ganado"], false);

    let (status, stats) = send(
        &app,
        get(&format!("/api/historial/{}/estadisticas?contrasena=Zeta123", id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let figures = &stats["data"]["estadisticas"];
    assert_eq!(figures["total_partidas"], 2);
    assert_eq!(figures["partidas_ganadas"], 1);
    assert_eq!(figures["tasa_victoria"], 50.0);
    assert_eq!(figures["juego_favorito"], "ruleta");
    assert_eq!(figures["racha_actual"], "mixed");

    let (_, filtered) = send(
        &app,
        get(&format!("/api/historial/{}/juego/RULETA?contrasena=Zeta123&limite=1", id)),
    )
    .await;
    assert_eq!(filtered["data"]["total_partidas"], 2);
    assert_eq!(filtered["data"]["partidas"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_error_envelopes() {
    let app = app_with(vec![]).await;
    let id = register(&app, "Luis").await;

    let (status, body) = send(
        &app,
        post("/jugar/dados", json!({"user_id": id, "contrasena": "wrong", "monto": 5, "eleccion": "3"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert!(body["request_id"].as_str().is_some());

    let (status, body) = send(
        &app,
        post("/jugar/dados", json!({"user_id": "1", "contrasena": "Zeta123", "monto": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, body) = send(
        &app,
        post("/jugar/tragamonedas", json!({"user_id": id, "contrasena": "Zeta123", "monto": 101})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INSUFFICIENT_FUNDS");

    let (status, body) = send(
        &app,
        post(
            "/jugar/ruleta",
            json!({"user_id": id, "contrasena": "Zeta123", "monto": 5, "tipo_apuesta": "1", "numero": 37}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_CHOICE");

    let (status, body) = send(
        &app,
        post("/jugar/carreras", json!({"user_id": id, "contrasena": "Zeta123", "monto": 5, "eleccion": "Pegasus"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_CHOICE");

    let (status, body) = send(
        &app,
        post("/api/usuarios", json!({"nombre": "Kid", "contrasena": "Zeta123", "fecha_nacimiento": "01/01/2020"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // Nothing above touched the balance
    let (_, balance) = send(&app, get(&format!("/api/usuarios/{}/saldo?contrasena=Zeta123", id))).await;
    assert_eq!(balance["data"]["fichas"], 100);
}

#[tokio::test]
async fn test_unknown_account_reported_before_bad_choice() {
    let app = app_with(vec![]).await;

    let (status, body) = send(
        &app,
        post(
            "/jugar/carreras",
            json!({"user_id": "4242", "contrasena": "Zeta123", "monto": 5, "eleccion": "Pegasus"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let id = register(&app, "Iris").await;
    let (status, body) = send(
        &app,
        post(
            "/jugar/ruleta",
            json!({"user_id": id, "contrasena": "wrong", "monto": 0, "tipo_apuesta": "9"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, body) = send(
        &app,
        post(
            "/jugar/carreras",
            json!({"user_id": id, "contrasena": "Zeta123", "monto": 500, "eleccion": "Pegasus"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INSUFFICIENT_FUNDS");
}

#[tokio::test]
async fn test_game_history_accepts_english_names() {
    let app = app_with(vec![Outcome::Dice { face: 5 }]).await;
    let id = register(&app, "Noa").await;

    let (status, _) = send(
        &app,
        post("/jugar/dados", json!({"user_id": id, "contrasena": "Zeta123", "monto": 5, "eleccion": "alto"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, page) = send(
        &app,
        get(&format!("/api/historial/{}/juego/Dice?contrasena=Zeta123", id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"]["juego"], "dados");
    assert_eq!(page["data"]["partidas"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_bank_deposit_and_listing() {
    let app = app_with(vec![]).await;
    let id = register(&app, "Marta").await;

    let (status, body) = send(
        &app,
        post("/api/banco/agregar-fichas", json!({"user_id": id, "contrasena": "Zeta123", "cantidad": 250})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fichas_despues"], 350);

    let (_, history) = send(&app, get(&format!("/api/historial/{}?contrasena=Zeta123&limite=0", id))).await;
    assert_eq!(history["data"]["partidas"][0]["juego"], "banco");
    assert_eq!(history["data"]["partidas"][0]["apuesta"], 0);

    let (_, users) = send(&app, get("/api/usuarios")).await;
    let listed = users["data"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["nombre"], "Marta");
    assert!(listed[0].get("contrasena").is_none());
}

#[tokio::test]
async fn test_request_id_health_and_metrics() {
    let app = app_with(vec![]).await;

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    let (_, horses) = send(&app, get("/api/juegos/caballos")).await;
    assert_eq!(horses["data"][0]["nombre"], "Tamamo Cross");
    assert_eq!(horses["data"][0]["cuota"], 3);

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(text.to_vec()).unwrap();
    assert!(text.contains("cancinhub_rounds_total{game=\"dados\"} 0"));
    assert!(text.contains("cancinhub_http_requests_total"));

    let (status, body) = send(&app, get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
