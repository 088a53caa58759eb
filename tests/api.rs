//! HTTP API tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.

#![cfg(feature = "server")]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use pet_flights::api::{router, AppState};
use pet_flights::{Flight, Pet, RecordStore, User};
use serde_json::{json, Value};
use tower::ServiceExt;

// =============================================================================
// Test Utilities
// =============================================================================

fn app_with(store: RecordStore) -> (Router, AppState) {
    let state = AppState::new(store);
    (router(state.clone()), state)
}

fn seeded_store() -> RecordStore {
    let mut store = RecordStore::new();
    store.add_user(User::new("u1", "Ana", "555", "30")).unwrap();
    store
        .add_pet(Pet::new("Rex", "3", 5551234, "2021", "dog", "u1"))
        .unwrap();
    store.add_flight(Flight::new(10, "Delta", 200, "2024-01-01")).unwrap();
    store
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

// =============================================================================
// General
// =============================================================================

#[tokio::test]
async fn test_root_and_health() {
    let (app, _) = app_with(RecordStore::new());

    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "Hello": "World" }));

    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], "OK");
}

#[tokio::test]
async fn test_pet_lookup_echoes_query() {
    let (app, _) = app_with(seeded_store());

    let (status, body) = send(&app, Method::GET, "/Mascotas/1?q=perro", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item_id"], 1);
    assert_eq!(body["q"], "perro");
    assert_eq!(body["pet"]["Nombre"], "Rex");

    let (_, body) = send(&app, Method::GET, "/Mascotas/99", None).await;
    assert!(body["q"].is_null());
    assert!(body.get("pet").is_none());
}

// =============================================================================
// Pets
// =============================================================================

#[tokio::test]
async fn test_create_pet_assigns_id() {
    let (app, state) = app_with(seeded_store());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/pets",
        Some(json!({
            "name": "Luna", "age": "2", "phone": "555-0000",
            "years": "2022", "kind": "cat", "owner": "u1"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["Id"], 2);
    assert_eq!(body["data"]["Telefono"], 5550000);
    state.with_store(|store| assert_eq!(store.pet_count(), 2));
}

#[tokio::test]
async fn test_create_pet_errors() {
    let (app, _) = app_with(seeded_store());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/pets",
        Some(json!({ "name": "Luna", "phone": 1, "kind": "cat", "owner": "ghost" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "owner ghost not found");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/pets",
        Some(json!({ "id": 1, "name": "Luna", "phone": 1, "kind": "cat", "owner": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/pets",
        Some(json!({ "name": "  ", "phone": 1, "kind": "cat", "owner": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid name: must not be empty");
}

#[tokio::test]
async fn test_max_pet_id_is_rejected_without_poisoning() {
    let (app, _) = app_with(seeded_store());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/pets",
        Some(json!({ "id": i64::MAX, "name": "Luna", "phone": 1, "kind": "cat", "owner": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "no pet ids left");

    let (status, body) = send(&app, Method::GET, "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pets"], 1);
}

#[tokio::test]
async fn test_stats_with_max_flight_id() {
    let (app, _) = app_with(seeded_store());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/flights",
        Some(json!({ "flight_id": i64::MAX, "airline": "Delta", "price": 1, "date": "2024-05-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::GET, "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["next_flight_id"].is_null());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/flights",
        Some(json!({ "airline": "LATAM", "price": 1, "date": "2024-05-02" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_pet_get_update_delete() {
    let (app, _) = app_with(seeded_store());

    let (status, body) = send(&app, Method::GET, "/api/pets/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["player_id"], "u1");

    let (status, body) = send(&app, Method::PATCH, "/api/pets/1", Some(json!({ "flight_id": 10 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["Id_vuelo"], 10);

    let (status, _) = send(&app, Method::PATCH, "/api/pets/7", Some(json!({ "flight_id": 10 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/api/pets/1", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/api/pets/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "pet 1 not found");

    let (status, _) = send(&app, Method::DELETE, "/api/pets/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_user_lifecycle_with_cascade() {
    let (app, state) = app_with(seeded_store());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({ "player_id": "u2", "name": "Luis", "phone": "556", "age": "41" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({ "player_id": "u2", "name": "Otro" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, Method::PATCH, "/api/users/u1", Some(json!({ "name": "Ana María" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["Nombre_U"], "Ana María");

    let (_, body) = send(&app, Method::GET, "/api/users/u1/pets", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::DELETE, "/api/users/u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pets_removed"], 1);

    let (status, _) = send(&app, Method::GET, "/api/users/u1/pets", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    state.with_store(|store| {
        assert_eq!(store.pet_count(), 0);
        assert!(store.get_user("u2").is_some());
        assert!(store.get_flight(10, "2024-01-01").is_some());
    });
}

// =============================================================================
// Flights
// =============================================================================

#[tokio::test]
async fn test_flights_by_id_and_date() {
    let (app, _) = app_with(seeded_store());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/flights",
        Some(json!({ "flight_id": 10, "airline": "Delta", "price": 210, "date": "2024-01-02" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["fecha"], "2024-01-02");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/flights",
        Some(json!({ "flight_id": 10, "airline": "Delta", "price": 210, "date": "2024-01-02" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/flights",
        Some(json!({ "airline": "LATAM", "price": 90, "date": "2024-03-15",
                     "origin": "BOG", "destination": "MDE" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id_vuelo"], 11);
    assert_eq!(body["data"]["destino"], "MDE");

    let (_, body) = send(&app, Method::GET, "/api/flights/10", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, Method::GET, "/api/flights", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_flight_update_and_delete() {
    let (app, _) = app_with(seeded_store());

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/flights/10/2024-01-01",
        Some(json!({ "airline": "Avianca" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["Aerolinea"], "Avianca");
    assert_eq!(body["data"]["precio"], 200);

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/flights/10/2024-01-01",
        Some(json!({ "price": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::DELETE, "/api/flights/10/2024-01-01", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/api/flights/10/2024-01-01", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/api/flights/10/2024-01-01", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bad_flight_date_is_rejected() {
    let (app, _) = app_with(RecordStore::new());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/flights",
        Some(json!({ "airline": "Delta", "price": 200, "date": "mañana" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_stats() {
    let (app, _) = app_with(seeded_store());

    let (status, body) = send(&app, Method::GET, "/api/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({ "pets": 1, "users": 1, "flights": 1, "next_pet_id": 2, "next_flight_id": 11 })
    );
}
