// HTTP API - axum routes over a shared RecordStore
//
// Handlers translate paths and JSON bodies into store calls and store errors
// into HTTP statuses. The whole store sits behind one Mutex: every handler
// takes the lock, runs one store operation to completion and releases it.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::StoreError;
use crate::models::{Flight, Pet, User};
use crate::store::RecordStore;
use crate::validate::{self, ValidationError};

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<RecordStore>>,
}

impl AppState {
    pub fn new(store: RecordStore) -> Self {
        AppState {
            store: Arc::new(Mutex::new(store)),
        }
    }

    fn lock(&self) -> ApiResult<MutexGuard<'_, RecordStore>> {
        self.store
            .lock()
            .map_err(|_| ApiError::Internal("record store lock poisoned".to_string()))
    }

    /// Run `f` against the store, even if a handler panicked while holding it.
    ///
    /// Used at shutdown so whatever is in memory still gets saved.
    pub fn with_store<R>(&self, f: impl FnOnce(&RecordStore) -> R) -> R {
        let guard = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }
}

// ============================================================================
// RESPONSES & ERRORS
// ============================================================================

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A lookup found nothing
    #[error("{0} not found")]
    Missing(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::DuplicateId(_)) => StatusCode::CONFLICT,
            ApiError::Store(StoreError::DuplicateKey { .. }) => StatusCode::CONFLICT,
            ApiError::Store(StoreError::ReferenceNotFound(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Store(StoreError::IdExhausted(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Missing(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }

        let body = ApiResponse {
            success: false,
            data: (),
            error: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

type Reply<T> = ApiResult<Json<ApiResponse<T>>>;

fn reply<T>(data: T) -> Reply<T> {
    Ok(Json(ApiResponse::ok(data)))
}

fn created<T: Serialize>(data: T) -> ApiResult<Response> {
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(data))).into_response())
}

// ============================================================================
// REQUEST BODIES
// ============================================================================

/// Phone numbers arrive as JSON numbers or strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PhoneInput {
    Number(i64),
    Text(String),
}

impl PhoneInput {
    fn parse(&self) -> validate::ValidationResult<i64> {
        match self {
            PhoneInput::Number(n) if *n >= 0 => Ok(*n),
            PhoneInput::Number(_) => Err(ValidationError::new("phone", "must not be negative")),
            PhoneInput::Text(s) => validate::phone_number(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPet {
    #[serde(default, alias = "Id")]
    pub id: Option<i64>,
    #[serde(alias = "Nombre")]
    pub name: String,
    #[serde(default, alias = "Edad")]
    pub age: String,
    #[serde(alias = "Telefono")]
    pub phone: PhoneInput,
    #[serde(default, alias = "Años")]
    pub years: String,
    #[serde(alias = "Tipo")]
    pub kind: String,
    #[serde(alias = "player_id")]
    pub owner: String,
    #[serde(default, alias = "Id_vuelo")]
    pub flight_id: Option<i64>,
}

impl NewPet {
    pub fn validate(self) -> validate::ValidationResult<Pet> {
        Ok(Pet {
            id: validate::optional_id("id", self.id)?,
            name: validate::non_empty("name", &self.name)?,
            age: self.age.trim().to_string(),
            phone: self.phone.parse()?,
            years: self.years.trim().to_string(),
            kind: validate::non_empty("kind", &self.kind)?,
            owner: validate::non_empty("owner", &self.owner)?,
            flight_id: self.flight_id,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PetFlightUpdate {
    #[serde(default)]
    pub flight_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub player_id: String,
    #[serde(alias = "Nombre_U")]
    pub name: String,
    #[serde(default, alias = "Telefono")]
    pub phone: String,
    #[serde(default, alias = "Edad")]
    pub age: String,
}

impl NewUser {
    pub fn validate(self) -> validate::ValidationResult<User> {
        Ok(User {
            player_id: validate::non_empty("player_id", &self.player_id)?,
            name: validate::non_empty("name", &self.name)?,
            phone: self.phone.trim().to_string(),
            age: self.age.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserNameUpdate {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFlight {
    #[serde(default, alias = "id_vuelo")]
    pub flight_id: Option<i64>,
    #[serde(alias = "Aerolinea")]
    pub airline: String,
    #[serde(alias = "precio")]
    pub price: i64,
    #[serde(alias = "fecha")]
    pub date: String,
    #[serde(default, alias = "origen")]
    pub origin: Option<String>,
    #[serde(default, alias = "destino")]
    pub destination: Option<String>,
}

impl NewFlight {
    pub fn validate(self) -> validate::ValidationResult<Flight> {
        let origin = self.origin.map(|o| validate::non_empty("origin", &o)).transpose()?;
        let destination = self
            .destination
            .map(|d| validate::non_empty("destination", &d))
            .transpose()?;

        Ok(Flight {
            flight_id: validate::optional_id("flight_id", self.flight_id)?,
            airline: validate::non_empty("airline", &self.airline)?,
            price: validate::price(self.price)?,
            date: validate::flight_date(&self.date)?,
            origin,
            destination,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlightUpdate {
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub airline: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub q: Option<String>,
}

// ============================================================================
// RESPONSE BODIES
// ============================================================================

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsResponse {
    pub pets: usize,
    pub users: usize,
    pub flights: usize,
    pub next_pet_id: i64,
    /// `None` once the highest flight id is `i64::MAX`
    pub next_flight_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserDeleted {
    pub player_id: String,
    pub pets_removed: usize,
}

#[derive(Debug, Serialize)]
pub struct PetLookup {
    pub item_id: i64,
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet: Option<Pet>,
}

// ============================================================================
// GENERAL HANDLERS
// ============================================================================

/// GET / - Greeting
async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "Hello": "World" }))
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/stats - Record counts
async fn stats(State(state): State<AppState>) -> Reply<StatsResponse> {
    let store = state.lock()?;
    reply(StatsResponse {
        pets: store.pet_count(),
        users: store.user_count(),
        flights: store.flight_count(),
        next_pet_id: store.next_pet_id(),
        next_flight_id: store.next_flight_id().ok(),
    })
}

/// GET /Mascotas/:item_id?q= - Pet lookup echo
async fn lookup_pet(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Query(query): Query<LookupQuery>,
) -> ApiResult<Json<PetLookup>> {
    let store = state.lock()?;
    Ok(Json(PetLookup {
        item_id,
        q: query.q,
        pet: store.get_pet(item_id).cloned(),
    }))
}

// ============================================================================
// PET HANDLERS
// ============================================================================

/// GET /api/pets
async fn list_pets(State(state): State<AppState>) -> Reply<Vec<Pet>> {
    let store = state.lock()?;
    reply(store.get_all_pets().into_iter().cloned().collect())
}

/// POST /api/pets
async fn create_pet(State(state): State<AppState>, Json(body): Json<NewPet>) -> ApiResult<Response> {
    let pet = body.validate()?;
    let mut store = state.lock()?;

    let id = store.add_pet(pet)?;
    info!(pet_id = id, "pet created");
    created(store.get_pet(id).cloned())
}

/// GET /api/pets/:id
async fn get_pet(State(state): State<AppState>, Path(id): Path<i64>) -> Reply<Pet> {
    let store = state.lock()?;
    let pet = store
        .get_pet(id)
        .cloned()
        .ok_or_else(|| ApiError::Missing(format!("pet {id}")))?;
    reply(pet)
}

/// PATCH /api/pets/:id - Rebook onto another flight (or none)
async fn update_pet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<PetFlightUpdate>,
) -> Reply<Option<Pet>> {
    let mut store = state.lock()?;
    store.update_pet(id, body.flight_id)?;
    reply(store.get_pet(id).cloned())
}

/// DELETE /api/pets/:id
async fn delete_pet(State(state): State<AppState>, Path(id): Path<i64>) -> Reply<Pet> {
    let mut store = state.lock()?;
    let pet = store.delete_pet(id)?;
    info!(pet_id = id, "pet deleted");
    reply(pet)
}

// ============================================================================
// USER HANDLERS
// ============================================================================

/// GET /api/users
async fn list_users(State(state): State<AppState>) -> Reply<Vec<User>> {
    let store = state.lock()?;
    reply(store.get_all_users().into_iter().cloned().collect())
}

/// POST /api/users
async fn create_user(State(state): State<AppState>, Json(body): Json<NewUser>) -> ApiResult<Response> {
    let user = body.validate()?;
    let mut store = state.lock()?;

    store.add_user(user.clone())?;
    info!(player_id = %user.player_id, "user created");
    created(user)
}

/// GET /api/users/:player_id
async fn get_user(State(state): State<AppState>, Path(player_id): Path<String>) -> Reply<User> {
    let store = state.lock()?;
    let user = store
        .get_user(&player_id)
        .cloned()
        .ok_or_else(|| ApiError::Missing(format!("user {player_id}")))?;
    reply(user)
}

/// PATCH /api/users/:player_id - Rename
async fn update_user(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
    Json(body): Json<UserNameUpdate>,
) -> Reply<Option<User>> {
    let name = body
        .name
        .map(|n| validate::non_empty("name", &n))
        .transpose()?;

    let mut store = state.lock()?;
    store.update_user_name(&player_id, name)?;
    reply(store.get_user(&player_id).cloned())
}

/// DELETE /api/users/:player_id - Deletes the user and all of its pets
async fn delete_user(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Reply<UserDeleted> {
    let mut store = state.lock()?;
    let pets_removed = store.delete_user(&player_id)?;
    info!(player_id = %player_id, pets_removed, "user deleted");
    reply(UserDeleted {
        player_id,
        pets_removed,
    })
}

/// GET /api/users/:player_id/pets
async fn user_pets(State(state): State<AppState>, Path(player_id): Path<String>) -> Reply<Vec<Pet>> {
    let store = state.lock()?;
    if store.get_user(&player_id).is_none() {
        return Err(ApiError::Missing(format!("user {player_id}")));
    }
    reply(store.get_pets_for_user(&player_id).into_iter().cloned().collect())
}

// ============================================================================
// FLIGHT HANDLERS
// ============================================================================

/// GET /api/flights
async fn list_flights(State(state): State<AppState>) -> Reply<Vec<Flight>> {
    let store = state.lock()?;
    reply(store.get_all_flights().into_iter().cloned().collect())
}

/// POST /api/flights
async fn create_flight(
    State(state): State<AppState>,
    Json(body): Json<NewFlight>,
) -> ApiResult<Response> {
    let flight = body.validate()?;
    let mut store = state.lock()?;

    let (flight_id, date) = store.add_flight(flight)?;
    info!(flight_id, date = %date, "flight created");
    created(store.get_flight(flight_id, &date).cloned())
}

/// GET /api/flights/:flight_id - Every date this flight runs
async fn flights_by_id(
    State(state): State<AppState>,
    Path(flight_id): Path<i64>,
) -> Reply<Vec<Flight>> {
    let store = state.lock()?;
    reply(store.get_flights_by_id(flight_id).into_iter().cloned().collect())
}

/// GET /api/flights/:flight_id/:date
async fn get_flight(
    State(state): State<AppState>,
    Path((flight_id, date)): Path<(i64, String)>,
) -> Reply<Flight> {
    let store = state.lock()?;
    let flight = store
        .get_flight(flight_id, &date)
        .cloned()
        .ok_or_else(|| ApiError::Missing(format!("flight {flight_id} on {date}")))?;
    reply(flight)
}

/// PATCH /api/flights/:flight_id/:date - Change price and/or airline
async fn update_flight(
    State(state): State<AppState>,
    Path((flight_id, date)): Path<(i64, String)>,
    Json(body): Json<FlightUpdate>,
) -> Reply<Option<Flight>> {
    let price = body.price.map(validate::price).transpose()?;
    let airline = body
        .airline
        .map(|a| validate::non_empty("airline", &a))
        .transpose()?;

    let mut store = state.lock()?;
    store.update_flight(flight_id, &date, price, airline)?;
    reply(store.get_flight(flight_id, &date).cloned())
}

/// DELETE /api/flights/:flight_id/:date
async fn delete_flight(
    State(state): State<AppState>,
    Path((flight_id, date)): Path<(i64, String)>,
) -> Reply<Flight> {
    let mut store = state.lock()?;
    let flight = store.delete_flight(flight_id, &date)?;
    info!(flight_id, date = %date, "flight deleted");
    reply(flight)
}

// ============================================================================
// ROUTER
// ============================================================================

/// Build the full application router around `state`
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(stats))
        .route("/pets", get(list_pets).post(create_pet))
        .route("/pets/:id", get(get_pet).patch(update_pet).delete(delete_pet))
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:player_id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/users/:player_id/pets", get(user_pets))
        .route("/flights", get(list_flights).post(create_flight))
        .route("/flights/:flight_id", get(flights_by_id))
        .route(
            "/flights/:flight_id/:date",
            get(get_flight).patch(update_flight).delete(delete_flight),
        );

    Router::new()
        .route("/", get(root))
        .route("/Mascotas/:item_id", get(lookup_pet))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
