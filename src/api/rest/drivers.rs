use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::route::SequencedStop;
use crate::engine::{
    AvailabilityQuery, AvailablePage, BatchDeliveryItem, BatchPickupItem, BatchReport,
    DeliveryReceipt, TodaySummary, WorkboardStats,
};
use crate::error::AppError;
use crate::models::driver::Driver;
use crate::models::location::{DriverLocation, LocationFix};
use crate::models::package::Package;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(register_driver).get(list_drivers))
        .route("/drivers/:id", get(get_driver))
        .route(
            "/drivers/:id/location",
            post(record_location).get(current_location),
        )
        .route("/drivers/:id/locations", get(location_history))
        .route("/drivers/:id/workboard", get(workboard))
        .route("/drivers/:id/stops", get(stops))
        .route("/drivers/:id/available", get(available))
        .route("/drivers/:id/summary", get(summary))
        .route("/drivers/:id/batch/pickup", post(batch_pickup))
        .route("/drivers/:id/batch/deliver", post(batch_deliver))
}

#[derive(Deserialize)]
pub struct RegisterDriverRequest {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct PositionQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Deserialize)]
pub struct AvailableQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub max_distance_km: Option<f64>,
    #[serde(default)]
    pub page: usize,
    pub size: Option<usize>,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub since: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct BatchPickupRequest {
    pub items: Vec<BatchPickupItem>,
    #[serde(default)]
    pub location: Option<LocationFix>,
}

#[derive(Deserialize)]
pub struct BatchDeliverRequest {
    pub items: Vec<BatchDeliveryItem>,
    #[serde(default)]
    pub location: Option<LocationFix>,
}

async fn register_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    let driver = state
        .engine
        .register_driver(&payload.name, payload.phone)
        .await?;
    Ok(Json(driver))
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Driver>>, AppError> {
    Ok(Json(state.engine.list_drivers().await?))
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Driver>, AppError> {
    Ok(Json(state.engine.get_driver(id).await?))
}

async fn record_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LocationFix>,
) -> Result<Json<DriverLocation>, AppError> {
    Ok(Json(state.engine.record_location(id, payload).await?))
}

async fn current_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DriverLocation>, AppError> {
    state
        .engine
        .current_location(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no location reported for driver {id}")))
}

async fn location_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<DriverLocation>>, AppError> {
    let since = query.since.unwrap_or(DateTime::<Utc>::MIN_UTC);
    Ok(Json(state.engine.location_history(id, since).await?))
}

async fn workboard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<PositionQuery>,
) -> Result<Json<WorkboardStats>, AppError> {
    let stats = state
        .engine
        .workboard_stats(id, query.lat, query.lng)
        .await?;
    Ok(Json(stats))
}

async fn stops(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<PositionQuery>,
) -> Result<Json<Vec<SequencedStop>>, AppError> {
    let stops = state
        .engine
        .assigned_stops(id, query.lat, query.lng)
        .await?;
    Ok(Json(stops))
}

async fn available(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailableQuery>,
) -> Result<Json<AvailablePage>, AppError> {
    let defaults = AvailabilityQuery::for_driver(id);
    let page = state
        .engine
        .available_for_pickup(AvailabilityQuery {
            lat: query.lat,
            lng: query.lng,
            max_distance_km: query.max_distance_km,
            page: query.page,
            size: query.size.unwrap_or(defaults.size),
            ..defaults
        })
        .await?;
    Ok(Json(page))
}

async fn summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TodaySummary>, AppError> {
    Ok(Json(state.engine.today_summary(id).await?))
}

async fn batch_pickup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BatchPickupRequest>,
) -> Result<Json<BatchReport<Package>>, AppError> {
    state.engine.get_driver(id).await?;
    let report = state
        .engine
        .batch_pickup(id, payload.items, payload.location)
        .await;
    Ok(Json(report))
}

async fn batch_deliver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BatchDeliverRequest>,
) -> Result<Json<BatchReport<DeliveryReceipt>>, AppError> {
    state.engine.get_driver(id).await?;
    let report = state
        .engine
        .batch_deliver(id, payload.items, payload.location)
        .await;
    Ok(Json(report))
}
