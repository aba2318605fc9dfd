use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::proof::DeliveryRequirements;
use crate::engine::verification::VerificationResult;
use crate::engine::{
    DeliveryReceipt, DeliveryRequest, FailureRequest, PackageDetails, PickupRequest,
};
use crate::error::AppError;
use crate::models::location::LocationFix;
use crate::models::package::{NewPackage, Package};
use crate::models::proof::{DeliveryEvidence, ProofOfDelivery, RecipientDetails};
use crate::models::tracking::TrackingEvent;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/packages", post(create_package))
        .route("/packages/:id", get(package_details))
        .route("/packages/tracking/:tracking_number", get(by_tracking))
        .route("/packages/:id/history", get(history))
        .route("/packages/:id/requirements", get(requirements))
        .route("/packages/:id/assign", post(assign))
        .route("/packages/:id/unassign", post(unassign))
        .route("/packages/:id/reassign", post(reassign))
        .route("/packages/:id/reject", post(reject))
        .route("/packages/:id/cancel", post(cancel))
        .route("/packages/:id/pickup", post(pickup))
        .route("/packages/:id/start-delivery", post(start_delivery))
        .route("/packages/:id/signature", post(attach_signature))
        .route("/packages/:id/photos/delivery", post(attach_delivery_photo))
        .route("/packages/:id/photos/package", post(attach_package_photo))
        .route("/packages/:id/deliver", post(deliver))
        .route("/packages/:id/fail", post(fail))
        .route(
            "/packages/:id/verify-collection-code",
            post(verify_collection_code),
        )
        .route("/packages/:id/verify-drop-off-code", post(verify_drop_off_code))
}

/// Booking response; the only place codes leave the service.
#[derive(Serialize)]
pub struct BookedPackage {
    #[serde(flatten)]
    pub package: Package,
    pub collection_code: Option<String>,
    pub drop_off_code: Option<String>,
}

#[derive(Deserialize)]
pub struct DriverRequest {
    pub driver_id: Uuid,
}

#[derive(Deserialize)]
pub struct RejectRequest {
    pub driver_id: Uuid,
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize)]
pub struct PickupBody {
    pub driver_id: Uuid,
    #[serde(default)]
    pub collection_code: Option<String>,
    #[serde(default)]
    pub location: Option<LocationFix>,
}

#[derive(Deserialize)]
pub struct StartDeliveryBody {
    pub driver_id: Uuid,
    #[serde(default)]
    pub location: Option<LocationFix>,
}

#[derive(Deserialize)]
pub struct EvidenceBody {
    pub driver_id: Uuid,
    pub value: String,
}

#[derive(Deserialize)]
pub struct DeliverBody {
    pub driver_id: Uuid,
    #[serde(default)]
    pub drop_off_code: Option<String>,
    pub recipient: RecipientDetails,
    #[serde(default)]
    pub evidence: DeliveryEvidence,
    #[serde(default)]
    pub location: Option<LocationFix>,
}

#[derive(Deserialize)]
pub struct FailBody {
    pub driver_id: Uuid,
    pub reason: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub photo_ref: Option<String>,
    #[serde(default)]
    pub location: Option<LocationFix>,
}

#[derive(Deserialize)]
pub struct CodeBody {
    #[serde(default)]
    pub code: Option<String>,
}

async fn create_package(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewPackage>,
) -> Result<Json<BookedPackage>, AppError> {
    let package = state.engine.create_package(payload).await?;
    Ok(Json(BookedPackage {
        collection_code: package.collection_code.clone(),
        drop_off_code: package.drop_off_code.clone(),
        package,
    }))
}

async fn package_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<PackageDetails>, AppError> {
    Ok(Json(state.engine.package_details(id).await?))
}

async fn by_tracking(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
) -> Result<Json<Package>, AppError> {
    Ok(Json(state.engine.package_by_tracking(&tracking_number).await?))
}

async fn history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<TrackingEvent>>, AppError> {
    Ok(Json(state.engine.tracking_history(id).await?))
}

async fn requirements(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<DeliveryRequirements>, AppError> {
    Ok(Json(state.engine.delivery_requirements(id).await?))
}

async fn assign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<DriverRequest>,
) -> Result<Json<Package>, AppError> {
    Ok(Json(state.engine.assign(id, payload.driver_id).await?))
}

async fn unassign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Package>, AppError> {
    Ok(Json(state.engine.unassign(id).await?))
}

async fn reassign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<DriverRequest>,
) -> Result<Json<Package>, AppError> {
    Ok(Json(state.engine.reassign(id, payload.driver_id).await?))
}

async fn reject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<RejectRequest>,
) -> Result<Json<Package>, AppError> {
    let package = state
        .engine
        .reject(id, payload.driver_id, &payload.reason)
        .await?;
    Ok(Json(package))
}

async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<CancelRequest>,
) -> Result<Json<Package>, AppError> {
    Ok(Json(state.engine.cancel(id, &payload.reason).await?))
}

async fn pickup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<PickupBody>,
) -> Result<Json<Package>, AppError> {
    let package = state
        .engine
        .pickup(PickupRequest {
            package_id: id,
            driver_id: payload.driver_id,
            collection_code: payload.collection_code,
            location: payload.location,
        })
        .await?;
    Ok(Json(package))
}

async fn start_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<StartDeliveryBody>,
) -> Result<Json<ProofOfDelivery>, AppError> {
    let proof = state
        .engine
        .start_delivery(id, payload.driver_id, payload.location)
        .await?;
    Ok(Json(proof))
}

async fn attach_signature(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<EvidenceBody>,
) -> Result<Json<ProofOfDelivery>, AppError> {
    let proof = state
        .engine
        .attach_signature(id, payload.driver_id, &payload.value)
        .await?;
    Ok(Json(proof))
}

async fn attach_delivery_photo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<EvidenceBody>,
) -> Result<Json<ProofOfDelivery>, AppError> {
    let proof = state
        .engine
        .attach_delivery_photo(id, payload.driver_id, &payload.value)
        .await?;
    Ok(Json(proof))
}

async fn attach_package_photo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<EvidenceBody>,
) -> Result<Json<ProofOfDelivery>, AppError> {
    let proof = state
        .engine
        .attach_package_photo(id, payload.driver_id, &payload.value)
        .await?;
    Ok(Json(proof))
}

async fn deliver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<DeliverBody>,
) -> Result<Json<DeliveryReceipt>, AppError> {
    let receipt = state
        .engine
        .deliver(DeliveryRequest {
            package_id: id,
            driver_id: payload.driver_id,
            drop_off_code: payload.drop_off_code,
            recipient: payload.recipient,
            evidence: payload.evidence,
            location: payload.location,
        })
        .await?;
    Ok(Json(receipt))
}

async fn fail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<FailBody>,
) -> Result<Json<DeliveryReceipt>, AppError> {
    let receipt = state
        .engine
        .mark_failed(FailureRequest {
            package_id: id,
            driver_id: payload.driver_id,
            reason: payload.reason,
            notes: payload.notes,
            photo_ref: payload.photo_ref,
            location: payload.location,
        })
        .await?;
    Ok(Json(receipt))
}

async fn verify_collection_code(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<CodeBody>,
) -> Result<Json<VerificationResult>, AppError> {
    let result = state
        .engine
        .verify_collection_code(id, payload.code.as_deref())
        .await?;
    Ok(Json(result))
}

async fn verify_drop_off_code(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<CodeBody>,
) -> Result<Json<VerificationResult>, AppError> {
    let result = state
        .engine
        .verify_drop_off_code(id, payload.code.as_deref())
        .await?;
    Ok(Json(result))
}
