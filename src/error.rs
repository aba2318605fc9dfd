use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::package::PackageStatus;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: PackageStatus,
        to: PackageStatus,
    },

    #[error("driver {driver_id} is not assigned to package {package_id}")]
    NotAuthorizedDriver { package_id: u64, driver_id: Uuid },

    #[error("package {package_id} is already assigned to another driver")]
    AlreadyAssignedElsewhere { package_id: u64 },

    #[error("package {package_id} is not available for assignment (status {status})")]
    NotAvailable {
        package_id: u64,
        status: PackageStatus,
    },

    #[error("invalid verification code: {0}")]
    InvalidVerificationCode(String),

    #[error("missing verification code: {0}")]
    MissingVerificationCode(String),

    #[error("an in-progress proof of delivery already exists for package {package_id}")]
    DuplicateActiveRecord { package_id: u64 },

    #[error("{0} is not required for this delivery")]
    RequirementNotApplicable(&'static str),

    #[error("missing required evidence: {0}")]
    MissingRequiredEvidence(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    StorageFailure(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable name used in API bodies and batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::NotAuthorizedDriver { .. } => "not_authorized_driver",
            AppError::AlreadyAssignedElsewhere { .. } => "already_assigned_elsewhere",
            AppError::NotAvailable { .. } => "not_available",
            AppError::InvalidVerificationCode(_) => "invalid_verification_code",
            AppError::MissingVerificationCode(_) => "missing_verification_code",
            AppError::DuplicateActiveRecord { .. } => "duplicate_active_record",
            AppError::RequirementNotApplicable(_) => "requirement_not_applicable",
            AppError::MissingRequiredEvidence(_) => "missing_required_evidence",
            AppError::Conflict(_) => "conflict",
            AppError::StorageFailure(_) => "storage_failure",
            AppError::BadRequest(_) => "bad_request",
            AppError::Internal(_) => "internal",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotAuthorizedDriver { .. } => StatusCode::FORBIDDEN,
            AppError::InvalidVerificationCode(_) | AppError::MissingVerificationCode(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::InvalidTransition { .. }
            | AppError::AlreadyAssignedElsewhere { .. }
            | AppError::NotAvailable { .. }
            | AppError::DuplicateActiveRecord { .. }
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RequirementNotApplicable(_) | AppError::MissingRequiredEvidence(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::StorageFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.kind(),
        }));

        (status, body).into_response()
    }
}
