use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{AllocationRequest, CapacityConfig};
use super::service::{AllocationService, AllocationServiceError};

/// Body for allocating a roster uploaded as CSV text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterAllocationRequest {
    pub roster_csv: String,
    #[serde(default)]
    pub quotas: Option<BTreeMap<String, f64>>,
    pub capacity: CapacityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterScanRequest {
    pub roster_csv: String,
}

/// Router builder exposing the allocation engine over HTTP.
pub fn allocation_router(service: Arc<AllocationService>) -> Router {
    Router::new()
        .route("/api/v1/allocations", post(allocate_handler))
        .route("/api/v1/allocations/roster", post(roster_handler))
        .route("/api/v1/allocations/scan", post(scan_handler))
        .with_state(service)
}

pub(crate) async fn allocate_handler(
    State(service): State<Arc<AllocationService>>,
    axum::Json(request): axum::Json<AllocationRequest>,
) -> Response {
    match service.allocate(request) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn roster_handler(
    State(service): State<Arc<AllocationService>>,
    axum::Json(request): axum::Json<RosterAllocationRequest>,
) -> Response {
    let RosterAllocationRequest {
        roster_csv,
        quotas,
        capacity,
    } = request;

    let reader = Cursor::new(roster_csv.into_bytes());
    match service.allocate_roster(reader, quotas.as_ref(), &capacity) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn scan_handler(
    State(service): State<Arc<AllocationService>>,
    axum::Json(request): axum::Json<RosterScanRequest>,
) -> Response {
    let reader = Cursor::new(request.roster_csv.into_bytes());
    match service.scan(reader) {
        Ok(scan) => (StatusCode::OK, axum::Json(scan)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AllocationServiceError) -> Response {
    let status = match error {
        AllocationServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AllocationServiceError::Roster(_) => StatusCode::BAD_REQUEST,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
