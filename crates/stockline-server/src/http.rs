// crates/stockline-server/src/http.rs
// ============================================================================
// Module: HTTP Transport
// Description: Axum routing and status mapping for the tenant API.
// Purpose: Keep transport framing thin over the transport-agnostic API.
// Dependencies: axum, serde, serde_json, stockline-core, tokio
// ============================================================================

//! ## Overview
//! The HTTP layer is deliberately thin: handlers parse the path and body,
//! bridge onto the blocking storage backend with `spawn_blocking`, and map
//! [`OperationError`] variants to status codes. No business rule lives here.
//! A pooled connection is only ever held inside the blocking call, never
//! across an await point.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use stockline_core::AnomalyOutcome;
use stockline_core::AnomalyRecord;
use stockline_core::InventoryRow;
use stockline_core::LicenseStatus;
use stockline_core::MovementAck;
use stockline_core::NewMovement;
use stockline_core::OperationError;
use stockline_core::ProductId;
use stockline_core::TenantId;
use stockline_core::TenantRecord;

use crate::api::TenantApi;

// ============================================================================
// SECTION: State and Router
// ============================================================================

/// Shared handler state.
///
/// # Invariants
/// - Cloning shares the same API instance.
#[derive(Clone)]
pub struct AppState {
    /// Transport-agnostic operation surface.
    api: Arc<TenantApi>,
}

/// Builds the service router over an API instance.
#[must_use]
pub fn build_router(api: Arc<TenantApi>) -> Router {
    let state = AppState {
        api,
    };
    Router::new()
        .route("/healthz", get(healthz))
        .route("/tenants", post(register_tenant))
        .route("/tenants/{tenant_id}", get(get_tenant))
        .route("/tenants/{tenant_id}/license", get(license_status))
        .route("/tenants/{tenant_id}/movements", post(record_movement))
        .route("/tenants/{tenant_id}/inventory", get(get_inventory))
        .route("/tenants/{tenant_id}/anomaly-checks", post(check_anomaly))
        .route("/tenants/{tenant_id}/anomalies", get(list_anomalies))
        .with_state(state)
}

// ============================================================================
// SECTION: Error Mapping
// ============================================================================

/// HTTP-facing wrapper for operation errors.
///
/// # Invariants
/// - The response body always carries the error message under `error`.
#[derive(Debug)]
pub struct ApiError(pub OperationError);

/// Maps an operation error to its response status.
#[must_use]
pub const fn status_for(error: &OperationError) -> StatusCode {
    match error {
        OperationError::AccessDenied(_) => StatusCode::FORBIDDEN,
        OperationError::NotFound(_) => StatusCode::NOT_FOUND,
        OperationError::InvalidTenantId(_) => StatusCode::BAD_REQUEST,
        OperationError::PoolExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
        OperationError::Configuration(_)
        | OperationError::Provisioning(_)
        | OperationError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = Json(json!({
            "error": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

/// Runs a blocking storage call off the async runtime.
async fn run_blocking<T, F>(task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, OperationError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result.map_err(ApiError),
        Err(err) => Err(ApiError(OperationError::Persistence(format!(
            "blocking task failed: {err}"
        )))),
    }
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Tenant registration request body.
#[derive(Debug, Deserialize)]
struct RegisterTenantRequest {
    /// Tenant display name.
    name: String,
    /// Tenant contact email.
    email: String,
}

/// Tenant registration response body.
#[derive(Debug, Serialize)]
struct RegisterTenantResponse {
    /// Generated tenant identifier.
    tenant_id: TenantId,
}

/// Anomaly check request body.
#[derive(Debug, Deserialize)]
struct AnomalyCheckRequest {
    /// Product to evaluate.
    product_id: ProductId,
    /// Description recorded when an anomaly is detected.
    description: String,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Liveness probe.
async fn healthz() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
    }))
}

/// Registers a tenant and returns the generated identifier.
async fn register_tenant(
    State(state): State<AppState>,
    Json(request): Json<RegisterTenantRequest>,
) -> Result<(StatusCode, Json<RegisterTenantResponse>), ApiError> {
    let api = state.api.clone();
    let record = run_blocking(move || api.register_tenant(request.name, request.email)).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterTenantResponse {
            tenant_id: record.id,
        }),
    ))
}

/// Fetches a tenant record.
async fn get_tenant(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<TenantRecord>, ApiError> {
    let api = state.api.clone();
    let tenant_id = TenantId::new(tenant_id);
    let record = run_blocking(move || api.get_tenant(&tenant_id)).await?;
    Ok(Json(record))
}

/// Reports the tenant's effective license state.
async fn license_status(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<LicenseStatus>, ApiError> {
    let api = state.api.clone();
    let tenant_id = TenantId::new(tenant_id);
    let status = run_blocking(move || api.license_status(&tenant_id)).await?;
    Ok(Json(status))
}

/// Appends a product movement to the tenant's tracking log.
async fn record_movement(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(movement): Json<NewMovement>,
) -> Result<Json<MovementAck>, ApiError> {
    let api = state.api.clone();
    let tenant_id = TenantId::new(tenant_id);
    let ack = run_blocking(move || api.track_product(&tenant_id, &movement)).await?;
    Ok(Json(ack))
}

/// Computes the tenant's derived inventory view.
async fn get_inventory(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<Vec<InventoryRow>>, ApiError> {
    let api = state.api.clone();
    let tenant_id = TenantId::new(tenant_id);
    let rows = run_blocking(move || api.get_inventory(&tenant_id)).await?;
    Ok(Json(rows))
}

/// Evaluates the anomaly rule for one product.
async fn check_anomaly(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(request): Json<AnomalyCheckRequest>,
) -> Result<Json<AnomalyOutcome>, ApiError> {
    let api = state.api.clone();
    let tenant_id = TenantId::new(tenant_id);
    let outcome = run_blocking(move || {
        api.detect_anomaly(&tenant_id, request.product_id, &request.description)
    })
    .await?;
    Ok(Json(outcome))
}

/// Lists the tenant's recorded anomalies, most recent first.
async fn list_anomalies(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<Vec<AnomalyRecord>>, ApiError> {
    let api = state.api.clone();
    let tenant_id = TenantId::new(tenant_id);
    let records = run_blocking(move || api.get_anomalies(&tenant_id)).await?;
    Ok(Json(records))
}
