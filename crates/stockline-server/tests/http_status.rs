// crates/stockline-server/tests/http_status.rs
// ============================================================================
// Module: HTTP Status Mapping Tests
// Description: Operation error to response status translation.
// Purpose: Keep the error taxonomy's client/server split stable on the wire.
// ============================================================================

//! ## Overview
//! Access denial is a client error, never retried; pool exhaustion is
//! retryable and must surface as service-unavailable; storage and
//! provisioning failures are server errors. These mappings are part of the
//! operation contract.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use axum::http::StatusCode;
use axum::response::IntoResponse;
use stockline_core::OperationError;
use stockline_server::ApiError;
use stockline_server::status_for;

#[test]
fn access_denied_maps_to_forbidden() {
    let error = OperationError::AccessDenied("license has expired".to_string());
    assert_eq!(status_for(&error), StatusCode::FORBIDDEN);
}

#[test]
fn not_found_maps_to_not_found() {
    let error = OperationError::NotFound("tenant x does not exist".to_string());
    assert_eq!(status_for(&error), StatusCode::NOT_FOUND);
}

#[test]
fn invalid_tenant_id_maps_to_bad_request() {
    let error = OperationError::InvalidTenantId("tenant identifier is empty".to_string());
    assert_eq!(status_for(&error), StatusCode::BAD_REQUEST);
}

#[test]
fn pool_exhausted_maps_to_service_unavailable() {
    let error = OperationError::PoolExhausted("shard 0: timed out".to_string());
    assert_eq!(status_for(&error), StatusCode::SERVICE_UNAVAILABLE);
}

#[test]
fn infrastructure_failures_map_to_internal_server_error() {
    for error in [
        OperationError::Configuration("shard index 7 out of range".to_string()),
        OperationError::Provisioning("schema creation failed".to_string()),
        OperationError::Persistence("insert failed".to_string()),
    ] {
        assert_eq!(status_for(&error), StatusCode::INTERNAL_SERVER_ERROR, "{error}");
    }
}

#[test]
fn api_error_response_carries_the_mapped_status() {
    let response =
        ApiError(OperationError::AccessDenied("license has been revoked".to_string()))
            .into_response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
