// crates/stockline-server/src/lib.rs
// ============================================================================
// Module: Stockline Server
// Description: Service surface, audit seam, and HTTP transport.
// Purpose: Compose the store, the API, and the router for the binary.
// Dependencies: axum, serde_json, stockline-core, stockline-store-postgres
// ============================================================================

//! ## Overview
//! The server crate layers the transport-agnostic [`api::TenantApi`] over any
//! backend implementing the core interfaces, emits JSONL audit records
//! through the [`audit::AuditSink`] seam, and exposes the whole surface as an
//! axum router. The binary in `main.rs` is the composition root: it owns the
//! shard pool registry lifecycle from initialization through shutdown.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod api;
pub mod audit;
pub mod http;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use api::TenantApi;
pub use api::TenantService;
pub use audit::AuditEvent;
pub use audit::AuditSink;
pub use audit::JsonLineAuditSink;
pub use audit::NoopAuditSink;
pub use http::ApiError;
pub use http::build_router;
pub use http::status_for;
