// crates/stockline-server/src/api.rs
// ============================================================================
// Module: Tenant API
// Description: Transport-agnostic service operations with auditing.
// Purpose: Keep the operation surface testable without HTTP framing.
// Dependencies: stockline-core, uuid
// ============================================================================

//! ## Overview
//! `TenantApi` is the logical operation surface: everything the HTTP layer
//! exposes is implemented here against the core interface traits, so the
//! behavior (gating, not-found mapping, audit emission) can be exercised
//! directly in tests with a stub backend. Tenant identifiers are generated
//! here, at the service edge, because the core never generates them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use stockline_core::AnomalyOutcome;
use stockline_core::AnomalyRecord;
use stockline_core::InventoryOperations;
use stockline_core::InventoryRow;
use stockline_core::LicenseAuthority;
use stockline_core::LicenseStatus;
use stockline_core::MovementAck;
use stockline_core::NewMovement;
use stockline_core::OperationError;
use stockline_core::ProductId;
use stockline_core::TenantDirectory;
use stockline_core::TenantId;
use stockline_core::TenantRecord;
use uuid::Uuid;

use crate::audit::AuditEvent;
use crate::audit::AuditSink;

// ============================================================================
// SECTION: Service Seam
// ============================================================================

/// Full backend surface the API is built on.
pub trait TenantService:
    InventoryOperations + TenantDirectory + LicenseAuthority + Send + Sync
{
}

impl<T> TenantService for T where
    T: InventoryOperations + TenantDirectory + LicenseAuthority + Send + Sync
{
}

// ============================================================================
// SECTION: Tenant API
// ============================================================================

/// Transport-agnostic operation surface.
///
/// # Invariants
/// - Every operation emits exactly one audit event.
/// - Gating lives in the backend; this layer never bypasses it.
pub struct TenantApi {
    /// Storage backend implementing the core interfaces.
    service: Arc<dyn TenantService>,
    /// Audit sink for operation outcomes.
    audit: Arc<dyn AuditSink>,
}

impl TenantApi {
    /// Creates the API over a backend and an audit sink.
    #[must_use]
    pub fn new(service: Arc<dyn TenantService>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            service,
            audit,
        }
    }

    /// Registers a tenant under a freshly generated identifier.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] when the record cannot be stored.
    pub fn register_tenant(
        &self,
        name: String,
        email: String,
    ) -> Result<TenantRecord, OperationError> {
        let record = TenantRecord {
            id: TenantId::new(Uuid::new_v4().to_string()),
            name,
            email,
        };
        let result = self.service.register_tenant(&record);
        self.emit("register_tenant", Some(&record.id), result.as_ref().err());
        result.map(|()| record)
    }

    /// Loads a tenant record, mapping absence to a not-found error.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::NotFound`] when the tenant does not exist and
    /// propagates lookup failures.
    pub fn get_tenant(&self, tenant_id: &TenantId) -> Result<TenantRecord, OperationError> {
        let result = self.service.get_tenant(tenant_id).and_then(|record| {
            record.ok_or_else(|| {
                OperationError::NotFound(format!("tenant {tenant_id} does not exist"))
            })
        });
        self.emit("get_tenant", Some(tenant_id), result.as_ref().err());
        result
    }

    /// Returns the tenant's effective license state (ungated read).
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] when the license record cannot be read.
    pub fn license_status(
        &self,
        tenant_id: &TenantId,
    ) -> Result<LicenseStatus, OperationError> {
        let result = self.service.license_status(tenant_id);
        self.emit("license_status", Some(tenant_id), result.as_ref().err());
        result
    }

    /// Appends one movement record (license-gated).
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] on denial, provisioning, or storage failure.
    pub fn track_product(
        &self,
        tenant_id: &TenantId,
        movement: &NewMovement,
    ) -> Result<MovementAck, OperationError> {
        let result = self.service.record_movement(tenant_id, movement);
        self.emit("track_product", Some(tenant_id), result.as_ref().err());
        result
    }

    /// Computes the derived inventory view (license-gated).
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] on denial, provisioning, or storage failure.
    pub fn get_inventory(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<InventoryRow>, OperationError> {
        let result = self.service.compute_inventory(tenant_id);
        self.emit("get_inventory", Some(tenant_id), result.as_ref().err());
        result
    }

    /// Evaluates the negative-total anomaly rule (license-gated).
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] on denial, provisioning, or storage failure.
    pub fn detect_anomaly(
        &self,
        tenant_id: &TenantId,
        product_id: ProductId,
        description: &str,
    ) -> Result<AnomalyOutcome, OperationError> {
        let result = self.service.record_anomaly_if_negative(tenant_id, product_id, description);
        self.emit("detect_anomaly", Some(tenant_id), result.as_ref().err());
        result
    }

    /// Lists recorded anomalies, most recent first (license-gated).
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] on denial, provisioning, or storage failure.
    pub fn get_anomalies(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<AnomalyRecord>, OperationError> {
        let result = self.service.list_anomalies(tenant_id);
        self.emit("get_anomalies", Some(tenant_id), result.as_ref().err());
        result
    }

    /// Emits one audit event for an operation outcome.
    fn emit(
        &self,
        operation: &'static str,
        tenant_id: Option<&TenantId>,
        error: Option<&OperationError>,
    ) {
        let (outcome, detail) = match error {
            None => ("ok", None),
            Some(OperationError::AccessDenied(reason)) => ("denied", Some(reason.clone())),
            Some(other) => ("error", Some(other.to_string())),
        };
        self.audit.record(&AuditEvent {
            operation,
            tenant_id: tenant_id.map(|id| id.as_str().to_string()),
            outcome,
            detail,
        });
    }
}
