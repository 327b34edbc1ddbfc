// crates/stockline-core/src/interfaces/mod.rs
// ============================================================================
// Module: Stockline Interfaces
// Description: Backend-agnostic interfaces for tenant operations and gating.
// Purpose: Define the contract surfaces every Stockline backend implements.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how Stockline integrates with a storage backend without
//! embedding backend-specific details. Implementations must fail closed: a
//! license check that cannot complete denies access, and storage failures are
//! surfaced with context rather than downgraded to success.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::ProductId;
use crate::core::identifiers::TenantId;
use crate::core::license::LicenseStatus;
use crate::core::records::AnomalyOutcome;
use crate::core::records::AnomalyRecord;
use crate::core::records::InventoryRow;
use crate::core::records::MovementAck;
use crate::core::records::NewMovement;
use crate::core::records::TenantRecord;
use crate::core::routing::NamespaceNameError;

// ============================================================================
// SECTION: Error Taxonomy
// ============================================================================

/// Tenant operation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `AccessDenied` always carries the human-readable license reason.
/// - `Provisioning` and `PoolExhausted` are retryable; `InvalidTenantId`,
///   `AccessDenied`, and `NotFound` are not.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Shard or pool configuration problem (bad index, failed slot, shutdown).
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Namespace or table creation failed for a non-benign reason.
    #[error("provisioning error: {0}")]
    Provisioning(String),
    /// Storage operation failed after provisioning.
    #[error("persistence error: {0}")]
    Persistence(String),
    /// License state does not permit tenant operations.
    #[error("access denied: {0}")]
    AccessDenied(String),
    /// Connection checkout exceeded the bounded wait.
    #[error("connection pool exhausted: {0}")]
    PoolExhausted(String),
    /// Requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Tenant identifier cannot derive a valid namespace.
    #[error("invalid tenant identifier: {0}")]
    InvalidTenantId(String),
}

impl From<NamespaceNameError> for OperationError {
    fn from(err: NamespaceNameError) -> Self {
        Self::InvalidTenantId(err.to_string())
    }
}

// ============================================================================
// SECTION: License Authority
// ============================================================================

/// License evaluation and gating interface.
pub trait LicenseAuthority {
    /// Returns the effective license state for the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] when the license record cannot be read.
    fn license_status(&self, tenant_id: &TenantId) -> Result<LicenseStatus, OperationError>;

    /// Authorizes tenant operations, failing closed on non-permitting states.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::AccessDenied`] with the human-readable reason
    /// unless the state is active or grace, and propagates read failures.
    fn authorize(&self, tenant_id: &TenantId) -> Result<LicenseStatus, OperationError> {
        let status = self.license_status(tenant_id)?;
        if status.permits_access() {
            Ok(status)
        } else {
            Err(OperationError::AccessDenied(status.reason()))
        }
    }
}

// ============================================================================
// SECTION: Inventory Operations
// ============================================================================

/// Tenant-scoped inventory operations.
///
/// Every method is license-gated: implementations must call
/// [`LicenseAuthority::authorize`] before performing any read or mutation.
pub trait InventoryOperations {
    /// Appends one movement record to the tenant's tracking log.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] on denial, provisioning, or storage failure.
    fn record_movement(
        &self,
        tenant_id: &TenantId,
        movement: &NewMovement,
    ) -> Result<MovementAck, OperationError>;

    /// Computes the derived inventory view over the tracking log.
    ///
    /// The result is a snapshot read; it is not atomic with respect to
    /// concurrent appends to the same tenant's log.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] on denial, provisioning, or storage failure.
    fn compute_inventory(&self, tenant_id: &TenantId) -> Result<Vec<InventoryRow>, OperationError>;

    /// Recomputes the product total and records an anomaly when negative.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] on denial, provisioning, or storage failure.
    fn record_anomaly_if_negative(
        &self,
        tenant_id: &TenantId,
        product_id: ProductId,
        description: &str,
    ) -> Result<AnomalyOutcome, OperationError>;

    /// Lists recorded anomalies, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] on denial, provisioning, or storage failure.
    fn list_anomalies(&self, tenant_id: &TenantId) -> Result<Vec<AnomalyRecord>, OperationError>;
}

// ============================================================================
// SECTION: Tenant Directory
// ============================================================================

/// Shared tenant directory backed by the per-shard `tenants` table.
pub trait TenantDirectory {
    /// Stores a tenant record under its caller-supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] when the record cannot be stored.
    fn register_tenant(&self, record: &TenantRecord) -> Result<(), OperationError>;

    /// Loads a tenant record by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] when the lookup fails; a missing tenant is
    /// `Ok(None)`, not an error.
    fn get_tenant(&self, tenant_id: &TenantId) -> Result<Option<TenantRecord>, OperationError>;
}
