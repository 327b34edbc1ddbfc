// crates/stockline-core/src/core/records.rs
// ============================================================================
// Module: Inventory Records
// Description: Movement, inventory, anomaly, and tenant record types.
// Purpose: Define the serializable data model shared by backends and callers.
// Dependencies: serde, sha2, time
// ============================================================================

//! ## Overview
//! Movement records form an append-only tracking log per tenant; inventory is
//! always derived from that log, never stored. Anomaly records are immutable
//! once written and carry a content-derived digest identifier so the same
//! detection never produces two different ids.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use time::PrimitiveDateTime;

use crate::core::identifiers::AnomalyId;
use crate::core::identifiers::ProductId;
use crate::core::identifiers::TenantId;

// ============================================================================
// SECTION: Movement Records
// ============================================================================

/// Product movement submitted by a caller.
///
/// # Invariants
/// - `quantity` is signed; negative values represent removals.
/// - The record is append-only once persisted; nothing updates or deletes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    /// Product identifier.
    pub product_id: ProductId,
    /// Product display name.
    pub product_name: String,
    /// Signed quantity delta.
    pub quantity: i64,
}

/// Acknowledgement for a persisted movement record.
///
/// # Invariants
/// - `sequence_id` is the storage-assigned append position within the tenant's
///   tracking log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementAck {
    /// Sequence identifier assigned by storage.
    pub sequence_id: i64,
}

/// One row of the derived inventory view.
///
/// # Invariants
/// - `total_quantity` is the sum of all movement quantities for the
///   `(product_id, product_name)` pair; it is recomputed, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRow {
    /// Product identifier.
    pub product_id: ProductId,
    /// Product display name.
    pub product_name: String,
    /// Summed quantity across the tracking log.
    pub total_quantity: i64,
}

// ============================================================================
// SECTION: Anomaly Records
// ============================================================================

/// Detected inventory anomaly.
///
/// # Invariants
/// - `id` is the SHA-256 digest of `tenant:product:detection time` and is
///   stable for identical inputs.
/// - Records are immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    /// Content-derived anomaly identifier.
    pub id: AnomalyId,
    /// Tenant the anomaly belongs to.
    pub tenant_id: TenantId,
    /// Product the anomaly was detected for.
    pub product_id: ProductId,
    /// Detection timestamp.
    pub detected_at: PrimitiveDateTime,
    /// Caller-supplied description.
    pub description: String,
}

impl AnomalyRecord {
    /// Builds an anomaly record with a content-derived identifier.
    #[must_use]
    pub fn detect(
        tenant_id: TenantId,
        product_id: ProductId,
        detected_at: PrimitiveDateTime,
        description: impl Into<String>,
    ) -> Self {
        let id = derive_anomaly_id(&tenant_id, product_id, detected_at);
        Self {
            id,
            tenant_id,
            product_id,
            detected_at,
            description: description.into(),
        }
    }
}

/// Derives the digest identifier for an anomaly detection.
fn derive_anomaly_id(
    tenant_id: &TenantId,
    product_id: ProductId,
    detected_at: PrimitiveDateTime,
) -> AnomalyId {
    let payload = format!("{tenant_id}:{product_id}:{detected_at}");
    let digest = Sha256::digest(payload.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    AnomalyId::new(hex)
}

/// Outcome of an anomaly evaluation.
///
/// # Invariants
/// - `Recorded` is returned only after the anomaly row is durably persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnomalyOutcome {
    /// Inventory total was non-negative; nothing recorded.
    NotDetected,
    /// Inventory total was negative; the anomaly was persisted.
    Recorded(AnomalyRecord),
}

// ============================================================================
// SECTION: Tenant Records
// ============================================================================

/// Tenant directory record.
///
/// # Invariants
/// - `id` is the routing key; it is generated at the service edge, never by
///   the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecord {
    /// Tenant identifier.
    pub id: TenantId,
    /// Tenant display name.
    pub name: String,
    /// Tenant contact email.
    pub email: String,
}
