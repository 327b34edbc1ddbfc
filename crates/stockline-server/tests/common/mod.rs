// crates/stockline-server/tests/common/mod.rs
// ============================================================================
// Module: Server Test Fixtures
// Description: In-memory backend and capturing audit sink for API tests.
// Purpose: Exercise gating, auditing, and API behavior without Postgres.
// Dependencies: stockline-core, stockline-server
// ============================================================================

//! ## Overview
//! `StubBackend` implements the core interfaces over in-memory state and runs
//! the real license-gate default before every inventory operation, so the
//! short-circuit contract (deny before any mutation) is exercised exactly as
//! a storage backend would run it. `CapturingAuditSink` collects emitted
//! events for assertions.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

use std::collections::BTreeMap;
use std::sync::Mutex;

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
use stockline_server::AuditEvent;
use stockline_server::AuditSink;
use time::macros::datetime;

/// In-memory backend with a configurable license state.
pub struct StubBackend {
    /// License state returned for every tenant.
    pub status: LicenseStatus,
    /// Recorded movements in append order.
    pub movements: Mutex<Vec<NewMovement>>,
    /// Recorded anomalies in append order.
    pub anomalies: Mutex<Vec<AnomalyRecord>>,
    /// Registered tenants keyed by identifier.
    pub tenants: Mutex<BTreeMap<String, TenantRecord>>,
}

impl StubBackend {
    /// Creates an empty backend with the given license state.
    pub fn with_status(status: LicenseStatus) -> Self {
        Self {
            status,
            movements: Mutex::new(Vec::new()),
            anomalies: Mutex::new(Vec::new()),
            tenants: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the number of recorded movements.
    pub fn movement_count(&self) -> usize {
        self.movements.lock().expect("movements lock").len()
    }

    /// Returns the number of recorded anomalies.
    pub fn anomaly_count(&self) -> usize {
        self.anomalies.lock().expect("anomalies lock").len()
    }
}

impl LicenseAuthority for StubBackend {
    fn license_status(&self, _tenant_id: &TenantId) -> Result<LicenseStatus, OperationError> {
        Ok(self.status)
    }
}

impl InventoryOperations for StubBackend {
    fn record_movement(
        &self,
        tenant_id: &TenantId,
        movement: &NewMovement,
    ) -> Result<MovementAck, OperationError> {
        self.authorize(tenant_id)?;
        let mut movements = self.movements.lock().expect("movements lock");
        movements.push(movement.clone());
        Ok(MovementAck {
            sequence_id: i64::try_from(movements.len()).expect("sequence fits"),
        })
    }

    fn compute_inventory(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<InventoryRow>, OperationError> {
        self.authorize(tenant_id)?;
        let movements = self.movements.lock().expect("movements lock");
        let mut totals: BTreeMap<(i64, String), i64> = BTreeMap::new();
        for movement in movements.iter() {
            *totals
                .entry((movement.product_id.get(), movement.product_name.clone()))
                .or_insert(0) += movement.quantity;
        }
        Ok(totals
            .into_iter()
            .map(|((product_id, product_name), total_quantity)| InventoryRow {
                product_id: ProductId::new(product_id),
                product_name,
                total_quantity,
            })
            .collect())
    }

    fn record_anomaly_if_negative(
        &self,
        tenant_id: &TenantId,
        product_id: ProductId,
        description: &str,
    ) -> Result<AnomalyOutcome, OperationError> {
        self.authorize(tenant_id)?;
        let total: i64 = self
            .movements
            .lock()
            .expect("movements lock")
            .iter()
            .filter(|movement| movement.product_id == product_id)
            .map(|movement| movement.quantity)
            .sum();
        if total >= 0 {
            return Ok(AnomalyOutcome::NotDetected);
        }
        let record = AnomalyRecord::detect(
            tenant_id.clone(),
            product_id,
            datetime!(2026-03-15 12:00:00),
            format!("{description} (total quantity {total})"),
        );
        self.anomalies.lock().expect("anomalies lock").push(record.clone());
        Ok(AnomalyOutcome::Recorded(record))
    }

    fn list_anomalies(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<AnomalyRecord>, OperationError> {
        self.authorize(tenant_id)?;
        let mut records = self.anomalies.lock().expect("anomalies lock").clone();
        records.reverse();
        Ok(records)
    }
}

impl TenantDirectory for StubBackend {
    fn register_tenant(&self, record: &TenantRecord) -> Result<(), OperationError> {
        self.tenants
            .lock()
            .expect("tenants lock")
            .insert(record.id.as_str().to_string(), record.clone());
        Ok(())
    }

    fn get_tenant(&self, tenant_id: &TenantId) -> Result<Option<TenantRecord>, OperationError> {
        Ok(self.tenants.lock().expect("tenants lock").get(tenant_id.as_str()).cloned())
    }
}

/// Audit sink that captures events for assertions.
pub struct CapturingAuditSink {
    /// Captured events in emission order.
    pub events: Mutex<Vec<AuditEvent>>,
}

impl CapturingAuditSink {
    /// Creates an empty capturing sink.
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Returns captured `(operation, outcome)` pairs.
    pub fn outcomes(&self) -> Vec<(String, String)> {
        self.events
            .lock()
            .expect("events lock")
            .iter()
            .map(|event| (event.operation.to_string(), event.outcome.to_string()))
            .collect()
    }
}

impl Default for CapturingAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for CapturingAuditSink {
    fn record(&self, event: &AuditEvent) {
        self.events.lock().expect("events lock").push(event.clone());
    }
}
