// crates/stockline-store-postgres/src/store.rs
// ============================================================================
// Module: Postgres Tenant Store
// Description: License-gated tenant operations over sharded Postgres storage.
// Purpose: Implement the core interfaces with routed, scoped connections.
// Dependencies: postgres, stockline-core, time
// ============================================================================

//! ## Overview
//! Every tenant-scoped call follows the same path: route the tenant to its
//! shard, check a connection out of that shard's pool, ensure the shared and
//! tenant-namespace tables exist, evaluate the license gate, then execute
//! inside the tenant's namespace. The connection is a scoped checkout that
//! returns to the pool on every exit path. License denial short-circuits
//! before the operation's reads or mutations; storage failures surface with
//! tenant and operation context and are never downgraded to success.
//!
//! The shared `tenants` and `licenses` tables live in the `public` schema of
//! each shard. The license table is owned and mutated by an external billing
//! collaborator; this store only reads it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;

use postgres::Client;
use postgres::error::SqlState;
use stockline_core::AnomalyId;
use stockline_core::AnomalyOutcome;
use stockline_core::AnomalyRecord;
use stockline_core::InventoryOperations;
use stockline_core::InventoryRow;
use stockline_core::LicenseAuthority;
use stockline_core::LicenseRecord;
use stockline_core::LicenseStatus;
use stockline_core::MovementAck;
use stockline_core::NewMovement;
use stockline_core::OperationError;
use stockline_core::ProductId;
use stockline_core::TenantDirectory;
use stockline_core::TenantId;
use stockline_core::TenantRecord;
use stockline_core::evaluate_license;
use stockline_core::shard_of;
use time::OffsetDateTime;
use time::PrimitiveDateTime;

use crate::provision::TenantNamespaceProvisioner;
use crate::registry::ShardConnection;
use crate::registry::ShardPoolRegistry;

// ============================================================================
// SECTION: Shared Table DDL
// ============================================================================

/// Create-if-absent DDL for the shared per-shard tables.
const SHARED_TABLE_DDL: &str = "CREATE TABLE IF NOT EXISTS tenants (\
     id TEXT PRIMARY KEY, \
     name TEXT NOT NULL, \
     email TEXT NOT NULL); \
     CREATE TABLE IF NOT EXISTS licenses (\
     tenant_id TEXT PRIMARY KEY, \
     expiration_date DATE NOT NULL, \
     grace_period INT NOT NULL, \
     status TEXT NOT NULL)";

// ============================================================================
// SECTION: Store
// ============================================================================

/// Postgres-backed tenant store.
///
/// # Invariants
/// - All routing goes through [`stockline_core::shard_of`]; no second routing
///   path exists.
/// - Connections are borrowed for one logical operation and returned on every
///   exit path via the pooled-connection guard.
pub struct PostgresTenantStore {
    /// Registry owning the per-shard pools.
    registry: Arc<ShardPoolRegistry>,
    /// Lazy namespace provisioner.
    provisioner: TenantNamespaceProvisioner,
    /// Shards whose shared tables were already ensured by this process.
    shared_ready: Mutex<BTreeSet<usize>>,
}

impl PostgresTenantStore {
    /// Creates a store over an initialized registry.
    #[must_use]
    pub fn new(registry: Arc<ShardPoolRegistry>) -> Self {
        Self {
            registry,
            provisioner: TenantNamespaceProvisioner::new(),
            shared_ready: Mutex::new(BTreeSet::new()),
        }
    }

    /// Returns the shard index for a tenant.
    #[must_use]
    pub fn shard_for(&self, tenant_id: &TenantId) -> usize {
        shard_of(tenant_id, self.registry.shard_count())
    }

    /// Routes the tenant and checks a connection out of its shard pool.
    fn checkout_for(
        &self,
        tenant_id: &TenantId,
    ) -> Result<(usize, ShardConnection), OperationError> {
        let shard = self.shard_for(tenant_id);
        let conn = self.registry.checkout(shard)?;
        Ok((shard, conn))
    }

    /// Ensures the shared `tenants` and `licenses` tables exist on a shard.
    fn ensure_shared_tables(
        &self,
        shard: usize,
        client: &mut Client,
    ) -> Result<(), OperationError> {
        if self
            .shared_ready
            .lock()
            .map(|guard| guard.contains(&shard))
            .unwrap_or(false)
        {
            return Ok(());
        }
        match client.batch_execute(SHARED_TABLE_DDL) {
            Ok(()) => {}
            // A concurrent process creating the same tables is success.
            Err(err) if is_duplicate_object(&err) => {}
            Err(err) => {
                return Err(OperationError::Provisioning(format!(
                    "ensure shared tables on shard {shard}: {err}"
                )));
            }
        }
        if let Ok(mut guard) = self.shared_ready.lock() {
            guard.insert(shard);
        }
        Ok(())
    }

    /// Evaluates the license gate on an already checked-out connection.
    ///
    /// Kept separate from [`LicenseAuthority::authorize`] so tenant
    /// operations reuse their own connection instead of checking out a
    /// second one for the gate.
    fn authorize_on(
        &self,
        tenant_id: &TenantId,
        client: &mut Client,
    ) -> Result<LicenseStatus, OperationError> {
        let record = fetch_license(client, tenant_id)?;
        let status = evaluate_license(record.as_ref(), OffsetDateTime::now_utc().date());
        if status.permits_access() {
            Ok(status)
        } else {
            Err(OperationError::AccessDenied(status.reason()))
        }
    }

    /// Routes, checks out, and prepares a connection for a gated operation.
    ///
    /// Runs the full pre-operation sequence: shared tables, tenant
    /// namespace, then the license gate.
    fn prepare_gated(
        &self,
        tenant_id: &TenantId,
    ) -> Result<(ShardConnection, String), OperationError> {
        let (shard, mut conn) = self.checkout_for(tenant_id)?;
        self.ensure_shared_tables(shard, &mut conn)?;
        let namespace = self.provisioner.ensure_namespace(tenant_id, &mut conn)?;
        self.authorize_on(tenant_id, &mut conn)?;
        Ok((conn, namespace.as_str().to_string()))
    }
}

// ============================================================================
// SECTION: License Authority
// ============================================================================

impl LicenseAuthority for PostgresTenantStore {
    fn license_status(&self, tenant_id: &TenantId) -> Result<LicenseStatus, OperationError> {
        let (shard, mut conn) = self.checkout_for(tenant_id)?;
        self.ensure_shared_tables(shard, &mut conn)?;
        let record = fetch_license(&mut conn, tenant_id)?;
        Ok(evaluate_license(record.as_ref(), OffsetDateTime::now_utc().date()))
    }
}

/// Reads the tenant's license record from the shared table.
fn fetch_license(
    client: &mut Client,
    tenant_id: &TenantId,
) -> Result<Option<LicenseRecord>, OperationError> {
    let row = client
        .query_opt(
            "SELECT expiration_date, grace_period, status FROM licenses WHERE tenant_id = $1",
            &[&tenant_id.as_str()],
        )
        .map_err(|err| {
            OperationError::Persistence(format!("license read for tenant {tenant_id}: {err}"))
        })?;
    Ok(row.map(|row| {
        let grace_period: i32 = row.get(1);
        LicenseRecord {
            tenant_id: tenant_id.clone(),
            expiration_date: row.get(0),
            grace_period_days: i64::from(grace_period),
            status: row.get(2),
        }
    }))
}

// ============================================================================
// SECTION: Inventory Operations
// ============================================================================

impl InventoryOperations for PostgresTenantStore {
    fn record_movement(
        &self,
        tenant_id: &TenantId,
        movement: &NewMovement,
    ) -> Result<MovementAck, OperationError> {
        let (mut conn, namespace) = self.prepare_gated(tenant_id)?;
        let statement = format!(
            "INSERT INTO {namespace}.product_tracking (tenant_id, product_id, product_name, \
             quantity) VALUES ($1, $2, $3, $4) RETURNING id"
        );
        let product_id = movement.product_id.get();
        let row = conn
            .query_one(
                &statement,
                &[&tenant_id.as_str(), &product_id, &movement.product_name, &movement.quantity],
            )
            .map_err(|err| {
                OperationError::Persistence(format!(
                    "record_movement for tenant {tenant_id}: {err}"
                ))
            })?;
        Ok(MovementAck {
            sequence_id: row.get(0),
        })
    }

    fn compute_inventory(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<InventoryRow>, OperationError> {
        let (mut conn, namespace) = self.prepare_gated(tenant_id)?;
        let statement = format!(
            "SELECT product_id, product_name, SUM(quantity)::BIGINT FROM \
             {namespace}.product_tracking WHERE tenant_id = $1 GROUP BY product_id, product_name \
             ORDER BY product_id, product_name"
        );
        let rows = conn.query(&statement, &[&tenant_id.as_str()]).map_err(|err| {
            OperationError::Persistence(format!(
                "compute_inventory for tenant {tenant_id}: {err}"
            ))
        })?;
        Ok(rows
            .iter()
            .map(|row| InventoryRow {
                product_id: ProductId::new(row.get(0)),
                product_name: row.get(1),
                total_quantity: row.get(2),
            })
            .collect())
    }

    fn record_anomaly_if_negative(
        &self,
        tenant_id: &TenantId,
        product_id: ProductId,
        description: &str,
    ) -> Result<AnomalyOutcome, OperationError> {
        let (mut conn, namespace) = self.prepare_gated(tenant_id)?;
        let persistence = |err: postgres::Error| {
            OperationError::Persistence(format!(
                "record_anomaly_if_negative for tenant {tenant_id}: {err}"
            ))
        };
        let mut tx = conn.transaction().map_err(persistence)?;
        let total_statement = format!(
            "SELECT SUM(quantity)::BIGINT FROM {namespace}.product_tracking WHERE tenant_id = $1 \
             AND product_id = $2"
        );
        let raw_product_id = product_id.get();
        let row = tx
            .query_one(&total_statement, &[&tenant_id.as_str(), &raw_product_id])
            .map_err(persistence)?;
        let total: Option<i64> = row.get(0);
        let Some(total) = total.filter(|total| *total < 0) else {
            tx.commit().map_err(persistence)?;
            return Ok(AnomalyOutcome::NotDetected);
        };
        let now = OffsetDateTime::now_utc();
        let detected_at = PrimitiveDateTime::new(now.date(), now.time());
        let record = AnomalyRecord::detect(
            tenant_id.clone(),
            product_id,
            detected_at,
            format!("{description} (total quantity {total})"),
        );
        let insert_statement = format!(
            "INSERT INTO {namespace}.anomalies (id, tenant_id, product_id, timestamp, \
             description) VALUES ($1, $2, $3, $4, $5)"
        );
        tx.execute(
            &insert_statement,
            &[
                &record.id.as_str(),
                &tenant_id.as_str(),
                &raw_product_id,
                &record.detected_at,
                &record.description,
            ],
        )
        .map_err(persistence)?;
        tx.commit().map_err(persistence)?;
        Ok(AnomalyOutcome::Recorded(record))
    }

    fn list_anomalies(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<AnomalyRecord>, OperationError> {
        let (mut conn, namespace) = self.prepare_gated(tenant_id)?;
        let statement = format!(
            "SELECT id, tenant_id, product_id, timestamp, description FROM \
             {namespace}.anomalies WHERE tenant_id = $1 ORDER BY timestamp DESC"
        );
        let rows = conn.query(&statement, &[&tenant_id.as_str()]).map_err(|err| {
            OperationError::Persistence(format!("list_anomalies for tenant {tenant_id}: {err}"))
        })?;
        Ok(rows
            .iter()
            .map(|row| AnomalyRecord {
                id: AnomalyId::new(row.get::<_, String>(0)),
                tenant_id: TenantId::new(row.get::<_, String>(1)),
                product_id: ProductId::new(row.get(2)),
                detected_at: row.get(3),
                description: row.get(4),
            })
            .collect())
    }
}

// ============================================================================
// SECTION: Tenant Directory
// ============================================================================

impl TenantDirectory for PostgresTenantStore {
    fn register_tenant(&self, record: &TenantRecord) -> Result<(), OperationError> {
        let (shard, mut conn) = self.checkout_for(&record.id)?;
        self.ensure_shared_tables(shard, &mut conn)?;
        conn.execute(
            "INSERT INTO tenants (id, name, email) VALUES ($1, $2, $3)",
            &[&record.id.as_str(), &record.name, &record.email],
        )
        .map_err(|err| {
            if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                OperationError::Persistence(format!("tenant {} already registered", record.id))
            } else {
                OperationError::Persistence(format!(
                    "register_tenant for tenant {}: {err}",
                    record.id
                ))
            }
        })?;
        Ok(())
    }

    fn get_tenant(&self, tenant_id: &TenantId) -> Result<Option<TenantRecord>, OperationError> {
        let (shard, mut conn) = self.checkout_for(tenant_id)?;
        self.ensure_shared_tables(shard, &mut conn)?;
        let row = conn
            .query_opt(
                "SELECT id, name, email FROM tenants WHERE id = $1",
                &[&tenant_id.as_str()],
            )
            .map_err(|err| {
                OperationError::Persistence(format!(
                    "get_tenant for tenant {tenant_id}: {err}"
                ))
            })?;
        Ok(row.map(|row| TenantRecord {
            id: TenantId::new(row.get::<_, String>(0)),
            name: row.get(1),
            email: row.get(2),
        }))
    }
}

// ============================================================================
// SECTION: Error Classification
// ============================================================================

/// Classifies duplicate-object SQLSTATEs raised by concurrent DDL.
fn is_duplicate_object(err: &postgres::Error) -> bool {
    matches!(
        err.code(),
        Some(&SqlState::DUPLICATE_SCHEMA)
            | Some(&SqlState::DUPLICATE_TABLE)
            | Some(&SqlState::UNIQUE_VIOLATION)
    )
}

// ============================================================================
// SECTION: Tests
// ============================================================================
