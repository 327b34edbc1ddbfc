// crates/stockline-store-postgres/src/provision.rs
// ============================================================================
// Module: Tenant Namespace Provisioner
// Description: Lazy, idempotent creation of per-tenant schemas and tables.
// Purpose: Make first-touch provisioning safe under concurrent access.
// Dependencies: postgres, stockline-core
// ============================================================================

//! ## Overview
//! A tenant's namespace (schema plus tracking and anomaly tables) is created
//! lazily on first touch rather than eagerly at registration, so onboarding a
//! tenant needs no out-of-band migration step. Each invocation runs the full
//! create-if-absent sequence inside one transaction on the caller's
//! connection; any step failure rolls the whole transaction back and leaves
//! no partial schema behind.
//!
//! Two concurrent first-accesses for the same tenant must both succeed.
//! `IF NOT EXISTS` does not fully close that race in Postgres: concurrent
//! transactions can still surface duplicate-object SQLSTATEs when they commit
//! the same schema or table. Those are treated as benign and the sequence is
//! re-run once, at which point the objects exist and the re-run is a no-op.
//!
//! A process-local cache records namespaces already ensured on this process
//! to skip repeat DDL per request. Correctness never depends on the cache;
//! provisioning stays idempotent and race-safe without it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Mutex;

use postgres::Client;
use postgres::error::SqlState;
use stockline_core::NamespaceName;
use stockline_core::OperationError;
use stockline_core::TenantId;

// ============================================================================
// SECTION: Provisioner
// ============================================================================

/// Lazy namespace provisioner.
///
/// # Invariants
/// - `ensure_namespace` is idempotent: a second call for the same tenant
///   produces no error and no duplicate objects.
/// - The ensured-namespace cache only ever skips work; it never substitutes
///   for the transactional create-if-absent sequence.
pub struct TenantNamespaceProvisioner {
    /// Namespaces already ensured by this process.
    ensured: Mutex<BTreeSet<String>>,
}

impl TenantNamespaceProvisioner {
    /// Creates a provisioner with an empty ensured-namespace cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ensured: Mutex::new(BTreeSet::new()),
        }
    }

    /// Ensures the tenant's namespace and tables exist on this connection.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidTenantId`] for identifiers that cannot
    /// derive a namespace name (not retryable) and
    /// [`OperationError::Provisioning`] when creation fails for a non-benign
    /// reason (retryable).
    pub fn ensure_namespace(
        &self,
        tenant_id: &TenantId,
        client: &mut Client,
    ) -> Result<NamespaceName, OperationError> {
        let name = NamespaceName::derive(tenant_id)?;
        if self.is_ensured(name.as_str()) {
            return Ok(name);
        }
        let mut retried = false;
        loop {
            match run_provisioning(client, &name) {
                Ok(()) => break,
                Err(err) if is_benign_duplicate(&err) => {
                    // A concurrent first-access won the race; the objects
                    // exist once its transaction commits. Re-run once so the
                    // if-absent sequence observes them.
                    if retried {
                        break;
                    }
                    retried = true;
                }
                Err(err) => {
                    return Err(OperationError::Provisioning(format!(
                        "ensure namespace for tenant {tenant_id}: {err}"
                    )));
                }
            }
        }
        self.mark_ensured(name.as_str());
        Ok(name)
    }

    /// Returns whether the namespace was already ensured by this process.
    fn is_ensured(&self, name: &str) -> bool {
        self.ensured.lock().map(|guard| guard.contains(name)).unwrap_or(false)
    }

    /// Records a namespace as ensured.
    fn mark_ensured(&self, name: &str) {
        if let Ok(mut guard) = self.ensured.lock() {
            guard.insert(name.to_string());
        }
    }
}

impl Default for TenantNamespaceProvisioner {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Provisioning Sequence
// ============================================================================

/// Runs the full create-if-absent sequence in one transaction.
fn run_provisioning(client: &mut Client, name: &NamespaceName) -> Result<(), postgres::Error> {
    let mut tx = client.transaction()?;
    for statement in provisioning_statements(name) {
        tx.batch_execute(&statement)?;
    }
    tx.commit()
}

/// Builds the DDL statements for a namespace.
///
/// The namespace name is the only identifier interpolated into DDL anywhere
/// in the crate and is guaranteed `tenant_[a-z0-9_]+` by construction; every
/// value elsewhere is parameterized.
fn provisioning_statements(name: &NamespaceName) -> [String; 3] {
    [
        format!("CREATE SCHEMA IF NOT EXISTS {name}"),
        format!(
            "CREATE TABLE IF NOT EXISTS {name}.product_tracking (\
             id BIGSERIAL PRIMARY KEY, \
             tenant_id TEXT NOT NULL, \
             product_id BIGINT NOT NULL, \
             product_name TEXT NOT NULL, \
             quantity BIGINT NOT NULL, \
             timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {name}.anomalies (\
             id TEXT PRIMARY KEY, \
             tenant_id TEXT NOT NULL, \
             product_id BIGINT NOT NULL, \
             timestamp TIMESTAMP NOT NULL, \
             description TEXT NOT NULL)"
        ),
    ]
}

/// Classifies duplicate-object races as benign.
fn is_benign_duplicate(err: &postgres::Error) -> bool {
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

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use stockline_core::NamespaceName;
    use stockline_core::OperationError;
    use stockline_core::TenantId;

    use super::provisioning_statements;

    #[test]
    fn statements_are_create_if_absent_and_namespace_scoped() {
        let name = NamespaceName::derive(&TenantId::new("tenant-a")).expect("derive");
        let statements = provisioning_statements(&name);
        assert!(statements[0].starts_with("CREATE SCHEMA IF NOT EXISTS tenant_tenant_a"));
        assert!(statements[1].starts_with(
            "CREATE TABLE IF NOT EXISTS tenant_tenant_a.product_tracking"
        ));
        assert!(statements[2].starts_with("CREATE TABLE IF NOT EXISTS tenant_tenant_a.anomalies"));
        for statement in &statements {
            assert!(!statement.contains(';'));
        }
    }

    #[test]
    fn malformed_identifier_maps_to_invalid_tenant_id() {
        // The derivation failure short-circuits ensure_namespace before any
        // SQL runs; it must map to the non-retryable invalid-id variant.
        let mapped: OperationError = match NamespaceName::derive(&TenantId::new("---")) {
            Err(err) => err.into(),
            Ok(name) => panic!("unexpected namespace {name}"),
        };
        assert!(matches!(mapped, OperationError::InvalidTenantId(_)));
    }
}
