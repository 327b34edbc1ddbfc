// crates/stockline-server/src/audit.rs
// ============================================================================
// Module: Audit Sink
// Description: Structured operation audit records without hard dependencies.
// Purpose: Emit one JSONL record per tenant operation outcome.
// Dependencies: serde_json, std
// ============================================================================

//! ## Overview
//! Every service operation emits an audit event naming the operation, the
//! tenant, and the outcome. The sink seam is intentionally dependency-light
//! so deployments can plug in their own collector without redesign; the
//! default implementation writes one JSON object per line to any writer.
//! Audit emission is best-effort and never fails the operation it describes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use serde_json::json;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Audit record for one operation outcome.
///
/// # Invariants
/// - `outcome` is one of the stable labels `ok`, `denied`, or `error`.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Operation name (stable label).
    pub operation: &'static str,
    /// Tenant identifier when the operation is tenant-scoped.
    pub tenant_id: Option<String>,
    /// Outcome label.
    pub outcome: &'static str,
    /// Error or denial detail when present.
    pub detail: Option<String>,
}

/// Audit sink interface.
pub trait AuditSink: Send + Sync {
    /// Records one audit event, best-effort.
    fn record(&self, event: &AuditEvent);
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// No-op audit sink for tests and minimal deployments.
///
/// # Invariants
/// - Discards every event.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &AuditEvent) {}
}

/// Writer-backed JSONL audit sink.
///
/// # Invariants
/// - Emits exactly one JSON object per line per event.
/// - Write failures are swallowed; auditing never fails an operation.
pub struct JsonLineAuditSink<W: Write + Send> {
    /// Output writer for audit records.
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLineAuditSink<W> {
    /// Creates a sink over a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> AuditSink for JsonLineAuditSink<W> {
    fn record(&self, event: &AuditEvent) {
        let record = json!({
            "operation": event.operation,
            "tenant_id": event.tenant_id,
            "outcome": event.outcome,
            "detail": event.detail,
        });
        let Ok(mut guard) = self.writer.lock() else {
            return;
        };
        if serde_json::to_writer(&mut *guard, &record).is_ok() {
            let _ = guard.write_all(b"\n");
        }
    }
}
