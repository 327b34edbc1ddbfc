// crates/stockline-server/tests/audit_sink.rs
// ============================================================================
// Module: Audit Sink Tests
// Description: JSONL audit record emission.
// Purpose: Keep audit output one parseable JSON object per line.
// ============================================================================

//! ## Overview
//! The JSONL sink must emit exactly one JSON object per event with stable
//! field names, and auditing must never fail the operation it describes.

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

use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;

use stockline_server::AuditEvent;
use stockline_server::AuditSink;
use stockline_server::JsonLineAuditSink;

mod common;

/// Writer handle that leaves its buffer observable after the sink owns it.
#[derive(Clone)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().map_or_else(
            |_| Err(std::io::Error::other("buffer lock poisoned")),
            |mut guard| {
                guard.extend_from_slice(buf);
                Ok(buf.len())
            },
        )
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn emits_one_json_object_per_line() {
    let buffer = SharedBuffer(Arc::new(Mutex::new(Vec::new())));
    let sink = JsonLineAuditSink::new(buffer.clone());
    sink.record(&AuditEvent {
        operation: "track_product",
        tenant_id: Some("tenant-a".to_string()),
        outcome: "ok",
        detail: None,
    });
    sink.record(&AuditEvent {
        operation: "detect_anomaly",
        tenant_id: Some("tenant-a".to_string()),
        outcome: "denied",
        detail: Some("license has expired".to_string()),
    });

    let bytes = buffer.0.lock().expect("buffer lock").clone();
    let text = String::from_utf8(bytes).expect("utf8 output");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: serde_json::Value = serde_json::from_str(lines[0]).expect("first line json");
    assert_eq!(first["operation"], "track_product");
    assert_eq!(first["tenant_id"], "tenant-a");
    assert_eq!(first["outcome"], "ok");
    assert!(first["detail"].is_null());

    let second: serde_json::Value = serde_json::from_str(lines[1]).expect("second line json");
    assert_eq!(second["outcome"], "denied");
    assert_eq!(second["detail"], "license has expired");
}

#[test]
fn capturing_sink_preserves_emission_order() {
    let sink = common::CapturingAuditSink::new();
    for operation in ["register_tenant", "get_tenant", "license_status"] {
        sink.record(&AuditEvent {
            operation,
            tenant_id: None,
            outcome: "ok",
            detail: None,
        });
    }
    let outcomes = sink.outcomes();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].0, "register_tenant");
    assert_eq!(outcomes[2].0, "license_status");
}
