// crates/stockline-core/tests/license.rs
// ============================================================================
// Module: License State Machine Tests
// Description: Time-relative license evaluation across all five states.
// Purpose: Pin the evaluation order and grace-day arithmetic.
// ============================================================================

//! ## Overview
//! License state is recomputed fresh on every check from the stored record and
//! an explicit evaluation date. These tests walk the full transition table,
//! including the revoked override and the inclusive grace boundary.

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

use stockline_core::LicenseRecord;
use stockline_core::LicenseStatus;
use stockline_core::TenantId;
use stockline_core::evaluate_license;
use time::Date;
use time::Duration;
use time::macros::date;

const TODAY: Date = date!(2026 - 03 - 15);

fn record(expiration: Date, grace_days: i64, status: &str) -> LicenseRecord {
    LicenseRecord {
        tenant_id: TenantId::new("tenant-a"),
        expiration_date: expiration,
        grace_period_days: grace_days,
        status: status.to_string(),
    }
}

#[test]
fn missing_record_is_invalid() {
    let status = evaluate_license(None, TODAY);
    assert_eq!(status, LicenseStatus::Invalid);
    assert!(!status.permits_access());
    assert_eq!(status.reason(), "no license found");
}

#[test]
fn future_expiration_is_active() {
    let license = record(TODAY + Duration::days(10), 5, "active");
    assert_eq!(evaluate_license(Some(&license), TODAY), LicenseStatus::Active);
}

#[test]
fn expiration_day_is_still_active() {
    let license = record(TODAY, 5, "active");
    assert_eq!(evaluate_license(Some(&license), TODAY), LicenseStatus::Active);
}

#[test]
fn day_after_expiration_enters_grace_with_remaining_days() {
    let license = record(TODAY - Duration::days(1), 5, "active");
    assert_eq!(
        evaluate_license(Some(&license), TODAY),
        LicenseStatus::Grace {
            remaining_days: 4,
        }
    );
}

#[test]
fn grace_window_close_is_inclusive() {
    let license = record(TODAY - Duration::days(5), 5, "active");
    let status = evaluate_license(Some(&license), TODAY);
    assert_eq!(
        status,
        LicenseStatus::Grace {
            remaining_days: 0,
        }
    );
    assert!(status.permits_access());
}

#[test]
fn past_grace_window_is_expired() {
    let license = record(TODAY - Duration::days(10), 5, "active");
    let status = evaluate_license(Some(&license), TODAY);
    assert_eq!(status, LicenseStatus::Expired);
    assert!(!status.permits_access());
}

#[test]
fn revoked_overrides_date_logic() {
    let still_valid = record(TODAY + Duration::days(365), 30, "revoked");
    assert_eq!(evaluate_license(Some(&still_valid), TODAY), LicenseStatus::Revoked);
    let long_expired = record(TODAY - Duration::days(365), 0, "revoked");
    assert_eq!(evaluate_license(Some(&long_expired), TODAY), LicenseStatus::Revoked);
}

#[test]
fn unknown_stored_status_falls_through_to_date_logic() {
    let license = record(TODAY + Duration::days(1), 5, "trial");
    assert_eq!(evaluate_license(Some(&license), TODAY), LicenseStatus::Active);
}

#[test]
fn negative_grace_period_is_treated_as_zero() {
    let license = record(TODAY - Duration::days(1), -7, "active");
    assert_eq!(evaluate_license(Some(&license), TODAY), LicenseStatus::Expired);
}

#[test]
fn grace_reason_names_remaining_days() {
    let status = LicenseStatus::Grace {
        remaining_days: 4,
    };
    assert_eq!(status.reason(), "license in grace period, 4 days remaining");
}

#[test]
fn status_serializes_with_stable_tags() {
    let grace = serde_json::to_value(LicenseStatus::Grace {
        remaining_days: 2,
    })
    .expect("serialize grace");
    assert_eq!(grace["state"], "grace");
    assert_eq!(grace["remaining_days"], 2);
    let revoked = serde_json::to_value(LicenseStatus::Revoked).expect("serialize revoked");
    assert_eq!(revoked["state"], "revoked");
}
