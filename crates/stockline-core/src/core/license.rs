// crates/stockline-core/src/core/license.rs
// ============================================================================
// Module: License State Machine
// Description: Time-relative license evaluation for tenant access gating.
// Purpose: Recompute license state fresh on every check with no persisted transitions.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! A license record carries an expiration date, a grace period in days, and a
//! stored status owned by an external billing collaborator. The effective
//! state is purely a function of the record and the evaluation date; nothing
//! is persisted between checks. The core never reads wall-clock time, so the
//! caller supplies `today` explicitly and evaluation stays replayable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::Date;
use time::Duration;

use crate::core::identifiers::TenantId;

// ============================================================================
// SECTION: License Records
// ============================================================================

/// Stored status value that unconditionally revokes access.
const STATUS_REVOKED: &str = "revoked";

/// License record as stored by the billing collaborator.
///
/// # Invariants
/// - The core only reads records; ownership and mutation live elsewhere.
/// - `status` is an opaque label; only the value `revoked` carries meaning
///   for evaluation and overrides all date logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Tenant the license belongs to.
    pub tenant_id: TenantId,
    /// Date the license expires (inclusive).
    pub expiration_date: Date,
    /// Grace period length in days after expiration.
    pub grace_period_days: i64,
    /// Stored status label from the billing system.
    pub status: String,
}

/// Effective license state for a tenant at an evaluation date.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `Grace::remaining_days` counts whole days until the grace window closes
///   and is always >= 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LicenseStatus {
    /// License is active.
    Active,
    /// License expired but the grace window is still open.
    Grace {
        /// Whole days remaining until the grace window closes.
        remaining_days: i64,
    },
    /// License expired and the grace window has closed.
    Expired,
    /// License was revoked by the billing system.
    Revoked,
    /// No license record exists for the tenant.
    Invalid,
}

impl LicenseStatus {
    /// Returns whether this state permits tenant operations.
    #[must_use]
    pub const fn permits_access(&self) -> bool {
        matches!(self, Self::Active | Self::Grace { .. })
    }

    /// Returns the human-readable denial or status reason.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Active => "license is active".to_string(),
            Self::Grace {
                remaining_days,
            } => {
                format!("license in grace period, {remaining_days} days remaining")
            }
            Self::Expired => "license has expired".to_string(),
            Self::Revoked => "license has been revoked".to_string(),
            Self::Invalid => "no license found".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates the effective license state at `today`.
///
/// Evaluation order, first match wins:
/// 1. no record -> [`LicenseStatus::Invalid`]
/// 2. stored status `revoked` -> [`LicenseStatus::Revoked`]
/// 3. `today <= expiration_date` -> [`LicenseStatus::Active`]
/// 4. `today <= expiration_date + grace_period_days` -> [`LicenseStatus::Grace`]
/// 5. otherwise -> [`LicenseStatus::Expired`]
#[must_use]
pub fn evaluate_license(record: Option<&LicenseRecord>, today: Date) -> LicenseStatus {
    let Some(record) = record else {
        return LicenseStatus::Invalid;
    };
    if record.status == STATUS_REVOKED {
        return LicenseStatus::Revoked;
    }
    if today <= record.expiration_date {
        return LicenseStatus::Active;
    }
    let grace_end = record
        .expiration_date
        .checked_add(Duration::days(record.grace_period_days.max(0)))
        .unwrap_or(record.expiration_date);
    if today <= grace_end {
        return LicenseStatus::Grace {
            remaining_days: (grace_end - today).whole_days(),
        };
    }
    LicenseStatus::Expired
}
