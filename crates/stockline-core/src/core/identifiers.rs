// crates/stockline-core/src/core/identifiers.rs
// ============================================================================
// Module: Stockline Identifiers
// Description: Canonical opaque identifiers for tenants, products, and anomalies.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout Stockline.
//! Tenant identifiers are opaque caller-supplied strings (UUID-like) and are
//! never generated by the core; they double as the routing key and the
//! namespace key. Product identifiers are numeric and tenant-scoped. Anomaly
//! identifiers are content-derived digests minted by
//! [`crate::core::records::AnomalyRecord`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Tenant identifier supplied by the caller.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
/// - Routing and namespace derivation treat the raw bytes as authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new tenant identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TenantId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Product identifier scoped within a tenant.
///
/// # Invariants
/// - Serializes as a plain integer on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    /// Creates a new product identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for ProductId {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

/// Anomaly identifier derived from record content.
///
/// # Invariants
/// - Hex-encoded digest string; collision resistance comes from the digest,
///   not from this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnomalyId(String);

impl AnomalyId {
    /// Creates an anomaly identifier from an already-derived digest string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnomalyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for AnomalyId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AnomalyId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
