// crates/stockline-core/src/core/routing.rs
// ============================================================================
// Module: Shard Routing
// Description: Deterministic tenant-to-shard assignment and namespace naming.
// Purpose: Keep routing stable across restarts and namespace names injection-safe.
// Dependencies: sha2, thiserror
// ============================================================================

//! ## Overview
//! Routing reduces a tenant identifier to a shard index with a SHA-256 digest
//! truncated modulo the shard count. The function is pure and total: identical
//! input always yields identical output, independent of process state, so the
//! assignment is recomputable byte-identically on every restart. Changing the
//! shard count invalidates the mapping for all tenants; no rebalancing logic
//! exists here.
//!
//! Namespace naming is the only place a tenant identifier is ever turned into
//! a schema identifier. The normalizer is strict: anything it emits matches
//! `tenant_[a-z0-9_]+` and fits the Postgres identifier length limit, which is
//! what makes interpolating the name into DDL safe. Call sites must never
//! format tenant input into SQL themselves.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroUsize;

use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

use crate::core::identifiers::TenantId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix applied to every derived namespace name.
const NAMESPACE_PREFIX: &str = "tenant_";
/// Maximum namespace name length in bytes (Postgres identifier limit).
const MAX_NAMESPACE_BYTES: usize = 63;

// ============================================================================
// SECTION: Shard Router
// ============================================================================

/// Maps a tenant identifier to a shard index in `[0, shard_count)`.
///
/// The tenant identifier is digested with SHA-256 and the first eight digest
/// bytes, read big-endian, are reduced modulo the shard count. A tenant never
/// changes shard while the shard count is fixed.
#[must_use]
pub fn shard_of(tenant_id: &TenantId, shard_count: NonZeroUsize) -> usize {
    let digest = Sha256::digest(tenant_id.as_str().as_bytes());
    let mut prefix = [0_u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let value = u64::from_be_bytes(prefix);
    let count = u64::try_from(shard_count.get()).unwrap_or(u64::MAX);
    usize::try_from(value % count).unwrap_or(0)
}

// ============================================================================
// SECTION: Namespace Naming
// ============================================================================

/// Errors produced while deriving a namespace name.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - All variants describe malformed tenant identifiers and are not retryable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamespaceNameError {
    /// Tenant identifier is empty.
    #[error("tenant identifier is empty")]
    Empty,
    /// Tenant identifier contains no alphanumeric characters.
    #[error("tenant identifier contains no alphanumeric characters")]
    NoAlphanumeric,
    /// Derived name exceeds the Postgres identifier length limit.
    #[error("derived namespace name exceeds {MAX_NAMESPACE_BYTES} bytes: {actual}")]
    TooLong {
        /// Length of the derived name in bytes.
        actual: usize,
    },
}

/// Validated per-tenant namespace (schema) name.
///
/// # Invariants
/// - Always matches `tenant_[a-z0-9_]+`.
/// - Never exceeds [`MAX_NAMESPACE_BYTES`] bytes.
/// - Construction is deterministic for a given tenant identifier.
/// - Only [`NamespaceName::derive`] constructs values; the type never
///   round-trips through untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceName(String);

impl NamespaceName {
    /// Derives the namespace name for a tenant identifier.
    ///
    /// ASCII letters are lowercased, digits pass through, and every other
    /// character (including `-` in UUID-style identifiers) is replaced with
    /// `_`. The result is prefixed with `tenant_`.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceNameError`] when the identifier is empty, contains
    /// no alphanumeric characters, or derives a name longer than the Postgres
    /// identifier limit.
    pub fn derive(tenant_id: &TenantId) -> Result<Self, NamespaceNameError> {
        let raw = tenant_id.as_str();
        if raw.is_empty() {
            return Err(NamespaceNameError::Empty);
        }
        let mut name = String::with_capacity(NAMESPACE_PREFIX.len() + raw.len());
        name.push_str(NAMESPACE_PREFIX);
        let mut has_alphanumeric = false;
        for ch in raw.chars() {
            let mapped = match ch {
                'a'..='z' | '0'..='9' => ch,
                'A'..='Z' => ch.to_ascii_lowercase(),
                _ => '_',
            };
            if mapped != '_' {
                has_alphanumeric = true;
            }
            name.push(mapped);
        }
        if !has_alphanumeric {
            return Err(NamespaceNameError::NoAlphanumeric);
        }
        if name.len() > MAX_NAMESPACE_BYTES {
            return Err(NamespaceNameError::TooLong {
                actual: name.len(),
            });
        }
        Ok(Self(name))
    }

    /// Returns the namespace name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
