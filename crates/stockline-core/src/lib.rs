// crates/stockline-core/src/lib.rs
// ============================================================================
// Module: Stockline Core
// Description: Routing, licensing, and record model for multi-tenant inventory.
// Purpose: Provide the pure core every Stockline backend builds on.
// Dependencies: serde, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! Stockline Core defines the deterministic pieces of the multi-tenant
//! inventory service: the tenant-to-shard router, the namespace naming rules,
//! the license state machine, the record model, and the backend-agnostic
//! interface traits. Nothing in this crate performs I/O or reads wall-clock
//! time; hosts supply dates and connections explicitly so every decision is
//! replayable.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use crate::core::identifiers::AnomalyId;
pub use crate::core::identifiers::ProductId;
pub use crate::core::identifiers::TenantId;
pub use crate::core::license::LicenseRecord;
pub use crate::core::license::LicenseStatus;
pub use crate::core::license::evaluate_license;
pub use crate::core::records::AnomalyOutcome;
pub use crate::core::records::AnomalyRecord;
pub use crate::core::records::InventoryRow;
pub use crate::core::records::MovementAck;
pub use crate::core::records::NewMovement;
pub use crate::core::records::TenantRecord;
pub use crate::core::routing::NamespaceName;
pub use crate::core::routing::NamespaceNameError;
pub use crate::core::routing::shard_of;
pub use crate::interfaces::InventoryOperations;
pub use crate::interfaces::LicenseAuthority;
pub use crate::interfaces::OperationError;
pub use crate::interfaces::TenantDirectory;
