// crates/stockline-store-postgres/src/registry.rs
// ============================================================================
// Module: Shard Pool Registry
// Description: Per-shard connection pool ownership and lifecycle.
// Purpose: Initialize pools independently, look them up fail-fast, shut down best-effort.
// Dependencies: postgres, r2d2, r2d2_postgres, stockline-core
// ============================================================================

//! ## Overview
//! The registry owns exactly one connection pool slot per shard. Slots are
//! built independently at startup: a descriptor that fails to parse or a pool
//! that fails to build marks its slot unavailable with the error text, and
//! every later lookup against that slot fails fast with a descriptive
//! configuration error instead of a null-reference fault. Shutdown releases
//! whatever was opened and is safe after partial startup failure; lookups
//! after shutdown fail with a configuration error rather than returning a
//! stale pool.
//!
//! The registry is an explicitly constructed, passed-down instance owned by
//! the process composition root. There is no process-global pool map.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use postgres::NoTls;
use r2d2::Pool;
use r2d2::PooledConnection;
use r2d2_postgres::PostgresConnectionManager;
use stockline_core::OperationError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Connection manager type used for every shard.
pub type ShardManager = PostgresConnectionManager<NoTls>;
/// Pool type used for every shard.
pub type ShardPool = Pool<ShardManager>;
/// Checked-out connection type.
pub type ShardConnection = PooledConnection<ShardManager>;

/// Pool settings applied uniformly to every shard.
///
/// # Invariants
/// - `checkout_timeout` bounds every connection checkout; no lookup blocks
///   indefinitely.
#[derive(Debug, Clone, Copy)]
pub struct ShardPoolSettings {
    /// Maximum pool size per shard.
    pub max_connections: u32,
    /// Minimum idle connections per shard; zero defers connecting until the
    /// first checkout.
    pub min_idle: u32,
    /// Bounded wait for a connection checkout.
    pub checkout_timeout: Duration,
    /// Connect timeout for new connections.
    pub connect_timeout: Duration,
    /// Statement timeout in milliseconds, applied via connection options.
    pub statement_timeout_ms: u64,
}

/// One per-shard pool slot.
///
/// # Invariants
/// - `Failed` preserves the initialization error text for later lookups.
#[derive(Debug)]
enum ShardSlot {
    /// Pool initialized and usable.
    Ready(ShardPool),
    /// Pool initialization failed; lookups fail fast with this reason.
    Failed(String),
}

/// Registry owning one connection pool per shard.
///
/// # Invariants
/// - `slots` is `None` only after shutdown.
/// - The slot vector length always equals `shard_count`.
#[derive(Debug)]
pub struct ShardPoolRegistry {
    /// Fixed number of shards for the lifetime of the registry.
    shard_count: NonZeroUsize,
    /// Bounded checkout wait applied to every pool.
    checkout_timeout: Duration,
    /// Per-shard slots; `None` after shutdown.
    slots: Mutex<Option<Vec<ShardSlot>>>,
}

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

impl ShardPoolRegistry {
    /// Initializes one pool slot per connection descriptor.
    ///
    /// Each slot is built independently: a failure on one shard never
    /// prevents the others from initializing.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Configuration`] when the descriptor list is
    /// empty. Per-shard failures are recorded in the slot, not returned.
    pub fn initialize(
        descriptors: &[String],
        settings: &ShardPoolSettings,
    ) -> Result<Self, OperationError> {
        let shard_count = NonZeroUsize::new(descriptors.len()).ok_or_else(|| {
            OperationError::Configuration(
                "at least one shard connection descriptor is required".to_string(),
            )
        })?;
        let slots = descriptors
            .iter()
            .map(|descriptor| match build_pool(descriptor, settings) {
                Ok(pool) => ShardSlot::Ready(pool),
                Err(reason) => ShardSlot::Failed(reason),
            })
            .collect();
        Ok(Self {
            shard_count,
            checkout_timeout: settings.checkout_timeout,
            slots: Mutex::new(Some(slots)),
        })
    }

    /// Returns the fixed shard count.
    #[must_use]
    pub const fn shard_count(&self) -> NonZeroUsize {
        self.shard_count
    }

    /// Returns the pool for a shard index.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Configuration`] when the index is out of
    /// range, the slot failed to initialize, or the registry is shut down.
    pub fn pool_for(&self, shard: usize) -> Result<ShardPool, OperationError> {
        let guard = self
            .slots
            .lock()
            .map_err(|_| OperationError::Configuration("pool registry lock poisoned".to_string()))?;
        let Some(slots) = guard.as_ref() else {
            return Err(OperationError::Configuration("pool registry is shut down".to_string()));
        };
        match slots.get(shard) {
            Some(ShardSlot::Ready(pool)) => Ok(pool.clone()),
            Some(ShardSlot::Failed(reason)) => Err(OperationError::Configuration(format!(
                "shard {shard} pool unavailable: {reason}"
            ))),
            None => Err(OperationError::Configuration(format!(
                "shard index {shard} out of range 0..{}",
                self.shard_count
            ))),
        }
    }

    /// Checks out a connection from a shard pool with a bounded wait.
    ///
    /// The pool handle is cloned out of the slot table first so the registry
    /// lock is never held across the wait.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Configuration`] for lookup failures and
    /// [`OperationError::PoolExhausted`] when no connection becomes available
    /// within the configured checkout timeout.
    pub fn checkout(&self, shard: usize) -> Result<ShardConnection, OperationError> {
        let pool = self.pool_for(shard)?;
        pool.get_timeout(self.checkout_timeout)
            .map_err(|err| OperationError::PoolExhausted(format!("shard {shard}: {err}")))
    }

    /// Releases every pool, best-effort.
    ///
    /// Safe to call after partial startup failure and safe to call more than
    /// once; subsequent lookups fail with a configuration error.
    pub fn shutdown(&self) {
        if let Ok(mut guard) = self.slots.lock() {
            drop(guard.take());
        }
    }
}

impl Drop for ShardPoolRegistry {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.slots.lock() {
            if let Some(slots) = guard.take() {
                let _ = std::thread::spawn(move || drop(slots));
            }
        }
    }
}

// ============================================================================
// SECTION: Pool Construction
// ============================================================================

/// Builds one shard pool from a connection descriptor.
fn build_pool(descriptor: &str, settings: &ShardPoolSettings) -> Result<ShardPool, String> {
    let mut pg_config = descriptor.parse::<postgres::Config>().map_err(|err| err.to_string())?;
    pg_config.connect_timeout(settings.connect_timeout);
    let options = format!("-c statement_timeout={}", settings.statement_timeout_ms);
    pg_config.options(&options);
    let manager = PostgresConnectionManager::new(pg_config, NoTls);
    Pool::builder()
        .max_size(settings.max_connections)
        .min_idle(Some(settings.min_idle))
        .connection_timeout(settings.checkout_timeout)
        .build(manager)
        .map_err(|err| err.to_string())
}
