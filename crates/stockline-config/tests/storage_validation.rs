// crates/stockline-config/tests/storage_validation.rs
// ============================================================================
// Module: Storage Config Validation Tests
// Description: Validate shard, descriptor, and pool constraints.
// Purpose: Ensure storage settings fail closed with descriptive messages.
// ============================================================================

//! ## Overview
//! Storage validation guards the shard count, the per-shard descriptors, and
//! every pool bound. Each test drives one constraint to its failure message.

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

use stockline_config::ConfigError;

mod common;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}

#[test]
fn minimal_config_is_valid() -> TestResult {
    let config = common::minimal_config().map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn zero_shard_count_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.shard_count = 0;
    config.storage.connections.clear();
    assert_invalid(config.validate(), "shard count must be at least 1")
}

#[test]
fn connection_list_must_match_shard_count() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.connections.pop();
    assert_invalid(config.validate(), "connection list length must equal shard count")
}

#[test]
fn non_postgres_descriptor_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.connections[0] = "mysql://stockline@localhost/shard0".to_string();
    assert_invalid(config.validate(), "must use a postgres scheme")
}

#[test]
fn malformed_descriptor_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.connections[0] = "not a url".to_string();
    assert_invalid(config.validate(), "descriptor is not a valid url")
}

#[test]
fn empty_env_prefix_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.connection_env_prefix = String::new();
    assert_invalid(config.validate(), "connection env prefix must not be empty")
}

#[test]
fn zero_max_connections_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.pool.max_connections = 0;
    assert_invalid(config.validate(), "pool max_connections must be at least 1")
}

#[test]
fn min_idle_above_max_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.pool.max_connections = 4;
    config.storage.pool.min_idle = 5;
    assert_invalid(config.validate(), "pool min_idle must not exceed max_connections")
}

#[test]
fn zero_checkout_timeout_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.pool.checkout_timeout_ms = 0;
    assert_invalid(config.validate(), "checkout_timeout_ms must be greater than zero")
}

#[test]
fn zero_connect_timeout_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.pool.connect_timeout_ms = 0;
    assert_invalid(config.validate(), "connect_timeout_ms must be greater than zero")
}

#[test]
fn zero_statement_timeout_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.pool.statement_timeout_ms = 0;
    assert_invalid(config.validate(), "statement_timeout_ms must be greater than zero")
}

#[test]
fn bad_bind_address_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.bind = "not-an-address".to_string();
    assert_invalid(config.validate(), "server bind must be a socket address")
}
