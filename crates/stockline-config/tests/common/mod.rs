// crates/stockline-config/tests/common/mod.rs
// ============================================================================
// Module: Config Test Helpers
// Description: Shared fixtures for configuration validation tests.
// ============================================================================

//! Shared helpers producing minimal valid configurations.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

use stockline_config::ConfigError;
use stockline_config::StocklineConfig;

/// Minimal TOML document that passes validation.
pub const MINIMAL_TOML: &str = r#"
[storage]
shard_count = 2
connections = [
    "postgres://stockline@localhost:5432/shard0",
    "postgres://stockline@localhost:5432/shard1",
]
"#;

/// Parses the minimal valid configuration.
pub fn minimal_config() -> Result<StocklineConfig, ConfigError> {
    StocklineConfig::from_toml(MINIMAL_TOML)
}
