// crates/stockline-server/src/main.rs
// ============================================================================
// Module: Stockline Server Entry Point
// Description: Process composition root and operational CLI.
// Purpose: Own configuration loading and the registry lifecycle end to end.
// Dependencies: clap, stockline-config, stockline-server, stockline-store-postgres, tokio
// ============================================================================

//! ## Overview
//! The binary wires everything together: it loads and validates
//! configuration, resolves shard descriptors from the environment,
//! initializes the shard pool registry, serves the HTTP surface, and shuts
//! the registry down when the serve loop ends. The registry is constructed
//! here and passed down; nothing else owns pool lifecycle.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use clap::Subcommand;
use stockline_config::ConfigError;
use stockline_config::PoolConfig;
use stockline_config::StocklineConfig;
use stockline_core::OperationError;
use stockline_server::AuditSink;
use stockline_server::JsonLineAuditSink;
use stockline_server::TenantApi;
use stockline_server::build_router;
use stockline_store_postgres::PostgresTenantStore;
use stockline_store_postgres::ShardPoolRegistry;
use stockline_store_postgres::ShardPoolSettings;
use thiserror::Error;

// ============================================================================
// SECTION: CLI
// ============================================================================

/// Stockline command-line interface.
#[derive(Debug, Parser)]
#[command(name = "stockline", version, about = "Multi-tenant inventory tracking service")]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service.
    Serve {
        /// Path to the TOML configuration file.
        #[arg(long, value_name = "PATH")]
        config: PathBuf,
    },
    /// Load and validate a configuration file, then exit.
    CheckConfig {
        /// Path to the TOML configuration file.
        #[arg(long, value_name = "PATH")]
        config: PathBuf,
    },
}

/// Process-level errors surfaced at exit.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
enum ServerError {
    /// Configuration loading or validation failed.
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    /// Storage layer failed.
    #[error("storage: {0}")]
    Operation(#[from] OperationError),
    /// Runtime or network failure.
    #[error("io: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}

/// Dispatches the parsed command.
fn run(cli: Cli) -> Result<(), ServerError> {
    match cli.command {
        Command::CheckConfig {
            config,
        } => {
            load_config(&config)?;
            report_config_ok(&config);
            Ok(())
        }
        Command::Serve {
            config,
        } => serve(&load_config(&config)?),
    }
}

/// Loads and validates a configuration file.
fn load_config(path: &Path) -> Result<StocklineConfig, ServerError> {
    let config = StocklineConfig::from_path(path)?;
    config.validate()?;
    Ok(config)
}

/// Converts config pool knobs into registry settings.
fn pool_settings(pool: &PoolConfig) -> ShardPoolSettings {
    ShardPoolSettings {
        max_connections: pool.max_connections,
        min_idle: pool.min_idle,
        checkout_timeout: Duration::from_millis(pool.checkout_timeout_ms),
        connect_timeout: Duration::from_millis(pool.connect_timeout_ms),
        statement_timeout_ms: pool.statement_timeout_ms,
    }
}

/// Runs the HTTP service until shutdown, then releases the pools.
fn serve(config: &StocklineConfig) -> Result<(), ServerError> {
    let descriptors = config.storage.resolve_connections()?;
    let settings = pool_settings(&config.storage.pool);
    let registry = Arc::new(ShardPoolRegistry::initialize(&descriptors, &settings)?);
    let store = Arc::new(PostgresTenantStore::new(Arc::clone(&registry)));
    let audit: Arc<dyn AuditSink> = Arc::new(JsonLineAuditSink::new(std::io::stdout()));
    let router = build_router(Arc::new(TenantApi::new(store, audit)));
    let bind = config.server.bind.clone();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| ServerError::Io(err.to_string()))?;
    let result = runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&bind)
            .await
            .map_err(|err| ServerError::Io(format!("bind {bind}: {err}")))?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|err| ServerError::Io(err.to_string()))
    });
    registry.shutdown();
    result
}

/// Resolves when the process receives a shutdown signal.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

// ============================================================================
// SECTION: Operator Output
// ============================================================================

/// Reports a process failure to the operator.
#[allow(clippy::print_stderr, reason = "Operator-facing failure report at process exit.")]
fn report_failure(err: &ServerError) {
    eprintln!("stockline: {err}");
}

/// Confirms a valid configuration to the operator.
#[allow(clippy::print_stdout, reason = "Operator-facing check-config confirmation.")]
fn report_config_ok(path: &Path) {
    println!("configuration at {} is valid", path.display());
}
