//! codebase-view-mcp: shared test-coverage annotations for a codebase
//!
//! Serves the metadata store to an LLM agent over MCP (stdio).

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use codebase_view_mcp::config;
use codebase_view_mcp::mcp::McpServer;
use codebase_view_mcp::metadata::MetadataStore;

/// MCP server for collaborative test-coverage annotation of a codebase.
///
/// Lets an LLM agent record which tests cover which source lines and which
/// tests are missing. Metadata is kept in one JSON file.
#[derive(Parser, Debug)]
#[command(name = "codebase-view-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Path to the metadata JSON file (overrides the configuration)
    #[arg(short, long, value_name = "PATH", conflicts_with = "in_memory")]
    metadata: Option<PathBuf>,

    /// Keep metadata in memory only
    #[arg(long)]
    in_memory: bool,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
///
/// Logs go to stderr; stdout carries protocol messages.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the codebase-view-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting codebase-view-mcp server"
    );

    let metadata_path = if args.in_memory {
        None
    } else {
        args.metadata.or(cfg.metadata_path)
    };

    match &metadata_path {
        Some(path) => info!(path = %path.display(), "Metadata file configured"),
        None => info!("Metadata kept in memory only"),
    }

    let store = Arc::new(MetadataStore::open(metadata_path));
    info!(files = store.len(), "Metadata store ready");
    let mut server = McpServer::stdio(store);

    info!("MCP server ready, waiting for client connection...");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    match runtime.block_on(server.run()) {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
