//! Error types for codebase-view-mcp.
//!
//! Store persistence errors live in [`crate::metadata::StoreError`]; this
//! module holds configuration errors and the request-scoped errors raised
//! by the protocol handlers.

use std::path::PathBuf;

use thiserror::Error;

use crate::metadata::StoreError;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Failures inside a protocol method handler.
///
/// All of these are reported to the caller as JSON-RPC internal errors
/// (-32603) whose message is the `Display` text below. None of them leave a
/// partial mutation behind except [`DispatchError::Store`], where the
/// in-memory change was applied but could not be persisted.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Params or tool arguments were missing or malformed.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// `tools/call` named a tool that does not exist.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// `prompts/get` named a prompt that does not exist.
    #[error("prompt not found: {0}")]
    UnknownPrompt(String),

    /// A required prompt argument was absent or empty.
    #[error("{0} argument is required")]
    MissingArgument(&'static str),

    /// The store accepted the change but could not persist it.
    #[error("failed to store metadata: {0}")]
    Store(#[from] StoreError),

    /// A handler result could not be serialised.
    #[error("failed to serialise result: {0}")]
    Serialise(#[from] serde_json::Error),
}
