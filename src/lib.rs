//! codebase-view-mcp: shared test-coverage annotations for a codebase
//!
//! A human (through a web UI) and an LLM agent (through MCP tool calls)
//! annotate source files with the tests that cover them, missing-test
//! suggestions and review comments. Everything is keyed by source path and
//! kept in one JSON document.
//!
//! # Architecture
//!
//! - **Metadata store**: concurrent keyed store with per-kind merge rules,
//!   rewritten to disk on every mutation
//! - **Protocol layer**: JSON-RPC method routing, typed tool arguments,
//!   tool and prompt registries
//!
//! # Modules
//!
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Error types
//! - [`metadata`] — Data model and store
//! - [`mcp`] — MCP protocol implementation

pub mod config;
pub mod error;
pub mod mcp;
pub mod metadata;
