//! Model Context Protocol (MCP) server implementation.
//!
//! This module exposes the metadata store to LLM agents as MCP tools and
//! prompts. The server communicates over stdio transport using JSON-RPC 2.0
//! messages.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          MCP Server                          │
//! │                                                              │
//! │   ┌─────────────┐    ┌──────────────┐    ┌───────────────┐   │
//! │   │  Transport  │───▶│  Dispatcher  │───▶│ Tools/Prompts │   │
//! │   │   (stdio)   │    │  (routing)   │    │  (registries) │   │
//! │   └─────────────┘    └──────────────┘    └───────────────┘   │
//! │                             │                    │           │
//! │                             ▼                    ▼           │
//! │                    ┌─────────────────────────────────┐       │
//! │                    │          MetadataStore          │       │
//! │                    └─────────────────────────────────┘       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod dispatcher;
pub mod prompts;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use dispatcher::ProtocolDispatcher;
pub use protocol::{JsonRpcError, JsonRpcReply, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::McpServer;
pub use transport::{LineTransport, StdioTransport};
