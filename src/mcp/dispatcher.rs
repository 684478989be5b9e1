//! Stateless JSON-RPC method router over the metadata store.
//!
//! The dispatcher holds no session state; it can be shared between any
//! number of concurrent callers; the store serialises its own mutations.
//!
//! | Failure                             | Code   |
//! |-------------------------------------|--------|
//! | Body cannot be decoded as a request | -32700 |
//! | Unknown method                      | -32601 |
//! | Any handler failure                 | -32603 |
//!
//! Requests without an `id` are handled like any other and answered with a
//! `null` id. Only MCP notifications (`notifications/*` without an `id`)
//! are consumed without a reply.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::DispatchError;
use crate::mcp::prompts::{self, PromptGetParams};
use crate::mcp::protocol::{
    parse_message, JsonRpcError, JsonRpcReply, JsonRpcRequest, JsonRpcResponse,
    MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use crate::mcp::tools::{self, ToolArguments, ToolCallParams};
use crate::metadata::MetadataStore;

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    pub tools: ListCapability,
    /// Prompt-related capabilities.
    pub prompts: ListCapability,
}

/// Capability of a listable feature.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListCapability {
    /// Whether the list can change during the session.
    #[serde(rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool, so we must take &bool here
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Routes decoded requests to their handlers.
#[derive(Debug, Clone)]
pub struct ProtocolDispatcher {
    store: Arc<MetadataStore>,
}

impl ProtocolDispatcher {
    /// Creates a dispatcher mutating `store`.
    #[must_use]
    pub const fn new(store: Arc<MetadataStore>) -> Self {
        Self { store }
    }

    /// Returns the store this dispatcher operates on.
    #[must_use]
    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// Handles one raw message.
    ///
    /// Returns `None` for MCP notifications, which never get a reply.
    #[must_use]
    pub fn handle(&self, raw: &str) -> Option<JsonRpcReply> {
        let req = match parse_message(raw) {
            Ok(req) => req,
            Err(error) => {
                tracing::debug!(code = error.error.code, "Rejected malformed message");
                return Some(error.into());
            }
        };

        if req.is_notification() {
            tracing::debug!(method = %req.method, "Notification received");
            return None;
        }

        Some(self.handle_request(req))
    }

    /// Handles one decoded request.
    #[must_use]
    pub fn handle_request(&self, req: JsonRpcRequest) -> JsonRpcReply {
        tracing::debug!(method = %req.method, id = ?req.id, "Request received");

        let params = req.params.unwrap_or(Value::Null);
        let outcome = match req.method.as_str() {
            "initialize" => Ok(Self::handle_initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tools::tool_definitions() })),
            "tools/call" => self.handle_tools_call(params),
            "prompts/list" => Ok(json!({ "prompts": prompts::prompt_definitions() })),
            "prompts/get" => Self::handle_prompts_get(params),
            _ => {
                tracing::debug!(method = %req.method, "Unknown method");
                return JsonRpcError::method_not_found(req.id, &req.method).into();
            }
        };

        match outcome {
            Ok(result) => JsonRpcResponse::success(req.id, result).into(),
            Err(e) => {
                tracing::warn!(method = %req.method, id = ?req.id, error = %e, "Request failed");
                JsonRpcError::internal_error(req.id, e.to_string()).into()
            }
        }
    }

    /// Handles the initialize request. Client params are ignored.
    fn handle_initialize() -> Value {
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": ServerCapabilities {
                tools: ListCapability::default(),
                prompts: ListCapability::default(),
            },
            "serverInfo": ServerInfo::default(),
        })
    }

    /// Handles the tools/call request.
    fn handle_tools_call(&self, params: Value) -> Result<Value, DispatchError> {
        let params: ToolCallParams = decode_params(params)?;
        let args = ToolArguments::decode(&params.name, params.arguments)?;

        tracing::info!(tool = %params.name, source_file = %args.source_file(), "Tool call");

        let result = args.apply(&self.store)?;
        Ok(serde_json::to_value(result)?)
    }

    /// Handles the prompts/get request.
    fn handle_prompts_get(params: Value) -> Result<Value, DispatchError> {
        let params: PromptGetParams = decode_params(params)?;
        let result = prompts::render_prompt(&params.name, &params.arguments)?;
        Ok(serde_json::to_value(result)?)
    }
}

fn decode_params<T: DeserializeOwned>(params: Value) -> Result<T, DispatchError> {
    if params.is_null() {
        return Err(DispatchError::InvalidParams("missing params".to_string()));
    }
    serde_json::from_value(params).map_err(|e| DispatchError::InvalidParams(e.to_string()))
}
