//! JSON-RPC 2.0 message types for the MCP protocol.
//!
//! This module defines the envelope types exchanged with the agent. Every
//! reply carries `"jsonrpc": "2.0"` and an `id`; the id is `null` when the
//! request had none or could not be parsed far enough to read it.
//!
//! # Message Types
//!
//! - **Request**: A message naming a method; answered unless it is an MCP
//!   notification (`notifications/*` without an `id`)
//! - **Response**: A reply to a request (success or error)

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The MCP protocol version this implementation supports.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name for capability negotiation.
pub const SERVER_NAME: &str = "codebase-view-mcp";

/// Method prefix of MCP client notifications.
const NOTIFICATION_PREFIX: &str = "notifications/";

/// A JSON-RPC 2.0 request ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request ID, echoed exactly as received.
    Number(serde_json::Number),
    /// String request ID.
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// A decoded JSON-RPC 2.0 request.
///
/// The `jsonrpc` member is not checked; a missing `method` decodes as the
/// empty string and is later reported as an unknown method.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Request identifier, echoed in the reply. `None` if absent or `null`.
    #[serde(default)]
    pub id: Option<RequestId>,

    /// The method to invoke.
    #[serde(default)]
    pub method: String,

    /// Optional parameters for the method.
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Builds a request, mainly for callers that already decoded the envelope.
    #[must_use]
    pub fn new(id: Option<RequestId>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }

    /// Returns `true` for MCP notifications, which are consumed without a reply.
    ///
    /// Any other message is dispatched and answered, with a `null` id if it
    /// carried none.
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none() && self.method.starts_with(NOTIFICATION_PREFIX)
    }
}

/// A successful JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this response corresponds to, `null` if it had none.
    pub id: Option<RequestId>,

    /// The result of the method call.
    pub result: Value,
}

impl JsonRpcResponse {
    /// Creates a new success response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Value is not const-compatible
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result,
        }
    }
}

/// JSON-RPC 2.0 error codes used by this server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The body could not be decoded as a request.
    ParseError,
    /// The method does not exist or is not available.
    MethodNotFound,
    /// A handler failed.
    InternalError,
}

impl ErrorCode {
    /// Returns the numeric code for this error.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::MethodNotFound => -32601,
            Self::InternalError => -32603,
        }
    }

    /// Returns the default message for this error code.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::MethodNotFound => "Method not found",
            Self::InternalError => "Internal error",
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorData {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,
}

impl JsonRpcErrorData {
    /// Creates a new error from an error code.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        Self::with_message(code, code.default_message())
    }

    /// Creates a new error with a custom message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
        }
    }
}

/// A JSON-RPC 2.0 error response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this error corresponds to, `null` if unknown.
    pub id: Option<RequestId>,

    /// The error details.
    pub error: JsonRpcErrorData,
}

impl JsonRpcError {
    /// Creates a new error response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // JsonRpcErrorData contains String
    pub fn new(id: Option<RequestId>, error: JsonRpcErrorData) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            error,
        }
    }

    /// Creates a parse error response (ID cannot be determined).
    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(None, JsonRpcErrorData::from_code(ErrorCode::ParseError))
    }

    /// Creates a method not found error response.
    #[must_use]
    pub fn method_not_found(id: Option<RequestId>, method: &str) -> Self {
        Self::new(
            id,
            JsonRpcErrorData::with_message(
                ErrorCode::MethodNotFound,
                format!("Method not found: {method}"),
            ),
        )
    }

    /// Creates an internal error response.
    #[must_use]
    pub fn internal_error(id: Option<RequestId>, message: impl Into<String>) -> Self {
        Self::new(
            id,
            JsonRpcErrorData::with_message(ErrorCode::InternalError, message),
        )
    }
}

/// Either kind of reply to a request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum JsonRpcReply {
    /// The method succeeded.
    Success(JsonRpcResponse),
    /// The request failed.
    Error(JsonRpcError),
}

impl JsonRpcReply {
    /// Returns the error object, if this is an error reply.
    #[must_use]
    pub const fn error(&self) -> Option<&JsonRpcErrorData> {
        match self {
            Self::Success(_) => None,
            Self::Error(err) => Some(&err.error),
        }
    }

    /// Returns the result value, if this is a success reply.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        match self {
            Self::Success(resp) => Some(&resp.result),
            Self::Error(_) => None,
        }
    }

    /// Returns the echoed request id, `None` if it was absent or unknown.
    #[must_use]
    pub const fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Success(resp) => resp.id.as_ref(),
            Self::Error(err) => err.id.as_ref(),
        }
    }
}

impl From<JsonRpcResponse> for JsonRpcReply {
    fn from(resp: JsonRpcResponse) -> Self {
        Self::Success(resp)
    }
}

impl From<JsonRpcError> for JsonRpcReply {
    fn from(err: JsonRpcError) -> Self {
        Self::Error(err)
    }
}

/// Parses a JSON string into a request.
///
/// # Errors
///
/// Returns a parse error (`-32700`, `null` id) if the text is not JSON, is
/// not an object, or has a member of the wrong type (for example a
/// non-string `method`, or an `id` that is neither a number nor a string).
pub fn parse_message(json: &str) -> Result<JsonRpcRequest, JsonRpcError> {
    let value: Value = serde_json::from_str(json).map_err(|_| JsonRpcError::parse_error())?;

    if !value.is_object() {
        return Err(JsonRpcError::parse_error());
    }

    serde_json::from_value(value).map_err(|_| JsonRpcError::parse_error())
}
