//! Protocol error shapes.
//!
//! [`RpcError`] is both the error-shaped response frame on the wire and the
//! error type every fallible surface of this workspace returns. Capabilities,
//! the dispatcher, and the transports all produce it; no other error shape
//! crosses a module boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ProtocolVersion, RequestId};

/// Stable error codes.
///
/// `-32700` is deliberately absent: undecodable input folds into
/// [`RpcErrorCode::InvalidRequest`] with a null id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcErrorCode {
    /// -32600: inbound frame is not a well-formed request.
    InvalidRequest,
    /// -32601: method absent from the effective registry.
    MethodNotFound,
    /// -32602: capability rejected the parameters.
    InvalidParams,
    /// -32603: capability failed without a structured error.
    InternalError,
    /// -32001: reply body unreadable or undecodable.
    TransportBody,
    /// -32002: transport-level failure or non-success status.
    TransportStatus,
    /// -32003: reply decoded but is not a response object.
    NotAnRpcResponse,
    /// -32004: batch reply is not a usable sequence.
    InvalidBatchReply,
    /// Application-reserved range -32099..=-32000.
    ServerError(i64),
}

impl RpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            RpcErrorCode::InvalidRequest => -32600,
            RpcErrorCode::MethodNotFound => -32601,
            RpcErrorCode::InvalidParams => -32602,
            RpcErrorCode::InternalError => -32603,
            RpcErrorCode::TransportBody => -32001,
            RpcErrorCode::TransportStatus => -32002,
            RpcErrorCode::NotAnRpcResponse => -32003,
            RpcErrorCode::InvalidBatchReply => -32004,
            RpcErrorCode::ServerError(code) => *code,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RpcErrorCode::InvalidRequest => "Invalid request",
            RpcErrorCode::MethodNotFound => "Method not found",
            RpcErrorCode::InvalidParams => "Invalid params",
            RpcErrorCode::InternalError => "Internal error",
            RpcErrorCode::TransportBody => "Malformed response body",
            RpcErrorCode::TransportStatus => "Transport failure",
            RpcErrorCode::NotAnRpcResponse => "Not an RPC response object",
            RpcErrorCode::InvalidBatchReply => "Invalid batch reply",
            RpcErrorCode::ServerError(_) => "Server error",
        }
    }
}

/// The wire `error` member: `{code, message, data?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InvalidRequest, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(RpcErrorCode::MethodNotFound, format!("Method not found: {method}"))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InvalidParams, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InternalError, message)
    }

    pub fn transport_body(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::TransportBody, message)
    }

    pub fn transport_status(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::TransportStatus, message)
    }

    pub fn not_an_rpc_response() -> Self {
        Self::new(RpcErrorCode::NotAnRpcResponse, "not an RPC response object")
    }

    pub fn invalid_batch_reply(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InvalidBatchReply, message)
    }

    /// Application error in the reserved range.
    pub fn server_error(code: i64, message: impl Into<String>) -> Self {
        assert!(
            (-32099..=-32000).contains(&code),
            "Server error code must be in range -32099 to -32000"
        );
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// Error-shaped response frame.
///
/// `id` correlates to the failing request; `None` serializes as `"id": null`
/// when no request id could be salvaged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    #[serde(rename = "jsonrpc")]
    pub version: ProtocolVersion,
    pub id: Option<RequestId>,
    pub error: RpcErrorObject,
}

impl RpcError {
    pub fn new(id: Option<RequestId>, error: RpcErrorObject) -> Self {
        Self {
            version: ProtocolVersion::V2,
            id,
            error,
        }
    }

    /// Replace the correlation id. The dispatcher stamps the originating
    /// request id on every capability failure with this.
    pub fn with_id(mut self, id: Option<RequestId>) -> Self {
        self.id = id;
        self
    }

    pub fn code(&self) -> i64 {
        self.error.code
    }

    pub fn message(&self) -> &str {
        &self.error.message
    }

    pub fn invalid_request(id: Option<RequestId>, message: impl Into<String>) -> Self {
        Self::new(id, RpcErrorObject::invalid_request(message))
    }

    pub fn method_not_found(id: Option<RequestId>, method: &str) -> Self {
        Self::new(id, RpcErrorObject::method_not_found(method))
    }

    pub fn invalid_params(id: Option<RequestId>, message: impl Into<String>) -> Self {
        Self::new(id, RpcErrorObject::invalid_params(message))
    }

    pub fn internal_error(id: Option<RequestId>, message: impl Into<String>) -> Self {
        Self::new(id, RpcErrorObject::internal_error(message))
    }

    pub fn transport_body(message: impl Into<String>) -> Self {
        Self::new(None, RpcErrorObject::transport_body(message))
    }

    pub fn transport_status(message: impl Into<String>) -> Self {
        Self::new(None, RpcErrorObject::transport_status(message))
    }

    pub fn not_an_rpc_response() -> Self {
        Self::new(None, RpcErrorObject::not_an_rpc_response())
    }

    pub fn invalid_batch_reply(message: impl Into<String>) -> Self {
        Self::new(None, RpcErrorObject::invalid_batch_reply(message))
    }
}

impl From<RpcErrorObject> for RpcError {
    fn from(error: RpcErrorObject) -> Self {
        Self::new(None, error)
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.error.code, self.error.message)
    }
}

impl std::error::Error for RpcError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_codes() {
        assert_eq!(RpcErrorCode::InvalidRequest.code(), -32600);
        assert_eq!(RpcErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(RpcErrorCode::InvalidParams.code(), -32602);
        assert_eq!(RpcErrorCode::InternalError.code(), -32603);
        assert_eq!(RpcErrorCode::TransportBody.code(), -32001);
        assert_eq!(RpcErrorCode::TransportStatus.code(), -32002);
        assert_eq!(RpcErrorCode::NotAnRpcResponse.code(), -32003);
        assert_eq!(RpcErrorCode::InvalidBatchReply.code(), -32004);
        assert_eq!(RpcErrorCode::ServerError(-32050).code(), -32050);
    }

    #[test]
    fn test_error_serialization_null_id() {
        let err = RpcError::invalid_request(None, "broken frame");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {"code": -32600, "message": "broken frame"}
            })
        );
    }

    #[test]
    fn test_error_preserves_id_and_data() {
        let err = RpcError::new(
            Some(RequestId::from("req_3")),
            RpcErrorObject::invalid_params("bad shape").with_data(json!({"field": "x"})),
        );
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["id"], json!("req_3"));
        assert_eq!(value["error"]["data"], json!({"field": "x"}));
    }

    #[test]
    fn test_data_omitted_when_absent() {
        let err = RpcError::method_not_found(Some(RequestId::from(1)), "nope");
        let value = serde_json::to_value(&err).unwrap();
        assert!(value["error"].get("data").is_none());
        assert_eq!(value["error"]["message"], json!("Method not found: nope"));
    }

    #[test]
    fn test_with_id_overwrites() {
        let err = RpcError::from(RpcErrorObject::internal_error("boom")).with_id(Some(RequestId::from(9)));
        assert_eq!(err.id, Some(RequestId::Number(9)));
        assert_eq!(err.code(), -32603);
    }

    #[test]
    #[should_panic(expected = "Server error code must be in range")]
    fn test_server_error_range_checked() {
        RpcErrorObject::server_error(-1, "out of range");
    }
}
