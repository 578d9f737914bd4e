//! # wirecall-jsonrpc
//!
//! Transport-agnostic JSON-RPC 2.0 message engine: typed frame shapes, total
//! inbound classification, a method registry with async capabilities, and
//! order-preserving batch dispatch.
//!
//! Every message this crate constructs carries `jsonrpc: "2.0"` by type, a
//! request with an id maps to exactly one outcome, and the only error shape
//! that crosses a boundary is [`RpcError`].
//!
//! ```rust
//! use wirecall_jsonrpc::{Inbound, InboundItem, classify_text};
//!
//! let inbound = classify_text(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
//! match inbound {
//!     Inbound::Single(InboundItem::Request(request)) => assert_eq!(request.method, "ping"),
//!     other => panic!("unexpected classification: {other:?}"),
//! }
//! ```

pub mod batch;
pub mod error;
pub mod notification;
pub mod prelude;
pub mod request;
pub mod response;
pub mod types;
pub mod validate;

#[cfg(feature = "async")]
pub mod dispatch;
#[cfg(feature = "async")]
pub mod registry;

pub use batch::collect_batch;
pub use error::{RpcError, RpcErrorCode, RpcErrorObject};
pub use notification::RpcNotification;
pub use request::{RequestParams, RpcRequest, parse_params};
pub use response::{OutboundFrame, RpcOutcome, RpcResponse};
pub use types::{ProtocolVersion, RequestId};
pub use validate::{
    Inbound, InboundItem, classify, classify_text, validate_response, validate_response_with_id,
};

#[cfg(feature = "async")]
pub use dispatch::Dispatcher;
#[cfg(feature = "async")]
pub use registry::{Capability, FnCapability, MethodRegistry, TypedCapability, typed};

/// Protocol version string carried by every message.
pub const JSONRPC_VERSION: &str = "2.0";

/// Flat error-code constants for call sites that match on raw codes.
pub mod error_codes {
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Transport extensions.
    pub const TRANSPORT_BODY: i64 = -32001;
    pub const TRANSPORT_STATUS: i64 = -32002;
    pub const NOT_AN_RPC_RESPONSE: i64 = -32003;
    pub const INVALID_BATCH_REPLY: i64 = -32004;

    // Application-reserved range.
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}
