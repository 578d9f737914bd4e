//! Convenient re-exports of the commonly used types.
//!
//! ```rust
//! use wirecall_jsonrpc::prelude::*;
//! ```

pub use crate::error::{RpcError, RpcErrorCode, RpcErrorObject};
pub use crate::notification::RpcNotification;
pub use crate::request::{RequestParams, RpcRequest, parse_params};
pub use crate::response::{OutboundFrame, RpcOutcome, RpcResponse};
pub use crate::types::{ProtocolVersion, RequestId};
pub use crate::validate::{
    Inbound, InboundItem, classify, classify_text, validate_response, validate_response_with_id,
};

#[cfg(feature = "async")]
pub use crate::dispatch::Dispatcher;
#[cfg(feature = "async")]
pub use crate::registry::{Capability, FnCapability, MethodRegistry, TypedCapability, typed};

pub use crate::error_codes::*;
