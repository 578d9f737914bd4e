//! Success responses and the outbound frame shapes drivers write back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;
use crate::types::{ProtocolVersion, RequestId};

/// Success frame. `result` is always serialized: a null result is still a
/// result, and absence is legal only for notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(rename = "jsonrpc")]
    pub version: ProtocolVersion,
    pub id: RequestId,
    pub result: Value,
}

impl RpcResponse {
    pub fn new(id: impl Into<RequestId>, result: Value) -> Self {
        Self {
            version: ProtocolVersion::V2,
            id: id.into(),
            result,
        }
    }
}

/// One reply to one request: success or failure. Untagged so either wire
/// shape decodes directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcOutcome {
    Success(RpcResponse),
    Failure(RpcError),
}

impl RpcOutcome {
    pub fn success(id: impl Into<RequestId>, result: Value) -> Self {
        RpcOutcome::Success(RpcResponse::new(id, result))
    }

    pub fn failure(error: RpcError) -> Self {
        RpcOutcome::Failure(error)
    }

    pub fn id(&self) -> Option<&RequestId> {
        match self {
            RpcOutcome::Success(response) => Some(&response.id),
            RpcOutcome::Failure(error) => error.id.as_ref(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RpcOutcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RpcOutcome::Failure(_))
    }
}

/// What one inbound frame produces: a single reply or an ordered batch.
/// A frame that produces nothing (notifications) simply has no
/// `OutboundFrame` at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutboundFrame {
    Single(RpcOutcome),
    Batch(Vec<RpcOutcome>),
}

impl OutboundFrame {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
