//! Notification frames: requests without an id slot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::request::RequestParams;
use crate::types::ProtocolVersion;

/// A fire-and-forget call. No id, therefore no response, ever, not even
/// on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcNotification {
    #[serde(rename = "jsonrpc")]
    pub version: ProtocolVersion,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<RequestParams>,
}

impl RpcNotification {
    pub fn new(method: impl Into<String>, params: Option<RequestParams>) -> Self {
        Self {
            version: ProtocolVersion::V2,
            method: method.into(),
            params,
        }
    }

    pub fn with_object_params(method: impl Into<String>, params: HashMap<String, Value>) -> Self {
        Self::new(method, Some(RequestParams::Object(params)))
    }

    pub fn with_array_params(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self::new(method, Some(RequestParams::Array(params)))
    }
}
