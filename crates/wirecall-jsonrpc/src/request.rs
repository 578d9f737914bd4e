//! Request frames and their parameter container.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RpcError, RpcErrorObject};
use crate::types::{ProtocolVersion, RequestId};

/// Structured request parameters: positional or keyed, nothing else.
///
/// Scalars are rejected at validation time, so a constructed value here is
/// always a legal `params` member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestParams {
    Array(Vec<Value>),
    Object(HashMap<String, Value>),
}

impl RequestParams {
    /// Accepts only arrays and objects; anything else yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(RequestParams::Array(items)),
            Value::Object(map) => Some(RequestParams::Object(map.into_iter().collect())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RequestParams::Array(items) => Value::Array(items.clone()),
            RequestParams::Object(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            }
        }
    }

    /// Keyed lookup; `None` for positional params.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            RequestParams::Object(map) => map.get(key),
            RequestParams::Array(_) => None,
        }
    }

    /// Positional lookup; `None` for keyed params.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            RequestParams::Array(items) => items.get(index),
            RequestParams::Object(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RequestParams::Array(items) => items.len(),
            RequestParams::Object(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deserialize into a concrete params type; a shape mismatch is an
    /// invalid-params failure (`-32602`).
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, RpcError> {
        serde_json::from_value(self.to_value())
            .map_err(|e| RpcErrorObject::invalid_params(format!("invalid params: {e}")).into())
    }
}

impl From<Vec<Value>> for RequestParams {
    fn from(items: Vec<Value>) -> Self {
        RequestParams::Array(items)
    }
}

impl From<HashMap<String, Value>> for RequestParams {
    fn from(map: HashMap<String, Value>) -> Self {
        RequestParams::Object(map)
    }
}

/// Deserialize optional params into a concrete type, treating absence as
/// JSON `null` so `Option<T>` and unit-params capabilities work unchanged.
pub fn parse_params<T: DeserializeOwned>(params: Option<&RequestParams>) -> Result<T, RpcError> {
    let raw = params.map(RequestParams::to_value).unwrap_or(Value::Null);
    serde_json::from_value(raw)
        .map_err(|e| RpcErrorObject::invalid_params(format!("invalid params: {e}")).into())
}

/// A call expecting exactly one response, correlated by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(rename = "jsonrpc")]
    pub version: ProtocolVersion,
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<RequestParams>,
}

impl RpcRequest {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Option<RequestParams>) -> Self {
        Self {
            version: ProtocolVersion::V2,
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    pub fn with_object_params(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        params: HashMap<String, Value>,
    ) -> Self {
        Self::new(id, method, Some(RequestParams::Object(params)))
    }

    pub fn with_array_params(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        params: Vec<Value>,
    ) -> Self {
        Self::new(id, method, Some(RequestParams::Array(params)))
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.as_ref().and_then(|p| p.get(key))
    }

    pub fn param_at(&self, index: usize) -> Option<&Value> {
        self.params.as_ref().and_then(|p| p.get_index(index))
    }
}
