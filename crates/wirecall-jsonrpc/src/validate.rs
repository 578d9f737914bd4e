//! Inbound classification and client-side response validation.
//!
//! Classification is total: every decoded value maps to a request, a
//! notification, a batch of those, or an invalid-frame failure that already
//! carries code `-32600` and the best salvageable id. Callers never see a
//! parse-stage panic or a second error taxonomy.

use serde_json::{Map, Value};

use crate::error::{RpcError, RpcErrorObject};
use crate::notification::RpcNotification;
use crate::request::{RequestParams, RpcRequest};
use crate::types::RequestId;

/// One classified element of an inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundItem {
    Request(RpcRequest),
    Notification(RpcNotification),
    /// Malformed element; the failure is ready to send as-is.
    Invalid(RpcError),
}

/// A classified inbound frame. Arrays become batches with every element
/// classified independently; an empty array is an empty batch, which
/// produces no output downstream.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Single(InboundItem),
    Batch(Vec<InboundItem>),
}

/// Classify one decoded JSON value.
pub fn classify(value: Value) -> Inbound {
    match value {
        Value::Array(items) => Inbound::Batch(items.into_iter().map(classify_item).collect()),
        other => Inbound::Single(classify_item(other)),
    }
}

/// Classify raw text. Undecodable input is a single invalid frame with a
/// null id; there is no separate parse-error code.
pub fn classify_text(text: &str) -> Inbound {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => classify(value),
        Err(err) => Inbound::Single(InboundItem::Invalid(RpcError::invalid_request(
            None,
            format!("invalid JSON: {err}"),
        ))),
    }
}

fn classify_item(value: Value) -> InboundItem {
    let Value::Object(mut obj) = value else {
        return invalid(None, "request must be an object");
    };

    match obj.get("jsonrpc").and_then(Value::as_str) {
        Some("2.0") => {}
        _ => return invalid(salvage_id(&obj), "missing or unsupported jsonrpc version"),
    }

    let method = match obj.remove("method") {
        Some(Value::String(method)) => method,
        _ => return invalid(salvage_id(&obj), "method must be a string"),
    };

    let params = match obj.remove("params") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(RequestParams::Array(items)),
        Some(Value::Object(map)) => Some(RequestParams::Object(map.into_iter().collect())),
        Some(_) => return invalid(salvage_id(&obj), "params must be an array or object"),
    };

    // An explicit null id cannot be correlated, so it classifies with the
    // absent-id case as a notification.
    match obj.remove("id") {
        None | Some(Value::Null) => InboundItem::Notification(RpcNotification::new(method, params)),
        Some(Value::String(s)) => InboundItem::Request(RpcRequest::new(RequestId::String(s), method, params)),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => InboundItem::Request(RpcRequest::new(RequestId::Number(i), method, params)),
            None => invalid(None, "id must be an integer, string, or null"),
        },
        Some(_) => invalid(None, "id must be an integer, string, or null"),
    }
}

fn invalid(id: Option<RequestId>, message: &str) -> InboundItem {
    InboundItem::Invalid(RpcError::invalid_request(id, message))
}

fn salvage_id(obj: &Map<String, Value>) -> Option<RequestId> {
    match obj.get("id") {
        Some(Value::String(s)) => Some(RequestId::String(s.clone())),
        Some(Value::Number(n)) => n.as_i64().map(RequestId::Number),
        _ => None,
    }
}

/// Client-side validation of one reply value, yielding the correlating id
/// alongside the unwrapped result.
///
/// A valid basis is an object with `jsonrpc == "2.0"` and an `id` that is a
/// number, string, or null. A basis carrying `result` succeeds; one carrying
/// a well-formed `error` member is raised with its code, message, and data
/// preserved. Everything else fails with `-32003` and a null id.
pub fn validate_response_with_id(value: &Value) -> Result<(Option<RequestId>, Value), RpcError> {
    let Some((obj, id)) = response_basis(value) else {
        return Err(RpcError::not_an_rpc_response());
    };

    if let Some(result) = obj.get("result") {
        return Ok((id, result.clone()));
    }

    if let Some(Value::Object(err_obj)) = obj.get("error")
        && let Some(code) = err_obj.get("code").and_then(Value::as_i64)
        && let Some(message) = err_obj.get("message").and_then(Value::as_str)
    {
        return Err(RpcError::new(
            id,
            RpcErrorObject {
                code,
                message: message.to_string(),
                data: err_obj.get("data").cloned(),
            },
        ));
    }

    Err(RpcError::not_an_rpc_response())
}

/// [`validate_response_with_id`] without the id, for callers that correlate
/// by position.
pub fn validate_response(value: &Value) -> Result<Value, RpcError> {
    validate_response_with_id(value).map(|(_, result)| result)
}

fn response_basis(value: &Value) -> Option<(&Map<String, Value>, Option<RequestId>)> {
    let obj = value.as_object()?;
    if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return None;
    }
    let id = match obj.get("id")? {
        Value::Null => None,
        Value::String(s) => Some(RequestId::String(s.clone())),
        Value::Number(n) => Some(RequestId::Number(n.as_i64()?)),
        _ => return None,
    };
    Some((obj, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn single(value: Value) -> InboundItem {
        match classify(value) {
            Inbound::Single(item) => item,
            Inbound::Batch(_) => panic!("expected single classification"),
        }
    }

    #[test]
    fn test_classifies_request() {
        let item = single(json!({"jsonrpc": "2.0", "id": 1, "method": "add", "params": [1, 2]}));
        match item {
            InboundItem::Request(req) => {
                assert_eq!(req.id, RequestId::Number(1));
                assert_eq!(req.method, "add");
            }
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn test_classifies_notification_when_id_absent() {
        let item = single(json!({"jsonrpc": "2.0", "method": "log"}));
        assert!(matches!(item, InboundItem::Notification(_)));
    }

    #[test]
    fn test_explicit_null_id_is_a_notification() {
        let item = single(json!({"jsonrpc": "2.0", "id": null, "method": "log"}));
        assert!(matches!(item, InboundItem::Notification(_)));
    }

    #[test]
    fn test_null_params_treated_as_absent() {
        let item = single(json!({"jsonrpc": "2.0", "id": 1, "method": "ping", "params": null}));
        match item {
            InboundItem::Request(req) => assert!(req.params.is_none()),
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn test_non_object_is_invalid_with_null_id() {
        let item = single(json!("just a string"));
        match item {
            InboundItem::Invalid(err) => {
                assert_eq!(err.code(), -32600);
                assert_eq!(err.id, None);
            }
            other => panic!("expected invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_version_salvages_id() {
        let item = single(json!({"id": "req_9", "method": "add"}));
        match item {
            InboundItem::Invalid(err) => {
                assert_eq!(err.code(), -32600);
                assert_eq!(err.id, Some(RequestId::from("req_9")));
            }
            other => panic!("expected invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_numeric_method_salvages_numeric_id() {
        let item = single(json!({"jsonrpc": "2.0", "id": 4, "method": 12}));
        match item {
            InboundItem::Invalid(err) => assert_eq!(err.id, Some(RequestId::Number(4))),
            other => panic!("expected invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_scalar_params_are_invalid() {
        let item = single(json!({"jsonrpc": "2.0", "id": 2, "method": "add", "params": 5}));
        assert!(matches!(item, InboundItem::Invalid(_)));
    }

    #[test]
    fn test_bool_id_is_invalid_with_null_id() {
        let item = single(json!({"jsonrpc": "2.0", "id": true, "method": "add"}));
        match item {
            InboundItem::Invalid(err) => assert_eq!(err.id, None),
            other => panic!("expected invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_batch_classifies_elements_independently() {
        let inbound = classify(json!([
            {"jsonrpc": "2.0", "id": 1, "method": "a"},
            {"jsonrpc": "2.0", "method": "b"},
            42,
            [1, 2]
        ]));
        let Inbound::Batch(items) = inbound else {
            panic!("expected batch");
        };
        assert_eq!(items.len(), 4);
        assert!(matches!(items[0], InboundItem::Request(_)));
        assert!(matches!(items[1], InboundItem::Notification(_)));
        assert!(matches!(items[2], InboundItem::Invalid(_)));
        assert!(matches!(items[3], InboundItem::Invalid(_)));
    }

    #[test]
    fn test_empty_array_is_empty_batch() {
        assert_eq!(classify(json!([])), Inbound::Batch(vec![]));
    }

    #[test]
    fn test_undecodable_text_is_invalid_request() {
        let inbound = classify_text("{not json");
        match inbound {
            Inbound::Single(InboundItem::Invalid(err)) => {
                assert_eq!(err.code(), -32600);
                assert_eq!(err.id, None);
            }
            other => panic!("expected invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_response_success_unwraps_result() {
        let value = json!({"jsonrpc": "2.0", "id": 1, "result": {"ok": true}});
        assert_eq!(validate_response(&value).unwrap(), json!({"ok": true}));
    }

    #[test]
    fn test_response_null_result_is_still_success() {
        let value = json!({"jsonrpc": "2.0", "id": 1, "result": null});
        assert_eq!(validate_response(&value).unwrap(), Value::Null);
    }

    #[test]
    fn test_response_failure_preserves_error() {
        let value = json!({
            "jsonrpc": "2.0",
            "id": "req_2",
            "error": {"code": -32601, "message": "Method not found: x", "data": {"hint": 1}}
        });
        let err = validate_response(&value).unwrap_err();
        assert_eq!(err.code(), -32601);
        assert_eq!(err.id, Some(RequestId::from("req_2")));
        assert_eq!(err.error.data, Some(json!({"hint": 1})));
    }

    #[test]
    fn test_response_with_null_id_keeps_null() {
        let value = json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32600, "message": "bad"}});
        let err = validate_response(&value).unwrap_err();
        assert_eq!(err.id, None);
    }

    #[test]
    fn test_garbage_is_not_a_response() {
        for value in [
            json!(["array"]),
            json!({"id": 1, "result": 2}),
            json!({"jsonrpc": "2.0", "result": 2}),
            json!({"jsonrpc": "2.0", "id": 1}),
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": "NaN", "message": "x"}}),
        ] {
            let err = validate_response(&value).unwrap_err();
            assert_eq!(err.code(), -32003, "value: {value}");
            assert_eq!(err.id, None);
        }
    }

    #[test]
    fn test_response_with_id_returns_it() {
        let value = json!({"jsonrpc": "2.0", "id": "k1", "result": 7});
        let (id, result) = validate_response_with_id(&value).unwrap();
        assert_eq!(id, Some(RequestId::from("k1")));
        assert_eq!(result, json!(7));
    }
}
