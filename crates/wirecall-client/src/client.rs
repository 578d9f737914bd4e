//! HTTP request/response client.
//!
//! One `POST` per call or batch. Protocol failures ride back as
//! [`RpcError`] with the responder's code, message, data, and id kept
//! intact; transport-level trouble maps onto the `-32001`/`-32002` codes
//! with a null id.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::debug;
use url::Url;

use wirecall_jsonrpc::{
    RequestId, RequestParams, RpcError, RpcNotification, RpcRequest, validate_response,
    validate_response_with_id,
};

use crate::config::ClientConfig;

/// Per-call options.
///
/// The bearer credential rides exactly one outbound `Authorization` header
/// on the call it is given to; the client never stores it.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub notification: bool,
    pub bearer_token: Option<String>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_notification(mut self) -> Self {
        self.notification = true;
        self
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

/// One item of a batch.
#[derive(Debug, Clone)]
pub struct BatchCall {
    pub method: String,
    pub params: Option<RequestParams>,
}

impl BatchCall {
    pub fn new(method: impl Into<String>, params: Option<RequestParams>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// Call counters; snapshot via [`RpcClient::stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientStats {
    pub requests_sent: u64,
    pub notifications_sent: u64,
    pub responses_received: u64,
    pub failures: u64,
}

/// JSON-RPC 2.0 client over HTTP POST.
#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: Url,
    request_counter: AtomicU64,
    stats: Mutex<ClientStats>,
}

impl RpcClient {
    /// Client for `endpoint` with the default configuration.
    pub fn new(endpoint: Url) -> Result<Self, RpcError> {
        Self::with_config(endpoint, ClientConfig::default())
    }

    pub fn with_config(endpoint: Url, config: ClientConfig) -> Result<Self, RpcError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in &config.default_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| RpcError::transport_status(format!("invalid header name {name:?}: {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| RpcError::transport_status(format!("invalid value for header {name:?}: {e}")))?;
            headers.insert(header_name, header_value);
        }

        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("wirecall-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .connect_timeout(config.timeouts.connect)
            .timeout(config.timeouts.request)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| RpcError::transport_status(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint,
            request_counter: AtomicU64::new(0),
            stats: Mutex::new(ClientStats::default()),
        })
    }

    /// Parse-and-build convenience; URL trouble maps onto `-32002`.
    pub fn from_url(endpoint: &str) -> Result<Self, RpcError> {
        let url = Url::parse(endpoint)
            .map_err(|e| RpcError::transport_status(format!("invalid endpoint URL: {e}")))?;
        Self::new(url)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn stats(&self) -> ClientStats {
        self.stats.lock().clone()
    }

    /// Request, expecting a result.
    pub async fn call(&self, method: &str, params: Option<RequestParams>) -> Result<Value, RpcError> {
        let result = self
            .call_with_options(method, params, &CallOptions::default())
            .await?;
        result.ok_or_else(|| RpcError::transport_body("empty response body for a request"))
    }

    /// Fire-and-forget; any success status resolves.
    pub async fn notify(&self, method: &str, params: Option<RequestParams>) -> Result<(), RpcError> {
        self.call_with_options(method, params, &CallOptions::new().as_notification())
            .await
            .map(|_| ())
    }

    /// Full call contract. Notification mode resolves `Ok(None)` on any
    /// success status with the body ignored; request mode validates the
    /// reply and raises the responder's failure verbatim.
    pub async fn call_with_options(
        &self,
        method: &str,
        params: Option<RequestParams>,
        options: &CallOptions,
    ) -> Result<Option<Value>, RpcError> {
        let result = self.dispatch_call(method, params, options).await;
        if result.is_err() {
            self.stats.lock().failures += 1;
        }
        result
    }

    /// Array-style batch: one POST, replies matched back by position.
    /// The reply must be a non-empty sequence of matching length (`-32004`
    /// otherwise); the first failure entry encountered is raised.
    pub async fn batch(&self, calls: Vec<BatchCall>) -> Result<Vec<Value>, RpcError> {
        let results = self
            .batch_with_options(calls, &CallOptions::default())
            .await?;
        Ok(results.unwrap_or_default())
    }

    /// All-notification batch; nothing is matched back.
    pub async fn batch_notify(&self, calls: Vec<BatchCall>) -> Result<(), RpcError> {
        self.batch_with_options(calls, &CallOptions::new().as_notification())
            .await
            .map(|_| ())
    }

    pub async fn batch_with_options(
        &self,
        calls: Vec<BatchCall>,
        options: &CallOptions,
    ) -> Result<Option<Vec<Value>>, RpcError> {
        let result = self.dispatch_batch(calls, options).await;
        if result.is_err() {
            self.stats.lock().failures += 1;
        }
        result
    }

    /// Object-style batch: the keys become string request ids and replies
    /// are matched back by id; an unknown or missing id is `-32004`.
    pub async fn batch_keyed(
        &self,
        calls: Vec<(String, BatchCall)>,
    ) -> Result<HashMap<String, Value>, RpcError> {
        let results = self
            .batch_keyed_with_options(calls, &CallOptions::default())
            .await?;
        Ok(results.unwrap_or_default())
    }

    pub async fn batch_keyed_with_options(
        &self,
        calls: Vec<(String, BatchCall)>,
        options: &CallOptions,
    ) -> Result<Option<HashMap<String, Value>>, RpcError> {
        let result = self.dispatch_batch_keyed(calls, options).await;
        if result.is_err() {
            self.stats.lock().failures += 1;
        }
        result
    }

    fn next_request_id(&self) -> RequestId {
        let n = self.request_counter.fetch_add(1, Ordering::SeqCst) + 1;
        RequestId::String(format!("req_{n}"))
    }

    async fn dispatch_call(
        &self,
        method: &str,
        params: Option<RequestParams>,
        options: &CallOptions,
    ) -> Result<Option<Value>, RpcError> {
        if options.notification {
            let body = to_body(&RpcNotification::new(method, params))?;
            debug!(%method, endpoint = %self.endpoint, "sending notification");
            self.stats.lock().notifications_sent += 1;
            let response = self.post(&body, options.bearer_token.as_deref()).await?;
            expect_success(&response)?;
            return Ok(None);
        }

        let id = self.next_request_id();
        let body = to_body(&RpcRequest::new(id.clone(), method, params))?;
        debug!(%method, %id, endpoint = %self.endpoint, "sending request");
        self.stats.lock().requests_sent += 1;
        let response = self.post(&body, options.bearer_token.as_deref()).await?;
        let value = read_json_body(response).await?;
        let result = validate_response(&value)?;
        self.stats.lock().responses_received += 1;
        Ok(Some(result))
    }

    async fn dispatch_batch(
        &self,
        calls: Vec<BatchCall>,
        options: &CallOptions,
    ) -> Result<Option<Vec<Value>>, RpcError> {
        if calls.is_empty() {
            // Empty batch: no frame, nothing touches the wire.
            return Ok(if options.notification { None } else { Some(vec![]) });
        }

        if options.notification {
            let frames = calls
                .into_iter()
                .map(|call| to_body(&RpcNotification::new(call.method, call.params)))
                .collect::<Result<Vec<_>, _>>()?;
            debug!(count = frames.len(), endpoint = %self.endpoint, "sending notification batch");
            self.stats.lock().notifications_sent += frames.len() as u64;
            let response = self
                .post(&Value::Array(frames), options.bearer_token.as_deref())
                .await?;
            expect_success(&response)?;
            return Ok(None);
        }

        let count = calls.len();
        let mut frames = Vec::with_capacity(count);
        for call in calls {
            let id = self.next_request_id();
            frames.push(to_body(&RpcRequest::new(id, call.method, call.params))?);
        }
        debug!(count, endpoint = %self.endpoint, "sending batch");
        self.stats.lock().requests_sent += count as u64;
        let response = self
            .post(&Value::Array(frames), options.bearer_token.as_deref())
            .await?;
        let value = read_json_body(response).await?;

        let mut results = Vec::with_capacity(count);
        for entry in batch_reply_entries(&value, count)? {
            results.push(validate_response(entry)?);
        }
        self.stats.lock().responses_received += count as u64;
        Ok(Some(results))
    }

    async fn dispatch_batch_keyed(
        &self,
        calls: Vec<(String, BatchCall)>,
        options: &CallOptions,
    ) -> Result<Option<HashMap<String, Value>>, RpcError> {
        if calls.is_empty() {
            return Ok(if options.notification { None } else { Some(HashMap::new()) });
        }

        if options.notification {
            let plain = calls.into_iter().map(|(_, call)| call).collect();
            return self.dispatch_batch(plain, options).await.map(|_| None);
        }

        let count = calls.len();
        let mut expected: HashSet<String> = HashSet::with_capacity(count);
        let mut frames = Vec::with_capacity(count);
        for (key, call) in calls {
            if !expected.insert(key.clone()) {
                return Err(RpcError::invalid_params(None, format!("duplicate batch key {key:?}")));
            }
            frames.push(to_body(&RpcRequest::new(
                RequestId::String(key),
                call.method,
                call.params,
            ))?);
        }
        debug!(count, endpoint = %self.endpoint, "sending keyed batch");
        self.stats.lock().requests_sent += count as u64;
        let response = self
            .post(&Value::Array(frames), options.bearer_token.as_deref())
            .await?;
        let value = read_json_body(response).await?;

        let mut results = HashMap::with_capacity(count);
        for entry in batch_reply_entries(&value, count)? {
            let (id, result) = validate_response_with_id(entry)?;
            let Some(RequestId::String(key)) = id else {
                return Err(RpcError::invalid_batch_reply("batch reply entry has no usable id"));
            };
            if !expected.remove(&key) {
                return Err(RpcError::invalid_batch_reply(format!(
                    "batch reply for unknown id {key:?}"
                )));
            }
            results.insert(key, result);
        }
        self.stats.lock().responses_received += count as u64;
        Ok(Some(results))
    }

    async fn post(&self, body: &Value, bearer: Option<&str>) -> Result<reqwest::Response, RpcError> {
        let mut request = self.http.post(self.endpoint.clone()).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        request
            .send()
            .await
            .map_err(|e| RpcError::transport_status(format!("request failed: {e}")))
    }
}

fn to_body<T: serde::Serialize>(message: &T) -> Result<Value, RpcError> {
    serde_json::to_value(message)
        .map_err(|e| RpcError::transport_body(format!("unserializable message: {e}")))
}

fn expect_success(response: &reqwest::Response) -> Result<(), RpcError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(RpcError::transport_status(format!(
            "HTTP request failed with status {status}"
        )))
    }
}

async fn read_json_body(response: reqwest::Response) -> Result<Value, RpcError> {
    expect_success(&response)?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| RpcError::transport_body(format!("unreadable response body: {e}")))?;
    if status == StatusCode::NO_CONTENT || text.is_empty() {
        return Err(RpcError::transport_body("empty response body for a request"));
    }
    serde_json::from_str(&text)
        .map_err(|e| RpcError::transport_body(format!("malformed response body: {e}")))
}

fn batch_reply_entries(value: &Value, expected: usize) -> Result<&[Value], RpcError> {
    let Some(entries) = value.as_array() else {
        return Err(RpcError::invalid_batch_reply("batch reply is not a sequence"));
    };
    if entries.is_empty() {
        return Err(RpcError::invalid_batch_reply("batch reply is empty"));
    }
    if entries.len() != expected {
        return Err(RpcError::invalid_batch_reply(format!(
            "batch reply has {} entries, expected {expected}",
            entries.len()
        )));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_client() -> RpcClient {
        RpcClient::from_url("http://127.0.0.1:9/rpc").unwrap()
    }

    #[test]
    fn test_invalid_endpoint_is_transport_status() {
        let err = RpcClient::from_url("not a url").unwrap_err();
        assert_eq!(err.code(), -32002);
        assert_eq!(err.id, None);
    }

    #[test]
    fn test_request_id_generation() {
        let client = test_client();
        assert_eq!(client.next_request_id(), RequestId::from("req_1"));
        assert_eq!(client.next_request_id(), RequestId::from("req_2"));
        assert_eq!(client.next_request_id(), RequestId::from("req_3"));
    }

    #[test]
    fn test_call_options_builder() {
        let options = CallOptions::new().as_notification().with_bearer("tok");
        assert!(options.notification);
        assert_eq!(options.bearer_token.as_deref(), Some("tok"));

        let defaults = CallOptions::default();
        assert!(!defaults.notification);
        assert!(defaults.bearer_token.is_none());
    }

    #[test]
    fn test_batch_reply_entries_checks() {
        let ok = json!([{"jsonrpc": "2.0", "id": 1, "result": 1}]);
        assert_eq!(batch_reply_entries(&ok, 1).unwrap().len(), 1);

        let not_array = json!({"jsonrpc": "2.0", "id": 1, "result": 1});
        assert_eq!(batch_reply_entries(&not_array, 1).unwrap_err().code(), -32004);

        let empty = json!([]);
        assert_eq!(batch_reply_entries(&empty, 1).unwrap_err().code(), -32004);

        let short = json!([{"jsonrpc": "2.0", "id": 1, "result": 1}]);
        assert_eq!(batch_reply_entries(&short, 2).unwrap_err().code(), -32004);
    }

    #[tokio::test]
    async fn test_empty_batch_never_touches_the_wire() {
        // The endpoint is a black hole; an empty batch must still resolve.
        let client = test_client();
        assert_eq!(client.batch(vec![]).await.unwrap(), Vec::<Value>::new());
        assert!(client.batch_keyed(vec![]).await.unwrap().is_empty());
        client.batch_notify(vec![]).await.unwrap();
        assert_eq!(client.stats(), ClientStats::default());
    }

    #[tokio::test]
    async fn test_duplicate_keyed_batch_key_rejected() {
        let client = test_client();
        let calls = vec![
            ("k".to_string(), BatchCall::new("a", None)),
            ("k".to_string(), BatchCall::new("b", None)),
        ];
        let err = client.batch_keyed(calls).await.unwrap_err();
        assert_eq!(err.code(), -32602);
    }
}
