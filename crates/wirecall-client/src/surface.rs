//! Bound method-call records.
//!
//! Callers construct the surface once from a known method-name list and get
//! plain handles back; nothing is proxied or resolved dynamically at call
//! time.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use wirecall_jsonrpc::{RequestParams, RpcError};

use crate::client::{CallOptions, RpcClient};

/// One remote method bound to a client.
#[derive(Clone)]
pub struct RemoteMethod {
    client: Arc<RpcClient>,
    method: String,
}

impl RemoteMethod {
    pub fn name(&self) -> &str {
        &self.method
    }

    pub async fn invoke(&self, params: Option<RequestParams>) -> Result<Value, RpcError> {
        self.client.call(&self.method, params).await
    }

    pub async fn invoke_with_options(
        &self,
        params: Option<RequestParams>,
        options: &CallOptions,
    ) -> Result<Option<Value>, RpcError> {
        self.client.call_with_options(&self.method, params, options).await
    }

    pub async fn notify(&self, params: Option<RequestParams>) -> Result<(), RpcError> {
        self.client.notify(&self.method, params).await
    }
}

/// A record of callables for a fixed method-name set.
pub struct MethodSurface {
    methods: HashMap<String, RemoteMethod>,
}

impl MethodSurface {
    pub fn bind<I, S>(client: Arc<RpcClient>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let methods = names
            .into_iter()
            .map(|name| {
                let name = name.into();
                let handle = RemoteMethod {
                    client: Arc::clone(&client),
                    method: name.clone(),
                };
                (name, handle)
            })
            .collect();
        Self { methods }
    }

    pub fn method(&self, name: &str) -> Option<&RemoteMethod> {
        self.methods.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.methods.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
