//! Method registry and the capability seam.

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{RpcError, RpcErrorObject};
use crate::request::{RequestParams, parse_params};

/// An invocable method implementation.
///
/// Failures are returned pre-structured; the dispatcher stamps the
/// originating request id on the way out, so implementations leave the id
/// alone (`RpcErrorObject::...().into()` is the usual shape).
#[async_trait]
pub trait Capability: Send + Sync {
    async fn invoke(&self, params: Option<RequestParams>) -> Result<Value, RpcError>;
}

/// Adapter for plain async closures working on raw params.
pub struct FnCapability<F> {
    f: F,
}

impl<F> FnCapability<F>
where
    F: Fn(Option<RequestParams>) -> BoxFuture<'static, Result<Value, RpcError>> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Capability for FnCapability<F>
where
    F: Fn(Option<RequestParams>) -> BoxFuture<'static, Result<Value, RpcError>> + Send + Sync,
{
    async fn invoke(&self, params: Option<RequestParams>) -> Result<Value, RpcError> {
        (self.f)(params).await
    }
}

/// Adapter that deserializes params into `P` and serializes the handler's
/// return value. Absent params deserialize from JSON `null`, so `Option<P>`
/// and `()` handlers need no special casing. Shape mismatches become
/// `-32602`; an unserializable result becomes `-32603`.
pub struct TypedCapability<P, F> {
    f: F,
    _params: PhantomData<fn(P)>,
}

/// Build a [`TypedCapability`] from an async function over typed params.
pub fn typed<P, R, F, Fut>(f: F) -> TypedCapability<P, F>
where
    P: DeserializeOwned + Send,
    R: Serialize,
    F: Fn(P) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, RpcError>> + Send,
{
    TypedCapability {
        f,
        _params: PhantomData,
    }
}

#[async_trait]
impl<P, R, F, Fut> Capability for TypedCapability<P, F>
where
    P: DeserializeOwned + Send,
    R: Serialize,
    F: Fn(P) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, RpcError>> + Send,
{
    async fn invoke(&self, params: Option<RequestParams>) -> Result<Value, RpcError> {
        let typed: P = parse_params(params.as_ref())?;
        let result = (self.f)(typed).await?;
        serde_json::to_value(result)
            .map_err(|e| RpcErrorObject::internal_error(format!("unserializable result: {e}")).into())
    }
}

/// Name → capability map. Registration replaces silently; last write wins.
#[derive(Clone, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, Arc<dyn Capability>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, capability: impl Capability + 'static) {
        self.methods.insert(name.into(), Arc::new(capability));
    }

    pub fn register_arc(&mut self, name: impl Into<String>, capability: Arc<dyn Capability>) {
        self.methods.insert(name.into(), capability);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Capability>> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn method_names(&self) -> Vec<String> {
        self.methods.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
