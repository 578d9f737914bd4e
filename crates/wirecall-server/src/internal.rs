//! Per-channel subscription methods.
//!
//! These capabilities live on a channel's overlay registry, never on the
//! shared one, so each connection can only touch its own subscription
//! table. With internal methods disabled the overlay is absent and both
//! names fall through to method-not-found.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use wirecall_jsonrpc::{
    Capability, MethodRegistry, RequestId, RequestParams, RpcError, RpcErrorObject, parse_params,
};

use crate::hub::{ChannelId, EmissionHub};

/// Method observers call to start receiving pushes for `(method, id)`.
pub const METHOD_SUBSCRIBE: &str = "rpc.on";
/// Method observers call to stop.
pub const METHOD_UNSUBSCRIBE: &str = "rpc.off";

#[derive(Debug, Deserialize)]
struct SubscriptionParams {
    method: String,
    id: RequestId,
}

struct Subscribe {
    hub: Arc<EmissionHub>,
    channel: ChannelId,
}

#[async_trait]
impl Capability for Subscribe {
    async fn invoke(&self, params: Option<RequestParams>) -> Result<Value, RpcError> {
        let p: SubscriptionParams = parse_params(params.as_ref())?;
        match self.hub.subscribe(&self.channel, &p.method, p.id).await {
            Some(_) => Ok(json!("ok")),
            None => Err(RpcErrorObject::internal_error("channel is no longer registered").into()),
        }
    }
}

struct Unsubscribe {
    hub: Arc<EmissionHub>,
    channel: ChannelId,
}

#[async_trait]
impl Capability for Unsubscribe {
    async fn invoke(&self, params: Option<RequestParams>) -> Result<Value, RpcError> {
        let p: SubscriptionParams = parse_params(params.as_ref())?;
        match self.hub.unsubscribe(&self.channel, &p.method, &p.id).await {
            Some(_) => Ok(json!("ok")),
            None => Err(RpcErrorObject::internal_error("channel is no longer registered").into()),
        }
    }
}

/// Overlay registry giving one channel its subscription controls.
pub fn internal_registry(hub: Arc<EmissionHub>, channel: ChannelId) -> MethodRegistry {
    let mut registry = MethodRegistry::new();
    registry.register(
        METHOD_SUBSCRIBE,
        Subscribe {
            hub: Arc::clone(&hub),
            channel: channel.clone(),
        },
    );
    registry.register(METHOD_UNSUBSCRIBE, Unsubscribe { hub, channel });
    registry
}
