//! Frame dispatch: classify, execute, coordinate.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::batch::collect_batch;
use crate::error::RpcError;
use crate::notification::RpcNotification;
use crate::registry::{Capability, MethodRegistry};
use crate::request::RpcRequest;
use crate::response::{OutboundFrame, RpcOutcome, RpcResponse};
use crate::validate::{Inbound, InboundItem, classify, classify_text};

/// Executes classified frames against an effective registry.
///
/// The optional overlay is consulted before the base registry; channel
/// drivers use it to expose per-connection methods without touching the
/// shared set.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<MethodRegistry>,
    overlay: Option<Arc<MethodRegistry>>,
}

impl Dispatcher {
    pub fn new(registry: Arc<MethodRegistry>) -> Self {
        Self {
            registry,
            overlay: None,
        }
    }

    pub fn with_overlay(registry: Arc<MethodRegistry>, overlay: Arc<MethodRegistry>) -> Self {
        Self {
            registry,
            overlay: Some(overlay),
        }
    }

    /// A dispatcher sharing this one's base registry under a different
    /// overlay.
    pub fn overlaid(&self, overlay: Arc<MethodRegistry>) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            overlay: Some(overlay),
        }
    }

    /// Registered names across overlay and base.
    pub fn method_names(&self) -> Vec<String> {
        let mut names = self.registry.method_names();
        if let Some(overlay) = &self.overlay {
            names.extend(overlay.method_names());
        }
        names
    }

    fn lookup(&self, method: &str) -> Option<&Arc<dyn Capability>> {
        self.overlay
            .as_deref()
            .and_then(|overlay| overlay.get(method))
            .or_else(|| self.registry.get(method))
    }

    /// One validated request in, exactly one outcome out. Capability
    /// failures come back stamped with the originating request id.
    pub async fn handle_request(&self, request: RpcRequest) -> RpcOutcome {
        let RpcRequest {
            id, method, params, ..
        } = request;
        let Some(capability) = self.lookup(&method) else {
            debug!(%method, %id, "method not found");
            return RpcOutcome::Failure(RpcError::method_not_found(Some(id), &method));
        };
        match capability.invoke(params).await {
            Ok(result) => RpcOutcome::Success(RpcResponse::new(id, result)),
            Err(err) => RpcOutcome::Failure(err.with_id(Some(id))),
        }
    }

    /// Execute a notification for effect. An unknown method is a silent
    /// no-op; a capability failure is returned so the driver can log it,
    /// but nothing ever goes back to the peer.
    pub async fn handle_notification(&self, notification: RpcNotification) -> Result<(), RpcError> {
        let RpcNotification { method, params, .. } = notification;
        match self.lookup(&method) {
            Some(capability) => capability.invoke(params).await.map(|_| ()),
            None => {
                debug!(%method, "notification for unregistered method ignored");
                Ok(())
            }
        }
    }

    async fn handle_item(&self, item: InboundItem) -> Option<RpcOutcome> {
        match item {
            InboundItem::Request(request) => Some(self.handle_request(request).await),
            InboundItem::Notification(notification) => {
                let method = notification.method.clone();
                if let Err(err) = self.handle_notification(notification).await {
                    warn!(%method, code = err.code(), "notification failed: {}", err.message());
                }
                None
            }
            InboundItem::Invalid(err) => Some(RpcOutcome::Failure(err)),
        }
    }

    async fn dispatch_inbound(&self, inbound: Inbound) -> Option<OutboundFrame> {
        match inbound {
            Inbound::Single(item) => self.handle_item(item).await.map(OutboundFrame::Single),
            Inbound::Batch(items) => {
                // Items run sequentially in arrival order; a failure outcome
                // never aborts its siblings.
                let mut outcomes = Vec::with_capacity(items.len());
                for item in items {
                    outcomes.push(self.handle_item(item).await);
                }
                collect_batch(outcomes).map(OutboundFrame::Batch)
            }
        }
    }

    /// Full pipeline for one decoded frame.
    pub async fn dispatch_value(&self, value: Value) -> Option<OutboundFrame> {
        self.dispatch_inbound(classify(value)).await
    }

    /// Full pipeline for one text frame; undecodable text produces an
    /// invalid-request failure with a null id.
    pub async fn dispatch_text(&self, text: &str) -> Option<OutboundFrame> {
        self.dispatch_inbound(classify_text(text)).await
    }
}
