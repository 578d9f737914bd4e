//! Emission hub: the fan-out registry for server pushes.
//!
//! The hub is owned by the server that created it; there is no process
//! global. Channels appear in registration order and that order is the
//! fan-out order. Every push frame is a notification-shaped request whose
//! id slot carries the subscription id, so an observer can correlate
//! without extra bookkeeping.

use std::collections::HashMap;

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

use wirecall_jsonrpc::{RequestId, RequestParams, RpcRequest};

/// Channel identifier, unique per accepted connection.
pub type ChannelId = String;

/// Per-channel subscription bookkeeping: method → ordered subscription ids,
/// each `(method, id)` pair held at most once.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionTable {
    by_method: HashMap<String, Vec<RequestId>>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the pair was newly added; a duplicate is a no-op.
    pub fn subscribe(&mut self, method: &str, id: RequestId) -> bool {
        let ids = self.by_method.entry(method.to_string()).or_default();
        if ids.contains(&id) {
            false
        } else {
            ids.push(id);
            true
        }
    }

    /// True when the pair existed.
    pub fn unsubscribe(&mut self, method: &str, id: &RequestId) -> bool {
        let Some(ids) = self.by_method.get_mut(method) else {
            return false;
        };
        let before = ids.len();
        ids.retain(|known| known != id);
        let removed = ids.len() < before;
        if ids.is_empty() {
            self.by_method.remove(method);
        }
        removed
    }

    /// Subscription ids for a method, in the order they subscribed.
    pub fn ids_for(&self, method: &str) -> &[RequestId] {
        self.by_method.get(method).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn subscription_count(&self) -> usize {
        self.by_method.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_method.is_empty()
    }
}

struct ChannelEntry {
    id: ChannelId,
    sender: mpsc::Sender<String>,
    subscriptions: SubscriptionTable,
}

/// Outcome of one emission pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmitSummary {
    /// Notifications written, one per subscribed id on a live channel.
    pub delivered: usize,
    /// Channels deregistered because a write failed.
    pub dropped: usize,
}

/// Broadcast registry: channels in registration order, each with its own
/// subscription table and push pipe.
pub struct EmissionHub {
    channels: RwLock<Vec<ChannelEntry>>,
    buffer_size: usize,
}

impl EmissionHub {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: RwLock::new(Vec::new()),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Add a channel; the driver keeps the receiving end of the push pipe.
    pub async fn register(&self) -> (ChannelId, mpsc::Receiver<String>) {
        let id = Uuid::now_v7().to_string();
        let (sender, receiver) = mpsc::channel(self.buffer_size);
        let mut channels = self.channels.write().await;
        channels.push(ChannelEntry {
            id: id.clone(),
            sender,
            subscriptions: SubscriptionTable::new(),
        });
        debug!(channel = %id, total = channels.len(), "channel registered");
        (id, receiver)
    }

    /// Remove a channel along with its subscriptions; idempotent.
    pub async fn deregister(&self, id: &str) -> bool {
        let mut channels = self.channels.write().await;
        let before = channels.len();
        channels.retain(|entry| entry.id != id);
        let removed = channels.len() < before;
        if removed {
            debug!(channel = %id, total = channels.len(), "channel deregistered");
        }
        removed
    }

    /// Record `(method, id)` for a channel. `Some(true)` when newly added,
    /// `Some(false)` for a duplicate, `None` when the channel is unknown.
    pub async fn subscribe(&self, channel: &str, method: &str, id: RequestId) -> Option<bool> {
        let mut channels = self.channels.write().await;
        let entry = channels.iter_mut().find(|entry| entry.id == channel)?;
        let added = entry.subscriptions.subscribe(method, id);
        debug!(%channel, %method, added, "subscribe");
        Some(added)
    }

    /// Drop `(method, id)` for a channel. `Some(true)` when the pair
    /// existed, `None` when the channel is unknown.
    pub async fn unsubscribe(&self, channel: &str, method: &str, id: &RequestId) -> Option<bool> {
        let mut channels = self.channels.write().await;
        let entry = channels.iter_mut().find(|entry| entry.id == channel)?;
        let removed = entry.subscriptions.unsubscribe(method, id);
        debug!(%channel, %method, removed, "unsubscribe");
        Some(removed)
    }

    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }

    pub async fn subscription_count(&self, channel: &str) -> usize {
        self.channels
            .read()
            .await
            .iter()
            .find(|entry| entry.id == channel)
            .map(|entry| entry.subscriptions.subscription_count())
            .unwrap_or(0)
    }

    /// Fan one emission out to every subscribed id, visiting channels in
    /// registration order.
    ///
    /// Any write failure (closed pipe, full buffer, unserializable frame)
    /// deregisters that channel after the pass. Nothing is retried and the
    /// emitter never sees an error; a dead peer is not an error condition
    /// for emitting code.
    pub async fn emit(&self, method: &str, params: Option<RequestParams>) -> EmitSummary {
        let mut summary = EmitSummary::default();
        let mut dead: Vec<ChannelId> = Vec::new();
        {
            let channels = self.channels.read().await;
            for entry in channels.iter() {
                let ids = entry.subscriptions.ids_for(method);
                if ids.is_empty() {
                    continue;
                }
                for id in ids {
                    match push_frame(method, params.as_ref(), id) {
                        Ok(frame) => match entry.sender.try_send(frame) {
                            Ok(()) => summary.delivered += 1,
                            Err(err) => {
                                warn!(channel = %entry.id, %method, "push write failed: {err}");
                                dead.push(entry.id.clone());
                                break;
                            }
                        },
                        Err(err) => {
                            warn!(channel = %entry.id, %method, "push frame unserializable: {err}");
                            dead.push(entry.id.clone());
                            break;
                        }
                    }
                }
            }
        }
        for id in &dead {
            self.deregister(id).await;
        }
        summary.dropped = dead.len();
        summary
    }
}

/// Synthesize the push frame: `{jsonrpc, method, params, id}` with the
/// subscription id in the id slot. Typed construction keeps the frame
/// well-formed by definition.
fn push_frame(
    method: &str,
    params: Option<&RequestParams>,
    id: &RequestId,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&RpcRequest::new(id.clone(), method, params.cloned()))
}
