//! Channel driver: one task per accepted connection.
//!
//! The driver multiplexes two sources onto the socket: replies to the
//! peer's own traffic and push frames from the emission hub. Pushes are
//! pre-serialized by the hub and written verbatim; they never pass
//! through the dispatcher.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, info, warn};

use wirecall_jsonrpc::Dispatcher;

use crate::hub::EmissionHub;
use crate::internal;

pub(crate) async fn drive(
    stream: TcpStream,
    peer: SocketAddr,
    base: Arc<Dispatcher>,
    hub: Option<Arc<EmissionHub>>,
) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(err) => {
            warn!(%peer, "handshake failed: {err}");
            return;
        }
    };

    // With a hub present the channel gets its own subscription methods as
    // an overlay on the shared registry, plus the receiving end of its
    // push pipe. Without one, the shared dispatcher is used as-is.
    let (channel, mut pushes, dispatcher) = match &hub {
        Some(hub) => {
            let (channel, receiver) = hub.register().await;
            let overlay = internal::internal_registry(Arc::clone(hub), channel.clone());
            let dispatcher = base.overlaid(Arc::new(overlay));
            (Some(channel), Some(receiver), dispatcher)
        }
        None => (None, None, base.as_ref().clone()),
    };

    info!(%peer, channel = channel.as_deref().unwrap_or("-"), "channel open");

    let (mut sink, mut reader) = ws.split();
    let mut close_sent = false;

    loop {
        tokio::select! {
            // Traffic from the peer
            incoming = reader.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let Some(frame) = dispatcher.dispatch_text(text.as_str()).await else {
                            // Notifications and empty batches get no reply.
                            continue;
                        };
                        let json = match frame.to_json() {
                            Ok(json) => json,
                            Err(err) => {
                                warn!(%peer, "reply unserializable: {err}");
                                continue;
                            }
                        };
                        if let Err(err) = sink.send(Message::text(json)).await {
                            debug!(%peer, "write failed: {err}");
                            break;
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        debug!(%peer, "ignoring binary frame");
                    }
                    Some(Ok(Message::Ping(_))) => {
                        // The transport queues the pong itself.
                    }
                    Some(Ok(Message::Pong(_) | Message::Frame(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        close_sent = true;
                        break;
                    }
                    Some(Err(err)) => {
                        debug!(%peer, "read failed: {err}");
                        break;
                    }
                    None => {
                        close_sent = true;
                        break;
                    }
                }
            }

            // Push frames for this channel's subscriptions
            push = recv_push(&mut pushes) => {
                match push {
                    Some(frame) => {
                        if let Err(err) = sink.send(Message::text(frame)).await {
                            debug!(%peer, "push write failed: {err}");
                            break;
                        }
                    }
                    // The hub dropped this channel; regular traffic
                    // continues without pushes.
                    None => pushes = None,
                }
            }
        }
    }

    if let (Some(hub), Some(channel)) = (&hub, &channel) {
        hub.deregister(channel).await;
    }
    if !close_sent {
        let _ = sink
            .send(Message::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "".into(),
            })))
            .await;
    }
    let _ = sink.close().await;
    info!(%peer, "channel closed");
}

/// Pending forever once the push pipe is gone, so the select loop keeps
/// serving peer traffic.
async fn recv_push(pushes: &mut Option<mpsc::Receiver<String>>) -> Option<String> {
    match pushes {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}
