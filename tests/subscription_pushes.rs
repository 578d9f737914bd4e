//! Server-push delivery end-to-end:
//! - `rpc.on` answers `"ok"` and later emissions arrive as
//!   notification-shaped requests carrying the subscription id
//! - `rpc.off` stops delivery; unsubscribed methods are never pushed
//! - one emission fans out to every subscribed channel
//! - a closed channel is deregistered and never retried
//! - disabling internal methods removes `rpc.on` and the hub entirely

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::info;

use wirecall_jsonrpc::{RequestParams, typed};
use wirecall_server::{EmissionHub, RpcServer};

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

async fn start_server() -> (SocketAddr, Arc<EmissionHub>) {
    let server = RpcServer::builder()
        .bind_address("127.0.0.1:0".parse().unwrap())
        .register("echo", typed(|v: Value| async move { Ok(v) }))
        .build();
    let hub = server.hub().expect("hub must exist by default");
    let bound = server.bind().await.expect("failed to bind server");
    let addr = bound.channel_addr();
    tokio::spawn(bound.serve());
    (addr, hub)
}

async fn connect(addr: SocketAddr) -> Socket {
    let (ws, _) = connect_async(format!("ws://{addr}"))
        .await
        .expect("failed to connect");
    ws
}

async fn next_frame(ws: &mut Socket) -> Value {
    loop {
        let message = ws
            .next()
            .await
            .expect("connection closed early")
            .expect("read failed");
        match message {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("frame is not JSON");
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Send `rpc.on`/`rpc.off` and wait for its `"ok"`.
async fn control(ws: &mut Socket, ctl_id: &str, method: &str, sub_method: &str, sub_id: &str) {
    let request = json!({
        "jsonrpc": "2.0",
        "id": ctl_id,
        "method": method,
        "params": {"method": sub_method, "id": sub_id}
    });
    ws.send(Message::text(request.to_string()))
        .await
        .expect("write failed");
    let reply = next_frame(ws).await;
    assert_eq!(reply["id"], json!(ctl_id));
    assert_eq!(reply["result"], json!("ok"), "control call failed: {reply}");
}

#[tokio::test]
async fn test_subscribe_then_emit_delivers_exact_frame() {
    let _ = tracing_subscriber::fmt::try_init();
    let (addr, hub) = start_server().await;
    let mut ws = connect(addr).await;

    control(&mut ws, "ctl-1", "rpc.on", "priceUpdate", "sub-1").await;

    let summary = hub
        .emit("priceUpdate", RequestParams::from_value(json!({"price": 42})))
        .await;
    assert_eq!(summary.delivered, 1);
    assert_eq!(summary.dropped, 0);

    let frame = next_frame(&mut ws).await;
    assert_eq!(
        frame,
        json!({
            "jsonrpc": "2.0",
            "id": "sub-1",
            "method": "priceUpdate",
            "params": {"price": 42}
        })
    );
    info!("push frame delivered verbatim");
}

#[tokio::test]
async fn test_unsubscribed_method_is_never_pushed() {
    let _ = tracing_subscriber::fmt::try_init();
    let (addr, hub) = start_server().await;
    let mut ws = connect(addr).await;

    control(&mut ws, "ctl-1", "rpc.on", "ticks", "t1").await;

    let summary = hub.emit("otherFeed", None).await;
    assert_eq!(summary.delivered, 0);

    // The next frame on the wire must be the subscribed push, proving the
    // unrelated emission wrote nothing.
    hub.emit("ticks", None).await;
    let frame = next_frame(&mut ws).await;
    assert_eq!(frame["method"], json!("ticks"));
    assert_eq!(frame["id"], json!("t1"));
}

#[tokio::test]
async fn test_rpc_off_stops_delivery() {
    let _ = tracing_subscriber::fmt::try_init();
    let (addr, hub) = start_server().await;
    let mut ws = connect(addr).await;

    control(&mut ws, "ctl-1", "rpc.on", "ticks", "t1").await;
    control(&mut ws, "ctl-2", "rpc.off", "ticks", "t1").await;

    let summary = hub.emit("ticks", None).await;
    assert_eq!(summary.delivered, 0);

    // Re-subscribing works after an off; the pair was removed, not the
    // channel.
    control(&mut ws, "ctl-3", "rpc.on", "ticks", "t1").await;
    hub.emit("ticks", None).await;
    let frame = next_frame(&mut ws).await;
    assert_eq!(frame["id"], json!("t1"));
}

#[tokio::test]
async fn test_emission_fans_out_to_every_channel() {
    let _ = tracing_subscriber::fmt::try_init();
    let (addr, hub) = start_server().await;
    let mut first = connect(addr).await;
    let mut second = connect(addr).await;

    control(&mut first, "ctl-1", "rpc.on", "ticks", "first-sub").await;
    control(&mut second, "ctl-1", "rpc.on", "ticks", "second-sub").await;

    let summary = hub.emit("ticks", RequestParams::from_value(json!([1]))).await;
    assert_eq!(summary.delivered, 2);

    let frame = next_frame(&mut first).await;
    assert_eq!(frame["id"], json!("first-sub"));
    let frame = next_frame(&mut second).await;
    assert_eq!(frame["id"], json!("second-sub"));
}

#[tokio::test]
async fn test_closed_channel_is_deregistered() {
    let _ = tracing_subscriber::fmt::try_init();
    let (addr, hub) = start_server().await;
    let mut ws = connect(addr).await;

    control(&mut ws, "ctl-1", "rpc.on", "ticks", "t1").await;
    assert_eq!(hub.channel_count().await, 1);

    ws.close(None).await.expect("close failed");

    let mut deregistered = false;
    for _ in 0..100 {
        if hub.channel_count().await == 0 {
            deregistered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(deregistered, "channel was not deregistered after close");

    // Nothing left to deliver to, and nothing is retried later.
    let summary = hub.emit("ticks", None).await;
    assert_eq!(summary.delivered, 0);
    assert_eq!(summary.dropped, 0);
}

#[tokio::test]
async fn test_disabled_internal_methods_remove_rpc_on() {
    let _ = tracing_subscriber::fmt::try_init();
    let server = RpcServer::builder()
        .bind_address("127.0.0.1:0".parse().unwrap())
        .disable_internal_methods()
        .register("echo", typed(|v: Value| async move { Ok(v) }))
        .build();
    assert!(server.hub().is_none(), "disabled server must not own a hub");

    let bound = server.bind().await.expect("failed to bind server");
    let addr = bound.channel_addr();
    tokio::spawn(bound.serve());

    let mut ws = connect(addr).await;
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "rpc.on",
        "params": {"method": "ticks", "id": "t1"}
    });
    ws.send(Message::text(request.to_string()))
        .await
        .expect("write failed");

    let reply = next_frame(&mut ws).await;
    assert_eq!(reply["error"]["code"], json!(-32601));

    // Plain dispatch still works on the same channel.
    ws.send(Message::text(
        json!({"jsonrpc": "2.0", "id": 2, "method": "echo", "params": [3]}).to_string(),
    ))
    .await
    .expect("write failed");
    let reply = next_frame(&mut ws).await;
    assert_eq!(reply["result"], json!([3]));
}
