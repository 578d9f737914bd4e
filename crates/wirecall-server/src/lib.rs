//! # wirecall-server
//!
//! Persistent-channel JSON-RPC server with server-initiated pushes.
//!
//! Each accepted WebSocket connection is a *channel*: a select loop that
//! answers the peer's requests and, interleaved with them, writes push
//! frames for whatever `(method, id)` pairs the peer subscribed to via
//! `rpc.on`. Pushes fan out from an [`EmissionHub`] owned by the server;
//! a failed write deregisters the channel and is never retried. An
//! optional HTTP ingress serves the plain request/response transport on
//! the same dispatcher.
//!
//! ```rust,no_run
//! use wirecall_server::RpcServer;
//! use wirecall_jsonrpc::typed;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), wirecall_server::ServerError> {
//! let server = RpcServer::builder()
//!     .bind_address("127.0.0.1:9464".parse().unwrap())
//!     .register("sum", typed(|terms: Vec<i64>| async move {
//!         Ok(terms.iter().sum::<i64>())
//!     }))
//!     .build();
//!
//! let hub = server.hub();
//! let bound = server.bind().await?;
//! tokio::spawn(bound.serve());
//!
//! if let Some(hub) = hub {
//!     hub.emit("priceUpdate", wirecall_jsonrpc::RequestParams::from_value(
//!         json!({"price": 42}),
//!     )).await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod hub;
pub mod internal;
pub mod server;

mod channel;
mod http;

pub use config::ServerConfig;
pub use hub::{ChannelId, EmissionHub, EmitSummary, SubscriptionTable};
pub use internal::{METHOD_SUBSCRIBE, METHOD_UNSUBSCRIBE, internal_registry};
pub use server::{BoundServer, RpcServer, RpcServerBuilder, ServerError};

pub use wirecall_jsonrpc::{Capability, Dispatcher, MethodRegistry, RpcError};
